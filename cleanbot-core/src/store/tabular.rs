//! CSV encoding of session records.
//!
//! The same format is used for the history file on disk and for the
//! `/history` CSV export. Every field is numeric, an RFC 3339 timestamp or a
//! fixed keyword, so no quoting is ever needed.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::{CleaningStatus, PlanSummary, Position, SessionRecord};

pub const COLUMNS: [&str; 12] = [
    "id",
    "timestamp",
    "start_x",
    "start_y",
    "actions_count",
    "requested_steps",
    "steps_taken",
    "cells_cleaned",
    "final_x",
    "final_y",
    "status",
    "premium",
];

pub const HEADER: &str = "id,timestamp,start_x,start_y,actions_count,requested_steps,steps_taken,cells_cleaned,final_x,final_y,status,premium";

/// Encode all records, header first. An empty slice gives the header alone.
pub fn encode(records: &[SessionRecord]) -> String {
    let mut out = String::with_capacity(HEADER.len() + 1 + records.len() * 96);
    out.push_str(HEADER);
    out.push('\n');
    for record in records {
        out.push_str(&encode_row(record));
    }
    out
}

/// One newline-terminated row.
pub fn encode_row(record: &SessionRecord) -> String {
    format!(
        "{},{},{},{},{},{},{},{},{},{},{},{}\n",
        record.id,
        record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        record.plan.start.x,
        record.plan.start.y,
        record.plan.actions_count,
        record.plan.requested_steps,
        record.steps_taken,
        record.cells_cleaned,
        record.final_position.x,
        record.final_position.y,
        record.status.as_str(),
        record.plan.premium,
    )
}

/// Decode one row, without its line terminator.
pub fn decode_row(line: &str) -> Result<SessionRecord, String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != COLUMNS.len() {
        return Err(format!(
            "expected {} fields, found {}",
            COLUMNS.len(),
            fields.len()
        ));
    }

    let number = |i: usize| -> Result<u64, String> {
        fields[i]
            .parse::<u64>()
            .map_err(|e| format!("{}: {}", COLUMNS[i], e))
    };
    let index = |i: usize| -> Result<usize, String> {
        fields[i]
            .parse::<usize>()
            .map_err(|e| format!("{}: {}", COLUMNS[i], e))
    };

    let timestamp = DateTime::parse_from_rfc3339(fields[1])
        .map_err(|e| format!("timestamp: {}", e))?
        .with_timezone(&Utc);
    let status = CleaningStatus::from_str(fields[10])
        .ok_or_else(|| format!("status: unknown value {:?}", fields[10]))?;
    let premium = fields[11]
        .parse::<bool>()
        .map_err(|e| format!("premium: {}", e))?;

    Ok(SessionRecord {
        id: number(0)?,
        timestamp,
        plan: PlanSummary {
            start: Position::new(index(2)?, index(3)?),
            actions_count: index(4)?,
            requested_steps: number(5)?,
            premium,
        },
        steps_taken: number(6)?,
        cells_cleaned: index(7)?,
        final_position: Position::new(index(8)?, index(9)?),
        status,
    })
}
