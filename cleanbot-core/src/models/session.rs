use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cleaning::{CleaningResult, CleaningStatus};
use super::grid::Position;
use super::plan::PlanSummary;

/// An append-only history entry for one cleaning session.
///
/// Records are created by [`HistoryStore::record`](crate::store::HistoryStore::record)
/// and never change afterwards. They keep counts rather than the full cleaned
/// set so that each one fits a single row of the history file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionRecord {
    /// Strictly increasing, assigned at append time.
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub plan: PlanSummary,
    pub steps_taken: u64,
    pub cells_cleaned: usize,
    pub final_position: Position,
    pub status: CleaningStatus,
}

impl SessionRecord {
    pub fn new(id: u64, timestamp: DateTime<Utc>, plan: PlanSummary, result: &CleaningResult) -> Self {
        Self {
            id,
            timestamp,
            plan,
            steps_taken: result.steps_taken,
            cells_cleaned: result.cells_cleaned(),
            final_position: result.final_position,
            status: result.status,
        }
    }
}
