use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use cleanbot_core::map::{self, MapFormat};
use cleanbot_core::models::*;
use cleanbot_core::simulation;

use super::{ApiError, AppState};

/// Form field carrying the uploaded map.
const MAP_FIELD: &str = "file";
const HISTORY_FILE_NAME: &str = "session_history.csv";

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Map
// ============================================================

/// Acknowledgement for a successful map upload.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetMapResponse {
    pub status: String,
    #[serde(flatten)]
    pub map: MapSummary,
}

/// Replace the current map with an uploaded `.txt` or `.json` file.
///
/// The format comes from the file name's extension. A part sent without a file
/// name is sniffed from its content.
pub async fn set_map(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<SetMapResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::SchemaValidation(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::SchemaValidation(e.body_text()))?
    {
        if field.name() != Some(MAP_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let raw = field
            .bytes()
            .await
            .map_err(|e| ApiError::SchemaValidation(e.body_text()))?;

        let format = match file_name.as_deref() {
            Some(name) if !name.is_empty() => MapFormat::from_file_name(name)?,
            _ => MapFormat::detect(&raw),
        };
        let grid = map::parse(&raw, format)?;
        let summary = state.set_map(grid).summary();

        tracing::info!(
            format = format.as_str(),
            width = summary.width,
            height = summary.height,
            obstacles = summary.obstacles,
            "map set"
        );

        return Ok(Json(SetMapResponse {
            status: "map set".to_string(),
            map: summary,
        }));
    }

    Err(ApiError::SchemaValidation(format!(
        "missing `{}` part in multipart upload",
        MAP_FIELD
    )))
}

pub async fn get_map(State(state): State<AppState>) -> Result<Json<MapSummary>, ApiError> {
    state
        .current_map()
        .map(|grid| Json(grid.summary()))
        .ok_or_else(|| ApiError::NotFound("No map has been set".to_string()))
}

// ============================================================
// Cleaning
// ============================================================

/// Result of a cleaning run together with the id of its history record.
#[derive(Debug, Serialize, Deserialize)]
pub struct CleanResponse {
    pub session_id: u64,
    #[serde(flatten)]
    pub result: CleaningResult,
}

/// Run a cleaning plan against the current map and record the session.
///
/// Runs that stop at an edge or an obstacle still succeed; the status field
/// tells them apart.
pub async fn clean(
    State(state): State<AppState>,
    body: Result<Json<CleanRequest>, JsonRejection>,
) -> Result<Json<CleanResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::SchemaValidation(e.body_text()))?;
    request.validate(state.max_total_steps)?;

    let grid = state.current_map().ok_or(ApiError::MapNotSet)?;
    let start = request.start().ok_or_else(|| {
        ApiError::InvalidStart(format!(
            "start position ({}, {}) is outside the grid",
            request.start_x, request.start_y
        ))
    })?;

    let result = simulation::run(&grid, start, &request.actions, request.premium)?;
    let plan = PlanSummary::new(start, &request.actions, request.premium);
    let record = state.history.record(plan, &result)?;

    tracing::info!(
        session_id = record.id,
        status = result.status.as_str(),
        cells_cleaned = result.cells_cleaned(),
        steps_taken = result.steps_taken,
        "cleaning session recorded"
    );

    Ok(Json(CleanResponse {
        session_id: record.id,
        result,
    }))
}

// ============================================================
// History
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryFormat {
    Json,
    Csv,
}

/// Query parameters for reading history.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    /// `json` (default) or `csv`. Without it, an `Accept: text/csv` header
    /// selects CSV.
    pub format: Option<HistoryFormat>,
}

pub async fn get_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::SchemaValidation(e.body_text()))?;

    let format = query.format.unwrap_or_else(|| {
        let accepts_csv = headers
            .get(header::ACCEPT)
            .and_then(|h| h.to_str().ok())
            .is_some_and(|accept| accept.contains("text/csv"));
        if accepts_csv {
            HistoryFormat::Csv
        } else {
            HistoryFormat::Json
        }
    });

    let response = match format {
        HistoryFormat::Json => Json(state.history.list_all()).into_response(),
        HistoryFormat::Csv => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", HISTORY_FILE_NAME),
                ),
            ],
            state.history.export_tabular(),
        )
            .into_response(),
    };
    Ok(response)
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<SessionRecord>, ApiError> {
    state
        .history
        .get(id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Session {} not found", id)))
}
