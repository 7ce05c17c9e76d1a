use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cleanbot_core::map::MapError;
use cleanbot_core::models::PlanError;
use cleanbot_core::simulation::SimulationError;
use cleanbot_core::store::StoreError;

/// Errors surfaced to API clients.
///
/// Everything except [`ApiError::StoreIo`] is a client error and is returned
/// with its description. Store failures are logged in full and reported with a
/// generic message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MalformedMap(MapError),

    #[error("{0}")]
    UnsupportedFormat(MapError),

    #[error("no map has been set; upload one to /set-map first")]
    MapNotSet,

    #[error("{0}")]
    InvalidStart(String),

    #[error("{0}")]
    SchemaValidation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("failed to record session history")]
    StoreIo(#[from] StoreError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MalformedMap(_)
            | Self::UnsupportedFormat(_)
            | Self::InvalidStart(_)
            | Self::SchemaValidation(_) => StatusCode::BAD_REQUEST,
            Self::MapNotSet => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::StoreIo(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedMap(_) => "malformed_map",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::MapNotSet => "map_not_set",
            Self::InvalidStart(_) => "invalid_start",
            Self::SchemaValidation(_) => "schema_validation",
            Self::NotFound(_) => "not_found",
            Self::StoreIo(_) => "store_io",
        }
    }
}

impl From<MapError> for ApiError {
    fn from(e: MapError) -> Self {
        match e {
            MapError::UnsupportedFormat(_) => Self::UnsupportedFormat(e),
            _ => Self::MalformedMap(e),
        }
    }
}

impl From<SimulationError> for ApiError {
    fn from(e: SimulationError) -> Self {
        Self::InvalidStart(e.to_string())
    }
}

impl From<PlanError> for ApiError {
    fn from(e: PlanError) -> Self {
        Self::SchemaValidation(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::StoreIo(source) => tracing::error!("Store error: {}", source),
            Self::NotFound(_) => tracing::debug!("Not found: {}", self),
            _ => tracing::warn!("Validation error: {}", self),
        }

        let body = ErrorBody {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
