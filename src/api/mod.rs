mod error;
mod handlers;
pub mod middleware;

use std::sync::{Arc, RwLock};

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use cleanbot_core::models::Grid;
use cleanbot_core::store::HistoryStore;

pub use error::{ApiError, ErrorBody};
pub use handlers::{CleanResponse, SetMapResponse};
use middleware::SecurityConfig;

/// Default cap on the total unit steps of one plan.
pub const DEFAULT_MAX_TOTAL_STEPS: u64 = 100_000;

/// Shared state handed to every handler.
///
/// The current map is swapped wholesale by `/set-map`; a `/clean` run takes its
/// own `Arc` snapshot so a concurrent upload never changes a run in progress.
#[derive(Clone)]
pub struct AppState {
    pub history: HistoryStore,
    current_map: Arc<RwLock<Option<Arc<Grid>>>>,
    pub max_total_steps: u64,
    pub security: SecurityConfig,
}

impl AppState {
    pub fn new(history: HistoryStore) -> Self {
        Self {
            history,
            current_map: Arc::new(RwLock::new(None)),
            max_total_steps: DEFAULT_MAX_TOTAL_STEPS,
            security: SecurityConfig::disabled(),
        }
    }

    pub fn with_max_total_steps(mut self, max_total_steps: u64) -> Self {
        self.max_total_steps = max_total_steps;
        self
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn current_map(&self) -> Option<Arc<Grid>> {
        self.current_map
            .read()
            .expect("map lock poisoned")
            .clone()
    }

    pub fn set_map(&self, grid: Grid) -> Arc<Grid> {
        let grid = Arc::new(grid);
        *self.current_map.write().expect("map lock poisoned") = Some(grid.clone());
        grid
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.security);

    let api = Router::new()
        // Map
        .route("/set-map", post(handlers::set_map))
        .route("/map", get(handlers::get_map))
        // Cleaning
        .route("/clean", post(handlers::clean))
        // History
        .route("/history", get(handlers::get_history))
        .route("/history/{id}", get(handlers::get_session))
        .route_layer(axum::middleware::from_fn_with_state(
            state.security.clone(),
            middleware::auth_middleware,
        ));

    Router::new()
        .merge(api)
        // Health stays reachable without credentials
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let Some(origins) = &security.cors_origins else {
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
