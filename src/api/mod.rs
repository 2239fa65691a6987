// API module - HTTP endpoints

pub mod cards;
pub mod requirements;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::services::issuing::IssuingApi;

#[derive(Clone)]
pub struct AppState {
    pub issuing: Arc<dyn IssuingApi>,
    pub config: Config,
}

/// Builds the full application router. Shared with tests so they exercise
/// the same middleware stack the binary serves.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(cards::router())
        .merge(requirements::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
