use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::AppState;
use crate::error::AppError;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/check-requirements/:card_holder_id",
        get(check_requirements),
    )
}

#[derive(Debug, Serialize)]
struct RequirementsResponse {
    status: String,
    // Echoed verbatim from upstream; {} when the resource omits the object.
    requirements: Map<String, Value>,
    metadata: Map<String, Value>,
}

/// Pure read: fetches the cardholder and echoes its verification state.
async fn check_requirements(
    State(state): State<AppState>,
    Path(card_holder_id): Path<String>,
) -> Result<Json<RequirementsResponse>, AppError> {
    let cardholder = state.issuing.retrieve_cardholder(&card_holder_id).await?;

    Ok(Json(RequirementsResponse {
        status: cardholder.status,
        requirements: cardholder.requirements.unwrap_or_default(),
        metadata: cardholder.metadata.unwrap_or_default(),
    }))
}
