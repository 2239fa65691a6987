use std::time::Duration;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::error::AppError;
use crate::services::registrar::{self, ReadinessPolicy};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/register-card", post(register_card))
        .route("/api/cancel-card", post(cancel_card))
}

#[derive(Debug, Deserialize)]
struct RegisterCardRequest {
    address: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterCardResponse {
    customer_id: String,
    card_token_id: String,
    card_type: &'static str,
    last4: String,
    exp_month: i64,
    exp_year: i64,
    status: String,
    unix_expiration: i64,
}

async fn register_card(
    State(state): State<AppState>,
    Json(body): Json<RegisterCardRequest>,
) -> Result<Json<RegisterCardResponse>, AppError> {
    let policy = ReadinessPolicy::new(
        state.config.readiness_max_attempts,
        Duration::from_millis(state.config.readiness_poll_ms),
    );

    let registered =
        registrar::register_card(state.issuing.as_ref(), &policy, &body.address).await?;

    tracing::info!(
        cardholder_id = %registered.cardholder_id,
        card_id = %registered.card_id,
        "Card registered"
    );

    Ok(Json(RegisterCardResponse {
        customer_id: registered.cardholder_id,
        card_token_id: registered.card_id,
        card_type: "virtual",
        last4: registered.last4,
        exp_month: registered.exp_month,
        exp_year: registered.exp_year,
        status: registered.status,
        unix_expiration: registered.unix_expiration,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelCardRequest {
    card_id: String,
}

async fn cancel_card(
    State(state): State<AppState>,
    Json(body): Json<CancelCardRequest>,
) -> Result<Json<Value>, AppError> {
    state
        .issuing
        .update_card_status(&body.card_id, "canceled")
        .await?;

    tracing::info!(card_id = %body.card_id, "Card canceled");

    Ok(Json(json!({ "success": true })))
}
