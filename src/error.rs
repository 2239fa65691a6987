use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::issuing::IssuingError;
use crate::services::registrar::RegistrationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Issuing(#[from] IssuingError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

impl AppError {
    // Only the registration path carries the raw external error object;
    // check/cancel respond with the message alone.
    fn details(&self) -> Option<&serde_json::Value> {
        match self {
            AppError::Registration(RegistrationError::Issuing(err)) => err.details(),
            AppError::Registration(_) | AppError::Issuing(_) => None,
        }
    }

    // reqwest's StatusCode, not axum's: the two track different http versions.
    fn upstream_status(&self) -> Option<reqwest::StatusCode> {
        match self {
            AppError::Issuing(err)
            | AppError::Registration(RegistrationError::Issuing(err)) => err.status(),
            AppError::Registration(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(
            error = %self,
            upstream_status = ?self.upstream_status(),
            "Request failed"
        );

        // Every failure is a flat 500 in this API's contract; callers
        // pattern-match on the `error` string.
        let mut body = json!({ "error": self.to_string() });
        if let Some(details) = self.details() {
            body["details"] = details.clone();
        }

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
