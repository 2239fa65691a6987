use std::time::Duration;

use chrono::Utc;

use crate::services::issuing::{
    CreateCardParams, CreateCardholderParams, IssuingApi, IssuingError,
};

/// Per-authorization spending limit, in minor units.
pub const SPENDING_LIMIT_MINOR_UNITS: u64 = 5000;

pub const ALLOWED_CATEGORIES: [&str; 2] =
    ["ac_refrigeration_repair", "accounting_bookkeeping_services"];

/// Reported card validity window. Client-computed, not sourced from the
/// card's actual expiration date.
pub const CARD_VALIDITY_SECS: i64 = 3 * 365 * 24 * 60 * 60;

#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    #[error(transparent)]
    Issuing(#[from] IssuingError),

    #[error("Cardholder requirements not met: {0}")]
    RequirementsNotMet(String),
}

/// Bounds on the cardholder readiness poll that runs between cardholder
/// creation and card issuance.
#[derive(Debug, Clone)]
pub struct ReadinessPolicy {
    pub max_attempts: u32,
    pub poll_interval: Duration,
}

impl ReadinessPolicy {
    pub fn new(max_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            max_attempts,
            poll_interval,
        }
    }
}

/// Normalized result of a successful registration.
#[derive(Debug, Clone)]
pub struct RegisteredCard {
    pub cardholder_id: String,
    pub card_id: String,
    pub last4: String,
    pub exp_month: i64,
    pub exp_year: i64,
    pub status: String,
    pub unix_expiration: i64,
}

/// Builds the cardholder creation payload for an address. The email is the
/// only address-derived field; everything else is a sandbox-grade constant.
fn cardholder_params(address: &str) -> CreateCardholderParams {
    CreateCardholderParams {
        name: "Test User".to_string(),
        email: format!("{}@example.com", address),
        phone_number: "+18888675309".to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        terms_acceptance_date: Utc::now().timestamp(),
        terms_acceptance_ip: "127.0.0.1".to_string(),
        billing_line1: "123 Main Street".to_string(),
        billing_city: "San Francisco".to_string(),
        billing_state: "CA".to_string(),
        billing_postal_code: "94111".to_string(),
        billing_country: "US".to_string(),
    }
}

/// Registers a virtual card for an address.
///
/// Flow: create the cardholder, poll until its past-due requirements clear
/// (bounded by `policy`), then issue a virtual card with fixed spending
/// controls. Card issuance is never attempted before a requirements check
/// passes. If card creation fails after the cardholder exists, a best-effort
/// deactivation of the cardholder runs before the original error is returned.
#[tracing::instrument(skip(issuing, policy), fields(address = %address))]
pub async fn register_card(
    issuing: &dyn IssuingApi,
    policy: &ReadinessPolicy,
    address: &str,
) -> Result<RegisteredCard, RegistrationError> {
    let cardholder = issuing.create_cardholder(&cardholder_params(address)).await?;
    tracing::info!(cardholder_id = %cardholder.id, "Cardholder created");

    wait_until_ready(issuing, policy, &cardholder.id).await?;
    tracing::debug!(cardholder_id = %cardholder.id, "Cardholder requirements met");

    let card_params = CreateCardParams {
        cardholder_id: cardholder.id.clone(),
        spending_limit_amount: SPENDING_LIMIT_MINOR_UNITS,
        allowed_categories: ALLOWED_CATEGORIES.iter().map(|c| c.to_string()).collect(),
    };

    let card = match issuing.create_card(&card_params).await {
        Ok(card) => card,
        Err(err) => {
            tracing::warn!(
                cardholder_id = %cardholder.id,
                error = %err,
                "Card creation failed, deactivating cardholder"
            );
            if let Err(cleanup_err) = issuing.deactivate_cardholder(&cardholder.id).await {
                tracing::warn!(
                    cardholder_id = %cardholder.id,
                    error = %cleanup_err,
                    "Cardholder deactivation failed, resource left active upstream"
                );
            }
            return Err(err.into());
        }
    };

    tracing::info!(card_id = %card.id, last4 = %card.last4, "Virtual card created");

    Ok(RegisteredCard {
        cardholder_id: cardholder.id,
        card_id: card.id,
        last4: card.last4,
        exp_month: card.exp_month,
        exp_year: card.exp_year,
        status: card.status,
        unix_expiration: Utc::now().timestamp() + CARD_VALIDITY_SECS,
    })
}

/// Polls the cardholder until its past-due requirements list is empty.
/// Fails with the outstanding items after the final attempt.
async fn wait_until_ready(
    issuing: &dyn IssuingApi,
    policy: &ReadinessPolicy,
    cardholder_id: &str,
) -> Result<(), RegistrationError> {
    let attempts = policy.max_attempts.max(1);
    let mut outstanding = Vec::new();

    for attempt in 1..=attempts {
        if attempt > 1 {
            tokio::time::sleep(policy.poll_interval).await;
        }

        let cardholder = issuing.retrieve_cardholder(cardholder_id).await?;
        outstanding = cardholder.past_due();
        if outstanding.is_empty() {
            return Ok(());
        }

        tracing::debug!(
            attempt,
            outstanding = ?outstanding,
            "Cardholder has past-due requirements"
        );
    }

    Err(RegistrationError::RequirementsNotMet(outstanding.join(", ")))
}
