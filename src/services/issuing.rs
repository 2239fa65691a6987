use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{card::Card, cardholder::Cardholder};

#[derive(thiserror::Error, Debug)]
pub enum IssuingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Message surfaced verbatim; callers pattern-match on it.
    #[error("{message}")]
    Api {
        status: StatusCode,
        message: String,
        raw: Value,
    },
}

impl IssuingError {
    /// The raw error object the external API returned, when there is one.
    pub fn details(&self) -> Option<&Value> {
        match self {
            IssuingError::Api { raw, .. } => Some(raw),
            IssuingError::Http(_) => None,
        }
    }

    /// The upstream HTTP status, when the failure got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            IssuingError::Api { status, .. } => Some(*status),
            IssuingError::Http(err) => err.status(),
        }
    }
}

/// Parameters for `POST /v1/issuing/cardholders`.
#[derive(Debug, Clone)]
pub struct CreateCardholderParams {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,
    pub terms_acceptance_date: i64,
    pub terms_acceptance_ip: String,
    pub billing_line1: String,
    pub billing_city: String,
    pub billing_state: String,
    pub billing_postal_code: String,
    pub billing_country: String,
}

impl CreateCardholderParams {
    /// Flattens into the API's bracket-keyed form encoding.
    fn to_form(&self) -> Vec<(String, String)> {
        vec![
            ("name".into(), self.name.clone()),
            ("email".into(), self.email.clone()),
            ("status".into(), "active".into()),
            ("type".into(), "individual".into()),
            ("individual[first_name]".into(), self.first_name.clone()),
            ("individual[last_name]".into(), self.last_name.clone()),
            (
                "individual[card_issuing][user_terms_acceptance][date]".into(),
                self.terms_acceptance_date.to_string(),
            ),
            (
                "individual[card_issuing][user_terms_acceptance][ip]".into(),
                self.terms_acceptance_ip.clone(),
            ),
            ("billing[address][line1]".into(), self.billing_line1.clone()),
            ("billing[address][city]".into(), self.billing_city.clone()),
            ("billing[address][state]".into(), self.billing_state.clone()),
            (
                "billing[address][postal_code]".into(),
                self.billing_postal_code.clone(),
            ),
            (
                "billing[address][country]".into(),
                self.billing_country.clone(),
            ),
            ("phone_number".into(), self.phone_number.clone()),
        ]
    }
}

/// Parameters for `POST /v1/issuing/cards`.
#[derive(Debug, Clone)]
pub struct CreateCardParams {
    pub cardholder_id: String,
    pub spending_limit_amount: u64,
    pub allowed_categories: Vec<String>,
}

impl CreateCardParams {
    fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("cardholder".into(), self.cardholder_id.clone()),
            ("currency".into(), "usd".into()),
            ("type".into(), "virtual".into()),
            ("status".into(), "active".into()),
            (
                "spending_controls[spending_limits][0][amount]".into(),
                self.spending_limit_amount.to_string(),
            ),
            (
                "spending_controls[spending_limits][0][interval]".into(),
                "per_authorization".into(),
            ),
        ];
        for (i, category) in self.allowed_categories.iter().enumerate() {
            form.push((
                format!("spending_controls[allowed_categories][{}]", i),
                category.clone(),
            ));
        }
        form
    }
}

/// Narrow interface over the external issuing API so handler logic can be
/// exercised against a fake implementation.
#[async_trait]
pub trait IssuingApi: Send + Sync {
    async fn create_cardholder(
        &self,
        params: &CreateCardholderParams,
    ) -> Result<Cardholder, IssuingError>;

    async fn retrieve_cardholder(&self, cardholder_id: &str) -> Result<Cardholder, IssuingError>;

    async fn create_card(&self, params: &CreateCardParams) -> Result<Card, IssuingError>;

    async fn update_card_status(&self, card_id: &str, status: &str)
        -> Result<Card, IssuingError>;

    async fn deactivate_cardholder(&self, cardholder_id: &str) -> Result<Cardholder, IssuingError>;
}

/// Production client for the Stripe Issuing API: Bearer auth, form-encoded
/// request bodies, JSON responses.
pub struct StripeClient {
    http: Client,
    base_url: String,
    secret_key: Secret<String>,
}

impl StripeClient {
    pub fn new(base_url: &str, secret_key: Secret<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key,
        }
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, IssuingError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(self.secret_key.expose_secret())
            .form(form)
            .send()
            .await?;

        decode(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, IssuingError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, IssuingError> {
    let status = response.status();

    if !status.is_success() {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        // Stripe wraps failures as {"error": {...}}; keep the inner object raw
        // so callers can pass it through as `details`.
        let raw = body.get("error").cloned().unwrap_or(body);
        let message = raw
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("issuing API returned HTTP {}", status));

        tracing::error!(status = %status, error = %message, "Issuing API request failed");
        return Err(IssuingError::Api {
            status,
            message,
            raw,
        });
    }

    Ok(response.json().await?)
}

#[async_trait]
impl IssuingApi for StripeClient {
    #[tracing::instrument(skip(self, params), fields(email = %params.email))]
    async fn create_cardholder(
        &self,
        params: &CreateCardholderParams,
    ) -> Result<Cardholder, IssuingError> {
        self.post_form("/v1/issuing/cardholders", &params.to_form())
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn retrieve_cardholder(&self, cardholder_id: &str) -> Result<Cardholder, IssuingError> {
        self.get(&format!("/v1/issuing/cardholders/{}", cardholder_id))
            .await
    }

    #[tracing::instrument(skip(self, params), fields(cardholder_id = %params.cardholder_id))]
    async fn create_card(&self, params: &CreateCardParams) -> Result<Card, IssuingError> {
        self.post_form("/v1/issuing/cards", &params.to_form()).await
    }

    #[tracing::instrument(skip(self))]
    async fn update_card_status(
        &self,
        card_id: &str,
        status: &str,
    ) -> Result<Card, IssuingError> {
        let form = vec![("status".to_string(), status.to_string())];
        self.post_form(&format!("/v1/issuing/cards/{}", card_id), &form)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn deactivate_cardholder(
        &self,
        cardholder_id: &str,
    ) -> Result<Cardholder, IssuingError> {
        let form = vec![("status".to_string(), "inactive".to_string())];
        self.post_form(&format!("/v1/issuing/cardholders/{}", cardholder_id), &form)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cardholder_params_use_bracket_keys() {
        let params = CreateCardholderParams {
            name: "Test User".into(),
            email: "addr@example.com".into(),
            phone_number: "+18888675309".into(),
            first_name: "Test".into(),
            last_name: "User".into(),
            terms_acceptance_date: 1700000000,
            terms_acceptance_ip: "127.0.0.1".into(),
            billing_line1: "123 Main Street".into(),
            billing_city: "San Francisco".into(),
            billing_state: "CA".into(),
            billing_postal_code: "94111".into(),
            billing_country: "US".into(),
        };

        let form = params.to_form();
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("type"), Some("individual"));
        assert_eq!(get("individual[first_name]"), Some("Test"));
        assert_eq!(
            get("individual[card_issuing][user_terms_acceptance][ip]"),
            Some("127.0.0.1")
        );
        assert_eq!(get("billing[address][postal_code]"), Some("94111"));
    }

    #[test]
    fn api_error_exposes_upstream_status() {
        let err = IssuingError::Api {
            status: StatusCode::PAYMENT_REQUIRED,
            message: "insufficient funds".to_string(),
            raw: Value::Null,
        };
        assert_eq!(err.status(), Some(StatusCode::PAYMENT_REQUIRED));
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[test]
    fn card_params_index_allowed_categories() {
        let params = CreateCardParams {
            cardholder_id: "ich_1".into(),
            spending_limit_amount: 5000,
            allowed_categories: vec![
                "ac_refrigeration_repair".into(),
                "accounting_bookkeeping_services".into(),
            ],
        };

        let form = params.to_form();
        assert!(form.contains(&(
            "spending_controls[spending_limits][0][amount]".into(),
            "5000".into()
        )));
        assert!(form.contains(&(
            "spending_controls[allowed_categories][1]".into(),
            "accounting_bookkeeping_services".into()
        )));
    }
}
