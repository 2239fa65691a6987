use secrecy::Secret;
use serde::Deserialize;

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,

    // Stripe Issuing API
    pub stripe_secret_key: Secret<String>,
    pub stripe_api_url: String,

    // Cardholder readiness poll (replaces a fixed post-create delay)
    pub readiness_max_attempts: u32,
    pub readiness_poll_ms: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        Ok(Self {
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port").unwrap_or(5000),

            stripe_secret_key: Secret::new(config.get("stripe_secret_key")?),
            stripe_api_url: config
                .get("stripe_api_url")
                .unwrap_or_else(|_| DEFAULT_STRIPE_API_URL.to_string()),

            readiness_max_attempts: config.get("readiness_max_attempts").unwrap_or(5),
            readiness_poll_ms: config.get("readiness_poll_ms").unwrap_or(500),
        })
    }
}
