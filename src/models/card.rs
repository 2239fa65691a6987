use serde::Deserialize;

/// A card as returned by the issuing API.
#[derive(Debug, Clone, Deserialize)]
pub struct Card {
    pub id: String,
    pub status: String,
    pub last4: String,
    pub exp_month: i64,
    pub exp_year: i64,
}
