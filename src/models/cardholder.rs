use serde::Deserialize;
use serde_json::{Map, Value};

/// A cardholder as returned by the issuing API. Owned entirely by the
/// external service; never persisted locally.
///
/// `requirements` and `metadata` are kept as raw JSON objects so the
/// check-requirements endpoint echoes them verbatim, key for key.
#[derive(Debug, Clone, Deserialize)]
pub struct Cardholder {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub requirements: Option<Map<String, Value>>,
    #[serde(default)]
    pub metadata: Option<Map<String, Value>>,
}

impl Cardholder {
    /// Outstanding past-due requirement items, empty when the cardholder
    /// is ready for card issuance.
    pub fn past_due(&self) -> Vec<String> {
        self.requirements
            .as_ref()
            .and_then(|r| r.get("past_due"))
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_requirements_serialize_as_empty_object() {
        let cardholder: Cardholder =
            serde_json::from_str(r#"{"id": "ich_1", "status": "active"}"#).unwrap();

        assert!(cardholder.past_due().is_empty());

        let requirements = cardholder.requirements.unwrap_or_default();
        assert_eq!(serde_json::to_value(&requirements).unwrap(), serde_json::json!({}));
    }

    #[test]
    fn requirements_echo_preserves_empty_past_due() {
        let upstream = serde_json::json!({
            "past_due": [],
            "disabled_reason": null
        });
        let cardholder: Cardholder = serde_json::from_value(serde_json::json!({
            "id": "ich_1",
            "status": "active",
            "requirements": upstream
        }))
        .unwrap();

        assert!(cardholder.past_due().is_empty());

        let echoed = serde_json::to_value(cardholder.requirements.unwrap()).unwrap();
        assert_eq!(echoed, upstream);
    }

    #[test]
    fn unknown_requirement_fields_round_trip() {
        let cardholder: Cardholder = serde_json::from_str(
            r#"{
                "id": "ich_1",
                "status": "active",
                "requirements": {
                    "past_due": ["individual.verification.document"],
                    "disabled_reason": "requirements.past_due"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(cardholder.past_due(), ["individual.verification.document"]);

        let value = serde_json::to_value(cardholder.requirements.unwrap()).unwrap();
        assert_eq!(value["past_due"], serde_json::json!(["individual.verification.document"]));
        assert_eq!(value["disabled_reason"], "requirements.past_due");
    }
}
