pub mod anthropic;

pub use anthropic::AnthropicExtractor;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::platform::Category;

/// Untyped field mapping returned by the extraction collaborator.
///
/// Values arrive as whatever JSON the collaborator produced. Nothing here is
/// trusted; the record transformer validates and coerces every field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExtraction(Map<String, Value>);

impl RawExtraction {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Look a field up under its canonical name first, then its aliases.
    pub fn field(&self, names: &[&str]) -> Option<&Value> {
        names.iter().find_map(|name| self.0.get(*name))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Map<String, Value>> for RawExtraction {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("extraction request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("extraction service returned status {status}")]
    Http { status: u16 },

    #[error("extraction response was not usable: {reason}")]
    MalformedResponse { reason: String },
}

/// Boundary to the external field-extraction collaborator.
///
/// The pipeline only depends on this trait; production wires in
/// [`AnthropicExtractor`], tests substitute their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Pull category-specific booking fields out of page text.
    async fn extract_fields(
        &self,
        category: Category,
        text: &str,
    ) -> Result<RawExtraction, ExtractionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawExtraction {
        match value {
            Value::Object(map) => RawExtraction::new(map),
            _ => panic!("fixture must be a JSON object"),
        }
    }

    #[test]
    fn test_field_prefers_canonical_name() {
        let fields = raw(json!({
            "duration_minutes": 390,
            "duration": 9999,
        }));

        assert_eq!(
            fields.field(&["duration_minutes", "duration"]),
            Some(&json!(390))
        );
    }

    #[test]
    fn test_field_falls_back_to_alias() {
        let fields = raw(json!({ "segment": 2 }));

        assert_eq!(fields.field(&["segment_count", "segment"]), Some(&json!(2)));
        assert_eq!(fields.field(&["flight_number"]), None);
    }

    #[test]
    fn test_empty_mapping() {
        let fields = RawExtraction::default();
        assert!(fields.is_empty());
        assert_eq!(fields.len(), 0);
    }
}
