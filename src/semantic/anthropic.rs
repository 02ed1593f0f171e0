use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::platform::Category;
use crate::semantic::{ExtractionError, FieldExtractor, RawExtraction};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f64 = 0.1;

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

/// Field extractor backed by the Anthropic Messages API.
pub struct AnthropicExtractor {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl AnthropicExtractor {
    pub fn new(config: &Config) -> Result<Self, ExtractionError> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_deadline())
            .build()?;

        Ok(Self {
            client,
            api_key: config.anthropic_api_key().to_string(),
            model: config.extractor_model().to_string(),
            base_url: config.extractor_base_url().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FieldExtractor for AnthropicExtractor {
    #[instrument(skip_all, fields(category = %category, model = %self.model))]
    async fn extract_fields(
        &self,
        category: Category,
        text: &str,
    ) -> Result<RawExtraction, ExtractionError> {
        let prompt = match category {
            Category::Flight => flight_prompt(text),
            Category::Lodging => lodging_prompt(text),
        };

        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Http {
                status: status.as_u16(),
            });
        }

        let body: MessagesResponse = response.json().await?;
        let reply = body
            .content
            .first()
            .map(|block| block.text.as_str())
            .unwrap_or_default();

        let fields = sniff_json_object(reply)?;
        debug!(fields = fields.len(), "collaborator returned extraction");
        Ok(fields)
    }
}

/// Pull the outermost JSON object out of a reply that may wrap it in prose.
fn sniff_json_object(reply: &str) -> Result<RawExtraction, ExtractionError> {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        return Err(ExtractionError::MalformedResponse {
            reason: "no JSON object in reply".to_string(),
        });
    };
    if end < start {
        return Err(ExtractionError::MalformedResponse {
            reason: "no JSON object in reply".to_string(),
        });
    }

    let value: Value =
        serde_json::from_str(&reply[start..=end]).map_err(|e| ExtractionError::MalformedResponse {
            reason: e.to_string(),
        })?;

    match value {
        Value::Object(map) => Ok(RawExtraction::new(map)),
        _ => Err(ExtractionError::MalformedResponse {
            reason: "reply was not a JSON object".to_string(),
        }),
    }
}

fn flight_prompt(text: &str) -> String {
    format!(
        r#"You are a travel data extraction expert. Extract flight booking information from the following text and return it as a JSON object with these fields:

{{
    "origin_airport": "string (IATA code preferred, e.g. 'JFK', else the city name shown)",
    "destination_airport": "string (IATA code preferred, else the city name shown)",
    "duration_minutes": "integer (total flight time in minutes)",
    "total_cost": "number (total cost as a decimal, numeric value only)",
    "total_cost_per_person": "number (cost per traveler as a decimal)",
    "segment_count": "integer (number of flight segments, 1 for a nonstop flight)",
    "flight_number": "string (primary flight number, e.g. 'AF123')",
    "passenger_count": "integer (number of travelers the total cost covers)"
}}

Instructions:
- Include only fields whose values are clearly present in the text. Omit any field you cannot find; never invent values and never use placeholders such as "Unknown" or "N/A".
- Convert durations to minutes (e.g. "2h 30m" is 150).
- Costs are numeric values only, without currency symbols or separators.
- Return only the JSON object, no additional text or explanation.

Text to analyze:
{text}"#
    )
}

fn lodging_prompt(text: &str) -> String {
    format!(
        r#"You are a travel data extraction expert. Extract lodging booking information from the following text and return it as a JSON object with these fields:

{{
    "name": "string (hotel or property name)",
    "location": "string (city, country or full address)",
    "number_of_guests": "integer (number of guests the booking covers)",
    "total_cost": "number (total cost as a decimal, numeric value only)",
    "total_cost_per_person": "integer (cost per guest, rounded)",
    "number_of_nights": "integer (number of nights)",
    "check_in": "string (ISO date, include the time and offset when shown)",
    "check_out": "string (ISO date, include the time and offset when shown)"
}}

Instructions:
- Include only fields whose values are clearly present in the text. Omit any field you cannot find; never invent values and never use placeholders such as "Unknown" or "N/A".
- Dates use ISO format (YYYY-MM-DD, with a time component when the page shows one).
- Costs are numeric values only, without currency symbols or separators.
- Return only the JSON object, no additional text or explanation.

Text to analyze:
{text}"#
    )
}
