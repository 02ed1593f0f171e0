use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use waypoint::platform::{Category, Platform, PlatformRule, PlatformTable};
use waypoint::semantic::{ExtractionError, FieldExtractor, RawExtraction};

/// Field-extraction double: returns one canned payload (or a canned
/// failure) and counts how many times the pipeline reached it.
pub struct StubExtractor {
    fields: Map<String, Value>,
    fail_status: Option<u16>,
    calls: AtomicUsize,
}

impl StubExtractor {
    pub fn returning(payload: Value) -> Self {
        let Value::Object(fields) = payload else {
            panic!("stub payload must be a JSON object");
        };
        Self {
            fields,
            fail_status: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Payload shaped like a typical flight-results extraction, with the
    /// kinds of values the collaborator actually produces: formatted money,
    /// a spelled-out duration, and a passenger count to derive from.
    pub fn flight() -> Self {
        Self::returning(json!({
            "origin": "Boston Logan",
            "destination": "SFO",
            "duration": "6h 30m",
            "total_cost": "$1,350.00",
            "passengers": 3,
            "flight_number": "UA 523",
        }))
    }

    pub fn lodging() -> Self {
        Self::returning(json!({
            "name": "Harborview Suites",
            "location": "Lisbon, Portugal",
            "number_of_guests": 2,
            "total_cost": "$450.00",
            "number_of_nights": 3,
            "check_in": "2024-03-01",
            "check_out": "2024-03-04",
        }))
    }

    /// Every call fails as if the extraction service returned `status`.
    pub fn failing(status: u16) -> Self {
        Self {
            fields: Map::new(),
            fail_status: Some(status),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FieldExtractor for StubExtractor {
    async fn extract_fields(
        &self,
        _category: Category,
        _text: &str,
    ) -> Result<RawExtraction, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_status {
            Some(status) => Err(ExtractionError::Http { status }),
            None => Ok(RawExtraction::new(self.fields.clone())),
        }
    }
}

/// Rule table admitting the local mock server as a known platform.
pub fn local_table() -> PlatformTable {
    PlatformTable::new(vec![PlatformRule::new(
        "127.0.0.1",
        Platform::Expedia,
        &[Category::Flight, Category::Lodging],
    )])
}

/// Realistic booking page shell around `summary`, with the navigation and
/// footer chrome a real results page carries.
pub fn booking_page(summary: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <title>Your itinerary</title>
  <script>window.__STATE__ = {{"session": "abc123"}};</script>
</head>
<body>
  <nav class="site-nav">
    <ul>
      <li><a href="/">Home</a></li>
      <li><a href="/trips">My trips</a></li>
      <li><a href="/account">Account</a></li>
    </ul>
  </nav>
  <main>
    <h1>Booking summary</h1>
    <p>{summary}</p>
    <p>Fares include all mandatory taxes and carrier-imposed surcharges.
       Baggage allowances and change policies vary by fare class; review the
       conditions attached to this itinerary before completing checkout.
       Prices are quoted in US dollars and remain valid while seats or rooms
       at this rate are available.</p>
  </main>
  <footer>
    <p>Terms of service. Privacy policy. Site map.</p>
  </footer>
</body>
</html>"#
    )
}
