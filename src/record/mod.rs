mod coerce;
pub mod flight;
pub mod lodging;

pub use flight::FlightRecord;
pub use lodging::LodgingRecord;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ParseError;
use crate::platform::Category;
use crate::semantic::RawExtraction;

/// Canonical validated output of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum TravelRecord {
    Flight(FlightRecord),
    Lodging(LodgingRecord),
}

impl TravelRecord {
    pub fn category(&self) -> Category {
        match self {
            Self::Flight(_) => Category::Flight,
            Self::Lodging(_) => Category::Lodging,
        }
    }
}

/// Validate an untyped extraction into a canonical record.
///
/// Either every required field coerces and the whole record is returned, or
/// the transformation fails; partially populated records do not exist.
pub fn transform(category: Category, fields: &RawExtraction) -> Result<TravelRecord, ParseError> {
    if fields.is_empty() {
        return Err(ParseError::MissingData {
            reason: "extraction produced no fields".to_string(),
        });
    }

    match category {
        Category::Flight => FlightRecord::from_raw(fields).map(TravelRecord::Flight),
        Category::Lodging => LodgingRecord::from_raw(fields).map(TravelRecord::Lodging),
    }
}

fn required<'a>(fields: &'a RawExtraction, names: &[&str]) -> Result<&'a Value, ParseError> {
    coerce::present(fields.field(names)).ok_or_else(|| ParseError::missing(names[0]))
}

fn optional<'a>(fields: &'a RawExtraction, names: &[&str]) -> Option<&'a Value> {
    coerce::present(fields.field(names))
}
