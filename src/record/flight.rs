use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::record::{coerce, optional, required};
use crate::semantic::RawExtraction;

const ORIGIN: &[&str] = &["origin_airport", "origin", "departure_airport", "from_airport"];
const DESTINATION: &[&str] = &[
    "destination_airport",
    "destination",
    "arrival_airport",
    "to_airport",
];
const DURATION: &[&str] = &[
    "duration_minutes",
    "duration",
    "flight_time_minutes",
    "flight_duration",
];
const TOTAL_COST: &[&str] = &["total_cost", "total_price", "price", "cost"];
const PER_PERSON: &[&str] = &["total_cost_per_person", "cost_per_person", "price_per_person"];
const SEGMENTS: &[&str] = &["segment_count", "segment", "segments", "number_of_segments"];
const FLIGHT_NUMBER: &[&str] = &["flight_number", "flight_no", "flight"];
const PASSENGERS: &[&str] = &[
    "passenger_count",
    "passengers",
    "number_of_passengers",
    "travelers",
];

/// Canonical flight booking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    /// IATA code when resolvable, otherwise the stated location.
    pub origin_airport: String,
    pub destination_airport: String,
    pub duration_minutes: u32,
    pub total_cost: f64,
    pub total_cost_per_person: f64,
    pub segment_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flight_number: Option<String>,
}

impl FlightRecord {
    pub(super) fn from_raw(fields: &RawExtraction) -> Result<Self, ParseError> {
        let origin_airport = coerce::airport_code(&coerce::string(
            "origin_airport",
            required(fields, ORIGIN)?,
        )?);
        let destination_airport = coerce::airport_code(&coerce::string(
            "destination_airport",
            required(fields, DESTINATION)?,
        )?);
        let duration_minutes =
            coerce::duration_minutes("duration_minutes", required(fields, DURATION)?)?;
        let total_cost = coerce::money("total_cost", required(fields, TOTAL_COST)?)?;

        let passenger_count = optional(fields, PASSENGERS)
            .map(|value| coerce::count("passenger_count", value))
            .transpose()?
            .map(|count| count.max(1));

        let stated_per_person = optional(fields, PER_PERSON)
            .map(|value| coerce::money("total_cost_per_person", value))
            .transpose()?;

        // Derive the per-person cost unless it was stated outright. When both
        // a stated value and the inputs to derive one exist, they must agree.
        let total_cost_per_person = match (stated_per_person, passenger_count) {
            (Some(stated), Some(passengers)) => {
                let derived = total_cost / f64::from(passengers);
                if !coerce::within_tolerance(stated, derived) {
                    return Err(ParseError::MissingData {
                        reason: format!(
                            "total_cost_per_person {stated:.2} disagrees with {derived:.2} \
                             derived from total_cost and passenger count"
                        ),
                    });
                }
                stated
            }
            (Some(stated), None) => stated,
            (None, passengers) => total_cost / f64::from(passengers.unwrap_or(1)),
        };

        let segment_count = match optional(fields, SEGMENTS) {
            Some(value) => coerce::count("segment_count", value)?.max(1),
            None => 1,
        };

        let flight_number = optional(fields, FLIGHT_NUMBER)
            .map(|value| coerce::string("flight_number", value))
            .transpose()?
            .filter(|text| !text.is_empty());

        Ok(Self {
            origin_airport,
            destination_airport,
            duration_minutes,
            total_cost,
            total_cost_per_person,
            segment_count,
            flight_number,
        })
    }
}
