use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::record::{coerce, optional, required};
use crate::semantic::RawExtraction;

const NAME: &[&str] = &["name", "property_name", "hotel_name"];
const LOCATION: &[&str] = &["location", "address", "city"];
const GUESTS: &[&str] = &["number_of_guests", "guests", "guest_count"];
const TOTAL_COST: &[&str] = &["total_cost", "total_price", "price", "cost"];
const PER_PERSON: &[&str] = &["total_cost_per_person", "cost_per_person", "price_per_person"];
const NIGHTS: &[&str] = &["number_of_nights", "nights", "night_count"];
const CHECK_IN: &[&str] = &["check_in", "check_in_date", "checkin"];
const CHECK_OUT: &[&str] = &["check_out", "check_out_date", "checkout"];

const SECONDS_PER_DAY: i64 = 86_400;

/// Canonical lodging booking record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodgingRecord {
    pub name: String,
    pub location: String,
    pub number_of_guests: u32,
    pub total_cost: f64,
    pub total_cost_per_person: i64,
    pub number_of_nights: u32,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
}

impl LodgingRecord {
    pub(super) fn from_raw(fields: &RawExtraction) -> Result<Self, ParseError> {
        let name = coerce::string("name", required(fields, NAME)?)?;
        let location = coerce::string("location", required(fields, LOCATION)?)?;
        let total_cost = coerce::money("total_cost", required(fields, TOTAL_COST)?)?;
        let check_in = coerce::datetime_utc("check_in", required(fields, CHECK_IN)?)?;
        let check_out = coerce::datetime_utc("check_out", required(fields, CHECK_OUT)?)?;

        if check_in >= check_out {
            return Err(ParseError::MissingData {
                reason: "check_out does not fall after check_in".to_string(),
            });
        }

        let number_of_guests = match optional(fields, GUESTS) {
            Some(value) => coerce::count("number_of_guests", value)?.max(1),
            None => 1,
        };

        // Nights spanned, counting a partial final day as a full night.
        let stay_seconds = (check_out - check_in).num_seconds();
        let derived_nights = (stay_seconds as u64).div_ceil(SECONDS_PER_DAY as u64) as u32;

        let number_of_nights = match optional(fields, NIGHTS) {
            Some(value) => {
                let stated = coerce::count("number_of_nights", value)?;
                if stated != derived_nights {
                    return Err(ParseError::MissingData {
                        reason: format!(
                            "number_of_nights {stated} disagrees with {derived_nights} \
                             spanned by check_in and check_out"
                        ),
                    });
                }
                stated
            }
            None => derived_nights,
        };

        let stated_per_person = optional(fields, PER_PERSON)
            .map(|value| coerce::money("total_cost_per_person", value))
            .transpose()?;
        let derived_per_person = (total_cost / f64::from(number_of_guests)).round() as i64;

        let total_cost_per_person = match stated_per_person {
            Some(stated) => {
                let rounded = stated.round() as i64;
                if !coerce::within_tolerance(rounded as f64, derived_per_person as f64) {
                    return Err(ParseError::MissingData {
                        reason: format!(
                            "total_cost_per_person {rounded} disagrees with {derived_per_person} \
                             derived from total_cost and guest count"
                        ),
                    });
                }
                rounded
            }
            None => derived_per_person,
        };

        Ok(Self {
            name,
            location,
            number_of_guests,
            total_cost,
            total_cost_per_person,
            number_of_nights,
            check_in,
            check_out,
        })
    }
}
