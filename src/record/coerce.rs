use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::error::ParseError;

/// Strings the collaborator emits when it could not find a value.
const PLACEHOLDERS: &[&str] = &["", "unknown", "n/a", "na", "null", "none", "-"];

/// City and airport names worth resolving to an IATA code. Unlisted
/// locations pass through as best-effort strings.
const IATA_LOOKUP: &[(&str, &str)] = &[
    ("new york", "JFK"),
    ("los angeles", "LAX"),
    ("san francisco", "SFO"),
    ("chicago", "ORD"),
    ("boston", "BOS"),
    ("logan", "BOS"),
    ("miami", "MIA"),
    ("seattle", "SEA"),
    ("denver", "DEN"),
    ("atlanta", "ATL"),
    ("dallas", "DFW"),
    ("houston", "IAH"),
    ("las vegas", "LAS"),
    ("washington", "IAD"),
    ("london", "LHR"),
    ("heathrow", "LHR"),
    ("paris", "CDG"),
    ("tokyo", "NRT"),
    ("rome", "FCO"),
    ("madrid", "MAD"),
    ("barcelona", "BCN"),
    ("amsterdam", "AMS"),
    ("frankfurt", "FRA"),
    ("lisbon", "LIS"),
    ("dubai", "DXB"),
    ("singapore", "SIN"),
    ("sydney", "SYD"),
    ("toronto", "YYZ"),
];

static IATA_CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]{3}$").unwrap());

static DURATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:(\d+)\s*h(?:ours?|rs?)?)?\s*(?:(\d+)\s*m(?:in(?:ute)?s?)?)?\s*$")
        .unwrap()
});

/// Timestamp layouts accepted before falling back to date-only forms.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%B %e, %Y", "%b %e, %Y", "%e %B %Y"];

pub(super) fn is_placeholder(text: &str) -> bool {
    PLACEHOLDERS.contains(&text.trim().to_ascii_lowercase().as_str())
}

/// Collapse null and placeholder values into plain absence.
pub(super) fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        Some(Value::Null) => None,
        Some(Value::String(text)) if is_placeholder(text) => None,
        other => other,
    }
}

pub(super) fn string(field: &str, value: &Value) -> Result<String, ParseError> {
    match value {
        Value::String(text) => Ok(text.trim().to_string()),
        Value::Number(number) => Ok(number.to_string()),
        _ => Err(ParseError::parsing(field, "expected text")),
    }
}

/// Parse an amount of money, tolerating currency symbols, codes and
/// thousands separators.
pub(super) fn money(field: &str, value: &Value) -> Result<f64, ParseError> {
    let amount = match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| ParseError::parsing(field, "amount out of range"))?,
        Value::String(text) => {
            let cleaned: String = text
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned
                .parse::<f64>()
                .map_err(|_| ParseError::parsing(field, format!("'{text}' is not an amount")))?
        }
        _ => return Err(ParseError::parsing(field, "expected an amount")),
    };

    if amount.is_finite() && amount >= 0.0 {
        Ok(amount)
    } else {
        Err(ParseError::parsing(field, "amount must be non-negative"))
    }
}

/// Parse a non-negative integer count.
pub(super) fn count(field: &str, value: &Value) -> Result<u32, ParseError> {
    match value {
        Value::Number(number) => {
            if let Some(n) = number.as_u64() {
                u32::try_from(n).map_err(|_| ParseError::parsing(field, "count out of range"))
            } else if let Some(f) = number.as_f64()
                && f.fract() == 0.0
                && f >= 0.0
                && f <= f64::from(u32::MAX)
            {
                Ok(f as u32)
            } else {
                Err(ParseError::parsing(field, "expected a whole number"))
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<u32>()
            .map_err(|_| ParseError::parsing(field, format!("'{text}' is not a count"))),
        _ => Err(ParseError::parsing(field, "expected a count")),
    }
}

/// Parse a duration in minutes, either as a bare number or in the
/// "2h 30m" family of layouts.
pub(super) fn duration_minutes(field: &str, value: &Value) -> Result<u32, ParseError> {
    if let Value::String(text) = value {
        if let Ok(minutes) = text.trim().parse::<u32>() {
            return Ok(minutes);
        }
        if let Some(captures) = DURATION_REGEX.captures(text)
            && (captures.get(1).is_some() || captures.get(2).is_some())
        {
            let hours: u32 = captures
                .get(1)
                .map_or(Ok(0), |m| m.as_str().parse())
                .map_err(|_| ParseError::parsing(field, "hours out of range"))?;
            let minutes: u32 = captures
                .get(2)
                .map_or(Ok(0), |m| m.as_str().parse())
                .map_err(|_| ParseError::parsing(field, "minutes out of range"))?;
            return Ok(hours * 60 + minutes);
        }
        return Err(ParseError::parsing(
            field,
            format!("'{text}' is not a duration"),
        ));
    }
    count(field, value)
}

/// Parse a timestamp. Offsets are honored; naive values are taken as UTC.
pub(super) fn datetime_utc(field: &str, value: &Value) -> Result<DateTime<Utc>, ParseError> {
    let text = match value {
        Value::String(text) => text.trim(),
        _ => return Err(ParseError::parsing(field, "expected a date")),
    };

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&Utc));
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format)
            && let Some(naive) = date.and_hms_opt(0, 0, 0)
        {
            return Ok(naive.and_utc());
        }
    }

    Err(ParseError::parsing(
        field,
        format!("'{text}' is not a recognized date"),
    ))
}

/// Map a location to its IATA code where possible. Three-letter inputs are
/// taken as codes and uppercased; unknown names pass through untouched.
pub(super) fn airport_code(raw: &str) -> String {
    let trimmed = raw.trim();
    if IATA_CODE_REGEX.is_match(trimmed) {
        return trimmed.to_ascii_uppercase();
    }

    let lowered = trimmed.to_ascii_lowercase();
    for (name, code) in IATA_LOOKUP {
        if lowered.contains(name) {
            return (*code).to_string();
        }
    }

    trimmed.to_string()
}

/// Stated and derived amounts must agree within 1% of the derived value
/// (with a one-unit floor for small amounts).
pub(super) fn within_tolerance(stated: f64, derived: f64) -> bool {
    (stated - derived).abs() <= (derived.abs() * 0.01).max(1.0)
}
