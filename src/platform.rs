//! Table-driven platform classification.
//!
//! A URL is matched against a list of domain rules (exact host or any
//! subdomain of it) before any network I/O happens. Platform identity is a
//! plain data value carried on the `ParseTarget`, not a type hierarchy, so
//! embedders and tests can thread their own rule set through `PlatformTable`.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ParseError;

/// What kind of booking page the caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Flight,
    Lodging,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Flight => "flight",
            Category::Lodging => "lodging",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flight" | "flights" => Ok(Category::Flight),
            "lodging" | "hotel" | "stay" => Ok(Category::Lodging),
            other => Err(format!("unknown category '{other}'")),
        }
    }
}

/// Booking platforms we know how to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    GoogleFlights,
    Expedia,
    Kayak,
    Priceline,
    United,
    Delta,
    American,
    JetBlue,
    Lufthansa,
    AirFrance,
    Klm,
    BritishAirways,
    Airbnb,
    Booking,
    Hotels,
    Marriott,
    Hilton,
    Hyatt,
    Ihg,
    Vrbo,
    HomeAway,
    Agoda,
    Trivago,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::GoogleFlights => "google-flights",
            Platform::Expedia => "expedia",
            Platform::Kayak => "kayak",
            Platform::Priceline => "priceline",
            Platform::United => "united",
            Platform::Delta => "delta",
            Platform::American => "american",
            Platform::JetBlue => "jetblue",
            Platform::Lufthansa => "lufthansa",
            Platform::AirFrance => "air-france",
            Platform::Klm => "klm",
            Platform::BritishAirways => "british-airways",
            Platform::Airbnb => "airbnb",
            Platform::Booking => "booking",
            Platform::Hotels => "hotels",
            Platform::Marriott => "marriott",
            Platform::Hilton => "hilton",
            Platform::Hyatt => "hyatt",
            Platform::Ihg => "ihg",
            Platform::Vrbo => "vrbo",
            Platform::HomeAway => "homeaway",
            Platform::Agoda => "agoda",
            Platform::Trivago => "trivago",
        }
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable output of classification, consumed by the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct ParseTarget {
    pub url: Url,
    pub category: Category,
    pub platform: Platform,
}

impl ParseTarget {
    /// Host the fetch layer rate-limits on. Always present after
    /// classification.
    pub fn domain(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }
}

/// One row: a registrable domain, the platform behind it, and which
/// categories that platform can serve. Matches the host exactly or any
/// subdomain of it.
#[derive(Debug, Clone)]
pub struct PlatformRule {
    domain: String,
    platform: Platform,
    categories: Vec<Category>,
}

impl PlatformRule {
    pub fn new(domain: impl Into<String>, platform: Platform, categories: &[Category]) -> Self {
        Self {
            domain: domain.into().to_ascii_lowercase(),
            platform,
            categories: categories.to_vec(),
        }
    }

    fn matches(&self, host: &str) -> bool {
        host == self.domain || host.ends_with(&format!(".{}", self.domain))
    }
}

const FLIGHT: &[Category] = &[Category::Flight];
const LODGING: &[Category] = &[Category::Lodging];
const BOTH: &[Category] = &[Category::Flight, Category::Lodging];

const BUILTIN_RULES: &[(&str, Platform, &[Category])] = &[
    ("flights.google.com", Platform::GoogleFlights, FLIGHT),
    ("google.com", Platform::GoogleFlights, FLIGHT),
    ("expedia.com", Platform::Expedia, BOTH),
    ("kayak.com", Platform::Kayak, FLIGHT),
    ("priceline.com", Platform::Priceline, FLIGHT),
    ("united.com", Platform::United, FLIGHT),
    ("delta.com", Platform::Delta, FLIGHT),
    ("american.com", Platform::American, FLIGHT),
    ("jetblue.com", Platform::JetBlue, FLIGHT),
    ("lufthansa.com", Platform::Lufthansa, FLIGHT),
    ("airfrance.com", Platform::AirFrance, FLIGHT),
    ("klm.com", Platform::Klm, FLIGHT),
    ("british-airways.com", Platform::BritishAirways, FLIGHT),
    ("airbnb.com", Platform::Airbnb, LODGING),
    ("booking.com", Platform::Booking, LODGING),
    ("hotels.com", Platform::Hotels, LODGING),
    ("marriott.com", Platform::Marriott, LODGING),
    ("hilton.com", Platform::Hilton, LODGING),
    ("hyatt.com", Platform::Hyatt, LODGING),
    ("ihg.com", Platform::Ihg, LODGING),
    ("vrbo.com", Platform::Vrbo, LODGING),
    ("homeaway.com", Platform::HomeAway, LODGING),
    ("agoda.com", Platform::Agoda, LODGING),
    ("trivago.com", Platform::Trivago, LODGING),
];

/// The rule set one `Parser` classifies against.
#[derive(Debug, Clone)]
pub struct PlatformTable {
    rules: Vec<PlatformRule>,
}

impl PlatformTable {
    pub fn new(rules: Vec<PlatformRule>) -> Self {
        Self { rules }
    }

    /// Map a raw URL string to a `ParseTarget`, or reject it.
    ///
    /// Rejections happen strictly before any network I/O: malformed URLs,
    /// missing hosts and non-http(s) schemes are `InvalidUrl`; hosts outside
    /// the table (or platforms that do not serve the requested category) are
    /// `UnsupportedPlatform` carrying the raw host, never a guessed match.
    pub fn classify(&self, raw_url: &str, category: Category) -> Result<ParseTarget, ParseError> {
        let raw = raw_url.trim();
        let url = Url::parse(raw).map_err(|e| ParseError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ParseError::InvalidUrl {
                    url: raw.to_string(),
                    reason: format!("unsupported scheme '{other}'"),
                });
            }
        }

        let host = url
            .host_str()
            .ok_or_else(|| ParseError::InvalidUrl {
                url: raw.to_string(),
                reason: "missing host".to_string(),
            })?
            .to_ascii_lowercase();

        let rule = self
            .rules
            .iter()
            .find(|rule| rule.matches(&host))
            .ok_or_else(|| ParseError::UnsupportedPlatform { host: host.clone() })?;

        if !rule.categories.contains(&category) {
            return Err(ParseError::UnsupportedPlatform { host });
        }

        Ok(ParseTarget {
            url,
            category,
            platform: rule.platform,
        })
    }
}

impl Default for PlatformTable {
    fn default() -> Self {
        Self::new(
            BUILTIN_RULES
                .iter()
                .map(|(domain, platform, categories)| {
                    PlatformRule::new(*domain, *platform, categories)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_exact_and_subdomain() {
        let table = PlatformTable::default();

        let target = table
            .classify("https://kayak.com/flights/BOS-SFO", Category::Flight)
            .unwrap();
        assert_eq!(target.platform, Platform::Kayak);
        assert_eq!(target.category, Category::Flight);
        assert_eq!(target.domain(), "kayak.com");

        let target = table
            .classify("https://www.airbnb.com/rooms/1234", Category::Lodging)
            .unwrap();
        assert_eq!(target.platform, Platform::Airbnb);
        assert_eq!(target.domain(), "www.airbnb.com");

        let target = table
            .classify("https://flights.google.com/flights?q=bos", Category::Flight)
            .unwrap();
        assert_eq!(target.platform, Platform::GoogleFlights);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let table = PlatformTable::default();
        let target = table
            .classify("https://WWW.EXPEDIA.COM/Hotels", Category::Lodging)
            .unwrap();
        assert_eq!(target.platform, Platform::Expedia);
    }

    #[test]
    fn test_expedia_serves_both_categories() {
        let table = PlatformTable::default();
        assert!(
            table
                .classify("https://expedia.com/flights", Category::Flight)
                .is_ok()
        );
        assert!(
            table
                .classify("https://expedia.com/hotels", Category::Lodging)
                .is_ok()
        );
    }

    #[test]
    fn test_category_mismatch_is_unsupported() {
        let table = PlatformTable::default();
        let err = table
            .classify("https://delta.com/stays", Category::Lodging)
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedPlatform {
                host: "delta.com".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_host_carries_raw_host() {
        let table = PlatformTable::default();
        let err = table
            .classify("https://tickets.example-travel.io/deal", Category::Flight)
            .unwrap_err();
        assert_eq!(
            err,
            ParseError::UnsupportedPlatform {
                host: "tickets.example-travel.io".to_string()
            }
        );
    }

    #[test]
    fn test_suffix_match_requires_label_boundary() {
        let table = PlatformTable::default();
        // notexpedia.com must not match the expedia.com rule
        let err = table
            .classify("https://notexpedia.com/flights", Category::Flight)
            .unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn test_malformed_urls_are_invalid() {
        let table = PlatformTable::default();

        let err = table.classify("not a url at all", Category::Flight).unwrap_err();
        assert!(matches!(err, ParseError::InvalidUrl { .. }));

        let err = table
            .classify("ftp://expedia.com/flights", Category::Flight)
            .unwrap_err();
        assert!(matches!(err, ParseError::InvalidUrl { .. }));

        // scheme-only URL has no host
        let err = table.classify("http://", Category::Flight).unwrap_err();
        assert!(matches!(err, ParseError::InvalidUrl { .. }));
    }

    #[test]
    fn test_custom_rules_thread_through() {
        let table = PlatformTable::new(vec![PlatformRule::new(
            "127.0.0.1",
            Platform::Expedia,
            BOTH,
        )]);
        let target = table
            .classify("http://127.0.0.1:8080/flights/1", Category::Flight)
            .unwrap();
        assert_eq!(target.platform, Platform::Expedia);
        assert_eq!(target.domain(), "127.0.0.1");
    }

    #[test]
    fn test_category_parses_from_cli_strings() {
        assert_eq!("flight".parse::<Category>().unwrap(), Category::Flight);
        assert_eq!("LODGING".parse::<Category>().unwrap(), Category::Lodging);
        assert!("cruise".parse::<Category>().is_err());
    }
}
