//! Travel booking URL parser.
//!
//! Takes a booking URL plus a category (flight or lodging), fetches the page
//! politely, reduces it to plain text, asks an external field extractor for
//! the booking details and validates them into a canonical record.
//! Concurrent and repeated requests for the same URL are coordinated through
//! an in-memory singleflight cache.

pub mod cache;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod parser;
pub mod platform;
pub mod record;
pub mod semantic;

pub use error::{ParseError, Severity};
pub use parser::Parser;
pub use platform::Category;
pub use record::{FlightRecord, LodgingRecord, TravelRecord};
