use std::fs;

use crate::extractor::{MAX_TEXT_CHARS, MIN_TEXT_CHARS, extract};

fn load_fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

#[test]
fn test_extract_flight_results() {
    let text = extract(&load_fixture("flight_results.html"));

    assert!(text.contains("Flights from Boston to San Francisco"));
    assert!(text.contains("United 523"));
    assert!(text.contains("Nonstop · 6h 30m"));
    assert!(text.contains("$450.00 round trip per traveler"));
    assert!(text.contains("Delta 1182"));
    assert!(text.contains("JetBlue 915"));

    // The fare-details table has low link density and survives
    assert!(text.contains("First checked bag"));

    // Chrome, scripts and promo furniture do not
    assert!(!text.contains("My trips"));
    assert!(!text.contains("We use cookies"));
    assert!(!text.contains("__SEARCH_STATE__"));
    assert!(!text.contains("Download our app"));
    assert!(!text.contains("Site map"));
    assert!(!text.contains("Update search"));
}

#[test]
fn test_extract_lodging_page() {
    let text = extract(&load_fixture("lodging_page.html"));

    assert!(text.contains("Harborview Suites"));
    assert!(text.contains("Check-in: Mar 1, 2024"));
    assert!(text.contains("Check-out: Mar 4, 2024"));
    assert!(text.contains("3 nights · 2 guests"));
    assert!(text.contains("Total: $450.00"));

    // Plain-text amenity lists are kept, link-only nav lists are not
    assert!(text.contains("Rooftop pool with river views"));
    assert!(!text.contains("Experiences"));

    assert!(!text.contains("newsletter"));
    assert!(!text.contains("Share on Facebook"));
    assert!(!text.contains("ld+json"));
}

#[test]
fn test_promo_wrapped_page_falls_back_to_raw_walk() {
    let text = extract(&load_fixture("promo_wrapped.html"));

    // Everything useful sits inside promo-classed containers, so the
    // stripped walk comes back nearly empty and the raw walk wins.
    assert!(text.chars().count() >= MIN_TEXT_CHARS);
    assert!(text.contains("$99 one way from New York"));
    assert!(text.contains("Barcelona in June"));
    assert!(text.contains("$780 round trip from Seattle"));

    // Raw mode still drops scripts
    assert!(!text.contains("experiments"));
}

#[test]
fn test_extract_caps_output_length() {
    let filler = "<p>Depart 08:15, arrive 11:40, fare $123.45 per traveler.</p>".repeat(600);
    let html = format!("<html><body><main>{filler}</main></body></html>");

    let text = extract(&html);
    assert_eq!(text.chars().count(), MAX_TEXT_CHARS);
}

#[test]
fn test_extract_handles_malformed_markup() {
    let html = "<html><body><p>Room rate $89.00<div>Two queen beds<p>No closing tags here";
    let text = extract(html);

    assert!(text.contains("Room rate $89.00"));
    assert!(text.contains("Two queen beds"));
}

#[test]
fn test_extract_empty_document() {
    assert!(extract("").is_empty());
    assert!(extract("<html><body></body></html>").is_empty());
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_extract_never_panics(html in ".*") {
            // Should never panic regardless of input
            let _ = extract(&html);
        }

        #[test]
        fn test_extract_respects_cap(html in ".*") {
            let text = extract(&html);
            assert!(text.chars().count() <= MAX_TEXT_CHARS);
        }
    }
}
