#![no_main]

use libfuzzer_sys::fuzz_target;

use waypoint::extractor::{MAX_TEXT_CHARS, extract};

fuzz_target!(|data: &[u8]| {
    let html = String::from_utf8_lossy(data);

    // The extractor must never panic and must honor its output cap,
    // whatever markup the origin serves.
    let text = extract(&html);
    assert!(text.chars().count() <= MAX_TEXT_CHARS);
});
