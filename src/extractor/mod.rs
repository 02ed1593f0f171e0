pub mod noise;
pub mod text;

#[cfg(test)]
mod tests;

use scraper::Html;

use text::WalkMode;

/// Upper bound on extracted text, in characters.
pub const MAX_TEXT_CHARS: usize = 20_000;

/// Below this the stripped walk likely removed the page content itself
/// (booking pages hide fares inside promo-styled containers often enough).
pub const MIN_TEXT_CHARS: usize = 250;

/// Reduce a fetched HTML page to the plain text a field extractor can work
/// with.
pub fn extract(markup: &str) -> String {
    let document = Html::parse_document(markup);

    // 1. Mark link-heavy list/table containers for removal
    let skip_containers = noise::link_heavy_containers(&document);

    // 2. Collect text with the full denylist applied
    let stripped = text::normalize_whitespace(&text::collect_text(
        &document,
        WalkMode::Strip,
        &skip_containers,
    ));

    // 3. Fall back to a raw walk when stripping ate the page
    let content = if stripped.chars().count() < MIN_TEXT_CHARS {
        let raw = text::normalize_whitespace(&text::collect_text(
            &document,
            WalkMode::Raw,
            &skip_containers,
        ));
        if raw.chars().count() > stripped.chars().count() {
            raw
        } else {
            stripped
        }
    } else {
        stripped
    };

    // 4. Cap the result
    text::truncate_chars(content, MAX_TEXT_CHARS)
}
