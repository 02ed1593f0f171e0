use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use ego_tree::{NodeId, NodeRef};
use scraper::{Html, Node};

use crate::extractor::noise;

/// Elements that force a line break in the collected text.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "tr", "table", "br", "hr", "h1", "h2", "h3", "h4", "h5", "h6",
    "section", "article", "main",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WalkMode {
    /// Apply the full denylist and density filtering.
    Strip,
    /// Whole-page fallback: only non-visible tags are skipped.
    Raw,
}

static SPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());
static NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\n\s*").unwrap());

/// Walk every text node under the document root, skipping nodes with a
/// filtered ancestor.
pub(super) fn collect_text(
    document: &Html,
    mode: WalkMode,
    skip_containers: &HashSet<NodeId>,
) -> String {
    let mut out = String::new();

    for node in document.root_element().descendants() {
        match node.value() {
            Node::Element(element) => {
                if BLOCK_TAGS.contains(&element.name()) && !out.is_empty() {
                    out.push('\n');
                }
            }
            Node::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || should_skip(&node, mode, skip_containers) {
                    continue;
                }
                if !out.is_empty() && !out.ends_with('\n') {
                    out.push(' ');
                }
                out.push_str(trimmed);
            }
            _ => {}
        }
    }

    out
}

fn should_skip(node: &NodeRef<'_, Node>, mode: WalkMode, skip_containers: &HashSet<NodeId>) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if let Some(element) = parent.value().as_element() {
            let skip = match mode {
                WalkMode::Raw => noise::is_raw_skip_tag(element.name()),
                WalkMode::Strip => {
                    noise::is_noise_tag(element.name())
                        || noise::has_noise_marker(element)
                        || skip_containers.contains(&parent.id())
                }
            };
            if skip {
                return true;
            }
        }
        current = parent.parent();
    }
    false
}

pub(super) fn normalize_whitespace(text: &str) -> String {
    let spaced = SPACE_REGEX.replace_all(text.trim(), " ");
    NEWLINE_REGEX.replace_all(&spaced, "\n").to_string()
}

/// Cap at `max_chars` characters on a char boundary.
pub(super) fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((index, _)) = text.char_indices().nth(max_chars) {
        text.truncate(index);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_text_breaks_on_blocks() {
        let doc = Html::parse_document(
            "<html><body><p>BOS to SFO</p><p>$450.00</p><span>nonstop</span></body></html>",
        );
        let text = normalize_whitespace(&collect_text(&doc, WalkMode::Strip, &HashSet::new()));
        assert_eq!(text, "BOS to SFO\n$450.00 nonstop");
    }

    #[test]
    fn test_strip_mode_drops_script_and_nav() {
        let doc = Html::parse_document(
            r#"<html><body>
                <nav><a href="/">Home</a></nav>
                <script>var x = 1;</script>
                <p>United 523, departs 2024-06-01</p>
            </body></html>"#,
        );
        let text = normalize_whitespace(&collect_text(&doc, WalkMode::Strip, &HashSet::new()));
        assert_eq!(text, "United 523, departs 2024-06-01");
    }

    #[test]
    fn test_raw_mode_keeps_denylisted_regions() {
        let doc = Html::parse_document(
            r#"<html><body>
                <div class="promo-banner">Deal: $99 to Miami on 2024-05-02</div>
                <script>tracking();</script>
            </body></html>"#,
        );
        let stripped = collect_text(&doc, WalkMode::Strip, &HashSet::new());
        assert!(stripped.is_empty());

        let raw = normalize_whitespace(&collect_text(&doc, WalkMode::Raw, &HashSet::new()));
        assert!(raw.contains("$99 to Miami"));
        assert!(!raw.contains("tracking"));
    }

    #[test]
    fn test_normalize_whitespace_collapses_runs() {
        let text = "  Grand   Hotel \t Rome \n\n\n  $450.00  \n total ";
        assert_eq!(normalize_whitespace(text), "Grand Hotel Rome\n$450.00\ntotal");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "€€€€€".to_string();
        assert_eq!(truncate_chars(text.clone(), 3), "€€€");
        assert_eq!(truncate_chars(text.clone(), 5), "€€€€€");
        assert_eq!(truncate_chars(text, 9), "€€€€€");
    }
}
