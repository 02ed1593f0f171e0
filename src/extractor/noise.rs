use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use ego_tree::NodeId;
use scraper::node::Element;
use scraper::{Html, Selector};

/// Tags whose subtrees never carry booking data.
pub(super) const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "iframe", "form", "button", "select",
    "option", "label", "input", "nav", "header", "footer", "aside",
];

/// Tags skipped even in raw fallback mode.
pub(super) const RAW_SKIP_TAGS: &[&str] = &["script", "style", "noscript", "template"];

static NOISE_KEYWORD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(ad|ads|advert|advertisement|banner|promo|sponsor|sponsored|cookie|consent|gdpr|popup|modal|overlay|newsletter|subscribe|signup|login|social|share|nav|navbar|navigation|menu|footer|header|sidebar|breadcrumb|breadcrumbs|tracking|analytics)\b",
    )
    .unwrap()
});

static LINK_CONTAINER_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("ul, ol, table").unwrap());

static ANCHOR_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Fraction of a container's visible text inside anchors above which the
/// container is treated as navigation chrome.
const MAX_LINK_DENSITY: f64 = 0.6;

pub(super) fn is_noise_tag(name: &str) -> bool {
    NOISE_TAGS.contains(&name)
}

pub(super) fn is_raw_skip_tag(name: &str) -> bool {
    RAW_SKIP_TAGS.contains(&name)
}

/// Class/id keyword denylist. Attribute tokens are usually dash separated;
/// underscores are normalized so `top_nav` matches like `top-nav`.
pub(super) fn has_noise_marker(element: &Element) -> bool {
    for attr in ["class", "id"] {
        if let Some(value) = element.attr(attr) {
            let normalized = value.replace('_', "-");
            if NOISE_KEYWORD_REGEX.is_match(&normalized) {
                return true;
            }
        }
    }
    false
}

/// Pre-pass marking list/table containers whose text is mostly link labels.
/// Price tables keep their unlinked fare text, so they stay below the
/// threshold; nav menus and footer link farms go over it.
pub(super) fn link_heavy_containers(document: &Html) -> HashSet<NodeId> {
    let mut marked = HashSet::new();

    for container in document.select(&LINK_CONTAINER_SELECTOR) {
        let total: usize = container.text().map(|t| t.trim().len()).sum();
        if total == 0 {
            continue;
        }
        let linked: usize = container
            .select(&ANCHOR_SELECTOR)
            .map(|a| a.text().map(|t| t.trim().len()).sum::<usize>())
            .sum();

        if linked as f64 / total as f64 > MAX_LINK_DENSITY {
            marked.insert(container.id());
        }
    }

    marked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element_of(html: &str) -> Html {
        Html::parse_fragment(html)
    }

    #[test]
    fn test_noise_markers_on_class_and_id() {
        let doc = element_of(r#"<div class="cookie-consent">ok</div>"#);
        let el = doc
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        assert!(has_noise_marker(el.value()));

        let doc = element_of(r#"<div id="top_nav">ok</div>"#);
        let el = doc
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        assert!(has_noise_marker(el.value()));

        let doc = element_of(r#"<div class="fare-summary">ok</div>"#);
        let el = doc
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        assert!(!has_noise_marker(el.value()));
    }

    #[test]
    fn test_keyword_requires_token_boundary() {
        // "gradient" and "shadow" must not trip the "ad" keyword
        let doc = element_of(r#"<div class="gradient shadow">ok</div>"#);
        let el = doc
            .select(&Selector::parse("div").unwrap())
            .next()
            .unwrap();
        assert!(!has_noise_marker(el.value()));
    }

    #[test]
    fn test_link_heavy_list_is_marked() {
        let doc = Html::parse_document(
            r#"<html><body>
            <ul><li><a href="/a">Flights</a></li><li><a href="/b">Hotels</a></li>
                <li><a href="/c">Cars</a></li></ul>
            <table><tr><td>Departure 9:40 AM</td><td>$450.00</td><td><a href="/buy">View</a></td></tr></table>
            </body></html>"#,
        );
        let marked = link_heavy_containers(&doc);
        assert_eq!(marked.len(), 1, "only the all-link menu should be marked");
    }
}
