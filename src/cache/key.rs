use std::fmt;

use url::Url;

use crate::platform::Category;

/// Digest identifying one (category, normalized URL) computation.
///
/// Stable across equivalent spellings of the same URL so that repeat and
/// concurrent requests coordinate on one cache slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(category: Category, url: &Url) -> Self {
        let digest = md5::compute(format!("{}:{}", category.as_str(), normalize(url)));
        Self(format!("{digest:x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical URL form: fragment dropped, query pairs sorted, trailing
/// slashes trimmed from non-root paths. Scheme and host arrive already
/// lowercased from URL parsing.
fn normalize(url: &Url) -> String {
    let mut out = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
    if let Some(port) = url.port() {
        out.push(':');
        out.push_str(&port.to_string());
    }

    let path = url.path();
    if path.len() > 1 {
        out.push_str(path.trim_end_matches('/'));
    } else {
        out.push_str(path);
    }

    if let Some(query) = url.query()
        && !query.is_empty()
    {
        let mut pairs: Vec<&str> = query.split('&').collect();
        pairs.sort_unstable();
        out.push('?');
        out.push_str(&pairs.join("&"));
    }

    out
}
