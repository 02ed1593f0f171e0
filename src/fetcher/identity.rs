use rand::Rng;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};

/// One outbound browser profile: the header set a fetch attempt presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    user_agent: &'static str,
    accept_language: &'static str,
}

impl Identity {
    pub fn user_agent(&self) -> &'static str {
        self.user_agent
    }

    /// Request headers for this identity. Accept-Encoding is left to the
    /// client's compression features.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_static(self.user_agent),
        );
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(self.accept_language),
        );
        headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
        headers.insert(
            HeaderName::from_static("upgrade-insecure-requests"),
            HeaderValue::from_static("1"),
        );
        headers
    }
}

const PROFILES: &[Identity] = &[
    Identity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
    },
    Identity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
    },
    Identity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
    },
    Identity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
        accept_language: "en-US,en;q=0.9",
    },
    Identity {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:120.0) Gecko/20100101 Firefox/120.0",
        accept_language: "en-US,en;q=0.5",
    },
    Identity {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:120.0) Gecko/20100101 Firefox/120.0",
        accept_language: "en-US,en;q=0.5",
    },
    Identity {
        user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        accept_language: "en-US,en;q=0.9",
    },
    Identity {
        user_agent: "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0",
        accept_language: "en-US,en;q=0.5",
    },
];

/// Rotation policy: every attempt draws a random identity; after a blocking
/// signal (403/429) the next attempt to that domain must draw a different
/// one.
#[derive(Debug, Clone, Default)]
pub struct IdentityPool;

impl IdentityPool {
    pub fn new() -> Self {
        Self
    }

    pub fn len(&self) -> usize {
        PROFILES.len()
    }

    pub fn is_empty(&self) -> bool {
        PROFILES.is_empty()
    }

    pub fn get(&self, index: usize) -> &'static Identity {
        &PROFILES[index % PROFILES.len()]
    }

    /// Pick an identity index, never returning `avoid` while more than one
    /// profile exists.
    pub fn draw(&self, avoid: Option<usize>) -> usize {
        let mut rng = rand::thread_rng();
        loop {
            let index = rng.gen_range(0..PROFILES.len());
            if PROFILES.len() == 1 || Some(index) != avoid {
                return index;
            }
        }
    }
}
