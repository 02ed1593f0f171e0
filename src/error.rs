use thiserror::Error;

/// Failure class the front door maps to a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller mistake (bad URL, unknown platform). Maps to 400.
    Client,
    /// Throttled by us or by the origin. Maps to 429.
    Throttled,
    /// Everything else. Maps to 500.
    Server,
}

impl Severity {
    pub fn status_hint(&self) -> u16 {
        match self {
            Self::Client => 400,
            Self::Throttled => 429,
            Self::Server => 500,
        }
    }
}

/// Terminal pipeline errors surfaced to the caller.
///
/// Clone-able on purpose: a failed computation fans out to every caller
/// waiting on the same in-flight parse.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported platform: {host}")]
    UnsupportedPlatform { host: String },

    #[error("unreachable: {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("deadline exceeded while parsing {url}")]
    Timeout { url: String },

    #[error("rate limited by {domain}, retry after {retry_after_secs}s")]
    RateLimited { domain: String, retry_after_secs: u64 },

    #[error("could not parse field '{field}': {reason}")]
    ParsingFailed { field: String, reason: String },

    #[error("missing required data: {reason}")]
    MissingData { reason: String },

    #[error("extraction service error: {reason}")]
    ExternalService { reason: String },
}

impl ParseError {
    pub fn severity(&self) -> Severity {
        match self {
            Self::InvalidUrl { .. } | Self::UnsupportedPlatform { .. } => Severity::Client,
            Self::RateLimited { .. } => Severity::Throttled,
            Self::Unreachable { .. }
            | Self::Timeout { .. }
            | Self::ParsingFailed { .. }
            | Self::MissingData { .. }
            | Self::ExternalService { .. } => Severity::Server,
        }
    }

    pub fn missing(field: &str) -> Self {
        Self::MissingData {
            reason: format!("field '{field}' absent or empty"),
        }
    }

    pub fn parsing(field: &str, reason: impl Into<String>) -> Self {
        Self::ParsingFailed {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
