use thiserror::Error;
use url::Url;

use crate::error::ParseError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("dns failure: {0}")]
    Dns(String),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("connect timeout")]
    ConnectTimeout,

    #[error("request timeout")]
    RequestTimeout,

    #[error("too many redirects")]
    RedirectLoop,

    #[error("http error {status}")]
    Http {
        status: reqwest::StatusCode,
        retriable: bool,
    },

    #[error("rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("blocked by origin ({status})")]
    Blocked { status: reqwest::StatusCode },

    #[error("origin served a bot-challenge page")]
    BlockPage,

    #[error("domain request budget exhausted (retry after {retry_after_secs}s)")]
    AdmissionDenied { retry_after_secs: u64 },

    #[error("overall deadline exceeded")]
    DeadlineExceeded,

    #[error("body too large ({0} bytes)")]
    BodyTooLarge(u64),

    #[error("unsupported content-type: {0}")]
    UnsupportedContentType(String),

    #[error("charset error: {0}")]
    Charset(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("unknown: {0}")]
    Unknown(String),
}

impl FetchError {
    pub fn should_retry(&self) -> bool {
        match self {
            // Fatal errors - don't retry
            Self::InvalidUrl(_) => false,
            Self::BodyTooLarge(_) => false,
            Self::UnsupportedContentType(_) => false,
            Self::Charset(_) => false,
            Self::BlockPage => false,
            Self::AdmissionDenied { .. } => false,
            Self::DeadlineExceeded => false,
            Self::Http { retriable, .. } => *retriable,

            // Temporary errors - retry (blocks retry only with a fresh identity)
            Self::RateLimited { .. } => true,
            Self::Blocked { .. } => true,
            Self::Dns(_) => true,
            Self::Tls(_) => true,
            Self::ConnectTimeout => true,
            Self::RequestTimeout => true,
            Self::RedirectLoop => true,
            Self::Io(_) => true,
            Self::Unknown(_) => true,
        }
    }

    /// Whether the origin explicitly pushed back (403/429). The next attempt
    /// to the same domain must not reuse the identity that triggered it.
    pub fn is_blocking_signal(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Blocked { .. })
    }

    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            if err.is_connect() {
                Self::ConnectTimeout
            } else {
                Self::RequestTimeout
            }
        } else if err.is_redirect() {
            Self::RedirectLoop
        } else if let Some(status) = err.status() {
            Self::Http {
                status,
                retriable: status.is_server_error(),
            }
        } else if err.is_request() {
            // DNS, connection errors
            Self::Dns(err.to_string())
        } else {
            Self::Unknown(err.to_string())
        }
    }

    /// Collapse into the caller-facing taxonomy once retries are spent.
    ///
    /// Per-attempt timeouts run on whatever time remains until the overall
    /// deadline, so they surface as Timeout; blocking and budget exhaustion
    /// surface as RateLimited; everything else is Unreachable with the
    /// underlying cause in the message.
    pub fn into_parse_error(self, url: &Url) -> ParseError {
        let domain = url.host_str().unwrap_or_default().to_string();
        match self {
            Self::InvalidUrl(e) => ParseError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            },
            Self::RateLimited { retry_after } => ParseError::RateLimited {
                domain,
                retry_after_secs: retry_after.unwrap_or(60),
            },
            Self::AdmissionDenied { retry_after_secs } => ParseError::RateLimited {
                domain,
                retry_after_secs,
            },
            Self::DeadlineExceeded | Self::ConnectTimeout | Self::RequestTimeout => {
                ParseError::Timeout {
                    url: url.to_string(),
                }
            }
            other => ParseError::Unreachable {
                url: url.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
