//! Configuration handling for the parser.
//!
//! All knobs are plain environment variables read once at startup via
//! `Config::from_env`; there is no hot reload. Embedders and tests that want
//! a specific shape build on `Config::default()` with the `with_*` setters
//! instead of touching the process environment.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable names. Keeping them public lets tests and embedding
/// applications refer to them directly.
pub const ENV_REQUEST_DEADLINE_SECS: &str = "REQUEST_DEADLINE_SECS";
pub const ENV_FETCH_MAX_ATTEMPTS: &str = "FETCH_MAX_ATTEMPTS";
pub const ENV_FETCH_BACKOFF_BASE_MS: &str = "FETCH_BACKOFF_BASE_MS";
pub const ENV_DOMAIN_RATE_PER_MINUTE: &str = "DOMAIN_RATE_PER_MINUTE";
pub const ENV_CACHE_TTL_SECS: &str = "CACHE_TTL_SECS";
pub const ENV_CACHE_MAX_ENTRIES: &str = "CACHE_MAX_ENTRIES";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_EXTRACTOR_MODEL: &str = "EXTRACTOR_MODEL";
pub const ENV_EXTRACTOR_BASE_URL: &str = "EXTRACTOR_BASE_URL";

/// Defaults used when environment variables are absent.
const DEFAULT_REQUEST_DEADLINE_SECS: u64 = 45;
const DEFAULT_FETCH_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_FETCH_BACKOFF_BASE_MS: u64 = 500;
const DEFAULT_DOMAIN_RATE_PER_MINUTE: u32 = 60;
const DEFAULT_CACHE_TTL_SECS: u64 = 3600;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 1000;
const DEFAULT_EXTRACTOR_MODEL: &str = "claude-3-5-sonnet-20241022";
const DEFAULT_EXTRACTOR_BASE_URL: &str = "https://api.anthropic.com";

/// Runtime configuration for one `Parser` instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    request_deadline_secs: u64,
    fetch_max_attempts: u32,
    fetch_backoff_base_ms: u64,
    domain_rate_per_minute: u32,
    cache_ttl_secs: u64,
    cache_max_entries: usize,
    anthropic_api_key: String,
    extractor_model: String,
    extractor_base_url: String,
}

impl Config {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cfg = Self {
            request_deadline_secs: env_parse(
                ENV_REQUEST_DEADLINE_SECS,
                DEFAULT_REQUEST_DEADLINE_SECS,
            )?,
            fetch_max_attempts: env_parse(ENV_FETCH_MAX_ATTEMPTS, DEFAULT_FETCH_MAX_ATTEMPTS)?,
            fetch_backoff_base_ms: env_parse(
                ENV_FETCH_BACKOFF_BASE_MS,
                DEFAULT_FETCH_BACKOFF_BASE_MS,
            )?,
            domain_rate_per_minute: env_parse(
                ENV_DOMAIN_RATE_PER_MINUTE,
                DEFAULT_DOMAIN_RATE_PER_MINUTE,
            )?,
            cache_ttl_secs: env_parse(ENV_CACHE_TTL_SECS, DEFAULT_CACHE_TTL_SECS)?,
            cache_max_entries: env_parse(ENV_CACHE_MAX_ENTRIES, DEFAULT_CACHE_MAX_ENTRIES)?,
            anthropic_api_key: env::var(ENV_ANTHROPIC_API_KEY).unwrap_or_default(),
            extractor_model: env::var(ENV_EXTRACTOR_MODEL)
                .unwrap_or_else(|_| DEFAULT_EXTRACTOR_MODEL.to_string()),
            extractor_base_url: env::var(ENV_EXTRACTOR_BASE_URL)
                .unwrap_or_else(|_| DEFAULT_EXTRACTOR_BASE_URL.to_string()),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_deadline_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_REQUEST_DEADLINE_SECS,
                reason: "must be at least 1".to_string(),
            });
        }
        if self.fetch_max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_FETCH_MAX_ATTEMPTS,
                reason: "must be at least 1".to_string(),
            });
        }
        if self.domain_rate_per_minute == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_DOMAIN_RATE_PER_MINUTE,
                reason: "must be at least 1".to_string(),
            });
        }
        if self.cache_max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: ENV_CACHE_MAX_ENTRIES,
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Hard wall-clock budget for one whole parse run.
    pub fn request_deadline(&self) -> Duration {
        Duration::from_secs(self.request_deadline_secs)
    }
    /// Maximum fetch attempts per run, blocking signals included.
    pub fn fetch_max_attempts(&self) -> u32 {
        self.fetch_max_attempts
    }
    /// Base delay for exponential backoff between fetch attempts.
    pub fn fetch_backoff_base(&self) -> Duration {
        Duration::from_millis(self.fetch_backoff_base_ms)
    }
    /// Outbound request cap per target domain per minute.
    pub fn domain_rate_per_minute(&self) -> u32 {
        self.domain_rate_per_minute
    }
    /// Time-to-live for cached records.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
    /// Cache capacity; least-recently-used entries are evicted past it.
    pub fn cache_max_entries(&self) -> usize {
        self.cache_max_entries
    }
    /// API key for the extraction service.
    pub fn anthropic_api_key(&self) -> &str {
        &self.anthropic_api_key
    }
    /// Model identifier sent to the extraction service.
    pub fn extractor_model(&self) -> &str {
        &self.extractor_model
    }
    /// Base URL of the extraction service (overridable for tests).
    pub fn extractor_base_url(&self) -> &str {
        &self.extractor_base_url
    }

    pub fn with_request_deadline(mut self, d: Duration) -> Self {
        self.request_deadline_secs = d.as_secs().max(1);
        self
    }
    pub fn with_fetch_max_attempts(mut self, attempts: u32) -> Self {
        self.fetch_max_attempts = attempts;
        self
    }
    pub fn with_fetch_backoff_base_ms(mut self, ms: u64) -> Self {
        self.fetch_backoff_base_ms = ms;
        self
    }
    pub fn with_domain_rate_per_minute(mut self, per_minute: u32) -> Self {
        self.domain_rate_per_minute = per_minute;
        self
    }
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl_secs = ttl.as_secs();
        self
    }
    pub fn with_cache_max_entries(mut self, max: usize) -> Self {
        self.cache_max_entries = max;
        self
    }
    pub fn with_anthropic_api_key(mut self, key: impl Into<String>) -> Self {
        self.anthropic_api_key = key.into();
        self
    }
    pub fn with_extractor_model(mut self, model: impl Into<String>) -> Self {
        self.extractor_model = model.into();
        self
    }
    pub fn with_extractor_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.extractor_base_url = base_url.into();
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_deadline_secs: DEFAULT_REQUEST_DEADLINE_SECS,
            fetch_max_attempts: DEFAULT_FETCH_MAX_ATTEMPTS,
            fetch_backoff_base_ms: DEFAULT_FETCH_BACKOFF_BASE_MS,
            domain_rate_per_minute: DEFAULT_DOMAIN_RATE_PER_MINUTE,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            cache_max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            anthropic_api_key: String::new(),
            extractor_model: DEFAULT_EXTRACTOR_MODEL.to_string(),
            extractor_base_url: DEFAULT_EXTRACTOR_BASE_URL.to_string(),
        }
    }
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                field: key,
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
