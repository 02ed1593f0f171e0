use std::sync::Arc;

use tokio::time::{Instant, timeout_at};
use tracing::{info, instrument, warn};

use crate::cache::{CacheError, CacheKey, ParseCache};
use crate::config::Config;
use crate::error::ParseError;
use crate::extractor;
use crate::fetcher::Fetcher;
use crate::platform::{Category, ParseTarget, PlatformTable};
use crate::record::{self, TravelRecord};
use crate::semantic::FieldExtractor;

/// The fetch-and-coordinate pipeline behind one `parse` call.
///
/// Owns all cross-request state (platform table, rate limiter, identity
/// pool, cache), so independent instances with their own configuration can
/// coexist in one process.
pub struct Parser {
    config: Config,
    platforms: PlatformTable,
    fetcher: Fetcher,
    cache: ParseCache,
    extractor: Arc<dyn FieldExtractor>,
}

impl Parser {
    pub fn new(config: Config, extractor: Arc<dyn FieldExtractor>) -> Result<Self, ParseError> {
        let fetcher = Fetcher::new(&config).map_err(|e| ParseError::ExternalService {
            reason: format!("could not build http client: {e}"),
        })?;

        Ok(Self {
            platforms: PlatformTable::default(),
            fetcher,
            cache: ParseCache::new(config.cache_ttl(), config.cache_max_entries()),
            extractor,
            config,
        })
    }

    /// Swap in a custom platform table. Tests use this to point the
    /// classifier at local servers.
    pub fn with_platforms(mut self, platforms: PlatformTable) -> Self {
        self.platforms = platforms;
        self
    }

    /// Parse one booking URL into a canonical record.
    ///
    /// Classification happens before any network I/O; everything after it
    /// runs under one wall-clock deadline and is deduplicated per cache key.
    #[instrument(skip_all, fields(url = %raw_url, category = %category))]
    pub async fn parse(
        &self,
        category: Category,
        raw_url: &str,
    ) -> Result<TravelRecord, ParseError> {
        let target = self.platforms.classify(raw_url, category)?;
        let key = CacheKey::new(category, &target.url);
        let url = target.url.clone();
        let deadline = Instant::now() + self.config.request_deadline();

        let outcome = timeout_at(
            deadline,
            self.cache.get_or_compute(key, || self.run(target, deadline)),
        )
        .await;

        match outcome {
            Ok(Ok(record)) => Ok(record),
            Ok(Err(CacheError::Compute(error))) => Err(error),
            // The caller leading this key's computation was dropped; from
            // this caller's perspective the wait simply ran out.
            Ok(Err(CacheError::Cancelled)) => Err(ParseError::Timeout {
                url: url.to_string(),
            }),
            Err(_) => {
                warn!("pipeline deadline expired");
                Err(ParseError::Timeout {
                    url: url.to_string(),
                })
            }
        }
    }

    /// One full computation: fetch, reduce to text, call the collaborator,
    /// validate into a record.
    async fn run(
        &self,
        target: ParseTarget,
        deadline: Instant,
    ) -> Result<TravelRecord, ParseError> {
        let fetched = self
            .fetcher
            .fetch(&target, deadline)
            .await
            .map_err(|e| e.into_parse_error(&target.url))?;

        let text = extractor::extract(&fetched.body_text);
        if text.is_empty() {
            return Err(ParseError::MissingData {
                reason: "page contained no extractable text".to_string(),
            });
        }

        let fields = timeout_at(
            deadline,
            self.extractor.extract_fields(target.category, &text),
        )
        .await
        .map_err(|_| ParseError::Timeout {
            url: target.url.to_string(),
        })?
        .map_err(|e| ParseError::ExternalService {
            reason: e.to_string(),
        })?;

        let record = record::transform(target.category, &fields)?;
        info!(
            attempts = fetched.attempts,
            status = fetched.status.as_u16(),
            "parsed travel record"
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::MockFieldExtractor;

    fn parser() -> Parser {
        // No expectations set: any collaborator call panics the test.
        Parser::new(Config::default(), Arc::new(MockFieldExtractor::new())).unwrap()
    }

    #[tokio::test]
    async fn test_unknown_host_fails_without_any_network_call() {
        let err = parser()
            .parse(Category::Flight, "https://definitely-not-a-travel-site.example/deal")
            .await
            .unwrap_err();

        assert!(matches!(err, ParseError::UnsupportedPlatform { .. }));
        assert!(err.to_string().contains("definitely-not-a-travel-site.example"));
    }

    #[tokio::test]
    async fn test_malformed_url_is_rejected_up_front() {
        let err = parser()
            .parse(Category::Flight, "not a url at all")
            .await
            .unwrap_err();

        assert!(matches!(err, ParseError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_category_mismatch_is_unsupported() {
        // united.com serves flights, not lodging
        let err = parser()
            .parse(Category::Lodging, "https://www.united.com/booking/123")
            .await
            .unwrap_err();

        assert!(matches!(err, ParseError::UnsupportedPlatform { .. }));
    }
}
