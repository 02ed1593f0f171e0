use std::time::Duration;

use reqwest::{Client, ClientBuilder, StatusCode, header};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::Config;
use crate::fetcher::{
    admission::DomainLimiter,
    backoff::backoff_delay,
    decode::decode_body,
    errors::FetchError,
    identity::IdentityPool,
    types::{Charset, FetchResult},
};
use crate::platform::ParseTarget;

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB

/// Resilient page fetcher: per-domain admission, identity rotation, and
/// deadline-bounded retries with exponential backoff.
///
/// Owned by the parser context rather than living in a process-wide static,
/// so independent configurations (and tests) get independent limiter state.
#[derive(Debug)]
pub struct Fetcher {
    client: Client,
    identities: IdentityPool,
    admission: DomainLimiter,
    max_attempts: u32,
    backoff_base: Duration,
}

/// Body of one successful attempt, before attempt accounting is attached.
struct PagePayload {
    url_final: Url,
    status: StatusCode,
    body_text: String,
    charset: Charset,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(config.request_deadline())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(FetchError::from_reqwest_error)?;

        Ok(Self {
            client,
            identities: IdentityPool::new(),
            admission: DomainLimiter::new(config.domain_rate_per_minute()),
            max_attempts: config.fetch_max_attempts().max(1),
            backoff_base: config.fetch_backoff_base(),
        })
    }

    /// Fetch the target page, retrying transient failures until the attempt
    /// budget or `deadline` runs out, whichever comes first.
    ///
    /// 429/403 responses count as transient but force the next attempt onto
    /// a different identity; the sleep before a retry honors the larger of
    /// the backoff delay and an origin-supplied Retry-After, and never
    /// crosses the deadline.
    #[instrument(skip_all, fields(url = %target.url, domain = %target.domain()))]
    pub async fn fetch(
        &self,
        target: &ParseTarget,
        deadline: Instant,
    ) -> Result<FetchResult, FetchError> {
        let started = Instant::now();
        let domain = target.domain();
        let mut avoid: Option<usize> = None;
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            self.admission.acquire(domain, deadline).await?;

            let remaining = deadline.duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(FetchError::DeadlineExceeded);
            }

            let identity_index = self.identities.draw(avoid);
            let identity = self.identities.get(identity_index);
            debug!(attempt, user_agent = identity.user_agent(), "sending request");

            match self.attempt(target, identity.headers(), remaining).await {
                Ok(page) => {
                    let elapsed = started.elapsed();
                    info!(
                        attempt,
                        status = page.status.as_u16(),
                        elapsed_ms = elapsed.as_millis() as u64,
                        "fetch succeeded"
                    );
                    return Ok(FetchResult {
                        url_final: page.url_final,
                        status: page.status,
                        body_text: page.body_text,
                        charset: page.charset,
                        elapsed,
                        attempts: attempt,
                    });
                }
                Err(err) => {
                    if err.is_blocking_signal() {
                        avoid = Some(identity_index);
                    }
                    if !err.should_retry() || attempt >= self.max_attempts {
                        warn!(attempt, error = %err, "fetch failed");
                        return Err(err);
                    }

                    let mut delay = backoff_delay(attempt, self.backoff_base);
                    if let FetchError::RateLimited {
                        retry_after: Some(secs),
                    } = &err
                    {
                        delay = delay.max(Duration::from_secs(*secs));
                    }
                    if Instant::now() + delay >= deadline {
                        warn!(attempt, error = %err, "deadline reached mid-retry");
                        return Err(FetchError::DeadlineExceeded);
                    }

                    warn!(attempt, error = %err, delay_ms = delay.as_millis() as u64, "transient fetch failure, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    async fn attempt(
        &self,
        target: &ParseTarget,
        headers: header::HeaderMap,
        remaining: Duration,
    ) -> Result<PagePayload, FetchError> {
        let response = self
            .client
            .get(target.url.clone())
            .headers(headers)
            .timeout(remaining)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        // Check content length before downloading
        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return Err(FetchError::BodyTooLarge(content_length));
        }

        let status = response.status();
        let url_final = response.url().clone();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                retry_after: parse_retry_after(response.headers()),
            });
        }
        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::Blocked { status });
        }
        if !status.is_success() {
            return Err(FetchError::Http {
                status,
                retriable: status.is_server_error(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        // Only booking pages, which are HTML, are worth decoding
        if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
            return Err(FetchError::UnsupportedContentType(content_type));
        }

        let body_bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Io(e.to_string()))?;

        // Check body size after download (in case Content-Length was missing)
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return Err(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        let (body_text, charset) = decode_body(&content_type, &body_bytes)?;

        if looks_like_block_page(&body_text) {
            return Err(FetchError::BlockPage);
        }

        Ok(PagePayload {
            url_final,
            status,
            body_text,
            charset,
        })
    }
}

fn parse_retry_after(headers: &header::HeaderMap) -> Option<u64> {
    headers
        .get(header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Challenge interstitials come back as HTTP 200; treat them as a block.
fn looks_like_block_page(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    let has_cloudflare_banner = lowered.contains("attention required! | cloudflare");
    let has_challenge_platform = lowered.contains("/cdn-cgi/challenge-platform/");
    let has_just_a_moment = lowered.contains("just a moment...");
    let has_cookie_gate = lowered.contains("please enable cookies");
    let has_cf_chl = lowered.contains("cf-chl-");
    let has_captcha_wall = lowered.contains("verify you are a human");

    has_cloudflare_banner
        || has_challenge_platform
        || has_captcha_wall
        || (has_just_a_moment && has_cookie_gate)
        || (has_just_a_moment && has_cf_chl)
}
