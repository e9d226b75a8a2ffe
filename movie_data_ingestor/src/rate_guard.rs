//! Request pacing and retry policy around a [`MovieSource`].
//!
//! Two independent limiters space listing-page calls and detail calls. A
//! rate-limit signal is honored once: the governor sleeps for the advertised
//! delay (or the configured default, capped at the configured maximum) and
//! retries. A second consecutive rate-limit is surfaced as
//! [`GovernorError::RateLimitExhausted`]. Transient failures get one retry
//! after a short backoff; permanent failures are returned as-is.

use std::{future::Future, num::NonZeroU32, time::Duration};

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    models::raw::{CatalogGenre, ListingPage, ProviderTag, RawItem},
    providers::{MovieSource, ProviderSettings, SourceError, SourceErrorKind},
};

const BURST: NonZeroU32 = nonzero!(1u32);

#[derive(Debug, Error)]
pub enum GovernorError {
    #[error("{provider} kept rate limiting after one retry (last delay {retry_after:?})")]
    RateLimitExhausted {
        provider: ProviderTag,
        retry_after: Option<Duration>,
    },

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl GovernorError {
    /// Stable tag recorded on aborted runs.
    pub fn reason_code(&self) -> &'static str {
        match self {
            GovernorError::RateLimitExhausted { .. } => "rate_limit_exhausted",
            GovernorError::Source(e) => match e.kind() {
                SourceErrorKind::Transient => "transient_source_failure",
                SourceErrorKind::Permanent => "permanent_source_failure",
                SourceErrorKind::RateLimited => "rate_limit_exhausted",
            },
        }
    }
}

/// Pacing and retry knobs, resolved from [`ProviderSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernorPolicy {
    pub listing_spacing: Duration,
    pub detail_spacing: Duration,
    pub default_retry_after: Duration,
    pub max_retry_after: Duration,
    pub transient_backoff: Duration,
}

impl GovernorPolicy {
    pub fn from_settings(settings: &ProviderSettings) -> Self {
        Self {
            listing_spacing: settings.listing_spacing(),
            detail_spacing: settings.detail_spacing(),
            default_retry_after: settings.default_retry_after(),
            max_retry_after: settings.max_retry_after(),
            transient_backoff: settings.transient_backoff(),
        }
    }

    /// No spacing and no backoff; retry delays still follow the provider.
    pub fn unpaced() -> Self {
        Self {
            listing_spacing: Duration::ZERO,
            detail_spacing: Duration::ZERO,
            default_retry_after: Duration::from_secs(1),
            max_retry_after: Duration::from_secs(60),
            transient_backoff: Duration::ZERO,
        }
    }

    /// Delay to wait before retrying a rate-limited call.
    pub fn retry_delay(&self, advertised: Option<Duration>) -> Duration {
        advertised
            .unwrap_or(self.default_retry_after)
            .min(self.max_retry_after)
    }
}

fn spacing_limiter(spacing: Duration) -> Option<DefaultDirectRateLimiter> {
    Quota::with_period(spacing).map(|q| RateLimiter::direct(q.allow_burst(BURST)))
}

pub struct SourceGovernor {
    source: Box<dyn MovieSource>,
    policy: GovernorPolicy,
    listing_limiter: Option<DefaultDirectRateLimiter>,
    detail_limiter: Option<DefaultDirectRateLimiter>,
}

impl SourceGovernor {
    pub fn new(source: Box<dyn MovieSource>, policy: GovernorPolicy) -> Self {
        let listing_limiter = spacing_limiter(policy.listing_spacing);
        let detail_limiter = spacing_limiter(policy.detail_spacing);
        Self {
            source,
            policy,
            listing_limiter,
            detail_limiter,
        }
    }

    pub fn provider(&self) -> ProviderTag {
        self.source.provider()
    }

    pub fn policy(&self) -> &GovernorPolicy {
        &self.policy
    }

    pub async fn fetch_listing(&self, page: u32) -> Result<ListingPage, GovernorError> {
        if let Some(limiter) = &self.listing_limiter {
            limiter.until_ready().await;
        }
        self.call_with_retry("listing", || self.source.fetch_listing(page)).await
    }

    pub async fn fetch_detail(&self, external_id: &str) -> Result<Option<RawItem>, GovernorError> {
        if let Some(limiter) = &self.detail_limiter {
            limiter.until_ready().await;
        }
        self.call_with_retry("detail", || self.source.fetch_detail(external_id)).await
    }

    pub async fn fetch_genre_catalog(&self) -> Result<Vec<CatalogGenre>, GovernorError> {
        self.call_with_retry("genre_catalog", || self.source.fetch_genre_catalog()).await
    }

    async fn call_with_retry<T, F, Fut>(
        &self,
        op: &'static str,
        call: F,
    ) -> Result<T, GovernorError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let provider = self.provider();
        let first = match call().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        let delay = match first.kind() {
            SourceErrorKind::RateLimited => self.policy.retry_delay(first.retry_after()),
            SourceErrorKind::Transient => self.policy.transient_backoff,
            SourceErrorKind::Permanent => return Err(first.into()),
        };
        warn!(
            %provider,
            op,
            error = %first,
            delay_ms = delay.as_millis() as u64,
            "Retrying once after provider failure"
        );
        tokio::time::sleep(delay).await;

        match call().await {
            Ok(value) => {
                debug!(%provider, op, "Retry succeeded");
                Ok(value)
            }
            Err(err) if err.kind() == SourceErrorKind::RateLimited => {
                Err(GovernorError::RateLimitExhausted {
                    provider,
                    retry_after: err.retry_after(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }
}
