//! Per-provider connection and pacing settings.
//!
//! Defaults follow each provider's published quota: TMDb allows roughly 40
//! requests per 10 seconds, OMDb's free tier 1000 per day.

use std::time::Duration;

use crate::models::raw::ProviderTag;

/// Fallback delay when a rate-limit signal carries no advertised retry delay.
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 1;

/// Upper bound on any advertised delay we are willing to sleep for.
pub const MAX_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Minimum spacing between successive listing-page calls.
    pub listing_spacing_ms: u64,
    /// Minimum spacing between successive detail calls.
    pub detail_spacing_ms: u64,
    pub default_retry_after_secs: u64,
    pub max_retry_after_secs: u64,
    /// Pause before the single retry of a transient failure.
    pub transient_backoff_ms: u64,
    /// Search term for providers whose listing endpoint is a search (OMDb).
    pub search: Option<String>,
}

impl ProviderSettings {
    pub fn defaults_for(provider: ProviderTag) -> Self {
        match provider {
            ProviderTag::Tmdb => Self {
                base_url: "https://api.themoviedb.org/3".to_string(),
                timeout_secs: 10,
                listing_spacing_ms: 250,
                detail_spacing_ms: 250,
                default_retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
                max_retry_after_secs: MAX_RETRY_AFTER_SECS,
                transient_backoff_ms: 500,
                search: None,
            },
            ProviderTag::Omdb => Self {
                base_url: "https://www.omdbapi.com/".to_string(),
                timeout_secs: 10,
                listing_spacing_ms: 100,
                detail_spacing_ms: 100,
                default_retry_after_secs: DEFAULT_RETRY_AFTER_SECS,
                max_retry_after_secs: MAX_RETRY_AFTER_SECS,
                transient_backoff_ms: 500,
                search: Some("movie".to_string()),
            },
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn listing_spacing(&self) -> Duration {
        Duration::from_millis(self.listing_spacing_ms)
    }

    pub fn detail_spacing(&self) -> Duration {
        Duration::from_millis(self.detail_spacing_ms)
    }

    pub fn default_retry_after(&self) -> Duration {
        Duration::from_secs(self.default_retry_after_secs)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_secs)
    }

    pub fn transient_backoff(&self) -> Duration {
        Duration::from_millis(self.transient_backoff_ms)
    }
}
