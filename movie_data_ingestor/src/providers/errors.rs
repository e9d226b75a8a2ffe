use std::time::Duration;

use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::raw::ProviderTag;

/// Errors that can occur during the creation of a provider instance.
///
/// Every variant is a configuration problem: it is raised by the constructor,
/// never lazily on the first request.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing credential for {provider}: {source}"))]
    MissingEnvVar {
        provider: ProviderTag,
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// credential passed in explicitly but blank.
    #[snafu(display("Credential for {provider} is empty"))]
    EmptyCredential {
        provider: ProviderTag,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// base URL is not an absolute http(s) URL.
    #[snafu(display("Invalid base URL for {provider}: {url:?}"))]
    InvalidBaseUrl {
        provider: ProviderTag,
        url: String,
        backtrace: Backtrace,
    },
}

/// Coarse classification the governor and orchestrator act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Network trouble or a 5xx; worth one more try.
    Transient,
    /// The provider refused the request; retrying will not help.
    Permanent,
    /// The provider asked us to slow down.
    RateLimited,
}

/// Errors that can occur within a [`MovieSource`](crate::providers::MovieSource) call.
///
/// "Not found" is deliberately absent: clients report it as an empty result.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("{provider} request failed: {source}"))]
    Request {
        provider: ProviderTag,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider failed on its side (5xx).
    #[snafu(display("{provider} transient failure: {message}"))]
    Transient {
        provider: ProviderTag,
        message: String,
        backtrace: Backtrace,
    },

    /// The provider rejected the request (4xx other than rate limiting).
    #[snafu(display("{provider} rejected request (status {status:?}): {message}"))]
    Permanent {
        provider: ProviderTag,
        status: Option<u16>,
        message: String,
        backtrace: Backtrace,
    },

    /// HTTP 429 or a provider-specific "slow down" error code.
    #[snafu(display("{provider} rate limited (advertised retry after {retry_after:?})"))]
    RateLimited {
        provider: ProviderTag,
        retry_after: Option<Duration>,
        backtrace: Backtrace,
    },

    /// A 2xx body that is not the JSON envelope we expect.
    #[snafu(display("{provider} returned a malformed body: {source}"))]
    Decode {
        provider: ProviderTag,
        source: serde_json::Error,
        backtrace: Backtrace,
    },
}

impl SourceError {
    pub fn kind(&self) -> SourceErrorKind {
        match self {
            SourceError::Request { source, .. } => {
                if source.is_decode() || source.is_builder() || source.is_redirect() {
                    SourceErrorKind::Permanent
                } else {
                    SourceErrorKind::Transient
                }
            }
            SourceError::Transient { .. } => SourceErrorKind::Transient,
            SourceError::Permanent { .. } | SourceError::Decode { .. } => {
                SourceErrorKind::Permanent
            }
            SourceError::RateLimited { .. } => SourceErrorKind::RateLimited,
        }
    }

    /// Delay the provider advertised alongside a rate-limit signal, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            SourceError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn provider(&self) -> ProviderTag {
        match self {
            SourceError::Request { provider, .. }
            | SourceError::Transient { provider, .. }
            | SourceError::Permanent { provider, .. }
            | SourceError::RateLimited { provider, .. }
            | SourceError::Decode { provider, .. } => *provider,
        }
    }
}
