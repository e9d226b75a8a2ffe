//! Plumbing shared by the HTTP-backed sources.

use chrono::Utc;
use reqwest::{header::RETRY_AFTER, Client, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::{ensure, OptionExt, ResultExt};

use crate::{
    models::raw::ProviderTag,
    providers::{
        errors::{
            ClientBuildSnafu, EmptyCredentialSnafu, InvalidBaseUrlSnafu, MissingEnvVarSnafu,
            ProviderInitError, RequestSnafu, SourceError,
        },
        retry_after::parse_retry_after,
        settings::ProviderSettings,
    },
};

/// A fully read HTTP response, detached from the connection.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status: u16,
    pub retry_after: Option<std::time::Duration>,
    pub body: String,
}

pub fn build_client(settings: &ProviderSettings) -> Result<Client, ProviderInitError> {
    Client::builder()
        .timeout(settings.timeout())
        .user_agent(concat!("movie-sync/", env!("CARGO_PKG_VERSION")))
        .build()
        .context(ClientBuildSnafu)
}

pub fn parse_base_url(provider: ProviderTag, raw: &str) -> Result<Url, ProviderInitError> {
    let url = Url::parse(raw).ok().context(InvalidBaseUrlSnafu {
        provider,
        url: raw.to_string(),
    })?;
    ensure!(
        matches!(url.scheme(), "http" | "https"),
        InvalidBaseUrlSnafu {
            provider,
            url: raw.to_string(),
        }
    );
    Ok(url)
}

/// Reads a credential from the environment (blank counts as missing).
pub fn credential_from_env(
    provider: ProviderTag,
    var: &str,
) -> Result<SecretString, ProviderInitError> {
    let value = get_env_var(var).context(MissingEnvVarSnafu { provider })?;
    Ok(SecretString::from(value))
}

pub fn ensure_credential(
    provider: ProviderTag,
    key: &SecretString,
) -> Result<(), ProviderInitError> {
    ensure!(!key.expose_secret().trim().is_empty(), EmptyCredentialSnafu { provider });
    Ok(())
}

pub async fn read_response(
    provider: ProviderTag,
    response: Response,
) -> Result<FetchedBody, SourceError> {
    let status = response.status().as_u16();
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| parse_retry_after(v, Utc::now()));
    let body = response.text().await.context(RequestSnafu { provider })?;
    Ok(FetchedBody {
        status,
        retry_after,
        body,
    })
}

/// Joins a relative endpoint onto a base URL without dropping the base path.
pub fn endpoint(base: &Url, path: &str) -> String {
    format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
