use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::{
    models::raw::{ListingPage, ProviderTag, RawItem},
    providers::{
        errors::{
            DecodeSnafu, PermanentSnafu, ProviderInitError, RateLimitedSnafu, RequestSnafu,
            SourceError, TransientSnafu,
        },
        http::{build_client, credential_from_env, ensure_credential, parse_base_url, read_response},
        omdb::response::{OmdbSearchResponse, OmdbStatus},
        settings::ProviderSettings,
        MovieSource,
    },
};

pub const OMDB_API_KEY_VAR: &str = "OMDB_API_KEY";

const PROVIDER: ProviderTag = ProviderTag::Omdb;

pub struct OmdbProvider {
    client: Client,
    base_url: Url,
    api_key: SecretString,
    search: String,
}

impl OmdbProvider {
    pub fn new(
        settings: &ProviderSettings,
        api_key: SecretString,
    ) -> Result<Self, ProviderInitError> {
        ensure_credential(PROVIDER, &api_key)?;
        let base_url = parse_base_url(PROVIDER, &settings.base_url)?;
        let client = build_client(settings)?;

        Ok(Self {
            client,
            base_url,
            api_key,
            search: settings.search.clone().unwrap_or_else(|| "movie".to_string()),
        })
    }

    /// Creates a provider using the `OMDB_API_KEY` environment variable.
    pub fn from_env(settings: &ProviderSettings) -> Result<Self, ProviderInitError> {
        let api_key = credential_from_env(PROVIDER, OMDB_API_KEY_VAR)?;
        Self::new(settings, api_key)
    }

    async fn get_json(&self, query: &[(&str, String)]) -> Result<Option<Value>, SourceError> {
        debug!(provider = %PROVIDER, ?query, "GET");

        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[("apikey", self.api_key.expose_secret())])
            .query(query)
            .send()
            .await
            .context(RequestSnafu { provider: PROVIDER })?;

        let fetched = read_response(PROVIDER, response).await?;
        interpret_response(fetched.status, fetched.retry_after, &fetched.body)
    }
}

/// Maps an OMDb HTTP outcome onto the source contract.
///
/// OMDb reports most failures as HTTP 200 with `"Response": "False"`, so the
/// body's `Error` text decides between "not found", rate limited and rejected.
pub fn interpret_response(
    status: u16,
    retry_after: Option<Duration>,
    body: &str,
) -> Result<Option<Value>, SourceError> {
    if status == 429 {
        return RateLimitedSnafu {
            provider: PROVIDER,
            retry_after,
        }
        .fail();
    }
    if (500..600).contains(&status) {
        return TransientSnafu {
            provider: PROVIDER,
            message: format!("HTTP {status}"),
        }
        .fail();
    }

    let in_band: OmdbStatus = serde_json::from_str(body).unwrap_or_default();
    if in_band.is_false() || !(200..300).contains(&status) {
        let message = in_band.error.unwrap_or_else(|| format!("HTTP {status}"));
        let lowered = message.to_ascii_lowercase();

        if lowered.contains("not found") || lowered.contains("incorrect imdb id") {
            return Ok(None);
        }
        if lowered.contains("limit reached") {
            return RateLimitedSnafu {
                provider: PROVIDER,
                retry_after,
            }
            .fail();
        }
        warn!(provider = %PROVIDER, %message, "OMDb rejected request");
        return PermanentSnafu {
            provider: PROVIDER,
            status: Some(status),
            message,
        }
        .fail();
    }

    let value: Value = serde_json::from_str(body).context(DecodeSnafu { provider: PROVIDER })?;
    Ok(Some(value))
}

#[async_trait]
impl MovieSource for OmdbProvider {
    fn provider(&self) -> ProviderTag {
        PROVIDER
    }

    async fn fetch_listing(&self, page: u32) -> Result<ListingPage, SourceError> {
        let query = [
            ("s", self.search.clone()),
            ("type", "movie".to_string()),
            ("page", page.to_string()),
        ];
        let Some(body) = self.get_json(&query).await? else {
            return Ok(ListingPage::empty(page));
        };
        let search: OmdbSearchResponse =
            serde_json::from_value(body).context(DecodeSnafu { provider: PROVIDER })?;
        let total_pages = search.total_pages();

        Ok(ListingPage {
            page,
            total_pages,
            items: search
                .search
                .into_iter()
                .map(|payload| RawItem::new(PROVIDER, payload))
                .collect(),
        })
    }

    async fn fetch_detail(&self, external_id: &str) -> Result<Option<RawItem>, SourceError> {
        let query = [("i", external_id.trim().to_string()), ("plot", "short".to_string())];
        let body = self.get_json(&query).await?;
        Ok(body.map(|payload| RawItem::new(PROVIDER, payload)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::errors::SourceErrorKind;

    #[test]
    fn movie_not_found_is_empty() {
        let body = r#"{"Response":"False","Error":"Movie not found!"}"#;
        assert!(interpret_response(200, None, body).unwrap().is_none());
    }

    #[test]
    fn incorrect_id_is_empty() {
        let body = r#"{"Response":"False","Error":"Incorrect IMDb ID."}"#;
        assert!(interpret_response(200, None, body).unwrap().is_none());
    }

    #[test]
    fn daily_limit_is_rate_limited() {
        let body = r#"{"Response":"False","Error":"Request limit reached!"}"#;
        let err = interpret_response(401, None, body).unwrap_err();
        assert_eq!(err.kind(), SourceErrorKind::RateLimited);
    }

    #[test]
    fn invalid_key_is_permanent() {
        let body = r#"{"Response":"False","Error":"Invalid API key!"}"#;
        let err = interpret_response(401, None, body).unwrap_err();
        assert_eq!(err.kind(), SourceErrorKind::Permanent);
    }

    #[test]
    fn true_response_passes_through() {
        let body = r#"{"Title":"Inception","imdbID":"tt1375666","Response":"True"}"#;
        let v = interpret_response(200, None, body).unwrap().unwrap();
        assert_eq!(v["imdbID"], "tt1375666");
    }

    #[test]
    fn gateway_errors_are_transient() {
        let err = interpret_response(502, None, "").unwrap_err();
        assert_eq!(err.kind(), SourceErrorKind::Transient);
    }

    #[test]
    fn search_total_pages_round_up() {
        let search: OmdbSearchResponse =
            serde_json::from_str(r#"{"Search":[],"totalResults":"21","Response":"True"}"#).unwrap();
        assert_eq!(search.total_pages(), 3);
    }
}
