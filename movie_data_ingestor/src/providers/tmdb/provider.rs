use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::raw::{CatalogGenre, ListingPage, ProviderTag, RawItem},
    providers::{
        errors::{
            DecodeSnafu, PermanentSnafu, ProviderInitError, RateLimitedSnafu, RequestSnafu,
            SourceError, TransientSnafu,
        },
        http::{
            build_client, credential_from_env, endpoint, ensure_credential, parse_base_url,
            read_response,
        },
        settings::ProviderSettings,
        tmdb::response::{
            TmdbErrorBody, TmdbGenreListResponse, TmdbListingResponse, TMDB_RATE_LIMIT_CODE,
        },
        MovieSource,
    },
};

pub const TMDB_API_KEY_VAR: &str = "TMDB_API_KEY";

const PROVIDER: ProviderTag = ProviderTag::Tmdb;
const LISTING_PATH: &str = "movie/popular";

pub struct TmdbProvider {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl TmdbProvider {
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
        })
    }

    /// Creates a provider using the `TMDB_API_KEY` environment variable.
    pub fn from_env(settings: &ProviderSettings) -> Result<Self, ProviderInitError> {
        let api_key = credential_from_env(PROVIDER, TMDB_API_KEY_VAR)?;
        Self::new(settings, api_key)
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Option<Value>, SourceError> {
        let url = endpoint(&self.base_url, path);
        debug!(provider = %PROVIDER, %path, "GET");

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.expose_secret())])
            .query(query)
            .send()
            .await
            .context(RequestSnafu { provider: PROVIDER })?;

        let fetched = read_response(PROVIDER, response).await?;
        interpret_response(fetched.status, fetched.retry_after, &fetched.body)
    }
}

/// Maps a TMDb HTTP outcome onto the source contract.
///
/// `Ok(None)` is "not found". HTTP 429 and TMDb status code 25 are rate
/// limits regardless of the HTTP status they arrive with.
pub fn interpret_response(
    status: u16,
    retry_after: Option<Duration>,
    body: &str,
) -> Result<Option<Value>, SourceError> {
    if (200..300).contains(&status) {
        let value: Value = serde_json::from_str(body).context(DecodeSnafu { provider: PROVIDER })?;
        return Ok(Some(value));
    }

    let error: TmdbErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = error
        .status_message
        .clone()
        .unwrap_or_else(|| format!("HTTP {status}"));

    if status == 429 || error.status_code == Some(TMDB_RATE_LIMIT_CODE) {
        return RateLimitedSnafu {
            provider: PROVIDER,
            retry_after,
        }
        .fail();
    }

    match status {
        404 => Ok(None),
        500..=599 => TransientSnafu { provider: PROVIDER, message }.fail(),
        _ => PermanentSnafu {
            provider: PROVIDER,
            status: Some(status),
            message,
        }
        .fail(),
    }
}

#[async_trait]
impl MovieSource for TmdbProvider {
    fn provider(&self) -> ProviderTag {
        PROVIDER
    }

    async fn fetch_listing(&self, page: u32) -> Result<ListingPage, SourceError> {
        let Some(body) = self.get_json(LISTING_PATH, &[("page", page.to_string())]).await? else {
            return Ok(ListingPage::empty(page));
        };
        let listing: TmdbListingResponse =
            serde_json::from_value(body).context(DecodeSnafu { provider: PROVIDER })?;

        Ok(ListingPage {
            page: listing.page,
            total_pages: listing.total_pages,
            items: listing
                .results
                .into_iter()
                .map(|payload| RawItem::new(PROVIDER, payload))
                .collect(),
        })
    }

    async fn fetch_detail(&self, external_id: &str) -> Result<Option<RawItem>, SourceError> {
        let id = external_id.trim();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return PermanentSnafu {
                provider: PROVIDER,
                status: None::<u16>,
                message: format!("not a TMDb movie id: {external_id:?}"),
            }
            .fail();
        }

        let body = self.get_json(&format!("movie/{id}"), &[]).await?;
        Ok(body.map(|payload| RawItem::new(PROVIDER, payload)))
    }

    async fn fetch_genre_catalog(&self) -> Result<Vec<CatalogGenre>, SourceError> {
        let Some(body) = self.get_json("genre/movie/list", &[]).await? else {
            return Ok(Vec::new());
        };
        let list: TmdbGenreListResponse =
            serde_json::from_value(body).context(DecodeSnafu { provider: PROVIDER })?;

        Ok(list
            .genres
            .into_iter()
            .map(|g| CatalogGenre { id: g.id, name: g.name })
            .collect())
    }
}
