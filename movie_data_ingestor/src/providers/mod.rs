//! Movie source abstraction.
//!
//! [`MovieSource`] is the single seam between the pipeline and an upstream
//! API. Implementations return provider-native payloads ([`RawItem`]) and
//! never interpret them; mapping happens in [`crate::normalize`].
//!
//! Sources are plain request/response clients: they do not pace themselves
//! and they do not retry. Both concerns live in
//! [`SourceGovernor`](crate::rate_guard::SourceGovernor), which wraps any
//! `Box<dyn MovieSource>`.

pub mod errors;
pub mod http;
pub mod omdb;
pub mod retry_after;
pub mod settings;
pub mod tmdb;

use async_trait::async_trait;

pub use errors::{ProviderInitError, SourceError, SourceErrorKind};
pub use settings::ProviderSettings;

use crate::models::raw::{CatalogGenre, ListingPage, ProviderTag, RawItem};

#[async_trait]
pub trait MovieSource: Send + Sync {
    fn provider(&self) -> ProviderTag;

    /// Fetches one page (1-based) of the provider's listing endpoint.
    ///
    /// A listing the provider reports as missing yields an empty page.
    async fn fetch_listing(&self, page: u32) -> Result<ListingPage, SourceError>;

    /// Fetches the full record for one id in the provider's own namespace.
    ///
    /// `Ok(None)` means the provider has no such record.
    async fn fetch_detail(&self, external_id: &str) -> Result<Option<RawItem>, SourceError>;

    /// The provider's genre catalog, when it publishes one.
    async fn fetch_genre_catalog(&self) -> Result<Vec<CatalogGenre>, SourceError> {
        Ok(Vec::new())
    }
}

/// Builds the HTTP-backed source for `provider`, reading its credential from
/// the environment.
pub fn build_source(
    provider: ProviderTag,
    settings: &ProviderSettings,
) -> Result<Box<dyn MovieSource>, ProviderInitError> {
    match provider {
        ProviderTag::Tmdb => Ok(Box::new(tmdb::TmdbProvider::from_env(settings)?)),
        ProviderTag::Omdb => Ok(Box::new(omdb::OmdbProvider::from_env(settings)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct CannedSource;

    #[async_trait]
    impl MovieSource for CannedSource {
        fn provider(&self) -> ProviderTag {
            ProviderTag::Tmdb
        }

        async fn fetch_listing(&self, page: u32) -> Result<ListingPage, SourceError> {
            Ok(ListingPage {
                page,
                total_pages: 1,
                items: vec![RawItem::new(ProviderTag::Tmdb, json!({"id": 1}))],
            })
        }

        async fn fetch_detail(&self, _external_id: &str) -> Result<Option<RawItem>, SourceError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn dyn_source_dispatch_and_default_catalog() {
        let source: Box<dyn MovieSource> = Box::new(CannedSource);
        let page = source.fetch_listing(1).await.unwrap();
        assert!(page.is_last());
        assert_eq!(page.items[0].label(), "1");
        assert!(source.fetch_genre_catalog().await.unwrap().is_empty());
    }
}
