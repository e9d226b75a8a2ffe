//! Provider-native payloads, exactly as the source clients received them.
//!
//! Nothing here is interpreted; the [`normalize`](crate::normalize) module owns
//! the mapping into canonical shapes.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which upstream a payload came from (serde snake_case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTag {
    /// The Movie Database (api.themoviedb.org).
    Tmdb,
    /// The Open Movie Database (omdbapi.com).
    Omdb,
}

impl ProviderTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderTag::Tmdb => "tmdb",
            ProviderTag::Omdb => "omdb",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tmdb" => Some(ProviderTag::Tmdb),
            "omdb" => Some(ProviderTag::Omdb),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One listing or detail object as returned by a provider.
#[derive(Debug, Clone, PartialEq)]
pub struct RawItem {
    pub provider: ProviderTag,
    pub payload: Value,
}

impl RawItem {
    pub fn new(provider: ProviderTag, payload: Value) -> Self {
        Self { provider, payload }
    }

    /// Best-effort identifier for log lines. Not used for matching.
    pub fn label(&self) -> String {
        let key = match self.provider {
            ProviderTag::Tmdb => "id",
            ProviderTag::Omdb => "imdbID",
        };
        match self.payload.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => "<unknown>".to_string(),
        }
    }
}

/// A single page of a paginated listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    pub page: u32,
    pub total_pages: u32,
    pub items: Vec<RawItem>,
}

impl ListingPage {
    /// An empty page, used when the provider reports "not found" for a listing.
    pub fn empty(page: u32) -> Self {
        Self {
            page,
            total_pages: 0,
            items: Vec::new(),
        }
    }

    /// True when the provider says there is nothing after this page.
    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}

/// One entry of a provider's genre catalog (TMDb `/genre/movie/list`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogGenre {
    pub id: i64,
    pub name: String,
}
