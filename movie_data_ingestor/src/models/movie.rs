//! Canonical, provider-agnostic movie record produced by the normalizer.
//!
//! This is the only shape the store ever sees. Every provider payload is
//! mapped into a [`NormalizedMovie`] before persistence, regardless of where
//! it came from or how its fields were spelled.

use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::raw::ProviderTag;

/// Namespace of an external identifier (the dedup key).
///
/// OMDb does not mint its own ids; its records are keyed by IMDb id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalIdKind {
    Tmdb,
    Imdb,
}

impl ExternalIdKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExternalIdKind::Tmdb => "tmdb",
            ExternalIdKind::Imdb => "imdb",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tmdb" => Some(ExternalIdKind::Tmdb),
            "imdb" => Some(ExternalIdKind::Imdb),
            _ => None,
        }
    }

    /// The namespace a provider keys its own records by.
    pub fn primary_for(provider: ProviderTag) -> Self {
        match provider {
            ProviderTag::Tmdb => ExternalIdKind::Tmdb,
            ProviderTag::Omdb => ExternalIdKind::Imdb,
        }
    }
}

impl fmt::Display for ExternalIdKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a rating came from. At most one rating per source per movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingSource {
    Tmdb,
    Imdb,
    RottenTomatoes,
    Metacritic,
}

impl RatingSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RatingSource::Tmdb => "tmdb",
            RatingSource::Imdb => "imdb",
            RatingSource::RottenTomatoes => "rotten_tomatoes",
            RatingSource::Metacritic => "metacritic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "tmdb" => Some(RatingSource::Tmdb),
            "imdb" => Some(RatingSource::Imdb),
            "rotten_tomatoes" => Some(RatingSource::RottenTomatoes),
            "metacritic" => Some(RatingSource::Metacritic),
            _ => None,
        }
    }

    /// Scale the source publishes on. Recorded on every rating row.
    pub fn default_scale_max(self) -> Decimal {
        match self {
            RatingSource::Tmdb | RatingSource::Imdb => Decimal::from(10),
            RatingSource::RottenTomatoes | RatingSource::Metacritic => Decimal::from(100),
        }
    }
}

impl fmt::Display for RatingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rating as reported by one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRating {
    pub source: RatingSource,
    pub value: Decimal,
    pub scale_max: Decimal,
    pub vote_count: Option<i64>,
}

/// Primary production company. Matched case-insensitively by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudioRef {
    pub name: String,
    /// ISO country code when the provider supplies one, else empty.
    pub country: String,
}

/// A genre reference. Resolved by provider id first, normalized name second.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreRef {
    pub tmdb_id: Option<i64>,
    pub name: Option<String>,
}

/// The canonical entity shape handed to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMovie {
    /// Provider the payload came from.
    pub source: ProviderTag,
    /// Every external id the payload carried; always contains the source's primary namespace.
    pub external_ids: BTreeMap<ExternalIdKind, String>,
    pub title: String,
    /// Title in the original language, when the provider reports one.
    pub original_title: Option<String>,
    pub overview: Option<String>,
    /// MPAA certification (OMDb `Rated`).
    pub content_rating: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    /// Production budget. `None` when absent or reported as 0.
    pub budget: Option<Decimal>,
    /// Worldwide revenue. `None` when absent or reported as 0.
    pub revenue: Option<Decimal>,
    /// Domestic box office gross (OMDb `BoxOffice`). Never folded into `revenue`.
    pub domestic_gross: Option<Decimal>,
    pub studio: Option<StudioRef>,
    pub genres: Vec<GenreRef>,
    pub ratings: Vec<NormalizedRating>,
}

impl NormalizedMovie {
    /// The dedup key in the source's own namespace.
    pub fn primary_external_id(&self) -> Option<(ExternalIdKind, &str)> {
        let kind = ExternalIdKind::primary_for(self.source);
        self.external_ids.get(&kind).map(|id| (kind, id.as_str()))
    }

    /// Human-readable key for log lines, e.g. `tmdb:155`.
    pub fn log_key(&self) -> String {
        match self.primary_external_id() {
            Some((kind, id)) => format!("{kind}:{id}"),
            None => format!("{}:<none>", self.source),
        }
    }
}
