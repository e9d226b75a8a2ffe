//! TMDb payload mapping. Handles both listing items (`genre_ids`, no money)
//! and detail payloads (`genres`, `budget`, `revenue`, `production_companies`).

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Number, Value};

use crate::{
    models::{
        movie::{
            ExternalIdKind, GenreRef, NormalizedMovie, NormalizedRating, RatingSource, StudioRef,
        },
        raw::ProviderTag,
    },
    normalize::{
        fields::{decimal_from_f64, id_text, money_from_number, parse_date, present},
        NormalizationError,
    },
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Deserialize, Debug)]
struct TmdbMovie {
    id: Option<Value>,
    title: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    imdb_id: Option<String>,
    release_date: Option<String>,
    runtime: Option<i64>,
    budget: Option<Number>,
    revenue: Option<Number>,
    #[serde(default)]
    genres: Vec<TmdbGenre>,
    #[serde(default)]
    genre_ids: Vec<i64>,
    #[serde(default)]
    production_companies: Vec<TmdbCompany>,
    vote_average: Option<f64>,
    vote_count: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct TmdbGenre {
    id: i64,
    name: Option<String>,
}

#[derive(Deserialize, Debug)]
struct TmdbCompany {
    name: Option<String>,
    origin_country: Option<String>,
}

pub(crate) fn normalize(payload: &Value) -> Result<NormalizedMovie, NormalizationError> {
    let movie = TmdbMovie::deserialize(payload).map_err(|source| NormalizationError::Schema {
        provider: ProviderTag::Tmdb,
        source,
    })?;

    let tmdb_id = id_text(movie.id.as_ref()).ok_or_else(|| NormalizationError::MissingExternalId {
        provider: ProviderTag::Tmdb,
        title: movie.title.clone(),
    })?;
    let title = present(movie.title.as_deref())
        .ok_or_else(|| NormalizationError::MissingTitle {
            provider: ProviderTag::Tmdb,
            external_id: Some(tmdb_id.clone()),
        })?
        .to_string();

    let mut external_ids = BTreeMap::from([(ExternalIdKind::Tmdb, tmdb_id)]);
    if let Some(imdb) = present(movie.imdb_id.as_deref()) {
        external_ids.insert(ExternalIdKind::Imdb, imdb.to_string());
    }

    // Detail payloads carry named genres; listing items only ids.
    let genres = if movie.genres.is_empty() {
        movie
            .genre_ids
            .iter()
            .map(|id| GenreRef {
                tmdb_id: Some(*id),
                name: None,
            })
            .collect()
    } else {
        movie
            .genres
            .iter()
            .map(|g| GenreRef {
                tmdb_id: Some(g.id),
                name: present(g.name.as_deref()).map(str::to_string),
            })
            .collect()
    };

    let studio = movie.production_companies.iter().find_map(|c| {
        present(c.name.as_deref()).map(|name| StudioRef {
            name: name.to_string(),
            country: present(c.origin_country.as_deref()).unwrap_or_default().to_string(),
        })
    });

    let ratings = match (movie.vote_average.and_then(decimal_from_f64), movie.vote_count) {
        (_, Some(0)) | (None, _) => Vec::new(),
        (Some(value), vote_count) => vec![NormalizedRating {
            source: RatingSource::Tmdb,
            value,
            scale_max: RatingSource::Tmdb.default_scale_max(),
            vote_count,
        }],
    };

    Ok(NormalizedMovie {
        source: ProviderTag::Tmdb,
        external_ids,
        title,
        original_title: present(movie.original_title.as_deref()).map(str::to_string),
        overview: present(movie.overview.as_deref()).map(str::to_string),
        content_rating: None,
        release_date: parse_date(movie.release_date.as_deref(), DATE_FORMAT),
        runtime_minutes: movie
            .runtime
            .filter(|m| *m > 0)
            .and_then(|m| i32::try_from(m).ok()),
        budget: money_from_number(movie.budget.as_ref()),
        revenue: money_from_number(movie.revenue.as_ref()),
        domestic_gross: None,
        studio,
        genres,
        ratings,
    })
}
