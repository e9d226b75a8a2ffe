//! OMDb payload mapping.
//!
//! Search items carry only `Title`, `Year`, `imdbID`; detail payloads add
//! `Released`, `BoxOffice`, `Production` and the `Ratings` list.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::{
    models::{
        movie::{
            ExternalIdKind, GenreRef, NormalizedMovie, NormalizedRating, RatingSource, StudioRef,
        },
        raw::ProviderTag,
    },
    normalize::{
        fields::{money_from_text, parse_count, parse_date, parse_runtime, parse_score, present},
        NormalizationError,
    },
};

const DATE_FORMAT: &str = "%d %b %Y";

/// `Ratings[].Source` labels and the sources they map to. Unlisted labels are dropped.
const RATING_SOURCES: &[(&str, RatingSource)] = &[
    ("Internet Movie Database", RatingSource::Imdb),
    ("Rotten Tomatoes", RatingSource::RottenTomatoes),
    ("Metacritic", RatingSource::Metacritic),
];

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct OmdbMovie {
    title: Option<String>,
    #[serde(rename = "imdbID")]
    imdb_id: Option<String>,
    rated: Option<String>,
    plot: Option<String>,
    released: Option<String>,
    runtime: Option<String>,
    genre: Option<String>,
    production: Option<String>,
    box_office: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbVotes")]
    imdb_votes: Option<String>,
    #[serde(default)]
    ratings: Vec<OmdbRating>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct OmdbRating {
    source: String,
    value: String,
}

fn rating_source(label: &str) -> Option<RatingSource> {
    RATING_SOURCES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(label.trim()))
        .map(|(_, source)| *source)
}

pub(crate) fn normalize(payload: &Value) -> Result<NormalizedMovie, NormalizationError> {
    let movie = OmdbMovie::deserialize(payload).map_err(|source| NormalizationError::Schema {
        provider: ProviderTag::Omdb,
        source,
    })?;

    let imdb_id = present(movie.imdb_id.as_deref())
        .ok_or_else(|| NormalizationError::MissingExternalId {
            provider: ProviderTag::Omdb,
            title: movie.title.clone(),
        })?
        .to_string();
    let title = present(movie.title.as_deref())
        .ok_or_else(|| NormalizationError::MissingTitle {
            provider: ProviderTag::Omdb,
            external_id: Some(imdb_id.clone()),
        })?
        .to_string();

    let genres = present(movie.genre.as_deref())
        .map(|list| {
            list.split(',')
                .filter_map(|name| present(Some(name)))
                .map(|name| GenreRef {
                    tmdb_id: None,
                    name: Some(name.to_string()),
                })
                .collect()
        })
        .unwrap_or_default();

    let studio = present(movie.production.as_deref())
        .and_then(|list| list.split(',').find_map(|name| present(Some(name))))
        .map(|name| StudioRef {
            name: name.to_string(),
            country: String::new(),
        });

    Ok(NormalizedMovie {
        source: ProviderTag::Omdb,
        external_ids: BTreeMap::from([(ExternalIdKind::Imdb, imdb_id)]),
        title,
        original_title: None,
        overview: present(movie.plot.as_deref()).map(str::to_string),
        content_rating: present(movie.rated.as_deref()).map(str::to_string),
        release_date: parse_date(movie.released.as_deref(), DATE_FORMAT),
        runtime_minutes: parse_runtime(movie.runtime.as_deref()),
        budget: None,
        revenue: None,
        domestic_gross: money_from_text(movie.box_office.as_deref()),
        studio,
        genres,
        ratings: ratings(&movie),
    })
}

/// The top-level `imdbRating` wins over the IMDb entry of `Ratings` because
/// only it comes with a vote count. One rating per source.
fn ratings(movie: &OmdbMovie) -> Vec<NormalizedRating> {
    let mut out: Vec<NormalizedRating> = Vec::new();

    if let Some((value, scale_max)) = parse_score(
        movie.imdb_rating.as_deref(),
        RatingSource::Imdb.default_scale_max(),
    ) {
        out.push(NormalizedRating {
            source: RatingSource::Imdb,
            value,
            scale_max,
            vote_count: parse_count(movie.imdb_votes.as_deref()),
        });
    }

    for rating in &movie.ratings {
        let Some(source) = rating_source(&rating.source) else {
            continue;
        };
        if out.iter().any(|r| r.source == source) {
            continue;
        }
        if let Some((value, scale_max)) =
            parse_score(Some(&rating.value), source.default_scale_max())
        {
            out.push(NormalizedRating {
                source,
                value,
                scale_max,
                vote_count: None,
            });
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn inception_detail() -> Value {
        json!({
            "Title": "Inception",
            "Year": "2010",
            "Rated": "PG-13",
            "Released": "16 Jul 2010",
            "Runtime": "148 min",
            "Genre": "Action, Adventure, Sci-Fi",
            "Director": "Christopher Nolan",
            "Plot": "A thief who steals corporate secrets through dream-sharing technology.",
            "Ratings": [
                {"Source": "Internet Movie Database", "Value": "8.8/10"},
                {"Source": "Rotten Tomatoes", "Value": "87%"},
                {"Source": "Metacritic", "Value": "74/100"},
                {"Source": "Letterboxd", "Value": "4.2/5"}
            ],
            "imdbRating": "8.8",
            "imdbVotes": "2,512,399",
            "imdbID": "tt1375666",
            "Type": "movie",
            "BoxOffice": "$292,587,330",
            "Production": "N/A",
            "Response": "True"
        })
    }

    #[test]
    fn detail_maps_ratings_with_their_scales() {
        let movie = normalize(&inception_detail()).unwrap();

        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2010, 7, 16));
        assert_eq!(movie.runtime_minutes, Some(148));
        assert_eq!(movie.domestic_gross, Some(dec!(292587330)));
        assert_eq!(movie.revenue, None);
        assert_eq!(movie.studio, None);
        assert_eq!(movie.genres.len(), 3);
        assert_eq!(movie.content_rating.as_deref(), Some("PG-13"));
        assert_eq!(movie.original_title, None);
        assert!(movie.overview.as_deref().is_some_and(|p| p.starts_with("A thief")));

        let by_source: Vec<_> = movie
            .ratings
            .iter()
            .map(|r| (r.source, r.value, r.scale_max, r.vote_count))
            .collect();
        assert_eq!(
            by_source,
            vec![
                (RatingSource::Imdb, dec!(8.8), dec!(10), Some(2_512_399)),
                (RatingSource::RottenTomatoes, dec!(87), dec!(100), None),
                (RatingSource::Metacritic, dec!(74), dec!(100), None),
            ]
        );
    }

    #[test]
    fn search_item_has_no_release_date() {
        let item = json!({
            "Title": "Inception",
            "Year": "2010",
            "imdbID": "tt1375666",
            "Type": "movie"
        });
        let movie = normalize(&item).unwrap();
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.content_rating, None);
        assert_eq!(movie.primary_external_id(), Some((ExternalIdKind::Imdb, "tt1375666")));
    }

    #[test]
    fn first_production_company_is_studio() {
        let item = json!({
            "Title": "X",
            "imdbID": "tt0000001",
            "Production": "Warner Bros., Legendary"
        });
        assert_eq!(normalize(&item).unwrap().studio.unwrap().name, "Warner Bros.");
    }

    #[test]
    fn missing_imdb_id_is_error() {
        let item = json!({"Title": "X", "imdbID": "N/A"});
        assert!(matches!(
            normalize(&item),
            Err(NormalizationError::MissingExternalId { .. })
        ));
    }
}
