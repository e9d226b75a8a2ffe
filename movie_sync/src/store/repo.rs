use std::collections::BTreeMap;

use diesel::prelude::*;
use movie_data_ingestor::models::{
    movie::{ExternalIdKind, GenreRef, NormalizedMovie, NormalizedRating, RatingSource},
    raw::CatalogGenre,
};
use tracing::{debug, info, warn};

use crate::{
    metrics::recompute::recompute_roi,
    models::{
        ExternalIdRow, GenreRow, MovieDetailChangeset, MovieGenreLink, MovieRow, NewExternalId,
        NewMovie, NewRating, RatingRow, StudioRow,
    },
    schema::{genres, movie_external_ids, movie_genres, movies, ratings, studios},
    store::{
        DetailOutcome, Genre, Movie, MovieRepo, Rating, StoreError, StoreResult, Studio,
        UpsertOutcome,
        codec::{date_text, decimal_text, now_text, read_date, read_decimal},
        resolve::{resolve_genre, resolve_studio},
    },
};

/// Repository for movies and their dependents in a SQLite database.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteMovieRepo;

impl SqliteMovieRepo {
    pub fn new() -> Self {
        Self
    }

    /// Primary namespace first, then every other id the record carries.
    pub(crate) fn match_existing(
        &self,
        conn: &mut SqliteConnection,
        movie: &NormalizedMovie,
    ) -> StoreResult<Option<i32>> {
        let primary = movie.primary_external_id();
        let others = movie
            .external_ids
            .iter()
            .map(|(kind, id)| (*kind, id.as_str()))
            .filter(|(kind, _)| primary.map(|(p, _)| p) != Some(*kind));

        for (kind, id) in primary.into_iter().chain(others) {
            if let Some(movie_id) = self.find_by_external_id(conn, kind, id)? {
                return Ok(Some(movie_id));
            }
        }
        Ok(None)
    }
}

/// Links every resolvable genre. Returns how many links are new.
fn link_genres(
    conn: &mut SqliteConnection,
    movie_id: i32,
    refs: &[GenreRef],
) -> StoreResult<usize> {
    let mut linked = 0;
    for genre in refs {
        let Some(genre_id) = resolve_genre(conn, genre)? else {
            continue;
        };
        linked += diesel::insert_into(movie_genres::table)
            .values(&MovieGenreLink { movie_id, genre_id })
            .on_conflict_do_nothing()
            .execute(conn)?;
    }
    Ok(linked)
}

/// Insert or update in place on `(movie_id, source)`. Returns false when the
/// stored rating already matches.
fn upsert_rating(
    conn: &mut SqliteConnection,
    movie_id: i32,
    rating: &NormalizedRating,
) -> StoreResult<bool> {
    let row = NewRating {
        movie_id,
        source: rating.source.as_str(),
        value: decimal_text(rating.value),
        scale_max: decimal_text(rating.scale_max),
        vote_count: rating.vote_count,
    };

    let existing = ratings::table
        .filter(ratings::movie_id.eq(movie_id).and(ratings::source.eq(row.source)))
        .select(RatingRow::as_select())
        .first(conn)
        .optional()?;
    if let Some(e) = existing {
        if e.value == row.value && e.scale_max == row.scale_max && e.vote_count == row.vote_count {
            return Ok(false);
        }
    }

    diesel::insert_into(ratings::table)
        .values(&row)
        .on_conflict((ratings::movie_id, ratings::source))
        .do_update()
        .set((&row, ratings::updated_at.eq(now_text())))
        .execute(conn)?;
    Ok(true)
}

fn decode_movie(
    row: MovieRow,
    studio: Option<StudioRow>,
    genre_rows: Vec<GenreRow>,
    id_rows: Vec<ExternalIdRow>,
    rating_rows: Vec<RatingRow>,
) -> StoreResult<Movie> {
    let mut external_ids = BTreeMap::new();
    for r in id_rows {
        let kind = ExternalIdKind::parse(&r.provider).ok_or_else(|| StoreError::CorruptValue {
            column: "movie_external_ids.provider",
            value: r.provider.clone(),
        })?;
        external_ids.insert(kind, r.external_id);
    }

    let mut ratings = Vec::with_capacity(rating_rows.len());
    for r in rating_rows {
        let source = RatingSource::parse(&r.source).ok_or_else(|| StoreError::CorruptValue {
            column: "ratings.source",
            value: r.source.clone(),
        })?;
        ratings.push(Rating {
            source,
            value: read_decimal("ratings.value", Some(&r.value))?.unwrap_or_default(),
            scale_max: read_decimal("ratings.scale_max", Some(&r.scale_max))?.unwrap_or_default(),
            vote_count: r.vote_count,
        });
    }
    ratings.sort_by_key(|r| r.source);

    Ok(Movie {
        id: row.id,
        release_date: read_date("movies.release_date", row.release_date.as_deref())?,
        runtime_minutes: row.runtime_minutes,
        budget: read_decimal("movies.budget", row.budget.as_deref())?,
        revenue: read_decimal("movies.revenue", row.revenue.as_deref())?,
        domestic_gross: read_decimal("movies.domestic_gross", row.domestic_gross.as_deref())?,
        roi_percent: read_decimal("movies.roi_percent", row.roi_percent.as_deref())?,
        title: row.title,
        original_title: row.original_title,
        overview: row.overview,
        content_rating: row.content_rating,
        studio: studio.map(|s| Studio {
            id: s.id,
            name: s.name,
            country: s.country,
        }),
        genres: genre_rows
            .into_iter()
            .map(|g| Genre {
                id: g.id,
                name: g.name,
                tmdb_id: g.tmdb_id,
            })
            .collect(),
        external_ids,
        ratings,
    })
}

impl MovieRepo for SqliteMovieRepo {
    fn upsert(
        &self,
        conn: &mut SqliteConnection,
        movie: &NormalizedMovie,
    ) -> StoreResult<UpsertOutcome> {
        if movie.external_ids.is_empty() {
            return Err(StoreError::MissingExternalId {
                title: movie.title.clone(),
            });
        }

        if let Some(movie_id) = self.match_existing(conn, movie)? {
            debug!(key = %movie.log_key(), movie_id, "Matched existing movie");
            return Ok(UpsertOutcome::Unchanged { movie_id });
        }

        let Some(release_date) = movie.release_date else {
            return Err(StoreError::MissingReleaseDate {
                external_id: movie.log_key(),
            });
        };

        let studio_id = match &movie.studio {
            Some(studio) => resolve_studio(conn, studio)?,
            None => None,
        };

        let new = NewMovie {
            title: movie.title.trim(),
            original_title: movie.original_title.as_deref(),
            overview: movie.overview.as_deref(),
            content_rating: movie.content_rating.as_deref(),
            release_date: Some(date_text(release_date)),
            runtime_minutes: movie.runtime_minutes,
            budget: movie.budget.map(decimal_text),
            revenue: movie.revenue.map(decimal_text),
            domestic_gross: movie.domestic_gross.map(decimal_text),
            roi_percent: None,
            studio_id,
        };
        let movie_id: i32 = diesel::insert_into(movies::table)
            .values(&new)
            .returning(movies::id)
            .get_result(conn)?;

        for (kind, external_id) in &movie.external_ids {
            diesel::insert_into(movie_external_ids::table)
                .values(&NewExternalId {
                    movie_id,
                    provider: kind.as_str(),
                    external_id,
                })
                .execute(conn)?;
        }

        link_genres(conn, movie_id, &movie.genres)?;
        for rating in &movie.ratings {
            upsert_rating(conn, movie_id, rating)?;
        }
        recompute_roi(conn, movie_id)?;

        info!(key = %movie.log_key(), movie_id, title = %new.title, "Created movie");
        Ok(UpsertOutcome::Created { movie_id })
    }

    fn apply_detail(
        &self,
        conn: &mut SqliteConnection,
        movie_id: i32,
        movie: &NormalizedMovie,
    ) -> StoreResult<DetailOutcome> {
        let current: MovieRow = movies::table
            .find(movie_id)
            .select(MovieRow::as_select())
            .first(conn)
            .optional()?
            .ok_or(StoreError::UnknownMovie { movie_id })?;

        let studio_id = match (current.studio_id, &movie.studio) {
            (Some(id), _) => Some(id),
            (None, Some(studio)) => resolve_studio(conn, studio)?,
            (None, None) => None,
        };

        // Financial fields present in the payload win; everything else only
        // fills gaps.
        let changes = MovieDetailChangeset {
            original_title: current.original_title.clone().or_else(|| movie.original_title.clone()),
            overview: current.overview.clone().or_else(|| movie.overview.clone()),
            content_rating: current.content_rating.clone().or_else(|| movie.content_rating.clone()),
            release_date: current
                .release_date
                .clone()
                .or_else(|| movie.release_date.map(date_text)),
            runtime_minutes: current.runtime_minutes.or(movie.runtime_minutes),
            budget: movie.budget.map(decimal_text).or_else(|| current.budget.clone()),
            revenue: movie.revenue.map(decimal_text).or_else(|| current.revenue.clone()),
            domestic_gross: movie
                .domestic_gross
                .map(decimal_text)
                .or_else(|| current.domestic_gross.clone()),
            studio_id,
        };

        let mut changed = changes.original_title != current.original_title
            || changes.overview != current.overview
            || changes.content_rating != current.content_rating
            || changes.release_date != current.release_date
            || changes.runtime_minutes != current.runtime_minutes
            || changes.budget != current.budget
            || changes.revenue != current.revenue
            || changes.domestic_gross != current.domestic_gross
            || changes.studio_id != current.studio_id;
        if changed {
            diesel::update(movies::table.find(movie_id))
                .set(&changes)
                .execute(conn)?;
        }

        for (kind, external_id) in &movie.external_ids {
            match self.find_by_external_id(conn, *kind, external_id)? {
                Some(owner) if owner == movie_id => {}
                Some(owner) => {
                    warn!(
                        movie_id,
                        owner,
                        %kind,
                        %external_id,
                        "External id belongs to another movie; not attached"
                    );
                }
                None => {
                    let has_kind = movie_external_ids::table
                        .filter(
                            movie_external_ids::movie_id
                                .eq(movie_id)
                                .and(movie_external_ids::provider.eq(kind.as_str())),
                        )
                        .select(movie_external_ids::id)
                        .first::<i32>(conn)
                        .optional()?
                        .is_some();
                    if has_kind {
                        warn!(
                            movie_id,
                            %kind,
                            %external_id,
                            "Movie already has a different id in this namespace"
                        );
                        continue;
                    }
                    diesel::insert_into(movie_external_ids::table)
                        .values(&NewExternalId {
                            movie_id,
                            provider: kind.as_str(),
                            external_id,
                        })
                        .execute(conn)?;
                    changed = true;
                }
            }
        }

        changed |= link_genres(conn, movie_id, &movie.genres)? > 0;
        for rating in &movie.ratings {
            changed |= upsert_rating(conn, movie_id, rating)?;
        }

        let roi_percent = recompute_roi(conn, movie_id)?;

        if changed {
            info!(movie_id, roi = ?roi_percent, "Applied detail update");
            Ok(DetailOutcome::Updated { movie_id, roi_percent })
        } else {
            Ok(DetailOutcome::Unchanged { movie_id })
        }
    }

    fn delete_movie(&self, conn: &mut SqliteConnection, movie_id: i32) -> StoreResult<bool> {
        // Dependents are removed explicitly rather than relying on the FK cascade.
        diesel::delete(ratings::table.filter(ratings::movie_id.eq(movie_id))).execute(conn)?;
        diesel::delete(movie_genres::table.filter(movie_genres::movie_id.eq(movie_id)))
            .execute(conn)?;
        diesel::delete(movie_external_ids::table.filter(movie_external_ids::movie_id.eq(movie_id)))
            .execute(conn)?;
        let deleted = diesel::delete(movies::table.find(movie_id)).execute(conn)?;

        if deleted > 0 {
            info!(movie_id, "Deleted movie");
        }
        Ok(deleted > 0)
    }

    fn get_movie(&self, conn: &mut SqliteConnection, movie_id: i32) -> StoreResult<Option<Movie>> {
        let Some(row) = movies::table
            .find(movie_id)
            .select(MovieRow::as_select())
            .first(conn)
            .optional()?
        else {
            return Ok(None);
        };

        let studio = match row.studio_id {
            Some(id) => studios::table
                .find(id)
                .select(StudioRow::as_select())
                .first(conn)
                .optional()?,
            None => None,
        };
        let genre_rows: Vec<GenreRow> = movie_genres::table
            .inner_join(genres::table)
            .filter(movie_genres::movie_id.eq(movie_id))
            .order(genres::name.asc())
            .select(GenreRow::as_select())
            .load(conn)?;
        let id_rows: Vec<ExternalIdRow> = ExternalIdRow::belonging_to(&row)
            .select(ExternalIdRow::as_select())
            .load(conn)?;
        let rating_rows: Vec<RatingRow> = RatingRow::belonging_to(&row)
            .select(RatingRow::as_select())
            .load(conn)?;

        decode_movie(row, studio, genre_rows, id_rows, rating_rows).map(Some)
    }

    fn find_by_external_id(
        &self,
        conn: &mut SqliteConnection,
        kind: ExternalIdKind,
        external_id: &str,
    ) -> StoreResult<Option<i32>> {
        Ok(movie_external_ids::table
            .filter(
                movie_external_ids::provider
                    .eq(kind.as_str())
                    .and(movie_external_ids::external_id.eq(external_id.trim())),
            )
            .select(movie_external_ids::movie_id)
            .first::<i32>(conn)
            .optional()?)
    }

    fn seed_genres(
        &self,
        conn: &mut SqliteConnection,
        catalog: &[CatalogGenre],
    ) -> StoreResult<usize> {
        let mut created = 0;
        for entry in catalog {
            let known = genres::table
                .filter(genres::tmdb_id.eq(entry.id))
                .select(genres::id)
                .first::<i32>(conn)
                .optional()?
                .is_some();
            if known {
                continue;
            }
            let genre = GenreRef {
                tmdb_id: Some(entry.id),
                name: Some(entry.name.clone()),
            };
            if resolve_genre(conn, &genre)?.is_some() {
                created += 1;
            }
        }
        Ok(created)
    }

    fn external_ids_for(
        &self,
        conn: &mut SqliteConnection,
        kind: ExternalIdKind,
        limit: Option<i64>,
    ) -> StoreResult<Vec<(i32, String)>> {
        let mut query = movie_external_ids::table
            .filter(movie_external_ids::provider.eq(kind.as_str()))
            .order(movie_external_ids::movie_id.asc())
            .select((movie_external_ids::movie_id, movie_external_ids::external_id))
            .into_boxed();
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        Ok(query.load(conn)?)
    }

    fn movie_count(&self, conn: &mut SqliteConnection) -> StoreResult<i64> {
        Ok(movies::table.count().get_result(conn)?)
    }
}
