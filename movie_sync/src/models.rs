//! Diesel models mapping to the database schema.
//!
//! These mirror the tables created by the embedded migrations:
//! - [`crate::schema::movies`]: one canonical movie, money as decimal text
//! - [`crate::schema::movie_external_ids`]: provider ids, the dedup key
//! - [`crate::schema::studios`] / [`crate::schema::genres`]: shared lookups
//! - [`crate::schema::movie_genres`]: movie to genre links
//! - [`crate::schema::ratings`]: one row per `(movie, source)`
//!
//! Decoding text columns into `Decimal`/`NaiveDate` happens in
//! [`crate::store::codec`], not here.

use diesel::prelude::*;

use crate::schema::*;

/// A row in [`crate::schema::movies`].
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = movies, check_for_backend(diesel::sqlite::Sqlite))]
pub struct MovieRow {
    pub id: i32,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    /// MPAA certification, e.g. `PG-13`.
    pub content_rating: Option<String>,
    /// `YYYY-MM-DD`.
    pub release_date: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub domestic_gross: Option<String>,
    /// Derived; written only by the metrics recompute.
    pub roi_percent: Option<String>,
    pub studio_id: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = movies)]
pub struct NewMovie<'a> {
    pub title: &'a str,
    pub original_title: Option<&'a str>,
    pub overview: Option<&'a str>,
    pub content_rating: Option<&'a str>,
    pub release_date: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub domestic_gross: Option<String>,
    pub roi_percent: Option<String>,
    pub studio_id: Option<i32>,
}

/// Fields the detail refresh may rewrite.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = movies, treat_none_as_null = true)]
pub struct MovieDetailChangeset {
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub content_rating: Option<String>,
    pub release_date: Option<String>,
    pub runtime_minutes: Option<i32>,
    pub budget: Option<String>,
    pub revenue: Option<String>,
    pub domestic_gross: Option<String>,
    pub studio_id: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = movie_external_ids, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(MovieRow, foreign_key = movie_id))]
pub struct ExternalIdRow {
    pub id: i32,
    pub movie_id: i32,
    /// Id namespace (`tmdb`, `imdb`).
    pub provider: String,
    pub external_id: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = movie_external_ids)]
pub struct NewExternalId<'a> {
    pub movie_id: i32,
    pub provider: &'a str,
    pub external_id: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = studios, check_for_backend(diesel::sqlite::Sqlite))]
pub struct StudioRow {
    pub id: i32,
    pub name: String,
    /// Case-folded, whitespace-collapsed `name`; the match key.
    pub name_key: String,
    pub country: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = studios)]
pub struct NewStudio<'a> {
    pub name: &'a str,
    pub name_key: &'a str,
    pub country: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = genres, check_for_backend(diesel::sqlite::Sqlite))]
pub struct GenreRow {
    pub id: i32,
    pub name: String,
    pub name_key: String,
    pub tmdb_id: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = genres)]
pub struct NewGenre<'a> {
    pub name: &'a str,
    pub name_key: &'a str,
    pub tmdb_id: Option<i64>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = movie_genres)]
pub struct MovieGenreLink {
    pub movie_id: i32,
    pub genre_id: i32,
}

/// A row in [`crate::schema::ratings`]. Unique per `(movie_id, source)`.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable)]
#[diesel(table_name = ratings, check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(belongs_to(MovieRow, foreign_key = movie_id))]
pub struct RatingRow {
    pub id: i32,
    pub movie_id: i32,
    pub source: String,
    pub value: String,
    pub scale_max: String,
    pub vote_count: Option<i64>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = ratings, treat_none_as_null = true)]
pub struct NewRating<'a> {
    pub movie_id: i32,
    pub source: &'a str,
    pub value: String,
    pub scale_max: String,
    pub vote_count: Option<i64>,
}
