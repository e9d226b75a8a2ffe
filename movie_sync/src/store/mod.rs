//! Movie store: the dedup/upsert engine and the explicit store handle.
//!
//! [`MovieRepo`] is the portable surface; [`repo::SqliteMovieRepo`] implements
//! it over Diesel. Repo methods assume they run inside a transaction. The
//! [`Store`] handle owns one connection and wraps every write in its own
//! `BEGIN IMMEDIATE` transaction, so one item's side effects are applied
//! together or not at all.

pub mod codec;
pub mod repo;
pub mod resolve;

use std::collections::BTreeMap;

use anyhow::Context;
use chrono::NaiveDate;
use diesel::{Connection, SqliteConnection};
use movie_data_ingestor::models::{
    movie::{ExternalIdKind, NormalizedMovie, RatingSource},
    raw::CatalogGenre,
};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    db::{connection::connect_sqlite, migrate},
    metrics::{self, BudgetTier, PerformanceTier},
    store::repo::SqliteMovieRepo,
};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// New records must carry a parsed release date.
    #[error("{external_id} has no release date and matches no stored movie")]
    MissingReleaseDate { external_id: String },

    #[error("record {title:?} carries no external id")]
    MissingExternalId { title: String },

    #[error("movie {movie_id} does not exist")]
    UnknownMovie { movie_id: i32 },

    /// Reserved for concurrent-writer detection; never raised while the
    /// store assumes a single writer.
    #[error("movie {movie_id} was modified by another writer")]
    PersistenceConflict { movie_id: i32 },

    #[error("column {column} holds an unreadable value {value:?}")]
    CorruptValue { column: &'static str, value: String },

    #[error("{what} overflows the decimal range")]
    Overflow { what: &'static str },

    #[error(transparent)]
    Database(#[from] diesel::result::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// What [`MovieRepo::upsert`] did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created { movie_id: i32 },
    /// Matched an existing movie; nothing was written.
    Unchanged { movie_id: i32 },
}

impl UpsertOutcome {
    pub fn movie_id(self) -> i32 {
        match self {
            UpsertOutcome::Created { movie_id } | UpsertOutcome::Unchanged { movie_id } => movie_id,
        }
    }

    pub fn created(self) -> bool {
        matches!(self, UpsertOutcome::Created { .. })
    }
}

/// What [`MovieRepo::apply_detail`] did with a detail payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailOutcome {
    Updated {
        movie_id: i32,
        roi_percent: Option<Decimal>,
    },
    Unchanged {
        movie_id: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Studio {
    pub id: i32,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
    pub tmdb_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rating {
    pub source: RatingSource,
    pub value: Decimal,
    pub scale_max: Decimal,
    pub vote_count: Option<i64>,
}

/// A stored movie with its lookups and ratings decoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub content_rating: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub budget: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub domestic_gross: Option<Decimal>,
    pub roi_percent: Option<Decimal>,
    pub studio: Option<Studio>,
    pub genres: Vec<Genre>,
    pub external_ids: BTreeMap<ExternalIdKind, String>,
    /// Ordered by source.
    pub ratings: Vec<Rating>,
}

impl Movie {
    pub fn budget_tier(&self) -> BudgetTier {
        metrics::budget_tier(self.budget)
    }

    pub fn performance_tier(&self) -> PerformanceTier {
        metrics::performance_tier(self.roi_percent)
    }

    pub fn is_profitable(&self) -> Option<bool> {
        metrics::is_profitable(self.budget, self.revenue)
    }

    pub fn rating(&self, source: RatingSource) -> Option<&Rating> {
        self.ratings.iter().find(|r| r.source == source)
    }
}

/// Portable surface, SQLite implementation lives in `repo.rs`.
pub trait MovieRepo {
    /// Create-or-match. Existing movies are never modified by this path.
    fn upsert(
        &self,
        conn: &mut SqliteConnection,
        movie: &NormalizedMovie,
    ) -> StoreResult<UpsertOutcome>;

    /// The explicit update path: refresh ratings in place, set financial
    /// fields present in `movie`, attach unseen external ids, recompute ROI.
    fn apply_detail(
        &self,
        conn: &mut SqliteConnection,
        movie_id: i32,
        movie: &NormalizedMovie,
    ) -> StoreResult<DetailOutcome>;

    /// Removes a movie and everything it owns. Returns false if it did not exist.
    fn delete_movie(&self, conn: &mut SqliteConnection, movie_id: i32) -> StoreResult<bool>;

    fn get_movie(&self, conn: &mut SqliteConnection, movie_id: i32) -> StoreResult<Option<Movie>>;

    fn find_by_external_id(
        &self,
        conn: &mut SqliteConnection,
        kind: ExternalIdKind,
        external_id: &str,
    ) -> StoreResult<Option<i32>>;

    /// Registers catalog genres by provider id. Returns how many were new.
    fn seed_genres(
        &self,
        conn: &mut SqliteConnection,
        catalog: &[CatalogGenre],
    ) -> StoreResult<usize>;

    /// `(movie_id, external_id)` for movies carrying an id in `kind`, by movie id.
    fn external_ids_for(
        &self,
        conn: &mut SqliteConnection,
        kind: ExternalIdKind,
        limit: Option<i64>,
    ) -> StoreResult<Vec<(i32, String)>>;

    fn movie_count(&self, conn: &mut SqliteConnection) -> StoreResult<i64>;
}

/// Explicit store handle: one connection, one per pipeline run.
///
/// Dropping the handle closes the connection.
pub struct Store {
    conn: SqliteConnection,
    repo: SqliteMovieRepo,
}

impl Store {
    /// Applies pending migrations, then connects with the standard PRAGMAs.
    pub fn open(database_url: &str) -> anyhow::Result<Self> {
        migrate::run_sqlite(database_url).context("run migrations")?;
        let conn = connect_sqlite(database_url)?;
        Ok(Self::from_connection(conn))
    }

    /// Wraps a connection whose schema is already migrated.
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn,
            repo: SqliteMovieRepo::new(),
        }
    }

    /// Read access for the aggregate queries in [`crate::metrics`].
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    pub fn upsert(&mut self, movie: &NormalizedMovie) -> StoreResult<UpsertOutcome> {
        let repo = &self.repo;
        self.conn
            .immediate_transaction(|conn| repo.upsert(conn, movie))
    }

    pub fn apply_detail(
        &mut self,
        movie_id: i32,
        movie: &NormalizedMovie,
    ) -> StoreResult<DetailOutcome> {
        let repo = &self.repo;
        self.conn
            .immediate_transaction(|conn| repo.apply_detail(conn, movie_id, movie))
    }

    pub fn delete_movie(&mut self, movie_id: i32) -> StoreResult<bool> {
        let repo = &self.repo;
        self.conn
            .immediate_transaction(|conn| repo.delete_movie(conn, movie_id))
    }

    pub fn seed_genres(&mut self, catalog: &[CatalogGenre]) -> StoreResult<usize> {
        let repo = &self.repo;
        self.conn
            .immediate_transaction(|conn| repo.seed_genres(conn, catalog))
    }

    /// Re-derives every stored ROI in one transaction. Returns how many changed.
    pub fn recompute_all(&mut self) -> StoreResult<usize> {
        self.conn
            .immediate_transaction(|conn| metrics::recompute::recompute_all(conn))
    }

    pub fn get_movie(&mut self, movie_id: i32) -> StoreResult<Option<Movie>> {
        self.repo.get_movie(&mut self.conn, movie_id)
    }

    pub fn find_by_external_id(
        &mut self,
        kind: ExternalIdKind,
        external_id: &str,
    ) -> StoreResult<Option<i32>> {
        self.repo.find_by_external_id(&mut self.conn, kind, external_id)
    }

    /// First stored movie matching any id in `movie`, primary namespace first.
    pub fn find_match(&mut self, movie: &NormalizedMovie) -> StoreResult<Option<i32>> {
        self.repo.match_existing(&mut self.conn, movie)
    }

    pub fn external_ids_for(
        &mut self,
        kind: ExternalIdKind,
        limit: Option<i64>,
    ) -> StoreResult<Vec<(i32, String)>> {
        self.repo.external_ids_for(&mut self.conn, kind, limit)
    }

    pub fn movie_count(&mut self) -> StoreResult<i64> {
        self.repo.movie_count(&mut self.conn)
    }
}
