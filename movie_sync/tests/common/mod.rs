#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use diesel::{
    QueryableByName,
    prelude::*,
    sql_types::{Integer, Text},
};
use movie_data_ingestor::{
    models::raw::{CatalogGenre, ListingPage, ProviderTag, RawItem},
    providers::{
        MovieSource, SourceError,
        errors::{PermanentSnafu, RateLimitedSnafu},
    },
    rate_guard::{GovernorPolicy, SourceGovernor},
};
use movie_sync::{
    db::{connection, migrate},
    store::Store,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::time::Instant;

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}
#[derive(QueryableByName)]
struct ForeignKeys {
    #[diesel(sql_type = Integer)]
    foreign_keys: i32,
}
#[derive(QueryableByName)]
struct BusyTimeout {
    #[diesel(sql_type = Integer, column_name = "timeout")]
    busy_timeout: i32,
}
#[derive(QueryableByName)]
struct Cnt {
    #[diesel(sql_type = Integer)]
    cnt: i32,
}

pub struct TestDb {
    _dir: TempDir,    // keep alive for the life of the test
    pub path: String, // <tmpdir>/movies.db
}

pub fn temp_db() -> TestDb {
    let dir = TempDir::new().expect("tempdir");
    let mut p = PathBuf::from(dir.path());
    p.push("movies.db");
    let path = p.to_string_lossy().to_string();
    TestDb { _dir: dir, path }
}

/// Migrated database plus a raw connection with PRAGMAs applied.
pub fn setup_db() -> (TestDb, SqliteConnection) {
    let db = temp_db();
    migrate::run_sqlite(&db.path).expect("migrations");
    let conn = connection::connect_sqlite(&db.path).expect("connect");
    (db, conn)
}

/// Migrated database behind a store handle.
pub fn setup_store() -> (TestDb, Store) {
    let db = temp_db();
    let store = Store::open(&db.path).expect("open store");
    (db, store)
}

pub fn assert_sqlite_pragmas(conn: &mut SqliteConnection) {
    use diesel::sql_query;

    let jm: JournalMode = sql_query("PRAGMA journal_mode;").get_result(conn).unwrap();
    assert_eq!(jm.journal_mode.to_lowercase(), "wal");

    let fk: ForeignKeys = sql_query("PRAGMA foreign_keys;").get_result(conn).unwrap();
    assert_eq!(fk.foreign_keys, 1);

    let bt: BusyTimeout = sql_query("PRAGMA busy_timeout;").get_result(conn).unwrap();
    assert_eq!(bt.busy_timeout, 5000);
}

pub fn fk_check_empty(conn: &mut SqliteConnection) {
    let rows: Cnt = diesel::sql_query("SELECT COUNT(*) AS cnt FROM pragma_foreign_key_check;")
        .get_result(conn)
        .unwrap();
    assert_eq!(rows.cnt, 0, "foreign key violations present");
}

pub fn count(conn: &mut SqliteConnection, table: &str) -> i32 {
    let row: Cnt = diesel::sql_query(format!("SELECT COUNT(*) AS cnt FROM {table};"))
        .get_result(conn)
        .unwrap();
    row.cnt
}

/// TMDb listing item: no money, genres by id only.
pub fn tmdb_listing_item(id: i64, title: &str, release_date: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "release_date": release_date,
        "genre_ids": [28, 878],
        "vote_average": 7.4,
        "vote_count": 1200
    })
}

/// TMDb detail payload with money, named genres and a studio.
pub fn tmdb_detail(id: i64, title: &str, budget: u64, revenue: u64) -> Value {
    json!({
        "id": id,
        "imdb_id": format!("tt{:07}", id),
        "title": title,
        "release_date": "2010-07-15",
        "runtime": 148,
        "budget": budget,
        "revenue": revenue,
        "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}],
        "production_companies": [{"name": "Legendary Pictures", "origin_country": "US"}],
        "vote_average": 8.4,
        "vote_count": 35000
    })
}

pub fn raw(payload: Value) -> RawItem {
    RawItem::new(ProviderTag::Tmdb, payload)
}

pub fn page(page: u32, total_pages: u32, items: Vec<Value>) -> Result<ListingPage, SourceError> {
    Ok(ListingPage {
        page,
        total_pages,
        items: items.into_iter().map(raw).collect(),
    })
}

pub fn rate_limited(after_secs: u64) -> Result<ListingPage, SourceError> {
    RateLimitedSnafu {
        provider: ProviderTag::Tmdb,
        retry_after: Some(std::time::Duration::from_secs(after_secs)),
    }
    .fail()
}

#[derive(Default)]
struct FakeState {
    listings: HashMap<u32, VecDeque<Result<ListingPage, SourceError>>>,
    details: HashMap<String, Value>,
    genres: Vec<CatalogGenre>,
    calls: Vec<(String, Instant)>,
}

/// Scripted in-memory TMDb source.
///
/// Listing outcomes are queued per page and replayed in order; an exhausted
/// queue yields an empty last page. Details are served from a map.
#[derive(Clone, Default)]
pub struct FakeSource {
    state: Arc<Mutex<FakeState>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_listing(&self, page: u32, outcome: Result<ListingPage, SourceError>) -> &Self {
        self.state
            .lock()
            .unwrap()
            .listings
            .entry(page)
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn with_detail(&self, id: &str, payload: Value) -> &Self {
        self.state.lock().unwrap().details.insert(id.to_string(), payload);
        self
    }

    pub fn with_genres(&self, genres: &[(i64, &str)]) -> &Self {
        self.state.lock().unwrap().genres = genres
            .iter()
            .map(|(id, name)| CatalogGenre {
                id: *id,
                name: name.to_string(),
            })
            .collect();
        self
    }

    /// Calls made so far, e.g. `listing:1`, `detail:27205`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().calls.iter().map(|(_, t)| *t).collect()
    }

    pub fn governor(&self) -> SourceGovernor {
        SourceGovernor::new(Box::new(self.clone()), GovernorPolicy::unpaced())
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push((call, Instant::now()));
    }
}

#[async_trait]
impl MovieSource for FakeSource {
    fn provider(&self) -> ProviderTag {
        ProviderTag::Tmdb
    }

    async fn fetch_listing(&self, page: u32) -> Result<ListingPage, SourceError> {
        self.record(format!("listing:{page}"));
        let mut state = self.state.lock().unwrap();
        state
            .listings
            .get_mut(&page)
            .and_then(|q| q.pop_front())
            .unwrap_or_else(|| Ok(ListingPage::empty(page)))
    }

    /// Ids `401` and `429` fail as permanent and rate-limited respectively.
    async fn fetch_detail(&self, external_id: &str) -> Result<Option<RawItem>, SourceError> {
        self.record(format!("detail:{external_id}"));
        if external_id == "429" {
            return RateLimitedSnafu {
                provider: ProviderTag::Tmdb,
                retry_after: None::<std::time::Duration>,
            }
            .fail();
        }
        if external_id == "401" {
            return PermanentSnafu {
                provider: ProviderTag::Tmdb,
                status: Some(401u16),
                message: "Invalid API key",
            }
            .fail();
        }
        let state = self.state.lock().unwrap();
        Ok(state.details.get(external_id).cloned().map(raw))
    }

    async fn fetch_genre_catalog(&self) -> Result<Vec<CatalogGenre>, SourceError> {
        self.record("genres".to_string());
        Ok(self.state.lock().unwrap().genres.clone())
    }
}
