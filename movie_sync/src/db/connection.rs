//! SQLite connection helpers.
//!
//! [`connect_sqlite`] opens a connection and applies the PRAGMAs every store
//! handle relies on: WAL journaling, `foreign_keys=ON` (rating and link rows
//! cascade with their movie) and a 5000ms `busy_timeout`.
//!
//! ```no_run
//! use movie_sync::db::connection::connect_sqlite;
//!
//! let path = std::env::temp_dir().join("movie_sync_example.db");
//! let _conn = connect_sqlite(path.to_str().unwrap()).expect("open sqlite");
//! ```

use anyhow::Context;
use diesel::{Connection, RunQueryDsl, SqliteConnection, sql_query};

/// Strips an optional `sqlite:` / `sqlite://` prefix so URLs and bare paths both work.
pub fn sqlite_path(database_url: &str) -> &str {
    database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url)
}

/// Open a SQLite connection and apply connection-wide PRAGMAs.
pub fn connect_sqlite(database_url: &str) -> anyhow::Result<SqliteConnection> {
    let path = sqlite_path(database_url);
    let mut conn = SqliteConnection::establish(path)
        .with_context(|| format!("open sqlite database {path}"))?;

    sql_query("PRAGMA journal_mode=WAL;").execute(&mut conn)?;
    sql_query("PRAGMA foreign_keys=ON;").execute(&mut conn)?;
    sql_query("PRAGMA busy_timeout=5000;").execute(&mut conn)?;
    Ok(conn)
}
