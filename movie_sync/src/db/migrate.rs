//! Embedded schema migrations.

use anyhow::{Context, anyhow};
use diesel::{Connection, SqliteConnection, connection::SimpleConnection};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::info;

use crate::db::connection::sqlite_path;

/// Embedded Diesel migrations bundled with this crate.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Runs pending migrations on the SQLite database at `url`, creating the file if needed.
pub fn run_sqlite(url: &str) -> anyhow::Result<()> {
    let path = sqlite_path(url);
    let mut conn = SqliteConnection::establish(path)
        .with_context(|| format!("open sqlite database {path}"))?;
    conn.batch_execute("PRAGMA journal_mode=WAL;")?;
    run_pending(&mut conn)
}

/// Runs pending migrations on an already-open connection.
pub fn run_pending(conn: &mut SqliteConnection) -> anyhow::Result<()> {
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| anyhow!(e))?;
    if !applied.is_empty() {
        info!(count = applied.len(), "Applied migrations");
    }
    Ok(())
}
