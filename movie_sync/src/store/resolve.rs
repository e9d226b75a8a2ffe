//! Resolve-or-create for the shared studio and genre lookups.
//!
//! Both run inside the caller's transaction.

use diesel::prelude::*;
use movie_data_ingestor::models::movie::{GenreRef, StudioRef};
use tracing::debug;

use crate::{
    models::{GenreRow, NewGenre, NewStudio},
    schema::{genres, studios},
    store::StoreResult,
};

/// Collapses inner whitespace and trims.
pub fn display_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive match key for studio and genre names.
pub fn name_key(name: &str) -> String {
    display_name(name).to_lowercase()
}

/// Studio id for `studio`, created on first reference. `None` for a blank name.
pub fn resolve_studio(conn: &mut SqliteConnection, studio: &StudioRef) -> StoreResult<Option<i32>> {
    let name = display_name(&studio.name);
    if name.is_empty() {
        return Ok(None);
    }
    let key = name.to_lowercase();

    if let Some(id) = studios::table
        .filter(studios::name_key.eq(&key))
        .select(studios::id)
        .first::<i32>(conn)
        .optional()?
    {
        return Ok(Some(id));
    }

    let id: i32 = diesel::insert_into(studios::table)
        .values(&NewStudio {
            name: &name,
            name_key: &key,
            country: studio.country.trim(),
        })
        .returning(studios::id)
        .get_result(conn)?;
    debug!(studio = %name, id, "Created studio");
    Ok(Some(id))
}

/// Genre id for `genre`: provider id first, normalized name second.
///
/// A name match that lacks a provider id adopts the incoming one. A genre
/// known only by an unseen provider id cannot be created and yields `None`.
pub fn resolve_genre(conn: &mut SqliteConnection, genre: &GenreRef) -> StoreResult<Option<i32>> {
    if let Some(tmdb_id) = genre.tmdb_id {
        if let Some(id) = genres::table
            .filter(genres::tmdb_id.eq(tmdb_id))
            .select(genres::id)
            .first::<i32>(conn)
            .optional()?
        {
            return Ok(Some(id));
        }
    }

    let Some(name) = genre.name.as_deref().map(display_name).filter(|n| !n.is_empty()) else {
        debug!(tmdb_id = ?genre.tmdb_id, "Unresolvable genre reference");
        return Ok(None);
    };
    let key = name.to_lowercase();

    if let Some(row) = genres::table
        .filter(genres::name_key.eq(&key))
        .select(GenreRow::as_select())
        .first(conn)
        .optional()?
    {
        if row.tmdb_id.is_none() && genre.tmdb_id.is_some() {
            diesel::update(genres::table.find(row.id))
                .set(genres::tmdb_id.eq(genre.tmdb_id))
                .execute(conn)?;
        }
        return Ok(Some(row.id));
    }

    let id: i32 = diesel::insert_into(genres::table)
        .values(&NewGenre {
            name: &name,
            name_key: &key,
            tmdb_id: genre.tmdb_id,
        })
        .returning(genres::id)
        .get_result(conn)?;
    debug!(genre = %name, id, "Created genre");
    Ok(Some(id))
}
