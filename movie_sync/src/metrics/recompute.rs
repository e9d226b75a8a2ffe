//! Writes the derived `roi_percent` column.
//!
//! Callers invoke [`recompute_roi`] inside the same transaction that changed
//! `budget` or `revenue`, so the stored ROI is never stale relative to them.

use diesel::prelude::*;
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    metrics::roi_percent,
    schema::movies,
    store::{StoreError, StoreResult, codec::read_decimal},
};

/// Recomputes ROI from the stored budget and revenue. Returns the new value.
pub fn recompute_roi(conn: &mut SqliteConnection, movie_id: i32) -> StoreResult<Option<Decimal>> {
    let (budget, revenue, stored): (Option<String>, Option<String>, Option<String>) = movies::table
        .find(movie_id)
        .select((movies::budget, movies::revenue, movies::roi_percent))
        .first(conn)
        .optional()?
        .ok_or(StoreError::UnknownMovie { movie_id })?;

    let roi = roi_percent(
        read_decimal("movies.budget", budget.as_deref())?,
        read_decimal("movies.revenue", revenue.as_deref())?,
    );
    let text = roi.map(|r| r.to_string());

    if text != stored {
        diesel::update(movies::table.find(movie_id))
            .set(movies::roi_percent.eq(text.as_deref()))
            .execute(conn)?;
        debug!(movie_id, roi = ?text, "Recomputed ROI");
    }
    Ok(roi)
}

/// Recomputes every movie. Returns how many rows changed.
pub fn recompute_all(conn: &mut SqliteConnection) -> StoreResult<usize> {
    let ids: Vec<(i32, Option<String>)> = movies::table
        .select((movies::id, movies::roi_percent))
        .load(conn)?;

    let mut changed = 0;
    for (movie_id, before) in ids {
        let after = recompute_roi(conn, movie_id)?;
        if after.map(|r| r.to_string()) != before {
            changed += 1;
        }
    }
    Ok(changed)
}
