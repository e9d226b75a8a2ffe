//! Genre and studio rollups, computed fresh per query.
//!
//! A group with no movie carrying revenue is left out of the ranking rather
//! than reported with zeros.

use std::cmp::Reverse;

use diesel::prelude::*;
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    metrics::portfolio::{FinancialRow, checked_sum, load_financials, mean},
    schema::{genres, movie_genres, studios},
    store::StoreResult,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreRollupRow {
    pub genre_id: i32,
    pub name: String,
    /// Every movie linked to the genre.
    pub movie_count: usize,
    /// Movies contributing to `avg_revenue`.
    pub movies_with_revenue: usize,
    pub avg_revenue: Decimal,
    pub avg_roi: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudioRollupRow {
    pub studio_id: i32,
    pub name: String,
    pub country: String,
    pub movie_count: usize,
    pub movies_with_revenue: usize,
    pub total_revenue: Decimal,
    pub avg_revenue: Decimal,
    pub avg_roi: Option<Decimal>,
}

#[derive(Default)]
struct Bucket {
    movie_count: usize,
    revenues: Vec<Decimal>,
    rois: Vec<Decimal>,
}

impl Bucket {
    fn add(&mut self, row: &FinancialRow) {
        self.movie_count += 1;
        self.revenues.extend(row.revenue);
        self.rois.extend(row.roi_percent);
    }
}

/// Genres by average revenue, highest first; ties by name.
pub fn genre_rollup(conn: &mut SqliteConnection, limit: usize) -> StoreResult<Vec<GenreRollupRow>> {
    let rows = load_financials(conn)?;
    let by_id: IndexMap<i32, &FinancialRow> = rows.iter().map(|r| (r.id, r)).collect();

    let links: Vec<(i32, i32, String)> = movie_genres::table
        .inner_join(genres::table)
        .order(genres::name.asc())
        .select((movie_genres::movie_id, genres::id, genres::name))
        .load(conn)?;

    let mut buckets: IndexMap<(i32, String), Bucket> = IndexMap::new();
    for (movie_id, genre_id, name) in links {
        if let Some(row) = by_id.get(&movie_id) {
            buckets.entry((genre_id, name)).or_default().add(row);
        }
    }

    let mut out = Vec::new();
    for ((genre_id, name), b) in buckets {
        let Some(avg_revenue) = mean(&b.revenues, "genre revenue")? else {
            continue;
        };
        out.push(GenreRollupRow {
            genre_id,
            name,
            movie_count: b.movie_count,
            movies_with_revenue: b.revenues.len(),
            avg_revenue,
            avg_roi: mean(&b.rois, "genre ROI")?,
        });
    }
    out.sort_by(|a, b| {
        Reverse(a.avg_revenue)
            .cmp(&Reverse(b.avg_revenue))
            .then_with(|| a.name.cmp(&b.name))
    });
    out.truncate(limit);
    Ok(out)
}

/// Studios by total revenue, highest first; ties by name.
pub fn studio_rollup(
    conn: &mut SqliteConnection,
    limit: usize,
) -> StoreResult<Vec<StudioRollupRow>> {
    let rows = load_financials(conn)?;
    let studio_rows: Vec<(i32, String, String)> = studios::table
        .order(studios::name.asc())
        .select((studios::id, studios::name, studios::country))
        .load(conn)?;

    let mut buckets: IndexMap<i32, Bucket> = IndexMap::new();
    for row in &rows {
        if let Some(studio_id) = row.studio_id {
            buckets.entry(studio_id).or_default().add(row);
        }
    }

    let mut out = Vec::new();
    for (studio_id, name, country) in studio_rows {
        let Some(b) = buckets.get(&studio_id) else {
            continue;
        };
        let Some(avg_revenue) = mean(&b.revenues, "studio revenue")? else {
            continue;
        };
        out.push(StudioRollupRow {
            studio_id,
            name,
            country,
            movie_count: b.movie_count,
            movies_with_revenue: b.revenues.len(),
            total_revenue: checked_sum(&b.revenues, "studio revenue")?,
            avg_revenue,
            avg_roi: mean(&b.rois, "studio ROI")?,
        });
    }
    out.sort_by(|a, b| {
        Reverse(a.total_revenue)
            .cmp(&Reverse(b.total_revenue))
            .then_with(|| a.name.cmp(&b.name))
    });
    out.truncate(limit);
    Ok(out)
}
