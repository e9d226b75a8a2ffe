//! Portfolio-level queries over the whole movie collection.
//!
//! Money and ROI are stored as text, so ordering and sums happen here over
//! decoded `Decimal`s rather than in SQL.

use std::{cmp::Reverse, fmt, str::FromStr};

use chrono::{Datelike, NaiveDate};
use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    metrics::{BudgetTier, PerformanceTier, budget_tier, performance_tier, roi_percent},
    schema::{genres, movie_genres, movies, studios},
    store::{
        StoreError, StoreResult,
        codec::{read_date, read_decimal},
    },
};

/// ROI above this marks a training row as successful.
const SUCCESS_ROI: i64 = 50;

#[derive(Debug, Clone)]
pub struct FinancialRow {
    pub id: i32,
    pub title: String,
    pub content_rating: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub runtime_minutes: Option<i32>,
    pub budget: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub roi_percent: Option<Decimal>,
    pub studio_id: Option<i32>,
}

type RawFinancials = (
    i32,
    String,
    Option<String>,
    Option<String>,
    Option<i32>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i32>,
);

pub(crate) fn load_financials(conn: &mut SqliteConnection) -> StoreResult<Vec<FinancialRow>> {
    let raw: Vec<RawFinancials> = movies::table
        .order(movies::id.asc())
        .select((
            movies::id,
            movies::title,
            movies::content_rating,
            movies::release_date,
            movies::runtime_minutes,
            movies::budget,
            movies::revenue,
            movies::roi_percent,
            movies::studio_id,
        ))
        .load(conn)?;

    raw.into_iter()
        .map(|(id, title, rating, date, runtime, budget, revenue, roi, studio_id)| {
            Ok(FinancialRow {
                id,
                title,
                content_rating: rating,
                release_date: read_date("movies.release_date", date.as_deref())?,
                runtime_minutes: runtime,
                budget: read_decimal("movies.budget", budget.as_deref())?,
                revenue: read_decimal("movies.revenue", revenue.as_deref())?,
                roi_percent: read_decimal("movies.roi_percent", roi.as_deref())?,
                studio_id,
            })
        })
        .collect()
}

/// `part / whole * 100`, two places. `None` for an empty whole.
pub(crate) fn percent_of(part: usize, whole: usize) -> Option<Decimal> {
    if whole == 0 {
        return None;
    }
    let share = Decimal::from(part as u64) / Decimal::from(whole as u64) * Decimal::ONE_HUNDRED;
    Some(share.round_dp(2))
}

pub(crate) fn checked_sum(values: &[Decimal], what: &'static str) -> StoreResult<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
        .ok_or(StoreError::Overflow { what })
}

pub(crate) fn mean(values: &[Decimal], what: &'static str) -> StoreResult<Option<Decimal>> {
    if values.is_empty() {
        return Ok(None);
    }
    let sum = checked_sum(values, what)?;
    Ok(Some((sum / Decimal::from(values.len() as u64)).round_dp(2)))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub total_movies: usize,
    pub movies_with_budget: usize,
    pub movies_without_budget: usize,
    pub movies_with_revenue: usize,
    pub movies_without_revenue: usize,
    /// Share of movies with revenue, in percent.
    pub completion_rate: Option<Decimal>,
    /// Sum over every movie with a budget.
    pub total_budget: Decimal,
    /// Sum over every movie with revenue.
    pub total_revenue: Decimal,
    /// ROI of the sums. Not the mean of per-movie ROIs.
    pub overall_roi: Option<Decimal>,
    /// Mean of per-movie ROI where defined.
    pub average_roi: Option<Decimal>,
    pub movies_with_roi: usize,
    pub profitable_movies: usize,
    pub loss_movies: usize,
    /// Profitable share of movies with a defined ROI, in percent.
    pub profitable_share: Option<Decimal>,
    /// Loss-making share of movies with a defined ROI, in percent.
    pub loss_share: Option<Decimal>,
}

pub fn portfolio_summary(conn: &mut SqliteConnection) -> StoreResult<PortfolioSummary> {
    let rows = load_financials(conn)?;

    let budgets: Vec<Decimal> = rows.iter().filter_map(|r| r.budget).collect();
    let revenues: Vec<Decimal> = rows.iter().filter_map(|r| r.revenue).collect();
    let rois: Vec<Decimal> = rows.iter().filter_map(|r| r.roi_percent).collect();

    let total_budget = checked_sum(&budgets, "total budget")?;
    let total_revenue = checked_sum(&revenues, "total revenue")?;
    let profitable = rois.iter().filter(|r| **r > Decimal::ZERO).count();
    let loss = rois.iter().filter(|r| **r < Decimal::ZERO).count();

    Ok(PortfolioSummary {
        total_movies: rows.len(),
        movies_with_budget: budgets.len(),
        movies_without_budget: rows.len() - budgets.len(),
        movies_with_revenue: revenues.len(),
        movies_without_revenue: rows.len() - revenues.len(),
        completion_rate: percent_of(revenues.len(), rows.len()),
        total_budget,
        total_revenue,
        overall_roi: roi_percent(Some(total_budget), Some(total_revenue)),
        average_roi: mean(&rois, "average ROI")?,
        movies_with_roi: rois.len(),
        profitable_movies: profitable,
        loss_movies: loss,
        profitable_share: percent_of(profitable, rois.len()),
        loss_share: percent_of(loss, rois.len()),
    })
}

/// Field to rank by in [`top_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopField {
    Revenue,
    Budget,
    Roi,
}

impl TopField {
    pub fn as_str(self) -> &'static str {
        match self {
            TopField::Revenue => "revenue",
            TopField::Budget => "budget",
            TopField::Roi => "roi",
        }
    }

    fn pick(self, row: &FinancialRow) -> Option<Decimal> {
        match self {
            TopField::Revenue => row.revenue,
            TopField::Budget => row.budget,
            TopField::Roi => row.roi_percent,
        }
    }
}

impl FromStr for TopField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "revenue" => Ok(TopField::Revenue),
            "budget" => Ok(TopField::Budget),
            "roi" => Ok(TopField::Roi),
            other => Err(format!(
                "unknown ranking field {other:?} (expected revenue, budget or roi)"
            )),
        }
    }
}

impl fmt::Display for TopField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A movie as listed by the ranking and filter queries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub budget: Option<Decimal>,
    pub revenue: Option<Decimal>,
    pub roi_percent: Option<Decimal>,
    pub budget_tier: BudgetTier,
    pub performance_tier: PerformanceTier,
}

impl From<&FinancialRow> for MovieSummary {
    fn from(row: &FinancialRow) -> Self {
        Self {
            id: row.id,
            title: row.title.clone(),
            release_date: row.release_date,
            budget: row.budget,
            revenue: row.revenue,
            roi_percent: row.roi_percent,
            budget_tier: budget_tier(row.budget),
            performance_tier: performance_tier(row.roi_percent),
        }
    }
}

/// Rows with `key` present, descending by it, ties by id.
fn ranked(
    rows: &[FinancialRow],
    key: impl Fn(&FinancialRow) -> Option<Decimal>,
) -> Vec<MovieSummary> {
    let mut picked: Vec<(&FinancialRow, Decimal)> =
        rows.iter().filter_map(|r| key(r).map(|v| (r, v))).collect();
    picked.sort_by_key(|(r, v)| (Reverse(*v), r.id));
    picked.into_iter().map(|(r, _)| MovieSummary::from(r)).collect()
}

/// Highest `field` first; movies without it are left out.
pub fn top_by(
    conn: &mut SqliteConnection,
    field: TopField,
    limit: usize,
) -> StoreResult<Vec<MovieSummary>> {
    let rows = load_financials(conn)?;
    let mut out = ranked(&rows, |r| field.pick(r));
    out.truncate(limit);
    Ok(out)
}

/// Movies with ROI above zero, best first.
pub fn profitable_movies(
    conn: &mut SqliteConnection,
    limit: Option<usize>,
) -> StoreResult<Vec<MovieSummary>> {
    let rows = load_financials(conn)?;
    let mut out = ranked(&rows, |r| r.roi_percent.filter(|roi| *roi > Decimal::ZERO));
    if let Some(limit) = limit {
        out.truncate(limit);
    }
    Ok(out)
}

/// Movies whose budget lies in `[min, max]`, largest budget first.
pub fn movies_by_budget_range(
    conn: &mut SqliteConnection,
    min: Decimal,
    max: Decimal,
) -> StoreResult<Vec<MovieSummary>> {
    let rows = load_financials(conn)?;
    Ok(ranked(&rows, |r| r.budget.filter(|b| *b >= min && *b <= max)))
}

/// One complete movie, flattened for model training.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingRow {
    pub id: i32,
    pub title: String,
    pub budget: Decimal,
    pub revenue: Decimal,
    pub roi_percent: Decimal,
    pub runtime_minutes: Option<i32>,
    pub content_rating: Option<String>,
    pub year: i32,
    pub month: u32,
    pub studio: String,
    pub genre_count: usize,
    pub primary_genre: String,
    pub budget_tier: BudgetTier,
    pub performance_tier: PerformanceTier,
    pub is_successful: bool,
}

/// Movies with budget, revenue, ROI and release date all present.
///
/// `primary_genre` is the alphabetically first genre; missing studio or
/// genre reads as `"Unknown"`.
pub fn training_rows(conn: &mut SqliteConnection) -> StoreResult<Vec<TrainingRow>> {
    let rows = load_financials(conn)?;

    let studio_names: Vec<(i32, String)> =
        studios::table.select((studios::id, studios::name)).load(conn)?;
    let links: Vec<(i32, String)> = movie_genres::table
        .inner_join(genres::table)
        .order((movie_genres::movie_id.asc(), genres::name.asc()))
        .select((movie_genres::movie_id, genres::name))
        .load(conn)?;

    let mut out = Vec::new();
    for row in &rows {
        let (Some(budget), Some(revenue), Some(roi), Some(date)) =
            (row.budget, row.revenue, row.roi_percent, row.release_date)
        else {
            continue;
        };

        let studio = row
            .studio_id
            .and_then(|sid| studio_names.iter().find(|(id, _)| *id == sid))
            .map(|(_, name)| name.clone())
            .unwrap_or_else(|| "Unknown".to_string());
        let genre_names: Vec<&str> = links
            .iter()
            .filter(|(mid, _)| *mid == row.id)
            .map(|(_, name)| name.as_str())
            .collect();

        out.push(TrainingRow {
            id: row.id,
            title: row.title.clone(),
            budget,
            revenue,
            roi_percent: roi,
            runtime_minutes: row.runtime_minutes,
            content_rating: row.content_rating.clone(),
            year: date.year(),
            month: date.month(),
            studio,
            genre_count: genre_names.len(),
            primary_genre: genre_names.first().map_or("Unknown", |g| *g).to_string(),
            budget_tier: budget_tier(Some(budget)),
            performance_tier: performance_tier(Some(roi)),
            is_successful: roi > Decimal::from(SUCCESS_ROI),
        });
    }
    Ok(out)
}
