//! Pipeline orchestrator: listing pages in, committed movies out.
//!
//! ## Run shape
//! `Fetching(page) -> Normalizing(item) -> Persisting(item) -> Fetching(page + 1) | Done`.
//! Items are processed one at a time; each item commits in its own
//! transaction through [`Store`].
//!
//! ## Failure policy
//! - Normalization, detail and persistence failures skip the item, are logged
//!   with page/index/key, and the run continues.
//! - A listing fetch that still fails after the governor's retry aborts the
//!   run. Items committed before the abort stay committed.
//! - Failing to seed the genre catalog is logged and ignored.

pub mod refresh;
pub mod report;

use std::fmt;

use movie_data_ingestor::{
    models::{movie::NormalizedMovie, raw::RawItem},
    normalize::normalize,
    rate_guard::SourceGovernor,
};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use refresh::refresh_details;
pub use report::{AbortReason, RefreshReport, RunOutcome, RunReport, SkipReason, SkippedItem};

use crate::store::{Store, StoreError, UpsertOutcome};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("page_count must be at least 1")]
pub struct InvalidRunParams;

/// Run parameters. The only knobs a run takes besides the provider settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    page_count: u32,
    hydrate_details: bool,
}

impl RunParams {
    pub fn new(page_count: u32) -> Result<Self, InvalidRunParams> {
        if page_count == 0 {
            return Err(InvalidRunParams);
        }
        Ok(Self {
            page_count,
            hydrate_details: false,
        })
    }

    /// Fetch the detail payload for items not yet stored and ingest that
    /// instead of the listing item.
    pub fn with_hydration(mut self, hydrate: bool) -> Self {
        self.hydrate_details = hydrate;
        self
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn hydrate_details(&self) -> bool {
        self.hydrate_details
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching { page: u32 },
    Normalizing { page: u32, index: usize },
    Persisting { page: u32, index: usize },
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => f.write_str("idle"),
            RunState::Fetching { page } => write!(f, "fetching(page={page})"),
            RunState::Normalizing { page, index } => {
                write!(f, "normalizing(page={page}, item={index})")
            }
            RunState::Persisting { page, index } => {
                write!(f, "persisting(page={page}, item={index})")
            }
            RunState::Done => f.write_str("done"),
        }
    }
}

/// One orchestrated ingest from a single governed source into one store.
pub struct Pipeline<'a> {
    store: &'a mut Store,
    governor: SourceGovernor,
    state: RunState,
}

impl<'a> Pipeline<'a> {
    pub fn new(store: &'a mut Store, governor: SourceGovernor) -> Self {
        Self {
            store,
            governor,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn governor(&self) -> &SourceGovernor {
        &self.governor
    }

    fn enter(&mut self, state: RunState) {
        debug!(provider = %self.governor.provider(), %state, "Pipeline state");
        self.state = state;
    }

    /// Runs the pipeline to a terminal outcome. Never returns an error: every
    /// failure is either a skipped item or an aborted run in the report.
    pub async fn run(&mut self, params: &RunParams) -> RunReport {
        let provider = self.governor.provider();
        let mut report = RunReport::new(provider);
        info!(
            %provider,
            pages = params.page_count(),
            hydrate = params.hydrate_details(),
            "Starting ingest run"
        );

        report.genres_seeded = self.seed_genres().await;

        for page in 1..=params.page_count() {
            self.enter(RunState::Fetching { page });
            let listing = match self.governor.fetch_listing(page).await {
                Ok(listing) => listing,
                Err(err) => {
                    warn!(%provider, page, error = %err, "Listing fetch failed; aborting run");
                    report.outcome = RunOutcome::Aborted {
                        reason: AbortReason {
                            code: err.reason_code(),
                            page,
                            message: err.to_string(),
                        },
                        items_before_abort: report.items_seen,
                    };
                    self.enter(RunState::Done);
                    return report;
                }
            };
            report.pages_fetched += 1;
            debug!(
                %provider,
                page,
                items = listing.items.len(),
                total_pages = listing.total_pages,
                "Fetched listing page"
            );

            for (index, raw) in listing.items.iter().enumerate() {
                report.items_seen += 1;
                match self.process_item(page, index, raw, params).await {
                    Ok(UpsertOutcome::Created { movie_id }) => {
                        report.created += 1;
                        debug!(page, index, movie_id, "Created movie");
                    }
                    Ok(UpsertOutcome::Unchanged { movie_id }) => {
                        report.unchanged += 1;
                        debug!(page, index, movie_id, "Movie already stored");
                    }
                    Err(skip) => {
                        warn!(
                            %provider,
                            page,
                            index,
                            key = %skip.key,
                            reason = skip.reason.code(),
                            error = %skip.message,
                            "Skipping item"
                        );
                        report.skipped.push(skip);
                    }
                }
            }

            if listing.is_last() {
                debug!(%provider, page, "Provider has no further pages");
                break;
            }
        }

        report.outcome = RunOutcome::Completed {
            items: report.items_seen,
        };
        self.enter(RunState::Done);
        info!(
            %provider,
            created = report.created,
            unchanged = report.unchanged,
            skipped = report.skipped.len(),
            "Ingest run completed"
        );
        report
    }

    async fn seed_genres(&mut self) -> usize {
        let catalog = match self.governor.fetch_genre_catalog().await {
            Ok(catalog) => catalog,
            Err(err) => {
                warn!(
                    provider = %self.governor.provider(),
                    error = %err,
                    "Genre catalog unavailable; continuing"
                );
                return 0;
            }
        };
        if catalog.is_empty() {
            return 0;
        }
        match self.store.seed_genres(&catalog) {
            Ok(added) => {
                debug!(added, listed = catalog.len(), "Seeded genre catalog");
                added
            }
            Err(err) => {
                warn!(error = %err, "Could not seed genre catalog; continuing");
                0
            }
        }
    }

    async fn process_item(
        &mut self,
        page: u32,
        index: usize,
        raw: &RawItem,
        params: &RunParams,
    ) -> Result<UpsertOutcome, SkippedItem> {
        let provider = self.governor.provider();
        let skipped = |key: String, reason: SkipReason, message: String| SkippedItem {
            page,
            index,
            key,
            reason,
            message,
        };

        self.enter(RunState::Normalizing { page, index });
        let mut movie = normalize(provider, raw).map_err(|e| {
            let key = format!("{provider}:{}", raw.label());
            skipped(key, SkipReason::Normalization, e.to_string())
        })?;

        if params.hydrate_details() {
            movie = self
                .hydrate(movie)
                .await
                .map_err(|(key, reason, message)| skipped(key, reason, message))?;
        }

        self.enter(RunState::Persisting { page, index });
        self.store.upsert(&movie).map_err(|e| {
            let reason = match e {
                StoreError::MissingReleaseDate { .. } => SkipReason::MissingReleaseDate,
                _ => SkipReason::Persistence,
            };
            skipped(movie.log_key(), reason, e.to_string())
        })
    }

    /// Swaps a thin listing record for its detail record when the movie is new.
    async fn hydrate(
        &mut self,
        listed: NormalizedMovie,
    ) -> Result<NormalizedMovie, (String, SkipReason, String)> {
        let key = listed.log_key();
        let existing = self
            .store
            .find_match(&listed)
            .map_err(|e| (key.clone(), SkipReason::Persistence, e.to_string()))?;
        if existing.is_some() {
            return Ok(listed);
        }
        let Some(external_id) = listed.primary_external_id().map(|(_, id)| id.to_string()) else {
            return Ok(listed);
        };

        let detail = match self.governor.fetch_detail(&external_id).await {
            Ok(Some(detail)) => detail,
            Ok(None) => {
                debug!(%key, "No detail record; keeping listing item");
                return Ok(listed);
            }
            Err(err) => return Err((key, SkipReason::DetailFetch, err.to_string())),
        };

        match normalize(listed.source, &detail) {
            Ok(full) => Ok(full),
            Err(err) => {
                warn!(%key, error = %err, "Detail record did not normalize; keeping listing item");
                Ok(listed)
            }
        }
    }
}
