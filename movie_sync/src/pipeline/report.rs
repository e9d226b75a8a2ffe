//! Run reports: what a pipeline run or a detail refresh did.

use std::fmt;

use movie_data_ingestor::models::raw::ProviderTag;
use serde::Serialize;

/// Why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortReason {
    /// Stable tag, e.g. `rate_limit_exhausted`.
    pub code: &'static str,
    pub page: u32,
    pub message: String,
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        items: usize,
    },
    Aborted {
        reason: AbortReason,
        items_before_abort: usize,
    },
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Normalization,
    MissingReleaseDate,
    DetailFetch,
    NotFound,
    Persistence,
}

impl SkipReason {
    pub fn code(self) -> &'static str {
        match self {
            SkipReason::Normalization => "normalization",
            SkipReason::MissingReleaseDate => "missing_release_date",
            SkipReason::DetailFetch => "detail_fetch",
            SkipReason::NotFound => "not_found",
            SkipReason::Persistence => "persistence",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub page: u32,
    pub index: usize,
    /// `provider:id` of the item, as far as it could be read.
    pub key: String,
    pub reason: SkipReason,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub provider: ProviderTag,
    pub outcome: RunOutcome,
    pub pages_fetched: u32,
    pub items_seen: usize,
    pub created: usize,
    pub unchanged: usize,
    pub skipped: Vec<SkippedItem>,
    pub genres_seeded: usize,
}

impl RunReport {
    pub(crate) fn new(provider: ProviderTag) -> Self {
        Self {
            provider,
            outcome: RunOutcome::Completed { items: 0 },
            pages_fetched: 0,
            items_seen: 0,
            created: 0,
            unchanged: 0,
            skipped: Vec::new(),
            genres_seeded: 0,
        }
    }

    pub fn skipped_with(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

fn header(f: &mut fmt::Formatter<'_>, title: &str) -> fmt::Result {
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "-".repeat(title.len()))
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        header(f, &format!("Ingest run ({})", self.provider))?;
        match &self.outcome {
            RunOutcome::Completed { items } => writeln!(f, "completed: {items} items")?,
            RunOutcome::Aborted {
                reason,
                items_before_abort,
            } => writeln!(
                f,
                "aborted on page {}: {} ({}) after {items_before_abort} items",
                reason.page, reason.code, reason.message
            )?,
        }
        writeln!(f, "pages fetched:  {}", self.pages_fetched)?;
        writeln!(f, "created:        {}", self.created)?;
        writeln!(f, "unchanged:      {}", self.unchanged)?;
        writeln!(f, "skipped:        {}", self.skipped.len())?;
        if self.genres_seeded > 0 {
            writeln!(f, "genres seeded:  {}", self.genres_seeded)?;
        }

        if !self.skipped.is_empty() {
            writeln!(f)?;
            header(f, "Skipped")?;
            for s in &self.skipped {
                writeln!(
                    f,
                    "- p{} #{} {} [{}] {}",
                    s.page,
                    s.index,
                    s.key,
                    s.reason.code(),
                    s.message
                )?;
            }
        }
        Ok(())
    }
}

/// Outcome of [`refresh_details`](super::refresh::refresh_details).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub refreshed: usize,
    pub unchanged: usize,
    pub skipped: Vec<(i32, SkipReason, String)>,
    /// Set when the governor gave up on rate limiting; remaining movies were not visited.
    pub aborted: Option<String>,
}

impl fmt::Display for RefreshReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        header(f, "Detail refresh")?;
        writeln!(f, "refreshed:  {}", self.refreshed)?;
        writeln!(f, "unchanged:  {}", self.unchanged)?;
        writeln!(f, "skipped:    {}", self.skipped.len())?;
        for (movie_id, reason, message) in &self.skipped {
            writeln!(f, "- movie {movie_id} [{}] {message}", reason.code())?;
        }
        if let Some(reason) = &self.aborted {
            writeln!(f, "aborted: {reason}")?;
        }
        Ok(())
    }
}
