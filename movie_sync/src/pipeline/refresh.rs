//! Detail refresh: the explicit update path, driven over stored movies.
//!
//! For every stored movie carrying an id in the source's namespace, fetch the
//! detail payload, normalize it and hand it to `apply_detail`. Ratings are
//! refreshed in place, financial fields present in the payload are written,
//! and ROI is recomputed in the same transaction.

use movie_data_ingestor::{
    models::movie::ExternalIdKind,
    normalize::normalize,
    rate_guard::{GovernorError, SourceGovernor},
};
use tracing::{debug, info, warn};

use crate::{
    pipeline::report::{RefreshReport, SkipReason},
    store::{DetailOutcome, Store, StoreResult},
};

/// Refreshes up to `limit` movies (all when `None`), lowest id first.
///
/// Per-movie failures are recorded and skipped. Rate-limit exhaustion stops
/// the refresh; movies already refreshed stay refreshed.
pub async fn refresh_details(
    store: &mut Store,
    governor: &SourceGovernor,
    limit: Option<i64>,
) -> StoreResult<RefreshReport> {
    let provider = governor.provider();
    let kind = ExternalIdKind::primary_for(provider);
    let targets = store.external_ids_for(kind, limit)?;
    info!(%provider, movies = targets.len(), "Starting detail refresh");

    let mut report = RefreshReport::default();
    for (movie_id, external_id) in targets {
        let raw = match governor.fetch_detail(&external_id).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                let message = format!("{kind}:{external_id} not found");
                report.skipped.push((movie_id, SkipReason::NotFound, message));
                continue;
            }
            Err(err @ GovernorError::RateLimitExhausted { .. }) => {
                warn!(%provider, movie_id, error = %err, "Stopping refresh");
                report.aborted = Some(err.to_string());
                break;
            }
            Err(err) => {
                warn!(%provider, movie_id, error = %err, "Detail fetch failed");
                report.skipped.push((movie_id, SkipReason::DetailFetch, err.to_string()));
                continue;
            }
        };

        let movie = match normalize(provider, &raw) {
            Ok(movie) => movie,
            Err(err) => {
                warn!(%provider, movie_id, error = %err, "Detail record did not normalize");
                report.skipped.push((movie_id, SkipReason::Normalization, err.to_string()));
                continue;
            }
        };

        match store.apply_detail(movie_id, &movie) {
            Ok(DetailOutcome::Updated { roi_percent, .. }) => {
                debug!(movie_id, roi = ?roi_percent, "Refreshed movie");
                report.refreshed += 1;
            }
            Ok(DetailOutcome::Unchanged { .. }) => report.unchanged += 1,
            Err(err) => {
                warn!(movie_id, error = %err, "Could not apply detail");
                report.skipped.push((movie_id, SkipReason::Persistence, err.to_string()));
            }
        }
    }

    info!(
        %provider,
        refreshed = report.refreshed,
        unchanged = report.unchanged,
        skipped = report.skipped.len(),
        "Detail refresh finished"
    );
    Ok(report)
}
