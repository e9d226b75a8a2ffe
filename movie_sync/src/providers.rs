//! Provider registry: maps a provider tag to a governed, HTTP-backed source.
use movie_data_ingestor::{
    models::raw::ProviderTag,
    providers::{ProviderInitError, build_source},
    rate_guard::{GovernorPolicy, SourceGovernor},
};

use crate::config::SyncConfig;

/// Build the source for `provider` with its configured settings and wrap it
/// in a governor using the same settings.
///
/// Fails when the provider's credential is missing, so runs never start
/// without one.
pub fn build_governor(
    provider: ProviderTag,
    cfg: &SyncConfig,
) -> Result<SourceGovernor, ProviderInitError> {
    let settings = cfg.provider_settings(provider);
    let source = build_source(provider, &settings)?;
    Ok(SourceGovernor::new(source, GovernorPolicy::from_settings(&settings)))
}
