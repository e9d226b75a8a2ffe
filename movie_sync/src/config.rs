//! `movie_sync.toml`: database location and per-provider pacing.
//!
//! ```toml
//! [database]
//! url = "movie_sync.db"
//!
//! [providers.tmdb]
//! listing_spacing_ms = 250
//! max_retry_after_secs = 60
//!
//! [providers.omdb]
//! search = "star"
//! ```
//!
//! Every key is optional. Missing provider keys fall back to
//! [`ProviderSettings::defaults_for`]. Credentials never live here; they come
//! from `TMDB_API_KEY` / `OMDB_API_KEY`.

use std::{fs, path::Path};

use anyhow::{Context, bail};
use movie_data_ingestor::{models::raw::ProviderTag, providers::ProviderSettings};
use serde::{Deserialize, Serialize};
use shared_utils::env::get_env_var_opt;
use toml::from_str;

pub const DEFAULT_DATABASE_URL: &str = "movie_sync.db";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct SyncConfig {
    pub database: DatabaseCfg,
    pub providers: ProvidersCfg,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct DatabaseCfg {
    pub url: String,
}

impl Default for DatabaseCfg {
    fn default() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProvidersCfg {
    pub tmdb: ProviderOverrides,
    pub omdb: ProviderOverrides,
}

/// Per-provider overrides. `None` keeps the provider default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct ProviderOverrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub listing_spacing_ms: Option<u64>,
    pub detail_spacing_ms: Option<u64>,
    pub default_retry_after_secs: Option<u64>,
    pub max_retry_after_secs: Option<u64>,
    pub transient_backoff_ms: Option<u64>,
    /// Search term for OMDb's listing endpoint.
    pub search: Option<String>,
}

impl ProviderOverrides {
    fn apply(&self, mut base: ProviderSettings) -> ProviderSettings {
        if let Some(v) = &self.base_url {
            base.base_url = v.trim().to_string();
        }
        if let Some(v) = self.timeout_secs {
            base.timeout_secs = v;
        }
        if let Some(v) = self.listing_spacing_ms {
            base.listing_spacing_ms = v;
        }
        if let Some(v) = self.detail_spacing_ms {
            base.detail_spacing_ms = v;
        }
        if let Some(v) = self.default_retry_after_secs {
            base.default_retry_after_secs = v;
        }
        if let Some(v) = self.max_retry_after_secs {
            base.max_retry_after_secs = v;
        }
        if let Some(v) = self.transient_backoff_ms {
            base.transient_backoff_ms = v;
        }
        if let Some(v) = &self.search {
            base.search = Some(v.trim().to_string());
        }
        base
    }
}

impl SyncConfig {
    /// Effective settings for `provider`: defaults with this file's overrides applied.
    pub fn provider_settings(&self, provider: ProviderTag) -> ProviderSettings {
        let overrides = match provider {
            ProviderTag::Tmdb => &self.providers.tmdb,
            ProviderTag::Omdb => &self.providers.omdb,
        };
        overrides.apply(ProviderSettings::defaults_for(provider))
    }

    /// Lets `DATABASE_URL` override `[database] url`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(url) = get_env_var_opt(DATABASE_URL_VAR) {
            self.database.url = url.trim().to_string();
        }
        self
    }

    /// Checks that every provider resolves to usable settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.trim().is_empty() {
            bail!("[database] url cannot be empty");
        }
        for provider in [ProviderTag::Tmdb, ProviderTag::Omdb] {
            let s = self.provider_settings(provider);
            if s.base_url.is_empty() {
                bail!("[providers.{provider}] base_url cannot be empty");
            }
            if !(s.base_url.starts_with("http://") || s.base_url.starts_with("https://")) {
                bail!("[providers.{provider}] base_url must be http(s), got {:?}", s.base_url);
            }
            if s.timeout_secs == 0 {
                bail!("[providers.{provider}] timeout_secs must be positive");
            }
            if s.max_retry_after_secs < s.default_retry_after_secs {
                bail!(
                    "[providers.{provider}] max_retry_after_secs ({}) is below \
                     default_retry_after_secs ({})",
                    s.max_retry_after_secs,
                    s.default_retry_after_secs
                );
            }
            if s.search.as_deref().is_some_and(|t| t.is_empty()) {
                bail!("[providers.{provider}] search cannot be empty");
            }
        }
        Ok(())
    }
}

/// Parse and validate a config from a TOML string.
pub fn load_config_str(s: &str) -> anyhow::Result<SyncConfig> {
    let cfg: SyncConfig = from_str(s).context("parse sync config TOML")?;
    cfg.validate()?;
    Ok(cfg)
}

/// Parse and validate a config from a file path.
pub fn load_config_path(p: impl AsRef<Path>) -> anyhow::Result<SyncConfig> {
    let p = p.as_ref();
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    load_config_str(&s).with_context(|| format!("load {}", p.display()))
}
