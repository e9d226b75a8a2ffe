//! Movie business metrics: ingest from TMDb/OMDb into SQLite, deduplicate,
//! and report ROI, tiers and rollups.

pub mod config;
pub mod db;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod schema;
pub mod store;
