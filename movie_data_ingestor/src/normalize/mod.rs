//! Record normalizer: provider-native payloads to [`NormalizedMovie`].
//!
//! Each provider has an explicit schema struct and mapping in its own module.
//! Unknown fields are ignored. Only a missing title or external id (or a
//! payload whose structure does not match the schema) fails a record; every
//! other unusable field becomes `None`.

mod fields;
mod omdb;
mod tmdb;

use thiserror::Error;

use crate::models::{movie::NormalizedMovie, raw::{ProviderTag, RawItem}};

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("{provider} record {external_id:?} has no title")]
    MissingTitle {
        provider: ProviderTag,
        external_id: Option<String>,
    },

    #[error("{provider} record {title:?} has no external id")]
    MissingExternalId {
        provider: ProviderTag,
        title: Option<String>,
    },

    #[error("{provider} payload does not match the expected schema: {source}")]
    Schema {
        provider: ProviderTag,
        #[source]
        source: serde_json::Error,
    },

    #[error("payload from {actual} handed to the {expected} normalizer")]
    ProviderMismatch { expected: ProviderTag, actual: ProviderTag },
}

pub fn normalize(
    provider: ProviderTag,
    raw: &RawItem,
) -> Result<NormalizedMovie, NormalizationError> {
    if raw.provider != provider {
        return Err(NormalizationError::ProviderMismatch {
            expected: provider,
            actual: raw.provider,
        });
    }

    match provider {
        ProviderTag::Tmdb => tmdb::normalize(&raw.payload),
        ProviderTag::Omdb => omdb::normalize(&raw.payload),
    }
}
