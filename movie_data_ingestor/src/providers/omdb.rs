pub mod provider;
pub mod response;

pub use provider::{interpret_response, OmdbProvider, OMDB_API_KEY_VAR};
