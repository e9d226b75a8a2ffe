pub mod provider;
pub mod response;

pub use provider::{interpret_response, TmdbProvider, TMDB_API_KEY_VAR};
