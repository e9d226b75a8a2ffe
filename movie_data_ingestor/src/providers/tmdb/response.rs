use serde::Deserialize;
use serde_json::Value;

/// Envelope of `/movie/popular` and the other paginated list endpoints.
///
/// Items stay raw so a single malformed entry can be rejected by the
/// normalizer without losing the rest of the page.
#[derive(Deserialize, Debug)]
pub struct TmdbListingResponse {
    pub page: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Deserialize, Debug)]
pub struct TmdbGenreListResponse {
    pub genres: Vec<TmdbGenre>,
}

#[derive(Deserialize, Debug)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

/// Error body TMDb returns alongside non-2xx statuses.
#[derive(Deserialize, Debug, Default)]
pub struct TmdbErrorBody {
    pub status_code: Option<i64>,
    pub status_message: Option<String>,
}

/// TMDb's own "request count over limit" status code.
pub const TMDB_RATE_LIMIT_CODE: i64 = 25;
