use serde::Deserialize;
use serde_json::Value;

/// OMDb search results come back ten per page.
pub const OMDB_PAGE_SIZE: u32 = 10;

/// Envelope of `?s=<term>&page=<n>`.
#[derive(Deserialize, Debug)]
pub struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    pub search: Vec<Value>,
    #[serde(rename = "totalResults", default)]
    pub total_results: Option<String>,
}

impl OmdbSearchResponse {
    pub fn total_pages(&self) -> u32 {
        let total: u32 = self
            .total_results
            .as_deref()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(0);
        total.div_ceil(OMDB_PAGE_SIZE)
    }
}

/// OMDb signals failures in-band: HTTP 200 with `"Response": "False"`.
#[derive(Deserialize, Debug, Default)]
pub struct OmdbStatus {
    #[serde(rename = "Response")]
    pub response: Option<String>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

impl OmdbStatus {
    pub fn is_false(&self) -> bool {
        self.response
            .as_deref()
            .is_some_and(|r| r.eq_ignore_ascii_case("false"))
    }
}
