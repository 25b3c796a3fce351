//! Open Tree of Life API HTTP client

use crate::error::{OtolError, Result};
use crate::types::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Client for the Open Tree of Life v3 API
///
/// All endpoints are `POST` with JSON bodies. A non-success status is turned
/// into [`OtolError::Status`] carrying the service's `message`, if any.
pub struct OtolClient {
    http: reqwest::Client,
    base_url: String,
}

impl OtolClient {
    /// Base URL for the public OTL v3 API
    pub const BASE_URL: &'static str = "https://api.opentreeoflife.org/v3";

    /// Create a new client against the public API (60 second timeout)
    pub fn new() -> Self {
        Self::with_base_url(Self::BASE_URL)
    }

    /// Create a new client against a custom API root (e.g. a mirror or a mock)
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_base_url_and_timeout(base_url, Duration::from_secs(60))
    }

    /// Create a new client with a custom API root and timeout
    pub fn with_base_url_and_timeout(base_url: &str, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Match names against the Open Tree Taxonomy
    ///
    /// # Arguments
    /// * `names` - Names to resolve
    /// * `approximate` - Allow fuzzy matching; `false` asks for exact matches only
    /// * `context` - Taxonomic context restricting the search (e.g. "Insects", "All life")
    pub async fn match_names(
        &self,
        names: &[&str],
        approximate: bool,
        context: &str,
    ) -> Result<MatchNamesResponse> {
        let body = MatchNamesRequest {
            names,
            do_approximate_matching: approximate,
            context_name: context,
        };
        self.post("tnrs/match_names", &body).await
    }

    /// Get a taxon and its full lineage by OTT id
    ///
    /// # Arguments
    /// * `ott_id` - The Open Tree Taxonomy id
    pub async fn taxon_info(&self, ott_id: u64) -> Result<TaxonInfo> {
        let body = TaxonInfoRequest {
            ott_id,
            include_lineage: true,
        };
        self.post("taxonomy/taxon_info", &body).await
    }

    /// Get information about the taxonomy snapshot currently served
    pub async fn about(&self) -> Result<AboutResponse> {
        self.post("taxonomy/about", &serde_json::json!({})).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let response = self.http.post(&url).json(body).send().await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .ok()
                .and_then(|b| b.message);
            return Err(OtolError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Default for OtolClient {
    fn default() -> Self {
        Self::new()
    }
}
