//! Global Names resolver HTTP client

use crate::error::{GnamesError, Result};
use crate::types::*;
use std::time::Duration;

/// Client for the Global Names resolver
pub struct GnamesClient {
    http: reqwest::Client,
    base_url: String,
}

impl GnamesClient {
    /// Base URL of the public resolver
    pub const BASE_URL: &'static str = "http://resolver.globalnames.org";

    /// Create a new client against the public resolver (60 second timeout)
    pub fn new() -> Self {
        Self::with_base_url(Self::BASE_URL)
    }

    /// Create a new client against a custom resolver root
    pub fn with_base_url(base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Fuzzy-resolve a name against every data source the resolver knows
    ///
    /// All candidates are requested (`best_match_only = false`) so the caller
    /// can apply its own filtering and source preference.
    pub async fn resolve(&self, name: &str) -> Result<ResolverResponse> {
        let url = format!("{}/name_resolvers.json", self.base_url);
        let body = ResolveRequest {
            names: name,
            best_match_only: false,
        };

        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GnamesError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl Default for GnamesClient {
    fn default() -> Self {
        Self::new()
    }
}
