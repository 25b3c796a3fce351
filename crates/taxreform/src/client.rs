//! Resilient wrappers around the name-matching services
//!
//! Each remote call is classified: transient failures (connection, TLS,
//! 5xx, throttling) block and retry after a fixed wait, definitive ones
//! (bad request, unknown id) yield no result immediately.

use crate::error::{ResolveError, Result};
use crate::services::{FuzzyNameService, TaxonomyService};
use crate::types::Candidate;
use async_trait::async_trait;
use chrono::Utc;
use gnames_api::{GnamesClient, GnamesError};
use otol_api::{OtolClient, OtolError, TaxonInfo, TaxonMatch};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

const OTOL_SERVICE: &str = "Open Tree of Life";
const GNAMES_SERVICE: &str = "Global Names";

/// Failure classification used by [`RetryPolicy`]
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for OtolError {
    fn is_transient(&self) -> bool {
        OtolError::is_transient(self)
    }
}

impl Transient for GnamesError {
    fn is_transient(&self) -> bool {
        GnamesError::is_transient(self)
    }
}

/// Fixed-interval retry policy shared by all service calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub wait: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(600),
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or fails definitively.
    ///
    /// Returns `Ok(None)` on a definitive failure and
    /// [`ResolveError::RetriesExhausted`] once a bounded budget is spent.
    pub async fn call<T, E, F, Fut>(&self, service: &str, mut op: F) -> Result<Option<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: Transient + fmt::Display,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(Some(value)),
                Err(e) if !e.is_transient() => {
                    warn!(service, error = %e, "Definitive service error, skipping");
                    return Ok(None);
                }
                Err(e) => {
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        return Err(ResolveError::RetriesExhausted {
                            service: service.to_string(),
                            attempts: attempt,
                        });
                    }
                    let next_attempt = Utc::now()
                        + chrono::Duration::from_std(self.wait)
                            .unwrap_or_else(|_| chrono::Duration::zero());
                    warn!(
                        service,
                        attempt,
                        error = %e,
                        wait_secs = self.wait.as_secs(),
                        next_attempt = %next_attempt.to_rfc3339(),
                        "Error contacting service, will try again"
                    );
                    tokio::time::sleep(self.wait).await;
                }
            }
        }
    }
}

/// Open Tree of Life behind the retry policy
pub struct OtolService {
    api: OtolClient,
    policy: RetryPolicy,
}

impl OtolService {
    pub fn new(api: OtolClient, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }
}

#[async_trait]
impl TaxonomyService for OtolService {
    async fn match_exact(&self, name: &str, context: &str) -> Result<Vec<TaxonMatch>> {
        let names = [name];
        let response = self
            .policy
            .call(OTOL_SERVICE, || self.api.match_names(&names, false, context))
            .await?;

        Ok(response
            .and_then(|r| r.results.into_iter().next())
            .map(|r| r.matches)
            .unwrap_or_default())
    }

    async fn taxon_info(&self, ott_id: u64) -> Result<Option<TaxonInfo>> {
        self.policy
            .call(OTOL_SERVICE, || self.api.taxon_info(ott_id))
            .await
    }

    async fn source_version(&self) -> Result<Option<String>> {
        let about = self.policy.call(OTOL_SERVICE, || self.api.about()).await?;
        Ok(about.map(|a| a.source))
    }
}

/// Global Names resolver behind the retry policy
pub struct GnamesService {
    api: GnamesClient,
    policy: RetryPolicy,
}

impl GnamesService {
    pub fn new(api: GnamesClient, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }
}

#[async_trait]
impl FuzzyNameService for GnamesService {
    async fn fuzzy_match(&self, name: &str) -> Result<Option<Vec<Candidate>>> {
        let response = self
            .policy
            .call(GNAMES_SERVICE, || self.api.resolve(name))
            .await?;

        Ok(response.and_then(|r| {
            r.first_results().map(|results| {
                results
                    .iter()
                    .filter_map(Candidate::from_name_result)
                    .collect()
            })
        }))
    }
}
