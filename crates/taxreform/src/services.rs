//! Seams between the decision engine and the remote services it consults

use crate::error::Result;
use crate::lineage::Lineage;
use crate::types::{Candidate, ResolvedTaxon, TaxonomicSource};
use async_trait::async_trait;
use otol_api::{TaxonInfo, TaxonMatch};

/// Broad fuzzy name-matching service (Global Names)
#[async_trait]
pub trait FuzzyNameService: Send + Sync {
    /// All candidates for `name`, or `None` when the service reports no
    /// result set at all.
    async fn fuzzy_match(&self, name: &str) -> Result<Option<Vec<Candidate>>>;
}

/// Authoritative taxonomy (Open Tree Taxonomy)
#[async_trait]
pub trait TaxonomyService: Send + Sync {
    /// Exact (non-fuzzy) matches for `name` within `context`, as returned
    async fn match_exact(&self, name: &str, context: &str) -> Result<Vec<TaxonMatch>>;

    /// Taxon with its lineage; `None` when the id is rejected
    async fn taxon_info(&self, ott_id: u64) -> Result<Option<TaxonInfo>>;

    /// Identifier of the taxonomy snapshot being served
    async fn source_version(&self) -> Result<Option<String>>;
}

/// Outcome of an exact name check
#[derive(Debug, Clone)]
pub struct NameCheck {
    pub taxon: ResolvedTaxon,
    pub source: TaxonomicSource,
    /// Higher taxonomy the checking service supplies itself
    pub lineage: Option<Lineage>,
}

/// A service that can confirm a name by exact match, tried in registration
/// order once fuzzy and exact OTT resolution both failed.
#[async_trait]
pub trait NameCheckService: Send + Sync {
    fn name(&self) -> &str;

    /// Species- or genus-level match for `name`, `None` otherwise
    async fn check_name(&self, name: &str, context: &str) -> Result<Option<NameCheck>>;
}
