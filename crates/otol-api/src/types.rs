//! Data types for Open Tree of Life API requests and responses
//!
//! Only the fields the name-resolution workflow reads are modelled; unknown
//! fields are ignored during deserialization.

use serde::{Deserialize, Serialize};

/// Request body for `/tnrs/match_names`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct MatchNamesRequest<'a> {
    pub names: &'a [&'a str],
    pub do_approximate_matching: bool,
    pub context_name: &'a str,
}

/// Request body for `/taxonomy/taxon_info`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct TaxonInfoRequest {
    pub ott_id: u64,
    pub include_lineage: bool,
}

/// Error body returned alongside 4xx statuses
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

/// Response from `/tnrs/match_names`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchNamesResponse {
    /// One entry per queried name that produced at least one match
    #[serde(default)]
    pub results: Vec<NameMatchResults>,
    #[serde(default)]
    pub unmatched_names: Vec<String>,
    pub context: Option<String>,
}

/// Matches found for a single queried name
#[derive(Debug, Clone, Deserialize)]
pub struct NameMatchResults {
    pub name: String,
    #[serde(default)]
    pub matches: Vec<TaxonMatch>,
}

/// A single TNRS match
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonMatch {
    pub matched_name: String,
    pub score: f64,
    #[serde(default)]
    pub is_synonym: bool,
    #[serde(default)]
    pub is_approximate_match: bool,
    pub taxon: TaxonSummary,
}

/// Taxon summary as it appears in matches and lineages
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonSummary {
    pub ott_id: u64,
    pub name: String,
    #[serde(default)]
    pub unique_name: Option<String>,
    #[serde(default)]
    pub rank: String,
    /// Cross references in `prefix:id` form, e.g. `ncbi:7460`
    #[serde(default)]
    pub tax_sources: Vec<String>,
}

/// Response from `/taxonomy/taxon_info` with `include_lineage`
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonInfo {
    pub ott_id: u64,
    pub name: String,
    #[serde(default)]
    pub unique_name: Option<String>,
    #[serde(default)]
    pub rank: String,
    #[serde(default)]
    pub tax_sources: Vec<String>,
    /// Ancestors, nearest first
    #[serde(default)]
    pub lineage: Vec<TaxonSummary>,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Response from `/taxonomy/about`
#[derive(Debug, Clone, Deserialize)]
pub struct AboutResponse {
    /// Taxonomy snapshot identifier, e.g. `ott3.6`
    pub source: String,
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Look up the id a taxon carries in another database.
///
/// `tax_sources` entries look like `ncbi:7460` or `gbif:1341976`; the
/// prefix is matched exactly.
pub fn cross_reference(tax_sources: &[String], prefix: &str) -> Option<String> {
    tax_sources.iter().find_map(|source| {
        let (key, id) = source.split_once(':')?;
        (key == prefix).then(|| id.to_string())
    })
}

impl TaxonSummary {
    /// NCBI taxonomy id, if OTT links one
    pub fn ncbi_id(&self) -> Option<String> {
        cross_reference(&self.tax_sources, "ncbi")
    }
}

impl TaxonInfo {
    /// NCBI taxonomy id, if OTT links one
    pub fn ncbi_id(&self) -> Option<String> {
        cross_reference(&self.tax_sources, "ncbi")
    }
}
