//! Data types for Global Names resolver responses

use serde::{Deserialize, Serialize};

/// Data source id of the Open Tree Taxonomy in Global Names
pub const OTT_DATA_SOURCE: u32 = 179;
/// Data source id of the NCBI taxonomy in Global Names
pub const NCBI_DATA_SOURCE: u32 = 4;
/// Data source id of the GBIF backbone in Global Names
pub const GBIF_DATA_SOURCE: u32 = 11;

/// Request body for `/name_resolvers.json`
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ResolveRequest<'a> {
    pub names: &'a str,
    pub best_match_only: bool,
}

/// Response from `/name_resolvers.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResolverResponse {
    #[serde(default)]
    pub data: Vec<ResolvedName>,
}

impl ResolverResponse {
    /// Results for the first (and only) supplied name.
    ///
    /// Returns `None` when the resolver omitted the `results` key, which is
    /// how it reports a name with no match at all.
    pub fn first_results(&self) -> Option<&[NameResult]> {
        self.data.first()?.results.as_deref()
    }

    /// All results for the first supplied name, empty if there are none
    pub fn results(&self) -> &[NameResult] {
        self.first_results().unwrap_or(&[])
    }
}

/// Resolution of a single supplied name
#[derive(Debug, Clone, Deserialize)]
pub struct ResolvedName {
    pub supplied_name_string: Option<String>,
    pub is_known_name: Option<bool>,
    pub results: Option<Vec<NameResult>>,
}

/// A single candidate returned by the resolver
#[derive(Debug, Clone, Deserialize)]
pub struct NameResult {
    pub data_source_id: u32,
    pub data_source_title: Option<String>,
    pub name_string: Option<String>,
    pub canonical_form: Option<String>,
    /// Currently accepted name in the data source (the senior synonym)
    pub current_name_string: Option<String>,
    /// `|`-separated names, highest rank first
    pub classification_path: Option<String>,
    /// `|`-separated ranks aligned with `classification_path`; may contain blanks
    pub classification_path_ranks: Option<String>,
    pub taxon_id: Option<String>,
    #[serde(default)]
    pub score: f64,
}
