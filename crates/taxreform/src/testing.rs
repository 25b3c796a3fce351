//! In-memory service fakes with frozen responses

use crate::error::{ResolveError, Result};
use crate::services::{FuzzyNameService, TaxonomyService};
use crate::types::{Candidate, ClassificationPath, DataSource};
use async_trait::async_trait;
use otol_api::{TaxonInfo, TaxonMatch, TaxonSummary};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub(crate) fn summary(ott_id: u64, name: &str, rank: &str, ncbi: Option<&str>) -> TaxonSummary {
    TaxonSummary {
        ott_id,
        name: name.to_string(),
        unique_name: Some(name.to_string()),
        rank: rank.to_string(),
        tax_sources: ncbi.map(|id| format!("ncbi:{}", id)).into_iter().collect(),
    }
}

pub(crate) fn info(
    ott_id: u64,
    name: &str,
    rank: &str,
    ncbi: Option<&str>,
    lineage: &[(u64, &str, &str, Option<&str>)],
) -> TaxonInfo {
    let taxon = summary(ott_id, name, rank, ncbi);
    TaxonInfo {
        ott_id,
        name: taxon.name,
        unique_name: taxon.unique_name,
        rank: taxon.rank,
        tax_sources: taxon.tax_sources,
        lineage: lineage
            .iter()
            .map(|(id, n, r, x)| summary(*id, n, r, *x))
            .collect(),
        synonyms: Vec::new(),
    }
}

pub(crate) fn taxon_match(
    matched_name: &str,
    score: f64,
    ott_id: u64,
    name: &str,
    rank: &str,
    ncbi: Option<&str>,
) -> TaxonMatch {
    TaxonMatch {
        matched_name: matched_name.to_string(),
        score,
        is_synonym: matched_name != name,
        is_approximate_match: false,
        taxon: summary(ott_id, name, rank, ncbi),
    }
}

pub(crate) fn candidate(
    canonical_form: &str,
    score: f64,
    source: DataSource,
    path: Option<(&str, &str)>,
) -> Candidate {
    Candidate {
        canonical_form: canonical_form.to_string(),
        current_name: None,
        score,
        source,
        classification: path.and_then(|(names, ranks)| ClassificationPath::parse(names, Some(ranks))),
    }
}

/// Honeybee lineage as served by OTT
pub(crate) fn honeybee_info() -> TaxonInfo {
    info(
        1000,
        "Apis mellifera",
        "species",
        Some("7460"),
        &[
            (10, "Apis", "genus", Some("7459")),
            (11, "Apini", "tribe", None),
            (12, "Apidae", "family", None),
            (13, "Hymenoptera", "order", None),
            (14, "Insecta", "class", None),
            (15, "Arthropoda", "phylum", None),
            (17, "Metazoa", "kingdom", None),
            (18, "Eukaryota", "domain", None),
            (19, "life", "no rank", None),
        ],
    )
}

pub(crate) fn apis_info() -> TaxonInfo {
    info(
        10,
        "Apis",
        "genus",
        Some("7459"),
        &[
            (11, "Apini", "tribe", None),
            (12, "Apidae", "family", None),
            (13, "Hymenoptera", "order", None),
            (14, "Insecta", "class", None),
            (19, "life", "no rank", None),
        ],
    )
}

#[derive(Default)]
pub(crate) struct FakeFuzzy {
    responses: HashMap<String, Vec<Candidate>>,
    queries: Mutex<Vec<String>>,
}

impl FakeFuzzy {
    pub(crate) fn with(mut self, name: &str, candidates: Vec<Candidate>) -> Self {
        self.responses.insert(name.to_string(), candidates);
        self
    }

    pub(crate) fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FuzzyNameService for FakeFuzzy {
    async fn fuzzy_match(&self, name: &str) -> Result<Option<Vec<Candidate>>> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(name.to_string());
        }
        Ok(self.responses.get(name).cloned())
    }
}

#[derive(Default)]
pub(crate) struct FakeTaxonomy {
    exact: HashMap<String, Vec<TaxonMatch>>,
    taxa: HashMap<u64, TaxonInfo>,
    info_calls: AtomicUsize,
    unavailable: bool,
}

impl FakeTaxonomy {
    /// Every exact lookup fails as if the retry budget ran out
    pub(crate) fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub(crate) fn with_match(mut self, name: &str, matches: Vec<TaxonMatch>) -> Self {
        self.exact.insert(name.to_string(), matches);
        self
    }

    pub(crate) fn with_taxon(mut self, taxon: TaxonInfo) -> Self {
        self.taxa.insert(taxon.ott_id, taxon);
        self
    }

    pub(crate) fn info_calls(&self) -> usize {
        self.info_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TaxonomyService for FakeTaxonomy {
    async fn match_exact(&self, name: &str, _context: &str) -> Result<Vec<TaxonMatch>> {
        if self.unavailable {
            return Err(ResolveError::RetriesExhausted {
                service: "Open Tree of Life".to_string(),
                attempts: 3,
            });
        }
        Ok(self.exact.get(name).cloned().unwrap_or_default())
    }

    async fn taxon_info(&self, ott_id: u64) -> Result<Option<TaxonInfo>> {
        self.info_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.taxa.get(&ott_id).cloned())
    }

    async fn source_version(&self) -> Result<Option<String>> {
        Ok(Some("ott3.6".to_string()))
    }
}
