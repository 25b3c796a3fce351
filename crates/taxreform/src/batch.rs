//! Batch driver
//!
//! Resolves every record of an input table in order, merges the answer with
//! its higher taxonomy and routes the result to the matched or the unmatched
//! table. A record never aborts the batch.

use crate::error::{ResolveError, Result};
use crate::io;
use crate::lineage::{GenusIdentity, Lineage};
use crate::orchestrator::{Orchestrator, TaxonomyOutcome};
use crate::types::{RawQuery, Rank};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Why a record went to the unmatched table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Problem {
    /// Nothing matched at all
    NoName,
    /// Name matched but no lineage could be obtained
    NoTaxonomy,
    /// A species epithet was supplied but only a genus resolved
    NoSpecies,
    /// Equally good candidates from different kingdoms
    Homonym,
    /// A service stayed down for the whole retry budget
    ServiceUnavailable,
}

impl Problem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Problem::NoName => "no_name",
            Problem::NoTaxonomy => "no_taxonomy",
            Problem::NoSpecies => "no_species",
            Problem::Homonym => "homonym",
            Problem::ServiceUnavailable => "service_unavailable",
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the input table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputRecord {
    pub name: String,
    /// Every other column, in input order
    pub extra: Vec<(String, String)>,
}

impl InputRecord {
    pub const SPECIES_COLUMN: &'static str = "s";

    /// Separately recorded species epithet, if the table has one
    pub fn species_hint(&self) -> Option<&str> {
        self.extra
            .iter()
            .find(|(column, _)| column == Self::SPECIES_COLUMN)
            .map(|(_, value)| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// The name as it was read, species epithet included
    fn scored_name(&self) -> String {
        match self.species_hint() {
            Some(s) => format!("{} {}", self.name.trim(), s),
            None => self.name.trim().to_string(),
        }
    }
}

/// One row of either output table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRecord {
    pub name: String,
    pub updated_fullname: Option<String>,
    pub taxonomy_source: Option<String>,
    pub rank_matched: Option<Rank>,
    pub matched: Option<String>,
    pub score: Option<u8>,
    pub ott_id: Option<u64>,
    pub ncbi_id: Option<String>,
    pub name_source: Option<String>,
    pub matched_id_in_source: Option<String>,
    pub updated_genus: Option<String>,
    pub updated_genus_ott_id: Option<u64>,
    pub updated_genus_ncbi_id: Option<String>,
    pub updated_species: Option<String>,
    pub updated_species_ott_id: Option<u64>,
    pub updated_species_ncbi_id: Option<String>,
    pub updated_subspecies: Option<String>,
    pub ott_accepted_name: Option<String>,
    pub ott_version: Option<String>,
    pub higher_source: Option<String>,
    /// Higher taxonomy keyed by rank
    pub ranks: BTreeMap<String, String>,
    pub extra: Vec<(String, String)>,
    pub problem: Option<Problem>,
}

impl OutputRecord {
    pub const HEADERS: [&'static str; 20] = [
        "name",
        "updated_fullname",
        "taxonomy_source",
        "rank_matched",
        "matched",
        "score",
        "ott_id",
        "ncbi_id",
        "name_source",
        "matched_id_in_source",
        "updated_genus",
        "updated_genus_ott_id",
        "updated_genus_ncbi_id",
        "updated_species",
        "updated_species_ott_id",
        "updated_species_ncbi_id",
        "updated_subspecies",
        "ott_accepted_name",
        "ott_version",
        "higher_source",
    ];

    fn from_input(record: &InputRecord, ott_version: Option<&str>) -> Self {
        Self {
            name: record.name.clone(),
            ott_version: ott_version.map(str::to_string),
            extra: record.extra.clone(),
            ..Default::default()
        }
    }

    /// Values for `HEADERS`, in order
    pub fn fixed_values(&self) -> Vec<String> {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map(ToString::to_string).unwrap_or_default()
        }

        vec![
            self.name.clone(),
            opt(&self.updated_fullname),
            opt(&self.taxonomy_source),
            opt(&self.rank_matched),
            opt(&self.matched),
            opt(&self.score),
            opt(&self.ott_id),
            opt(&self.ncbi_id),
            opt(&self.name_source),
            opt(&self.matched_id_in_source),
            opt(&self.updated_genus),
            opt(&self.updated_genus_ott_id),
            opt(&self.updated_genus_ncbi_id),
            opt(&self.updated_species),
            opt(&self.updated_species_ott_id),
            opt(&self.updated_species_ncbi_id),
            opt(&self.updated_subspecies),
            opt(&self.ott_accepted_name),
            opt(&self.ott_version),
            opt(&self.higher_source),
        ]
    }

    fn apply_lineage(&mut self, lineage: &Lineage) {
        self.ranks = lineage.ranks.clone();
        self.higher_source = Some(Lineage::SOURCE.to_string());
        self.rank_matched = Some(lineage.rank.clone());
        self.ott_id = Some(lineage.ott_id);
        self.ncbi_id = lineage.ncbi_id.clone();
        self.ott_accepted_name = Some(lineage.accepted_name.clone());

        if let GenusIdentity::Promoted { ott_id, ncbi_id, .. } = &lineage.genus {
            self.updated_genus_ott_id = Some(*ott_id);
            self.updated_genus_ncbi_id = ncbi_id.clone();
        }
        if let Some(genus) = lineage.corrected_genus() {
            self.updated_genus = (!genus.is_empty()).then(|| genus.to_string());
        }
        if let Some(species_ott_id) = lineage.species_ott_id {
            self.updated_species_ott_id = Some(species_ott_id);
        }
    }
}

/// Similarity between the supplied and the matched name, 0 to 100
pub fn similarity_score(supplied: &str, matched: &str) -> u8 {
    (rapidfuzz::fuzz::ratio(supplied.chars(), matched.chars()) * 100.0).round() as u8
}

/// Counts for a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub matched: usize,
    pub unmatched: usize,
}

pub struct BatchRunner {
    orchestrator: Arc<Orchestrator>,
    context: String,
    taxon_filter: Vec<String>,
    /// Accept genus-only answers for records with a species epithet
    genus_search: bool,
}

impl BatchRunner {
    pub fn new(orchestrator: Arc<Orchestrator>, context: &str, taxon_filter: Vec<String>) -> Self {
        Self {
            orchestrator,
            context: context.to_string(),
            taxon_filter,
            genus_search: false,
        }
    }

    pub fn with_genus_search(mut self, genus_search: bool) -> Self {
        self.genus_search = genus_search;
        self
    }

    /// `<prefix>_matched.csv` and `<prefix>_unmatched.csv`
    pub fn output_paths(prefix: &str) -> (PathBuf, PathBuf) {
        (
            PathBuf::from(format!("{}_matched.csv", prefix)),
            PathBuf::from(format!("{}_unmatched.csv", prefix)),
        )
    }

    pub async fn run(&self, input: &Path, prefix: &str) -> Result<BatchSummary> {
        let records = io::read_records(input)?;
        let total = records.len();
        info!(input = %input.display(), total, "Starting batch");

        let mut matched = Vec::new();
        let mut unmatched = Vec::new();
        for (i, record) in records.iter().enumerate() {
            let output = self.process(record).await;
            match output.problem {
                Some(problem) => {
                    info!("Record {} of {} processed. Taxonomy Error: {}", i + 1, total, problem);
                    unmatched.push(output);
                }
                None => {
                    info!("Record {} of {} processed. Record OK", i + 1, total);
                    matched.push(output);
                }
            }
        }

        let (matched_path, unmatched_path) = Self::output_paths(prefix);
        io::write_records(&matched_path, &matched)?;
        io::write_records(&unmatched_path, &unmatched)?;

        let stats = self.orchestrator.lineages().cache_stats();
        info!(
            matched = matched.len(),
            unmatched = unmatched.len(),
            lineage_cache_hits = stats.hits,
            lineage_cache_misses = stats.misses,
            "Batch finished"
        );

        Ok(BatchSummary {
            total,
            matched: matched.len(),
            unmatched: unmatched.len(),
        })
    }

    /// Resolve one record. Failures become problem codes.
    pub async fn process(&self, record: &InputRecord) -> OutputRecord {
        let ott_version = self.orchestrator.lineages().source_version();
        let mut output = OutputRecord::from_input(record, ott_version);
        if record.name.trim().is_empty() {
            output.problem = Some(Problem::NoName);
            return output;
        }

        match self.fill(record, &mut output).await {
            Ok(problem) => output.problem = problem,
            Err(err) => {
                let problem = match err {
                    ResolveError::RetriesExhausted { .. } => Problem::ServiceUnavailable,
                    _ => Problem::NoName,
                };
                warn!(name = %record.name, error = %err, "Record could not be resolved");
                output = OutputRecord::from_input(record, ott_version);
                output.problem = Some(problem);
            }
        }
        output
    }

    async fn fill(&self, record: &InputRecord, output: &mut OutputRecord) -> Result<Option<Problem>> {
        let query = RawQuery::new(&record.name, &self.context, &self.taxon_filter);
        let Some(result) = self.orchestrator.resolve(&query).await? else {
            return Ok(Some(Problem::NoName));
        };

        let current = self.orchestrator.parser().parse(result.current_name()).await?;
        output.updated_genus = current.genus;
        output.updated_species = current.species;
        output.updated_subspecies = current.subspecies;
        output.updated_fullname = Some(result.current_name().to_string());
        output.name_source = Some(result.taxonomic_source().to_string());
        output.matched = Some(result.matched_name().to_string());
        output.matched_id_in_source = Some(result.source_identifier());
        output.updated_species_ncbi_id = result.species_cross_reference_id().map(str::to_string);
        if let Some(ott_id) = result.ott_id() {
            match result.taxonomic_level() {
                Rank::Species => output.updated_species_ott_id = Some(ott_id),
                Rank::Genus => output.updated_genus_ott_id = Some(ott_id),
                _ => {}
            }
        }
        output.score = Some(similarity_score(&record.scored_name(), result.matched_name()));

        let taxonomy = self
            .orchestrator
            .attach_taxonomy(&query, &result, output.updated_genus.as_deref())
            .await?;
        match taxonomy {
            TaxonomyOutcome::Authoritative(lineage) => {
                output.apply_lineage(&lineage);
                output.taxonomy_source = Some(Lineage::SOURCE.to_string());
            }
            TaxonomyOutcome::Fallback { ranks, source } => {
                output.ranks = ranks;
                output.taxonomy_source = Some(source.to_string());
            }
            TaxonomyOutcome::Missing => return Ok(Some(Problem::NoTaxonomy)),
        }

        if result.homonym_suspected {
            return Ok(Some(Problem::Homonym));
        }
        if record.species_hint().is_some() && output.updated_species.is_none() && !self.genus_search {
            return Ok(Some(Problem::NoSpecies));
        }
        Ok(None)
    }
}
