//! Resolution outcomes
//!
//! One variant per way a query can end up resolved. Each variant only holds
//! what is known for that outcome, and `ResolutionResult` flattens it back to
//! the common field set for output.

use crate::lineage::Lineage;
use crate::types::{Candidate, Rank, ResolvedTaxon, TaxonomicSource};
use serde::Serialize;
use std::collections::BTreeMap;

/// Identity confirmed by an exact match
#[derive(Debug, Clone, PartialEq)]
pub struct Verified {
    /// Name the query was resolved through
    pub matched_name: String,
    pub taxon: ResolvedTaxon,
    pub source: TaxonomicSource,
    pub lineage: Option<Lineage>,
}

/// Fuzzy candidate that no exact-match service confirmed
#[derive(Debug, Clone, PartialEq)]
pub struct Unverified {
    pub candidate: Candidate,
    /// Rank inferred from the classification path
    pub level: Rank,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Species or subspecies confirmed
    Species(Verified),
    /// Genus or a higher taxon confirmed
    Genus(Verified),
    Unverified(Unverified),
}

impl Resolution {
    /// Variant chosen by the rank the service reported
    pub fn verified(
        matched_name: String,
        taxon: ResolvedTaxon,
        source: TaxonomicSource,
        lineage: Option<Lineage>,
    ) -> Self {
        let verified = Verified {
            matched_name,
            taxon,
            source,
            lineage,
        };
        if verified.taxon.rank.is_species_level() {
            Self::Species(verified)
        } else {
            Self::Genus(verified)
        }
    }

    pub fn unverified(candidate: Candidate) -> Self {
        let level = candidate.inferred_rank();
        Self::Unverified(Unverified { candidate, level })
    }
}

/// Terminal answer for one query
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionResult {
    pub resolution: Resolution,
    /// The fuzzy choice was ambiguous across kingdoms
    pub homonym_suspected: bool,
}

impl ResolutionResult {
    pub fn new(resolution: Resolution, homonym_suspected: bool) -> Self {
        Self {
            resolution,
            homonym_suspected,
        }
    }

    fn verified(&self) -> Option<&Verified> {
        match &self.resolution {
            Resolution::Species(v) | Resolution::Genus(v) => Some(v),
            Resolution::Unverified(_) => None,
        }
    }

    pub fn matched_name(&self) -> &str {
        match &self.resolution {
            Resolution::Species(v) | Resolution::Genus(v) => &v.matched_name,
            Resolution::Unverified(u) => &u.candidate.canonical_form,
        }
    }

    pub fn current_name(&self) -> &str {
        match &self.resolution {
            Resolution::Species(v) | Resolution::Genus(v) => &v.taxon.current_name,
            Resolution::Unverified(u) => &u.candidate.canonical_form,
        }
    }

    /// OTT id when verified, otherwise the Global Names data source id
    pub fn source_identifier(&self) -> String {
        match &self.resolution {
            Resolution::Species(v) | Resolution::Genus(v) => v.taxon.source_identifier(),
            Resolution::Unverified(u) => u.candidate.source.id().to_string(),
        }
    }

    /// NCBI id of a confirmed species
    pub fn species_cross_reference_id(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Species(v) => v.taxon.ncbi_id.as_deref(),
            _ => None,
        }
    }

    pub fn taxonomic_source(&self) -> TaxonomicSource {
        match &self.resolution {
            Resolution::Species(v) | Resolution::Genus(v) => v.source,
            Resolution::Unverified(u) => TaxonomicSource::GlobalNames(u.candidate.source),
        }
    }

    pub fn taxonomic_level(&self) -> &Rank {
        match &self.resolution {
            Resolution::Species(v) | Resolution::Genus(v) => &v.taxon.rank,
            Resolution::Unverified(u) => &u.level,
        }
    }

    pub fn lineage(&self) -> Option<&Lineage> {
        self.verified()?.lineage.as_ref()
    }

    /// OTT id of the resolved taxon, if OTT confirmed it
    pub fn ott_id(&self) -> Option<u64> {
        self.verified()
            .filter(|v| v.source.is_authoritative())
            .map(|v| v.taxon.ott_id)
    }

    /// Ranked ancestors from the fuzzy candidate's classification path
    pub fn candidate_taxonomy(&self) -> Option<BTreeMap<String, String>> {
        match &self.resolution {
            Resolution::Unverified(u) => u
                .candidate
                .classification
                .as_ref()
                .map(|path| path.higher_taxonomy())
                .filter(|ranks| !ranks.is_empty()),
            _ => None,
        }
    }

    pub fn view(&self) -> ResolutionView<'_> {
        ResolutionView {
            matched_name: self.matched_name(),
            current_name: self.current_name(),
            source_identifier: self.source_identifier(),
            species_cross_reference_id: self.species_cross_reference_id(),
            taxonomic_source: self.taxonomic_source(),
            taxonomic_level: self.taxonomic_level(),
            lineage: self.lineage(),
            homonym_suspected: self.homonym_suspected,
        }
    }
}

/// Flat, serializable form of a `ResolutionResult`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionView<'a> {
    pub matched_name: &'a str,
    pub current_name: &'a str,
    pub source_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub species_cross_reference_id: Option<&'a str>,
    pub taxonomic_source: TaxonomicSource,
    pub taxonomic_level: &'a Rank,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lineage: Option<&'a Lineage>,
    pub homonym_suspected: bool,
}
