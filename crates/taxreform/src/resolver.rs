//! Exact lookups against the authoritative taxonomy
//!
//! Species first: a binomial or trinomial is matched exactly and accepted only
//! if OTT places it at species or subspecies rank. Otherwise the genus alone is
//! matched and accepted at whatever rank OTT reports.

use crate::error::Result;
use crate::lineage::LineageBuilder;
use crate::services::{NameCheck, NameCheckService, TaxonomyService};
use crate::types::{ParsedName, Rank, ResolvedTaxon, TaxonomicSource};
use async_trait::async_trait;
use otol_api::TaxonMatch;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of the species-level exact lookup
#[derive(Debug, Clone, PartialEq)]
pub enum SpeciesLookup {
    Species(ResolvedTaxon),
    /// Best match sits at another rank
    NotSpecies(Rank),
    NotFound,
}

/// Highest-scoring match; the first one on ties
pub fn best_match(matches: &[TaxonMatch]) -> Option<&TaxonMatch> {
    matches.iter().fold(None, |best: Option<&TaxonMatch>, m| match best {
        Some(b) if b.score >= m.score => Some(b),
        _ => Some(m),
    })
}

#[derive(Clone)]
pub struct AuthoritativeResolver {
    service: Arc<dyn TaxonomyService>,
}

impl AuthoritativeResolver {
    pub fn new(service: Arc<dyn TaxonomyService>) -> Self {
        Self { service }
    }

    /// Exact lookup of the full binomial/trinomial
    pub async fn resolve_species(&self, name: &ParsedName, context: &str) -> Result<SpeciesLookup> {
        let full_name = match name.full_name() {
            Some(n) if name.has_species() => n,
            _ => return Ok(SpeciesLookup::NotFound),
        };

        let matches = self.service.match_exact(&full_name, context).await?;
        let Some(best) = best_match(&matches) else {
            debug!(name = %full_name, "No exact species match");
            return Ok(SpeciesLookup::NotFound);
        };

        let taxon = ResolvedTaxon::from_match(best);
        if taxon.rank.is_species_level() {
            Ok(SpeciesLookup::Species(taxon))
        } else {
            debug!(name = %full_name, rank = %taxon.rank, "Exact match is not a species");
            Ok(SpeciesLookup::NotSpecies(taxon.rank))
        }
    }

    /// Exact lookup of a genus (or higher) name, accepted at any rank
    pub async fn resolve_genus(&self, genus: &str, context: &str) -> Result<Option<ResolvedTaxon>> {
        let matches = self.service.match_exact(genus, context).await?;
        Ok(best_match(&matches).map(ResolvedTaxon::from_match))
    }

    /// Species first, then genus fallback
    pub async fn resolve_exact(&self, name: &ParsedName, context: &str) -> Result<Option<ResolvedTaxon>> {
        if let SpeciesLookup::Species(taxon) = self.resolve_species(name, context).await? {
            return Ok(Some(taxon));
        }
        match name.genus.as_deref() {
            Some(genus) => self.resolve_genus(genus, context).await,
            None => Ok(None),
        }
    }
}

/// Exact name check against OTT, taking the first match as returned.
///
/// Only species and genus matches count; anything else is reported and
/// skipped.
pub struct OttNameCheck {
    service: Arc<dyn TaxonomyService>,
    lineages: LineageBuilder,
}

impl OttNameCheck {
    pub fn new(service: Arc<dyn TaxonomyService>, lineages: LineageBuilder) -> Self {
        Self { service, lineages }
    }
}

#[async_trait]
impl NameCheckService for OttNameCheck {
    fn name(&self) -> &str {
        "OTT"
    }

    async fn check_name(&self, name: &str, context: &str) -> Result<Option<NameCheck>> {
        let matches = self.service.match_exact(name, context).await?;
        let Some(first) = matches.first() else {
            return Ok(None);
        };

        let mut taxon = ResolvedTaxon::from_match(first);
        match taxon.rank {
            Rank::Species => {}
            Rank::Genus => taxon.ncbi_id = None,
            ref rank => {
                warn!(query = name, rank = %rank, "Found in OTT, but not as genus or species");
                return Ok(None);
            }
        }

        let lineage = self.lineages.build(taxon.ott_id).await?;
        Ok(Some(NameCheck {
            taxon,
            source: TaxonomicSource::Ott,
            lineage,
        }))
    }
}
