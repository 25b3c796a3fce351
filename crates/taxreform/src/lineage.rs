//! Higher-taxonomy lineage from the Open Tree Taxonomy

use crate::error::Result;
use crate::services::TaxonomyService;
use crate::types::Rank;
use moka::future::Cache;
use otol_api::TaxonInfo;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const NO_RANK: &str = "no rank";

/// Genus-level identity implied by a lineage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GenusIdentity {
    /// Species-level taxon whose genus ancestor was found and lifted out of
    /// the rank table
    Promoted {
        name: String,
        ott_id: u64,
        ncbi_id: Option<String>,
    },
    /// Species-level taxon without a genus ancestor; genus taken from the
    /// first word of the accepted name
    Derived { name: String },
    /// Genus or subgenus; the parsed name already carries the genus
    Unchanged,
    /// Above genus; no genus-level identity applies
    NotApplicable,
}

/// Verified lineage of a taxon
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineage {
    /// Ancestors keyed by rank; no "no rank", "species" or promoted "genus" keys
    pub ranks: BTreeMap<String, String>,
    pub rank: Rank,
    pub ott_id: u64,
    pub ncbi_id: Option<String>,
    /// Name OTT currently accepts for the id (may differ from the query)
    pub accepted_name: String,
    pub genus: GenusIdentity,
    /// OTT id of the species ancestor, for subspecies
    pub species_ott_id: Option<u64>,
    /// Taxonomy snapshot the lineage was read from
    pub source_version: Option<String>,
}

impl Lineage {
    pub const SOURCE: &'static str = "OTT";

    /// Normalize a `taxon_info` response
    pub fn from_taxon_info(info: &TaxonInfo, source_version: Option<&str>) -> Self {
        let rank = Rank::parse(&info.rank);

        let mut ranks = BTreeMap::new();
        for ancestor in &info.lineage {
            if ancestor.rank.is_empty() || ancestor.rank == NO_RANK {
                continue;
            }
            ranks.insert(ancestor.rank.clone(), ancestor.name.clone());
        }

        let genus = if rank.is_species_level() {
            match info.lineage.iter().find(|a| a.rank == "genus") {
                Some(genus) => {
                    ranks.remove("genus");
                    GenusIdentity::Promoted {
                        name: genus.name.clone(),
                        ott_id: genus.ott_id,
                        ncbi_id: genus.ncbi_id(),
                    }
                }
                None => {
                    let name = info
                        .name
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .to_string();
                    warn!(
                        ott_id = info.ott_id,
                        genus = %name,
                        "No genus in lineage, deriving genus from accepted name"
                    );
                    GenusIdentity::Derived { name }
                }
            }
        } else if rank.is_genus_level() {
            GenusIdentity::Unchanged
        } else {
            GenusIdentity::NotApplicable
        };

        let species_ott_id = info
            .lineage
            .iter()
            .find(|a| a.rank == "species")
            .map(|a| a.ott_id);
        ranks.remove("species");

        Self {
            ranks,
            rank,
            ott_id: info.ott_id,
            ncbi_id: info.ncbi_id(),
            accepted_name: info.name.clone(),
            genus,
            species_ott_id,
            source_version: source_version.map(str::to_string),
        }
    }

    /// Corrected genus for output. `Some("")` clears it for ranks above
    /// genus; `None` leaves the parsed genus in place.
    pub fn corrected_genus(&self) -> Option<&str> {
        match &self.genus {
            GenusIdentity::Promoted { name, .. } | GenusIdentity::Derived { name } => Some(name),
            GenusIdentity::NotApplicable => Some(""),
            GenusIdentity::Unchanged => None,
        }
    }
}

/// Lineage cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Fetches and normalizes lineages, caching them per OTT id
#[derive(Clone)]
pub struct LineageBuilder {
    service: Arc<dyn TaxonomyService>,
    source_version: Option<String>,
    cache: Cache<u64, Option<Lineage>>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl LineageBuilder {
    const CACHE_TTL_MINS: u64 = 60;

    pub fn new(service: Arc<dyn TaxonomyService>, source_version: Option<String>) -> Self {
        let cache = Cache::builder()
            .max_capacity(10_000)
            .time_to_live(Duration::from_secs(Self::CACHE_TTL_MINS * 60))
            .build();

        Self {
            service,
            source_version,
            cache,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn source_version(&self) -> Option<&str> {
        self.source_version.as_deref()
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cache.entry_count(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Lineage for `ott_id`; `None` if the service rejects the id
    pub async fn build(&self, ott_id: u64) -> Result<Option<Lineage>> {
        if let Some(cached) = self.cache.get(&ott_id).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let lineage = self
            .service
            .taxon_info(ott_id)
            .await?
            .map(|info| Lineage::from_taxon_info(&info, self.source_version.as_deref()));

        if lineage.is_none() {
            debug!(ott_id, "No taxon info for id");
        }
        self.cache.insert(ott_id, lineage.clone()).await;
        Ok(lineage)
    }
}
