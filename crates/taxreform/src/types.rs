//! Core data types for name resolution

use gnames_api::{NameResult, GBIF_DATA_SOURCE, NCBI_DATA_SOURCE, OTT_DATA_SOURCE};
use otol_api::TaxonMatch;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Taxonomic rank as reported by a service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rank {
    Subspecies,
    Species,
    Subgenus,
    Genus,
    /// Anything above genus, or a rank string we do not interpret
    Other(String),
}

impl Rank {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "subspecies" => Self::Subspecies,
            "species" => Self::Species,
            "subgenus" => Self::Subgenus,
            "genus" => Self::Genus,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Subspecies => "subspecies",
            Self::Species => "species",
            Self::Subgenus => "subgenus",
            Self::Genus => "genus",
            Self::Other(s) => s,
        }
    }

    pub fn is_species_level(&self) -> bool {
        matches!(self, Self::Species | Self::Subspecies)
    }

    pub fn is_genus_level(&self) -> bool {
        matches!(self, Self::Genus | Self::Subgenus)
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Rank {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Global Names data source a fuzzy candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    Ott,
    Ncbi,
    Gbif,
    Other(u32),
}

impl DataSource {
    pub fn from_id(id: u32) -> Self {
        match id {
            OTT_DATA_SOURCE => Self::Ott,
            NCBI_DATA_SOURCE => Self::Ncbi,
            GBIF_DATA_SOURCE => Self::Gbif,
            other => Self::Other(other),
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            Self::Ott => OTT_DATA_SOURCE,
            Self::Ncbi => NCBI_DATA_SOURCE,
            Self::Gbif => GBIF_DATA_SOURCE,
            Self::Other(id) => *id,
        }
    }

    /// Tie-break preference among equally scored candidates, lower wins
    pub fn priority(&self) -> u8 {
        match self {
            Self::Ott => 0,
            Self::Ncbi => 1,
            Self::Gbif => 2,
            Self::Other(_) => 3,
        }
    }
}

/// Where the accepted identity of a record comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxonomicSource {
    /// Open Tree Taxonomy, the authoritative source
    Ott,
    /// A Global Names data source, unverified by an exact match
    GlobalNames(DataSource),
}

impl TaxonomicSource {
    pub fn is_authoritative(&self) -> bool {
        matches!(self, Self::Ott)
    }
}

impl fmt::Display for TaxonomicSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ott => f.write_str("OTT"),
            Self::GlobalNames(source) => write!(f, "GN_datasourceid_{}", source.id()),
        }
    }
}

impl Serialize for TaxonomicSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Input to a single resolution
#[derive(Debug, Clone)]
pub struct RawQuery {
    pub full_name: String,
    /// Taxonomic context for exact matching (e.g. "Insects", "All life")
    pub context: String,
    /// Higher taxa a fuzzy candidate should belong to; empty disables filtering
    pub taxon_filter: Vec<String>,
}

impl RawQuery {
    pub fn new(full_name: &str, context: &str, taxon_filter: &[String]) -> Self {
        Self {
            full_name: full_name.trim().to_string(),
            context: context.to_string(),
            taxon_filter: taxon_filter.to_vec(),
        }
    }
}

/// Scientific name split into its components.
///
/// No `species` means the name denotes a genus or a higher taxon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedName {
    pub genus: Option<String>,
    pub species: Option<String>,
    pub subspecies: Option<String>,
}

impl ParsedName {
    pub fn has_species(&self) -> bool {
        self.genus.is_some() && self.species.is_some()
    }

    /// Binomial or trinomial string, or the bare genus
    pub fn full_name(&self) -> Option<String> {
        let genus = self.genus.as_deref()?;
        let parts: Vec<&str> = std::iter::once(genus)
            .chain(self.species.as_deref())
            .chain(self.species.as_ref().and(self.subspecies.as_deref()))
            .collect();
        Some(parts.join(" "))
    }
}

/// One segment of a Global Names classification path
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub name: String,
    pub rank: Option<String>,
}

/// Classification path attached to a fuzzy candidate, highest rank first
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationPath {
    segments: Vec<PathSegment>,
}

impl ClassificationPath {
    /// Parse `A|B|C` names with optional aligned `kingdom|phylum|` ranks
    pub fn parse(path: &str, ranks: Option<&str>) -> Option<Self> {
        if path.trim().is_empty() {
            return None;
        }
        let ranks: Vec<Option<String>> = ranks
            .map(|r| {
                r.split('|')
                    .map(|rank| {
                        let rank = rank.trim().to_lowercase();
                        (!rank.is_empty()).then_some(rank)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let segments = path
            .split('|')
            .enumerate()
            .map(|(i, name)| PathSegment {
                name: name.trim().to_string(),
                rank: ranks.get(i).cloned().flatten(),
            })
            .collect();
        Some(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether any segment names one of `taxa` (case-insensitive)
    pub fn contains_any(&self, taxa: &[String]) -> bool {
        self.segments
            .iter()
            .any(|s| taxa.iter().any(|t| t.eq_ignore_ascii_case(&s.name)))
    }

    /// Name recorded at an explicit rank, if the path carries ranks
    pub fn name_at(&self, rank: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|s| s.rank.as_deref() == Some(rank))
            .map(|s| s.name.as_str())
    }

    /// Rank of the last segment (the candidate itself).
    ///
    /// An explicit rank wins. A blank one is inferred from its parent: a
    /// family or tribe parent means genus, a genus parent means species.
    /// Without usable ranks, a space in the canonical form means species.
    pub fn infer_rank(&self, canonical_form: &str) -> Rank {
        if self.segments.iter().any(|s| s.rank.is_some()) {
            let n = self.segments.len();
            if let Some(rank) = &self.segments[n - 1].rank {
                return Rank::parse(rank);
            }
            if let Some(parent) = n.checked_sub(2).and_then(|i| self.segments[i].rank.as_ref()) {
                if parent.contains("family") || parent.contains("tribe") {
                    return Rank::Genus;
                }
                if parent.contains("genus") {
                    return Rank::Species;
                }
            }
        }
        rank_from_name_shape(canonical_form)
    }

    /// Ranked ancestors of the candidate (every segment but the last)
    pub fn higher_taxonomy(&self) -> BTreeMap<String, String> {
        let n = self.segments.len();
        self.segments[..n.saturating_sub(1)]
            .iter()
            .filter_map(|s| Some((s.rank.clone()?, s.name.clone())))
            .collect()
    }
}

fn rank_from_name_shape(canonical_form: &str) -> Rank {
    if canonical_form.trim().contains(' ') {
        Rank::Species
    } else {
        Rank::Genus
    }
}

/// A fuzzy match candidate from Global Names
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub canonical_form: String,
    /// Currently accepted name in the source, if it differs (senior synonym)
    pub current_name: Option<String>,
    pub score: f64,
    pub source: DataSource,
    pub classification: Option<ClassificationPath>,
}

impl Candidate {
    /// Convert a resolver result; results without a canonical form are unusable
    pub fn from_name_result(result: &NameResult) -> Option<Self> {
        let canonical_form = result.canonical_form.as_deref()?.trim();
        if canonical_form.is_empty() {
            return None;
        }
        let classification = result.classification_path.as_deref().and_then(|path| {
            ClassificationPath::parse(path, result.classification_path_ranks.as_deref())
        });

        Some(Self {
            canonical_form: canonical_form.to_string(),
            current_name: result
                .current_name_string
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            score: result.score,
            source: DataSource::from_id(result.data_source_id),
            classification,
        })
    }

    /// Name to carry into exact search: the accepted name when known
    pub fn preferred_name(&self) -> &str {
        self.current_name.as_deref().unwrap_or(&self.canonical_form)
    }

    /// Rank implied by the classification path or, failing that, the name shape
    pub fn inferred_rank(&self) -> Rank {
        match &self.classification {
            Some(path) => path.infer_rank(&self.canonical_form),
            None => rank_from_name_shape(&self.canonical_form),
        }
    }
}

/// An identity accepted by the authoritative taxonomy
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTaxon {
    /// Name string the service matched
    pub matched_name: String,
    /// Currently accepted name (differs from `matched_name` for synonyms)
    pub current_name: String,
    pub rank: Rank,
    pub ott_id: u64,
    /// NCBI cross-reference id
    pub ncbi_id: Option<String>,
}

impl ResolvedTaxon {
    pub fn from_match(m: &TaxonMatch) -> Self {
        Self {
            matched_name: m.matched_name.clone(),
            current_name: m.taxon.name.clone(),
            rank: Rank::parse(&m.taxon.rank),
            ott_id: m.taxon.ott_id,
            ncbi_id: m.taxon.ncbi_id(),
        }
    }

    pub fn source_identifier(&self) -> String {
        self.ott_id.to_string()
    }
}
