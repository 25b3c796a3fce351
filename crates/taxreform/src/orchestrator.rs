//! Resolution state machine
//!
//! ```text
//! FuzzySearch ──▶ SpeciesExact ──▶ Done
//!   │   ▲             │
//!   │   └ genus retry ▼
//!   └───────────▶ GenusExact ──▶ Done
//!                     │
//!                     ▼
//!                 NameCheck ──▶ Done (verified or fuzzy-only)
//! ```

use crate::error::Result;
use crate::lineage::{Lineage, LineageBuilder};
use crate::parser::NameParser;
use crate::resolution::{Resolution, ResolutionResult};
use crate::resolver::{AuthoritativeResolver, OttNameCheck, SpeciesLookup};
use crate::selector::{CandidateSelector, Selection};
use crate::services::{FuzzyNameService, NameCheckService, TaxonomyService};
use crate::types::{ParsedName, RawQuery, TaxonomicSource};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

enum Phase {
    FuzzySearch { query: String, genus_retry: bool },
    SpeciesExact { selection: Selection, name: ParsedName },
    GenusExact { selection: Selection, genus: String },
    NameCheck { selection: Selection },
    Done(Option<ResolutionResult>),
}

/// Where a resolved record's higher taxonomy comes from
#[derive(Debug, Clone, PartialEq)]
pub enum TaxonomyOutcome {
    /// Lineage verified by OTT
    Authoritative(Lineage),
    /// Lower-confidence ranks from the name source itself
    Fallback {
        ranks: BTreeMap<String, String>,
        source: TaxonomicSource,
    },
    Missing,
}

pub struct Orchestrator {
    selector: CandidateSelector,
    resolver: AuthoritativeResolver,
    lineages: LineageBuilder,
    parser: Arc<dyn NameParser>,
    name_checks: Vec<Arc<dyn NameCheckService>>,
    accept_unverified_lineage: bool,
}

impl Orchestrator {
    /// Orchestrator with OTT as the only exact name-check service
    pub fn new(
        fuzzy: Arc<dyn FuzzyNameService>,
        taxonomy: Arc<dyn TaxonomyService>,
        parser: Arc<dyn NameParser>,
        source_version: Option<String>,
    ) -> Self {
        let lineages = LineageBuilder::new(taxonomy.clone(), source_version);
        let ott_check: Arc<dyn NameCheckService> =
            Arc::new(OttNameCheck::new(taxonomy.clone(), lineages.clone()));

        Self {
            selector: CandidateSelector::new(fuzzy),
            resolver: AuthoritativeResolver::new(taxonomy),
            lineages,
            parser,
            name_checks: vec![ott_check],
            accept_unverified_lineage: false,
        }
    }

    /// Register another exact name-check service, tried after the existing ones
    pub fn with_name_check(mut self, service: Arc<dyn NameCheckService>) -> Self {
        self.name_checks.push(service);
        self
    }

    /// Let records fall back to the fuzzy candidate's classification path
    /// when OTT has no lineage for them
    pub fn with_unverified_lineage(mut self, accept: bool) -> Self {
        self.accept_unverified_lineage = accept;
        self
    }

    pub fn lineages(&self) -> &LineageBuilder {
        &self.lineages
    }

    pub fn parser(&self) -> &dyn NameParser {
        self.parser.as_ref()
    }

    /// Resolve one query; `None` when no service knows the name
    pub async fn resolve(&self, query: &RawQuery) -> Result<Option<ResolutionResult>> {
        let mut phase = Phase::FuzzySearch {
            query: query.full_name.clone(),
            genus_retry: false,
        };

        loop {
            phase = match phase {
                Phase::FuzzySearch { query: name, genus_retry } => {
                    self.fuzzy_search(query, name, genus_retry).await?
                }
                Phase::SpeciesExact { selection, name } => {
                    let lookup = self.resolver.resolve_species(&name, &query.context).await?;
                    match lookup {
                        SpeciesLookup::Species(taxon) => {
                            let lineage = self.lineages.build(taxon.ott_id).await?;
                            let resolution = Resolution::verified(
                                selection.candidate.canonical_form.clone(),
                                taxon,
                                TaxonomicSource::Ott,
                                lineage,
                            );
                            Phase::Done(Some(ResolutionResult::new(
                                resolution,
                                selection.homonym_suspected,
                            )))
                        }
                        _ => match name.genus {
                            Some(genus) => Phase::GenusExact { selection, genus },
                            None => Phase::NameCheck { selection },
                        },
                    }
                }
                Phase::GenusExact { selection, genus } => {
                    let taxon = self.resolver.resolve_genus(&genus, &query.context).await?;
                    match taxon {
                        Some(taxon) => {
                            let lineage = self.lineages.build(taxon.ott_id).await?;
                            let resolution = Resolution::verified(
                                taxon.matched_name.clone(),
                                taxon,
                                TaxonomicSource::Ott,
                                lineage,
                            );
                            Phase::Done(Some(ResolutionResult::new(
                                resolution,
                                selection.homonym_suspected,
                            )))
                        }
                        None => Phase::NameCheck { selection },
                    }
                }
                Phase::NameCheck { selection } => self.name_check(query, selection).await?,
                Phase::Done(result) => return Ok(result),
            };
        }
    }

    async fn fuzzy_search(&self, query: &RawQuery, name: String, genus_retry: bool) -> Result<Phase> {
        if let Some(selection) = self.selector.select(&name, &query.taxon_filter).await? {
            let chosen = self.parse_candidate(&selection).await?;
            return Ok(match chosen.genus.clone() {
                Some(genus) if genus_retry || !chosen.has_species() => {
                    Phase::GenusExact { selection, genus }
                }
                Some(_) => Phase::SpeciesExact {
                    selection,
                    name: chosen,
                },
                None => Phase::NameCheck { selection },
            });
        }

        if genus_retry {
            return Ok(Phase::Done(None));
        }
        let parsed = self.parser.parse(&name).await?;
        match parsed.genus {
            Some(genus) if parsed.species.is_some() => {
                debug!(query = %name, genus = %genus, "No fuzzy match, retrying with genus");
                Ok(Phase::FuzzySearch {
                    query: genus,
                    genus_retry: true,
                })
            }
            _ => Ok(Phase::Done(None)),
        }
    }

    /// Parse the candidate's accepted name, or its canonical form if the
    /// accepted name does not parse
    async fn parse_candidate(&self, selection: &Selection) -> Result<ParsedName> {
        let candidate = &selection.candidate;
        let parsed = self.parser.parse(candidate.preferred_name()).await?;
        if parsed.genus.is_some() || candidate.current_name.is_none() {
            return Ok(parsed);
        }
        self.parser.parse(&candidate.canonical_form).await
    }

    async fn name_check(&self, query: &RawQuery, selection: Selection) -> Result<Phase> {
        let canonical = &selection.candidate.canonical_form;
        for service in &self.name_checks {
            if let Some(check) = service.check_name(canonical, &query.context).await? {
                debug!(name = %canonical, service = service.name(), "Name confirmed by exact check");
                let resolution =
                    Resolution::verified(canonical.clone(), check.taxon, check.source, check.lineage);
                return Ok(Phase::Done(Some(ResolutionResult::new(
                    resolution,
                    selection.homonym_suspected,
                ))));
            }
        }

        info!(name = %canonical, "No exact match anywhere, keeping fuzzy candidate");
        Ok(Phase::Done(Some(ResolutionResult::new(
            Resolution::unverified(selection.candidate),
            selection.homonym_suspected,
        ))))
    }

    /// Higher taxonomy for a resolved record.
    ///
    /// OTT lineages are used as they are. Anything else first gets one more
    /// exact genus lookup in OTT for `genus`, and only falls back to the name
    /// source's own ranks if that fails.
    pub async fn attach_taxonomy(
        &self,
        query: &RawQuery,
        result: &ResolutionResult,
        genus: Option<&str>,
    ) -> Result<TaxonomyOutcome> {
        if result.taxonomic_source().is_authoritative() {
            return Ok(match result.lineage() {
                Some(lineage) => TaxonomyOutcome::Authoritative(lineage.clone()),
                None => TaxonomyOutcome::Missing,
            });
        }

        if let Some(genus) = genus.filter(|g| !g.is_empty()) {
            if let Some(taxon) = self.resolver.resolve_genus(genus, &query.context).await? {
                if taxon.rank.is_genus_level() {
                    if let Some(lineage) = self.lineages.build(taxon.ott_id).await? {
                        debug!(genus, ott_id = taxon.ott_id, "Genus lineage taken from OTT");
                        return Ok(TaxonomyOutcome::Authoritative(lineage));
                    }
                }
            }
        }

        if let Some(lineage) = result.lineage() {
            return Ok(TaxonomyOutcome::Fallback {
                ranks: lineage.ranks.clone(),
                source: result.taxonomic_source(),
            });
        }
        if self.accept_unverified_lineage {
            if let Some(ranks) = result.candidate_taxonomy() {
                return Ok(TaxonomyOutcome::Fallback {
                    ranks,
                    source: result.taxonomic_source(),
                });
            }
        }
        Ok(TaxonomyOutcome::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::GenusIdentity;
    use crate::parser::CanonicalParser;
    use crate::services::NameCheck;
    use crate::testing::{apis_info, candidate, honeybee_info, taxon_match, FakeFuzzy, FakeTaxonomy};
    use crate::types::{DataSource, Rank, ResolvedTaxon};
    use async_trait::async_trait;

    const INSECT_PATH: (&str, &str) = (
        "Animalia|Arthropoda|Insecta|Hymenoptera|Apidae|Apis|Apis mellifera",
        "kingdom|phylum|class|order|family|genus|species",
    );

    fn orchestrator(fuzzy: FakeFuzzy, taxonomy: FakeTaxonomy) -> Orchestrator {
        Orchestrator::new(
            Arc::new(fuzzy),
            Arc::new(taxonomy),
            Arc::new(CanonicalParser),
            Some("ott3.6".to_string()),
        )
    }

    fn query(name: &str) -> RawQuery {
        RawQuery::new(name, "Insects", &[])
    }

    fn honeybee_taxonomy() -> FakeTaxonomy {
        FakeTaxonomy::default()
            .with_match(
                "Apis mellifera",
                vec![taxon_match("Apis mellifera", 1.0, 1000, "Apis mellifera", "species", Some("7460"))],
            )
            .with_match("Apis", vec![taxon_match("Apis", 1.0, 10, "Apis", "genus", Some("7459"))])
            .with_taxon(honeybee_info())
            .with_taxon(apis_info())
    }

    #[tokio::test]
    async fn test_misspelled_species_resolves_through_ott() {
        let fuzzy = FakeFuzzy::default().with(
            "Apis meliffera",
            vec![candidate("Apis mellifera", 95.0, DataSource::Ott, Some(INSECT_PATH))],
        );
        let result = orchestrator(fuzzy, honeybee_taxonomy())
            .resolve(&query("Apis meliffera"))
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(result.resolution, Resolution::Species(_)));
        assert_eq!(result.matched_name(), "Apis mellifera");
        assert_eq!(result.taxonomic_source(), TaxonomicSource::Ott);
        assert_eq!(result.species_cross_reference_id(), Some("7460"));

        let lineage = result.lineage().unwrap();
        assert_eq!(lineage.ranks.get("order").map(String::as_str), Some("Hymenoptera"));
        assert!(!lineage.ranks.contains_key("genus"));
        assert!(matches!(lineage.genus, GenusIdentity::Promoted { ref name, .. } if name == "Apis"));
    }

    #[tokio::test]
    async fn test_species_miss_falls_back_to_genus() {
        let fuzzy = FakeFuzzy::default().with(
            "Apis nova",
            vec![candidate("Apis nova", 90.0, DataSource::Gbif, None)],
        );
        let result = orchestrator(fuzzy, honeybee_taxonomy())
            .resolve(&query("Apis nova"))
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(result.resolution, Resolution::Genus(_)));
        assert_eq!(result.taxonomic_level(), &Rank::Genus);
        assert_eq!(result.matched_name(), "Apis");
        assert_eq!(result.current_name(), "Apis");
    }

    #[tokio::test]
    async fn test_no_candidate_retries_fuzzy_with_genus() {
        let fuzzy = FakeFuzzy::default()
            .with("Apis", vec![candidate("Apis", 100.0, DataSource::Ott, None)]);
        let fuzzy = Arc::new(fuzzy);
        let orchestrator = Orchestrator::new(
            fuzzy.clone(),
            Arc::new(honeybee_taxonomy()),
            Arc::new(CanonicalParser),
            None,
        );

        let result = orchestrator.resolve(&query("Apis xyzzy")).await.unwrap().unwrap();
        assert_eq!(fuzzy.queries(), vec!["Apis xyzzy", "Apis"]);
        assert_eq!(result.taxonomic_level(), &Rank::Genus);
    }

    #[tokio::test]
    async fn test_unknown_name_is_none() {
        let fuzzy = Arc::new(FakeFuzzy::default());
        let orchestrator = Orchestrator::new(
            fuzzy.clone(),
            Arc::new(FakeTaxonomy::default()),
            Arc::new(CanonicalParser),
            None,
        );

        assert!(orchestrator.resolve(&query("Nullus nihil")).await.unwrap().is_none());
        assert_eq!(fuzzy.queries(), vec!["Nullus nihil", "Nullus"]);
        assert!(orchestrator.resolve(&query("Nullus")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unconfirmed_candidate_is_unverified() {
        let fuzzy = FakeFuzzy::default().with(
            "Bombus terrestris",
            vec![candidate(
                "Bombus terrestris",
                80.0,
                DataSource::Other(12),
                Some(("Animalia|Apidae|Bombus|Bombus terrestris", "kingdom|family|genus|")),
            )],
        );
        let result = orchestrator(fuzzy, FakeTaxonomy::default())
            .resolve(&query("Bombus terrestris"))
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(result.resolution, Resolution::Unverified(_)));
        assert_eq!(result.taxonomic_level(), &Rank::Species);
        assert_eq!(result.taxonomic_source().to_string(), "GN_datasourceid_12");
        assert!(result.lineage().is_none());
    }

    struct FixedCheck;

    #[async_trait]
    impl NameCheckService for FixedCheck {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn check_name(&self, name: &str, _context: &str) -> Result<Option<NameCheck>> {
            Ok(Some(NameCheck {
                taxon: ResolvedTaxon {
                    matched_name: name.to_string(),
                    current_name: "Bombus terrestris".to_string(),
                    rank: Rank::Species,
                    ott_id: 0,
                    ncbi_id: None,
                },
                source: TaxonomicSource::GlobalNames(DataSource::Gbif),
                lineage: None,
            }))
        }
    }

    #[tokio::test]
    async fn test_registered_name_check_confirms_after_ott() {
        let fuzzy = FakeFuzzy::default().with(
            "Bombus terestris",
            vec![candidate("Bombus terrestris", 80.0, DataSource::Gbif, None)],
        );
        let result = orchestrator(fuzzy, FakeTaxonomy::default())
            .with_name_check(Arc::new(FixedCheck))
            .resolve(&query("Bombus terestris"))
            .await
            .unwrap()
            .unwrap();

        assert!(matches!(result.resolution, Resolution::Species(_)));
        assert_eq!(result.taxonomic_source().to_string(), "GN_datasourceid_11");
        assert_eq!(result.matched_name(), "Bombus terrestris");
    }

    #[tokio::test]
    async fn test_resolution_is_idempotent() {
        let fuzzy = FakeFuzzy::default().with(
            "Apis meliffera",
            vec![candidate("Apis mellifera", 95.0, DataSource::Ott, Some(INSECT_PATH))],
        );
        let orchestrator = orchestrator(fuzzy, honeybee_taxonomy());

        let first = orchestrator.resolve(&query("Apis meliffera")).await.unwrap().unwrap();
        let second = orchestrator.resolve(&query("Apis meliffera")).await.unwrap().unwrap();
        assert_eq!(
            serde_json::to_string(&first.view()).unwrap(),
            serde_json::to_string(&second.view()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_attach_taxonomy_prefers_ott_genus_lineage() {
        let orchestrator = orchestrator(FakeFuzzy::default(), honeybee_taxonomy());
        let unverified = ResolutionResult::new(
            Resolution::unverified(candidate("Apis nova", 70.0, DataSource::Gbif, None)),
            false,
        );

        let outcome = orchestrator
            .attach_taxonomy(&query("Apis nova"), &unverified, Some("Apis"))
            .await
            .unwrap();
        match outcome {
            TaxonomyOutcome::Authoritative(lineage) => assert_eq!(lineage.ott_id, 10),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_attach_taxonomy_without_lineage_is_missing() {
        let unverified = ResolutionResult::new(
            Resolution::unverified(candidate(
                "Bombus terrestris",
                70.0,
                DataSource::Gbif,
                Some(("Animalia|Apidae|Bombus terrestris", "kingdom|family|")),
            )),
            false,
        );
        let q = query("Bombus terrestris");

        let strict = orchestrator(FakeFuzzy::default(), FakeTaxonomy::default());
        let outcome = strict.attach_taxonomy(&q, &unverified, Some("Bombus")).await.unwrap();
        assert_eq!(outcome, TaxonomyOutcome::Missing);

        let lenient = orchestrator(FakeFuzzy::default(), FakeTaxonomy::default())
            .with_unverified_lineage(true);
        match lenient.attach_taxonomy(&q, &unverified, Some("Bombus")).await.unwrap() {
            TaxonomyOutcome::Fallback { ranks, source } => {
                assert_eq!(ranks.get("family").map(String::as_str), Some("Apidae"));
                assert_eq!(source, TaxonomicSource::GlobalNames(DataSource::Gbif));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
}
