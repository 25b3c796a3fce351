//! Fuzzy candidate selection
//!
//! Picks one Global Names candidate per query: the best score within the
//! candidates that pass the higher-taxon filter (or within all candidates if
//! none pass), ties broken by source authority, then by response order.

use crate::error::Result;
use crate::services::FuzzyNameService;
use crate::types::Candidate;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// The chosen candidate and what was noticed while choosing it
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub candidate: Candidate,
    /// Equally scored candidates sit in different kingdoms
    pub homonym_suspected: bool,
}

#[derive(Clone)]
pub struct CandidateSelector {
    service: Arc<dyn FuzzyNameService>,
}

impl CandidateSelector {
    pub fn new(service: Arc<dyn FuzzyNameService>) -> Self {
        Self { service }
    }

    /// Query the fuzzy service for `name` and choose one candidate
    pub async fn select(&self, name: &str, taxon_filter: &[String]) -> Result<Option<Selection>> {
        let candidates = match self.service.fuzzy_match(name).await? {
            Some(candidates) => candidates,
            None => {
                debug!(query = name, "No fuzzy results");
                return Ok(None);
            }
        };

        let selection = choose(candidates, taxon_filter);
        if let Some(s) = &selection {
            debug!(
                query = name,
                chosen = %s.candidate.canonical_form,
                score = s.candidate.score,
                source = s.candidate.source.id(),
                "Selected fuzzy candidate"
            );
            if s.homonym_suspected {
                warn!(query = name, chosen = %s.candidate.canonical_form, "Possible cross-kingdom homonym");
            }
        }
        Ok(selection)
    }
}

/// Deterministic choice among `candidates`
pub fn choose(candidates: Vec<Candidate>, taxon_filter: &[String]) -> Option<Selection> {
    let filtered: Vec<&Candidate> = if taxon_filter.is_empty() {
        Vec::new()
    } else {
        candidates
            .iter()
            .filter(|c| {
                c.classification
                    .as_ref()
                    .is_some_and(|path| path.contains_any(taxon_filter))
            })
            .collect()
    };

    let unfiltered = filtered.is_empty();
    let preferred: Vec<&Candidate> = if unfiltered {
        candidates.iter().collect()
    } else {
        filtered
    };

    let max_score = preferred
        .iter()
        .map(|c| c.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let best: Vec<&Candidate> = preferred
        .into_iter()
        .filter(|c| c.score == max_score)
        .collect();

    // min_by_key keeps the first of equal keys, so response order breaks
    // remaining ties
    let chosen = best.iter().min_by_key(|c| c.source.priority())?;

    let homonym_suspected = unfiltered && {
        let kingdoms: BTreeSet<String> = best
            .iter()
            .filter_map(|c| c.classification.as_ref()?.name_at("kingdom"))
            .map(str::to_lowercase)
            .collect();
        kingdoms.len() > 1
    };

    Some(Selection {
        candidate: (*chosen).clone(),
        homonym_suspected,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{candidate, FakeFuzzy};
    use crate::types::DataSource;

    fn filter(taxa: &[&str]) -> Vec<String> {
        taxa.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_highest_score_wins() {
        let chosen = choose(
            vec![
                candidate("Apis mellifica", 0.8, DataSource::Ott, None),
                candidate("Apis mellifera", 0.95, DataSource::Other(1), None),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(chosen.candidate.canonical_form, "Apis mellifera");
    }

    #[test]
    fn test_equal_scores_prefer_ott_over_ncbi() {
        let chosen = choose(
            vec![
                candidate("Apis mellifera", 0.9, DataSource::Ncbi, None),
                candidate("Apis melifera", 0.9, DataSource::Ott, None),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(chosen.candidate.source, DataSource::Ott);
        assert_eq!(chosen.candidate.canonical_form, "Apis melifera");
    }

    #[test]
    fn test_equal_scores_prefer_gbif_over_unknown_sources() {
        let chosen = choose(
            vec![
                candidate("A", 0.9, DataSource::Other(1), None),
                candidate("B", 0.9, DataSource::Gbif, None),
                candidate("C", 0.9, DataSource::Other(2), None),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(chosen.candidate.canonical_form, "B");
    }

    #[test]
    fn test_unknown_sources_fall_back_to_response_order() {
        let chosen = choose(
            vec![
                candidate("First", 0.9, DataSource::Other(1), None),
                candidate("Second", 0.9, DataSource::Other(2), None),
            ],
            &[],
        )
        .unwrap();
        assert_eq!(chosen.candidate.canonical_form, "First");
    }

    #[test]
    fn test_filtered_candidates_take_precedence() {
        let chosen = choose(
            vec![
                candidate(
                    "Morus alba",
                    0.99,
                    DataSource::Ott,
                    Some(("Plantae|Moraceae|Morus|Morus alba", "kingdom|family|genus|species")),
                ),
                candidate(
                    "Morus bassanus",
                    0.7,
                    DataSource::Other(3),
                    Some(("Animalia|Aves|Sulidae|Morus|Morus bassanus", "kingdom|class|family|genus|species")),
                ),
            ],
            &filter(&["Aves"]),
        )
        .unwrap();
        assert_eq!(chosen.candidate.canonical_form, "Morus bassanus");
        assert!(!chosen.homonym_suspected);
    }

    #[test]
    fn test_filter_without_matches_uses_all_candidates() {
        let chosen = choose(
            vec![candidate("Apis mellifera", 0.9, DataSource::Gbif, None)],
            &filter(&["Aves"]),
        )
        .unwrap();
        assert_eq!(chosen.candidate.canonical_form, "Apis mellifera");
    }

    #[test]
    fn test_no_candidates_is_none() {
        assert!(choose(Vec::new(), &[]).is_none());
        assert!(choose(Vec::new(), &filter(&["Insecta"])).is_none());
    }

    #[test]
    fn test_cross_kingdom_tie_is_flagged() {
        let chosen = choose(
            vec![
                candidate(
                    "Morus",
                    0.9,
                    DataSource::Ott,
                    Some(("Plantae|Moraceae|Morus", "kingdom|family|genus")),
                ),
                candidate(
                    "Morus",
                    0.9,
                    DataSource::Ncbi,
                    Some(("Animalia|Sulidae|Morus", "kingdom|family|genus")),
                ),
            ],
            &[],
        )
        .unwrap();
        assert!(chosen.homonym_suspected);
        assert_eq!(chosen.candidate.source, DataSource::Ott);
    }

    #[tokio::test]
    async fn test_select_without_results_key() {
        let selector = CandidateSelector::new(std::sync::Arc::new(FakeFuzzy::default()));
        assert!(selector.select("Nothing here", &[]).await.unwrap().is_none());
    }
}
