//! Taxonomic name resolution
//!
//! Resolves raw, often misspelled scientific names to a single accepted
//! identity. A fuzzy Global Names search picks a candidate, exact Open Tree
//! Taxonomy lookups confirm it (species first, then genus), and the OTT
//! lineage of the confirmed taxon supplies the higher taxonomy.
//!
//! ```no_run
//! use std::sync::Arc;
//! use taxreform::{GnamesService, Orchestrator, OtolService, RawQuery, RetryPolicy};
//! use taxreform::parser::CanonicalParser;
//!
//! # async fn run() -> taxreform::Result<()> {
//! let policy = RetryPolicy::default();
//! let taxonomy = Arc::new(OtolService::new(otol_api::OtolClient::new(), policy.clone()));
//! let fuzzy = Arc::new(GnamesService::new(gnames_api::GnamesClient::new(), policy));
//! let orchestrator = Orchestrator::new(fuzzy, taxonomy, Arc::new(CanonicalParser), None);
//!
//! let query = RawQuery::new("Apis meliffera", "Insects", &[]);
//! if let Some(result) = orchestrator.resolve(&query).await? {
//!     println!("{} ({})", result.current_name(), result.taxonomic_level());
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod io;
pub mod lineage;
pub mod orchestrator;
pub mod parser;
pub mod resolution;
pub mod resolver;
pub mod selector;
pub mod server;
pub mod services;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchRunner, BatchSummary, Problem};
pub use client::{GnamesService, OtolService, RetryPolicy};
pub use error::{ResolveError, Result};
pub use lineage::{GenusIdentity, Lineage, LineageBuilder};
pub use orchestrator::{Orchestrator, TaxonomyOutcome};
pub use resolution::{Resolution, ResolutionResult};
pub use types::{Candidate, ParsedName, Rank, RawQuery, ResolvedTaxon, TaxonomicSource};
