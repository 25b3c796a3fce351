//! Rust client for the Open Tree of Life (OTL) API, version 3
//!
//! This crate provides type-safe bindings to the OTL taxonomic name resolution
//! service (TNRS) and the Open Tree Taxonomy (OTT) endpoints.
//!
//! # Example
//!
//! ```no_run
//! use otol_api::OtolClient;
//!
//! # async fn example() -> Result<(), otol_api::OtolError> {
//! let client = OtolClient::new();
//!
//! // Exact (non-fuzzy) match, scoped to a taxonomic context
//! let response = client.match_names(&["Apis mellifera"], false, "Insects").await?;
//! for result in response.results {
//!     for m in result.matches {
//!         println!("{} -> ott{}", m.matched_name, m.taxon.ott_id);
//!     }
//! }
//!
//! // Full lineage for a taxon
//! let info = client.taxon_info(1_000_000).await?;
//! println!("{} ({})", info.name, info.rank);
//! # Ok(())
//! # }
//! ```
//!
//! # API Coverage
//!
//! - `POST /v3/tnrs/match_names` - Fuzzy or exact name matching
//! - `POST /v3/taxonomy/taxon_info` - Taxon details with lineage
//! - `POST /v3/taxonomy/about` - Taxonomy version information
//!
//! Every method performs exactly one HTTP request. Failures are reported with
//! enough detail for the caller to decide whether a retry makes sense
//! (see [`OtolError::is_transient`]).

mod client;
mod error;
mod types;

pub use client::OtolClient;
pub use error::{OtolError, Result};
pub use types::{
    cross_reference, AboutResponse, MatchNamesResponse, NameMatchResults, TaxonInfo, TaxonMatch,
    TaxonSummary,
};
