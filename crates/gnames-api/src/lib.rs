//! Rust client for the Global Names resolver
//!
//! The resolver fuzzy-matches a name string against a large collection of
//! nomenclatural data sources (Open Tree Taxonomy, NCBI, GBIF, Catalogue of
//! Life, ...) and returns every candidate with a similarity score and, when
//! the source provides one, a classification path.
//!
//! # Example
//!
//! ```no_run
//! use gnames_api::GnamesClient;
//!
//! # async fn example() -> Result<(), gnames_api::GnamesError> {
//! let client = GnamesClient::new();
//! let response = client.resolve("Apis meliffera").await?;
//! for result in response.results() {
//!     println!("{:?} ({}) from source {}", result.canonical_form, result.score, result.data_source_id);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::GnamesClient;
pub use error::{GnamesError, Result};
pub use types::{
    NameResult, ResolvedName, ResolverResponse, GBIF_DATA_SOURCE, NCBI_DATA_SOURCE,
    OTT_DATA_SOURCE,
};
