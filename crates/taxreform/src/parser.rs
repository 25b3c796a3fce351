//! Scientific name parsing
//!
//! Splitting a name string into genus, species and subspecies is delegated to
//! an external parser (`gnparser`). A plain whitespace splitter covers
//! already-canonical names and serves as an offline fallback.

use crate::error::{ResolveError, Result};
use crate::types::ParsedName;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;

/// Parses a free-text scientific name into its components
#[async_trait]
pub trait NameParser: Send + Sync {
    async fn parse(&self, name: &str) -> Result<ParsedName>;
}

const RANK_MARKERS: &[&str] = &[
    "subsp.", "ssp.", "subsp", "ssp", "var.", "var", "f.", "forma", "morph", "ab.",
];

/// Splits a canonical (or near-canonical) name on whitespace.
///
/// The first capitalised token is the genus; following lower-case epithets
/// are species and subspecies. Infraspecific rank markers and a
/// parenthesised subgenus are skipped; anything else (authorship, years)
/// ends the name. A single token is taken to be a genus or higher taxon.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalParser;

impl CanonicalParser {
    pub fn split(name: &str) -> ParsedName {
        let mut tokens = name.split_whitespace();
        let genus = match tokens.next() {
            Some(t) if t.chars().next().is_some_and(char::is_uppercase) => {
                t.trim_end_matches([',', '.']).to_string()
            }
            _ => return ParsedName::default(),
        };

        let mut epithets = Vec::new();
        for token in tokens {
            if epithets.len() == 2 {
                break;
            }
            if RANK_MARKERS.contains(&token.to_lowercase().as_str()) {
                continue;
            }
            if epithets.is_empty() && token.starts_with('(') && token.ends_with(')') {
                continue;
            }
            if is_epithet(token) {
                epithets.push(token.to_string());
            } else {
                break;
            }
        }

        let mut epithets = epithets.into_iter();
        ParsedName {
            genus: Some(genus),
            species: epithets.next(),
            subspecies: epithets.next(),
        }
    }
}

fn is_epithet(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_lowercase)
        && token.chars().all(|c| c.is_lowercase() || c == '-')
}

#[async_trait]
impl NameParser for CanonicalParser {
    async fn parse(&self, name: &str) -> Result<ParsedName> {
        Ok(Self::split(name))
    }
}

#[derive(Debug, Deserialize)]
struct GnParserOutput {
    parsed: bool,
    canonical: Option<GnCanonical>,
}

#[derive(Debug, Deserialize)]
struct GnCanonical {
    simple: String,
}

/// Runs the `gnparser` binary (<https://github.com/gnames/gnparser>)
#[derive(Debug, Clone)]
pub struct GnParser {
    path: PathBuf,
}

impl GnParser {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_output(stdout: &[u8]) -> Result<ParsedName> {
        let text = String::from_utf8_lossy(stdout);
        let line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        let output: GnParserOutput = serde_json::from_str(line)
            .map_err(|e| ResolveError::Parser(format!("unreadable gnparser output: {}", e)))?;

        match output.canonical {
            Some(canonical) if output.parsed => Ok(CanonicalParser::split(&canonical.simple)),
            _ => Ok(ParsedName::default()),
        }
    }
}

impl Default for GnParser {
    fn default() -> Self {
        Self::new("gnparser")
    }
}

#[async_trait]
impl NameParser for GnParser {
    async fn parse(&self, name: &str) -> Result<ParsedName> {
        let output = Command::new(&self.path)
            .args(["-f", "compact", name])
            .output()
            .await
            .map_err(|e| {
                ResolveError::Parser(format!("failed to run {}: {}", self.path.display(), e))
            })?;

        if !output.status.success() {
            return Err(ResolveError::Parser(format!(
                "{} exited with {}",
                self.path.display(),
                output.status
            )));
        }

        Self::read_output(&output.stdout)
    }
}
