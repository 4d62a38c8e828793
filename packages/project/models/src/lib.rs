#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Project record types produced by the legislature scraper.
//!
//! A [`ProjectRecord`] is the aggregated result of scraping one bill's
//! detail page: its identification metadata, which tabs the page carries,
//! and the documents that were downloaded for it. The
//! [`analysis`] module holds the structured output of the LLM
//! legislation parser, which may be attached to each [`FileReference`].

pub mod analysis;

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

pub use analysis::{Category, Evidence, LegislationAnalysis};

/// One scraped bill ("Projeto de Lei").
///
/// Field order here is the field order of the persisted JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    /// Absolute URL of the project detail page.
    pub url: String,
    /// Trailing path segment of [`Self::url`] (e.g. `"140595"`).
    pub id: String,
    /// Identification tab fields, keyed by normalized label.
    pub metadata: ProjectMetadata,
    /// Whether the page has a "votações" tab.
    pub has_votacoes: bool,
    /// Whether the page has a "tramitações" tab.
    pub has_tramitacoes: bool,
    /// Documents downloaded for this project, in page order.
    pub files: Vec<FileReference>,
}

/// A document downloaded from a project's "documentos" tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReference {
    /// Link text as shown on the page (or `"document"` when blank).
    pub name: String,
    /// Where the bytes were written.
    pub local_path: String,
    /// Where the bytes came from.
    pub remote_url: String,
    /// Semantic analysis of the document, when one was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<LegislationAnalysis>,
}

/// Metadata keys the project page is known to emit.
///
/// The metadata map stays open because label text changes with the site;
/// these are the keys observed on current pages.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum WellKnownKey {
    /// Process number (e.g. `"00362/25"`).
    Processo,
    /// Bill identifier (e.g. `"PLL 135/25"`).
    Projeto,
    /// Summary line of the bill.
    Ementa,
    /// Date the process was opened.
    DataDeAbertura,
    /// Authoring council members.
    Autores,
    /// Administrative status (e.g. `"ARQUIVADO"`).
    Situacao,
    /// Plenary status (e.g. `"APROVADO"`).
    SituacaoPlenaria,
    /// Current location (e.g. `"ARQ - SETOR DE ARQUIVO"`).
    LocalizacaoAtual,
    /// Date of the last procedural step.
    UltimaTramitacao,
}

/// Ordered string-to-string map of identification fields.
///
/// Keys are unique and iterate in insertion order, which is the order the
/// labels appear on the page. Re-inserting an existing key replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    entries: Vec<(String, String)>,
}

impl ProjectMetadata {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts a field, returning the previous value if the key was present.
    pub fn insert(&mut self, key: String, value: String) -> Option<String> {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.entries.push((key, value));
        None
    }

    /// Looks up a field by normalized key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Looks up one of the [`WellKnownKey`] fields.
    #[must_use]
    pub fn well_known(&self, key: WellKnownKey) -> Option<&str> {
        self.get(key.as_ref())
    }

    /// Number of fields.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no fields.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl FromIterator<(String, String)> for ProjectMetadata {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut metadata = Self::new();
        for (key, value) in iter {
            metadata.insert(key, value);
        }
        metadata
    }
}

impl Serialize for ProjectMetadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for ProjectMetadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MetadataVisitor;

        impl<'de> Visitor<'de> for MetadataVisitor {
            type Value = ProjectMetadata;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string fields")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut metadata = ProjectMetadata::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    metadata.insert(key, value);
                }
                Ok(metadata)
            }
        }

        deserializer.deserialize_map(MetadataVisitor)
    }
}
