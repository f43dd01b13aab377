//! Character records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Species reference as returned inside STAPI character payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRef {
    #[serde(default)]
    pub uid: Option<String>,
    pub name: String,
}

/// A character as harvested from STAPI and augmented with wiki data
///
/// Fields the harvester does not model are kept in `extra` and written back
/// unchanged, so a cache round-trip never drops upstream data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub uid: String,
    pub name: String,
    #[serde(default)]
    pub performer: Option<String>,
    #[serde(default, alias = "characterSpecies")]
    pub species: Vec<SpeciesRef>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub year_of_birth: Option<i64>,
    #[serde(default)]
    pub year_of_death: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub wiki_image: Option<String>,
    #[serde(default)]
    pub wiki_url: Option<String>,
    #[serde(default)]
    pub wiki_summary: Option<String>,
    /// Canonical-record flag; exactly one per identity group
    #[serde(default = "default_keep")]
    pub keep: bool,
    /// Curated significance flag
    #[serde(default)]
    pub important: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_keep() -> bool {
    true
}

impl CharacterRecord {
    /// Minimal record, mostly for tests and fixtures
    pub fn new(uid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            performer: None,
            species: Vec::new(),
            gender: None,
            year_of_birth: None,
            year_of_death: None,
            height: None,
            weight: None,
            status: None,
            wiki_image: None,
            wiki_url: None,
            wiki_summary: None,
            keep: true,
            important: false,
            extra: Map::new(),
        }
    }

    /// Copy wiki-derived fields from a previously cached version of this record
    ///
    /// Upstream fields stay as freshly fetched; enrichment is only filled in
    /// where the fresh record has none.
    pub fn retain_enrichment_from(&mut self, cached: &CharacterRecord) {
        if self.wiki_image.is_none() {
            self.wiki_image = cached.wiki_image.clone();
        }
        if self.wiki_url.is_none() {
            self.wiki_url = cached.wiki_url.clone();
        }
        if self.wiki_summary.is_none() {
            self.wiki_summary = cached.wiki_summary.clone();
        }
        if self.performer.is_none() {
            self.performer = cached.performer.clone();
        }
    }

    /// True if any species name contains `needle` (case-insensitive)
    pub fn has_species_like(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.species
            .iter()
            .any(|s| s.name.to_lowercase().contains(&needle))
    }
}
