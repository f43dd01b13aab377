//! Series cast table
//!
//! Main casts are curated as data: each row names a series, the character
//! as it should be listed, the performer, and a rule for finding the
//! matching character record. The table is loaded from TOML:
//!
//! ```toml
//! [[entries]]
//! series_slug = "tos"
//! character_name = "Leonard McCoy"
//! performer = "DeForest Kelley"
//! match_rule = { kind = "normalized", value = "Leonard McCoy" }
//! ```

use crate::error::{HarvestError, HarvestResult};
use crate::names::normalize_name;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};
use trekdb_common::models::{CastMember, CharacterRecord};

/// How a cast entry finds its character record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum MatchRule {
    /// Name equals the value exactly
    Exact(String),
    /// Normalized names are equal
    Normalized(String),
    /// Name starts with the value (case-insensitive)
    Prefix(String),
    /// Name contains the value (case-insensitive)
    Contains(String),
}

impl MatchRule {
    pub fn value(&self) -> &str {
        match self {
            MatchRule::Exact(v)
            | MatchRule::Normalized(v)
            | MatchRule::Prefix(v)
            | MatchRule::Contains(v) => v,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            MatchRule::Exact(v) => name.trim() == v.trim(),
            MatchRule::Normalized(v) => {
                let wanted = normalize_name(v);
                !wanted.is_empty() && normalize_name(name) == wanted
            }
            MatchRule::Prefix(v) => name.to_lowercase().starts_with(&v.to_lowercase()),
            MatchRule::Contains(v) => name.to_lowercase().contains(&v.to_lowercase()),
        }
    }
}

/// One curated cast row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastEntry {
    pub series_slug: String,
    pub character_name: String,
    #[serde(default)]
    pub performer: Option<String>,
    pub match_rule: MatchRule,
}

impl CastEntry {
    /// Rule match plus performer agreement when both sides name one
    fn accepts(&self, record: &CharacterRecord) -> bool {
        if !self.match_rule.matches(&record.name) {
            return false;
        }
        match (self.performer.as_deref(), record.performer.as_deref()) {
            (Some(wanted), Some(actual)) => wanted.trim().eq_ignore_ascii_case(actual.trim()),
            _ => true,
        }
    }
}

/// Cast table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastTable {
    #[serde(default)]
    pub entries: Vec<CastEntry>,
}

impl CastTable {
    pub fn from_toml_str(source: &str) -> HarvestResult<Self> {
        let table: CastTable =
            toml::from_str(source).map_err(|e| HarvestError::Parse(format!("cast table: {}", e)))?;
        table.validate()?;
        Ok(table)
    }

    /// Load and validate a table file
    pub fn load(path: &Path) -> HarvestResult<Self> {
        let source = std::fs::read_to_string(path)?;
        let table = Self::from_toml_str(&source)?;
        info!(path = %path.display(), entries = table.entries.len(), "Loaded cast table");
        Ok(table)
    }

    /// Reject blank fields and repeated `(series_slug, character_name)` pairs
    pub fn validate(&self) -> HarvestResult<()> {
        let mut seen = HashSet::new();

        for (index, entry) in self.entries.iter().enumerate() {
            if entry.series_slug.trim().is_empty() {
                return Err(HarvestError::Validation(format!(
                    "cast entry {} has an empty series_slug",
                    index
                )));
            }
            if entry.character_name.trim().is_empty() {
                return Err(HarvestError::Validation(format!(
                    "cast entry {} ({}) has an empty character_name",
                    index, entry.series_slug
                )));
            }
            if entry.match_rule.value().trim().is_empty() {
                return Err(HarvestError::Validation(format!(
                    "cast entry {} ({} / {}) has an empty match value",
                    index, entry.series_slug, entry.character_name
                )));
            }
            if entry.performer.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(HarvestError::Validation(format!(
                    "cast entry {} ({} / {}) has a blank performer",
                    index, entry.series_slug, entry.character_name
                )));
            }

            let key = (entry.series_slug.as_str(), entry.character_name.as_str());
            if !seen.insert(key) {
                return Err(HarvestError::Validation(format!(
                    "duplicate cast entry {} / {}",
                    entry.series_slug, entry.character_name
                )));
            }
        }

        Ok(())
    }

    /// Build cast lists per series slug from canonical (`keep`) records
    ///
    /// Entries keep table order; an entry without a matching record is still
    /// listed, with `uid = None`.
    pub fn resolve(&self, characters: &[CharacterRecord]) -> BTreeMap<String, Vec<CastMember>> {
        let mut casts: BTreeMap<String, Vec<CastMember>> = BTreeMap::new();
        let mut unmatched = 0usize;

        for entry in &self.entries {
            let found = characters
                .iter()
                .filter(|record| record.keep)
                .find(|record| entry.accepts(record));

            if found.is_none() {
                unmatched += 1;
                debug!(
                    series = %entry.series_slug,
                    character = %entry.character_name,
                    "No character record for cast entry"
                );
            }

            casts
                .entry(entry.series_slug.clone())
                .or_default()
                .push(CastMember {
                    character_name: entry.character_name.clone(),
                    performer: entry
                        .performer
                        .clone()
                        .or_else(|| found.and_then(|r| r.performer.clone())),
                    uid: found.map(|r| r.uid.clone()),
                    wiki_image: found.and_then(|r| r.wiki_image.clone()),
                });
        }

        info!(
            series = casts.len(),
            entries = self.entries.len(),
            unmatched,
            "Resolved cast table"
        );
        casts
    }
}
