//! Typed list filters
//!
//! Unknown query keys are ignored by deserialization; only these fields
//! take part in filtering.

use super::{CharacterRecord, SeriesRecord};

/// Character list filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterFilter {
    /// Case-insensitive substring of the name
    pub name: Option<String>,
    /// Case-insensitive substring of any species name
    pub species: Option<String>,
    pub important: Option<bool>,
    pub keep: Option<bool>,
}

impl CharacterFilter {
    pub fn matches(&self, record: &CharacterRecord) -> bool {
        if let Some(name) = non_blank(&self.name) {
            if !record.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(species) = non_blank(&self.species) {
            if !record.has_species_like(species) {
                return false;
            }
        }
        if let Some(important) = self.important {
            if record.important != important {
                return false;
            }
        }
        if let Some(keep) = self.keep {
            if record.keep != keep {
                return false;
            }
        }
        true
    }
}

/// Series list filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
}

impl SeriesFilter {
    pub fn matches(&self, record: &SeriesRecord) -> bool {
        match non_blank(&self.title) {
            Some(title) => record.title.to_lowercase().contains(&title.to_lowercase()),
            None => true,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
