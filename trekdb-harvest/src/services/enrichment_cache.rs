//! Enrichment cache
//!
//! Enriched character records keyed by `uid:<uid>` and
//! `name:<lowercased name>`. Entries never expire; the map is persisted to
//! the scratch folder so a restarted server starts warm.

use crate::error::HarvestResult;
use crate::services::cache_writer::{read_json_or_default, write_json_atomic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use trekdb_common::models::CharacterRecord;

pub fn uid_key(uid: &str) -> String {
    format!("uid:{}", uid)
}

pub fn name_key(name: &str) -> String {
    format!("name:{}", name.trim().to_lowercase())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrichmentCache {
    entries: BTreeMap<String, CharacterRecord>,
}

impl EnrichmentCache {
    /// Load from disk; missing or corrupt files give an empty cache
    pub fn load(path: &Path) -> Self {
        read_json_or_default(path)
    }

    pub fn save(&self, path: &Path) -> HarvestResult<()> {
        write_json_atomic(path, self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_by_uid(&self, uid: &str) -> Option<&CharacterRecord> {
        self.entries.get(&uid_key(uid))
    }

    pub fn get_by_name(&self, name: &str) -> Option<&CharacterRecord> {
        self.entries.get(&name_key(name))
    }

    /// Store `record` under both of its keys
    pub fn insert(&mut self, record: CharacterRecord) {
        self.entries.insert(name_key(&record.name), record.clone());
        self.entries.insert(uid_key(&record.uid), record);
    }
}
