//! Local cache files
//!
//! The harvest writes whole JSON documents under the root folder; the
//! server and the enrichment service only read them. Writes go through
//! [`trekdb_common::atomic::write_atomic`], so readers see either the old
//! document or the new one.

use crate::error::HarvestResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;
use trekdb_common::atomic::write_atomic;

/// Serialize `value` as pretty JSON and atomically replace `path`
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> HarvestResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value).map_err(trekdb_common::Error::from)?;
    bytes.push(b'\n');
    write_atomic(path, &bytes)?;
    Ok(())
}

/// Read a JSON cache file; missing or corrupt files read as empty
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache file unreadable, starting empty");
            return T::default();
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache file corrupt, starting empty");
            T::default()
        }
    }
}

/// File layout under the root folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn characters_path(&self) -> PathBuf {
        self.root.join("data").join("characters.json")
    }

    pub fn series_path(&self) -> PathBuf {
        self.root.join("data").join("series.json")
    }

    /// Per-series cast lists, keyed by series slug
    pub fn cast_path(&self) -> PathBuf {
        self.root.join("data").join("series-cast.json")
    }

    /// Downloaded character portraits
    pub fn character_images_dir(&self) -> PathBuf {
        self.root.join("images").join("characters")
    }

    /// Enrichment results persisted between server restarts
    pub fn enrichment_cache_path(&self) -> PathBuf {
        self.root.join("scratch").join("enrichment-cache.json")
    }
}
