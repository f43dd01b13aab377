//! Atomic file replacement
//!
//! Every cache and config file is written as a whole document: bytes go to a
//! sibling `.tmp` file first, then the temp file is renamed over the target.
//! A crash mid-write leaves the previous file intact.

use crate::Result;
use std::path::{Path, PathBuf};

/// Path of the temp file used while replacing `target`
pub fn temp_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

/// Write `bytes` to `target` via temp file + rename
///
/// Parent directories are created if missing.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp = temp_path_for(target);
    std::fs::write(&temp, bytes)?;

    if let Err(e) = std::fs::rename(&temp, target) {
        let _ = std::fs::remove_file(&temp);
        return Err(e.into());
    }

    tracing::debug!(path = %target.display(), bytes = bytes.len(), "Atomic write complete");
    Ok(())
}
