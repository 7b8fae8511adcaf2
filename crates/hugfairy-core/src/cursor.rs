//! Persistence for the processed-up-to-here marker.
//!
//! The marker is the CID of the most recently answered post, stored as one
//! trimmed line of text. A run reads it once at the start and commits a new
//! one only after all of the run's replies went out.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Single-file marker persistence
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and trim the stored marker. A missing file is a hard failure:
    /// running without a marker would reply to the entire result set.
    pub fn load(&self) -> Result<String> {
        let raw = fs::read_to_string(&self.path)?;
        let marker = raw.trim().to_string();
        debug!("Loaded cursor marker {}", marker);
        Ok(marker)
    }

    /// Overwrite the stored marker
    pub fn save(&self, marker: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, marker)?;
        debug!("Committed cursor marker {}", marker);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_file_fails() {
        let temp = tempdir().expect("Failed to create temp dir");
        let store = CursorStore::new(temp.path().join("latest.txt"));

        assert!(store.load().is_err());
    }

    #[test]
    fn test_save_and_load_trims() {
        let temp = tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("latest.txt");
        fs::write(&path, "bafymarker\n").unwrap();

        let store = CursorStore::new(path);
        assert_eq!(store.load().unwrap(), "bafymarker");

        store.save("bafynewer").unwrap();
        assert_eq!(store.load().unwrap(), "bafynewer");
    }
}
