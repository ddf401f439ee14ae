// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI Configuration

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use roster_core::{open_store, RecordStore, Roster, SimilarityPolicy, StoreBackend};
use tracing::debug;

/// Database file name inside the data directory.
const DATABASE_FILE: &str = "roster.db";

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Data directory for storage.
    pub data_dir: PathBuf,
    /// Record store backend.
    pub backend: StoreBackend,
    /// Thresholds for fuzzy duplicate detection.
    pub policy: SimilarityPolicy,
}

impl CliConfig {
    /// Builds a configuration, rejecting a ratio outside `0.0..=1.0`.
    pub fn new(
        data_dir: PathBuf,
        backend: StoreBackend,
        min_ratio: f64,
        max_distance: usize,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&min_ratio) {
            bail!("--min-ratio must be between 0 and 1, got {}", min_ratio);
        }
        Ok(CliConfig {
            data_dir,
            backend,
            policy: SimilarityPolicy::new(min_ratio, max_distance),
        })
    }

    /// Returns the SQLite database path.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    /// Opens the roster, creating the data directory on first use.
    pub fn open_roster(&self) -> Result<Roster<Box<dyn RecordStore>>> {
        if self.backend == StoreBackend::Sqlite {
            fs::create_dir_all(&self.data_dir).with_context(|| {
                format!("Failed to create data directory {}", self.data_dir.display())
            })?;
        }
        debug!(
            "opening {:?} store at {}",
            self.backend,
            self.storage_path().display()
        );

        let store = open_store(self.backend, &self.storage_path())
            .with_context(|| format!("Failed to open {}", self.storage_path().display()))?;
        Ok(Roster::new(store).with_policy(self.policy))
    }
}

// INLINE_TEST_REQUIRED: Binary crate without lib.rs - tests cannot be external
#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::NewParticipant;
    use tempfile::tempdir;

    fn config(data_dir: PathBuf) -> CliConfig {
        CliConfig::new(data_dir, StoreBackend::Sqlite, 0.7, 2).unwrap()
    }

    #[test]
    fn test_storage_path_inside_data_dir() {
        let config = config(PathBuf::from("/tmp/roster-test"));
        assert_eq!(
            config.storage_path(),
            PathBuf::from("/tmp/roster-test/roster.db")
        );
    }

    #[test]
    fn test_open_roster_creates_data_dir() {
        let temp_dir = tempdir().unwrap();
        let data_dir = temp_dir.path().join("nested").join("roster");
        let config = config(data_dir.clone());

        config.open_roster().expect("should open roster");

        assert!(data_dir.is_dir());
        assert!(config.storage_path().exists());
    }

    #[test]
    fn test_data_persists_across_opens() {
        let temp_dir = tempdir().unwrap();
        let config = config(temp_dir.path().to_path_buf());

        let id = config
            .open_roster()
            .unwrap()
            .add_participant(NewParticipant::new("Jan", "Bakker"))
            .unwrap()
            .id;

        let reopened = config.open_roster().unwrap();
        assert_eq!(reopened.participant(&id).unwrap().first_name, "Jan");
    }

    #[test]
    fn test_memory_backend_writes_nothing() {
        let temp_dir = tempdir().unwrap();
        let data_dir = temp_dir.path().join("unused");
        let config = CliConfig::new(data_dir.clone(), StoreBackend::Memory, 0.7, 2).unwrap();

        config.open_roster().unwrap();
        assert!(!data_dir.exists());
    }

    #[test]
    fn test_ratio_out_of_range_rejected() {
        let temp_dir = tempdir().unwrap();
        let result = CliConfig::new(temp_dir.path().to_path_buf(), StoreBackend::Sqlite, 1.5, 2);
        assert!(result.is_err());
    }

    #[test]
    fn test_policy_passed_to_roster() {
        let temp_dir = tempdir().unwrap();
        let config =
            CliConfig::new(temp_dir.path().to_path_buf(), StoreBackend::Memory, 0.9, 1).unwrap();
        let roster = config.open_roster().unwrap();
        assert_eq!(roster.policy(), &SimilarityPolicy::new(0.9, 1));
    }
}
