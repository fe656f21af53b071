//! # Snapshot Storage
//!
//! Mirrors the store's working set to a single JSON document under the data
//! directory so that offline edits and the last synced state survive a
//! restart. Loading/error flags are never persisted.
//!
//! ```text
//! {data_dir}/
//! └── finance-storage.json
//! ```

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use shared::{Event, Goal, Transaction};
use std::fs;
use std::path::{Path, PathBuf};

use super::traits::SnapshotStorage;

/// Namespace of the persisted entry
pub const SNAPSHOT_NAMESPACE: &str = "finance-storage";

/// Persisted part of the store state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub goals: Vec<Goal>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub balance: f64,
    #[serde(default)]
    pub monthly_income: f64,
    #[serde(default)]
    pub monthly_expenses: f64,
    #[serde(default)]
    pub current_user_id: Option<String>,
}

/// Snapshot storage backed by one JSON file
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStorage {
    path: PathBuf,
}

impl JsonFileSnapshotStorage {
    /// Create storage in `directory`, creating the directory if needed
    pub fn new<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref();
        if !directory.exists() {
            fs::create_dir_all(directory)
                .with_context(|| format!("Failed to create data directory {}", directory.display()))?;
        }
        Ok(Self {
            path: directory.join(format!("{}.json", SNAPSHOT_NAMESPACE)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStorage for JsonFileSnapshotStorage {
    fn load(&self) -> Result<Option<StoreSnapshot>> {
        if !self.path.exists() {
            debug!("No snapshot at {}", self.path.display());
            return Ok(None);
        }

        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot {}", self.path.display()))?;

        match serde_json::from_str::<StoreSnapshot>(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                warn!("Ignoring unreadable snapshot {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    fn save(&self, snapshot: &StoreSnapshot) -> Result<()> {
        let serialized = serde_json::to_vec_pretty(snapshot)?;
        let temp_path = self.path.with_extension("json.tmp");

        fs::write(&temp_path, serialized)
            .with_context(|| format!("Failed to write snapshot {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace snapshot {}", self.path.display()))?;

        debug!(
            "Saved snapshot with {} transactions, {} goals, {} events",
            snapshot.transactions.len(),
            snapshot.goals.len(),
            snapshot.events.len()
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}
