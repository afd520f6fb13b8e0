//! JSON file profile store
//!
//! The whole table is written after every update: tmp file first, the old
//! save rotates to `.bak`, then tmp is renamed into place. On open a corrupt
//! save falls back to the backup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::{ProfileStore, StoreError, Table, Update};
use crate::leaderboard::Leaderboard;
use crate::rating::PlayerRatingProfile;

/// Current on-disk format
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    profiles: Vec<PlayerRatingProfile>,
}

/// Profiles persisted to a single JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    table: Mutex<Table>,
}

impl FileStore {
    /// Open (or start) a store at `path`
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let profiles = match read_envelope(&path) {
            Ok(Some(envelope)) => envelope.profiles,
            Ok(None) => {
                log::info!("No save at {}, starting fresh", path.display());
                Vec::new()
            }
            Err(e) => {
                log::warn!("Save at {} unreadable ({}), trying backup", path.display(), e);
                match read_envelope(&backup_path(&path)) {
                    Ok(Some(envelope)) => envelope.profiles,
                    _ => {
                        log::error!("Backup unusable, starting with an empty store");
                        Vec::new()
                    }
                }
            }
        };
        log::info!("Loaded {} profiles", profiles.len());
        Ok(Self {
            path,
            table: Mutex::new(Table::from_profiles(profiles)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table>, StoreError> {
        self.table.lock().map_err(|_| StoreError::Poisoned)
    }

    fn flush(&self, table: &Table) -> Result<(), StoreError> {
        let envelope = Envelope {
            version: FORMAT_VERSION,
            profiles: table.profiles.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&envelope)?;

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        if self.path.exists() {
            fs::rename(&self.path, backup_path(&self.path))?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("bak")
}

fn read_envelope(path: &Path) -> Result<Option<Envelope>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path)?;
    let envelope: Envelope = serde_json::from_str(&json)?;
    if envelope.version != FORMAT_VERSION {
        log::warn!(
            "Save format v{} differs from v{}, loading anyway",
            envelope.version,
            FORMAT_VERSION
        );
    }
    Ok(Some(envelope))
}

impl ProfileStore for FileStore {
    fn get_profile(&self, player_id: &str) -> Result<Option<PlayerRatingProfile>, StoreError> {
        Ok(self.lock()?.profiles.get(player_id).cloned())
    }

    fn update(
        &self,
        player_id: &str,
        apply: Update<'_>,
    ) -> Result<PlayerRatingProfile, StoreError> {
        let mut table = self.lock()?;
        let previous = table.profiles.get(player_id).cloned();
        let updated = table.apply(player_id, apply)?;

        // Keep memory and disk in step: undo the change if the write fails
        if let Err(e) = self.flush(&table) {
            match previous {
                Some(p) => table.profiles.insert(player_id.to_string(), p),
                None => table.profiles.remove(player_id),
            };
            return Err(e);
        }
        table.notify();
        Ok(updated)
    }

    fn profiles(&self) -> Result<Vec<PlayerRatingProfile>, StoreError> {
        Ok(self.lock()?.profiles.values().cloned().collect())
    }

    fn subscribe(&self) -> Result<Receiver<Leaderboard>, StoreError> {
        Ok(self.lock()?.subscribe())
    }
}
