//! Game settings and preferences
//!
//! Persisted as JSON next to the profile store.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::AD_LOSS_THRESHOLD;
use crate::persistence::StoreError;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Vibrate on hit/miss/timeout
    pub haptic_feedback: bool,
    /// Lost sessions in a row before an interstitial
    pub ad_loss_threshold: u32,
    /// Fixed RNG seed (random per run when unset)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            haptic_feedback: true,
            ad_loss_threshold: AD_LOSS_THRESHOLD,
            seed: None,
        }
    }
}

impl Settings {
    /// Load settings, falling back to defaults when missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Ignoring corrupt settings at {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    /// Save settings as JSON
    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }

    /// Seed to use for this run
    pub fn effective_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}
