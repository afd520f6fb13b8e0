//! Player profile repository
//!
//! Features:
//! - `ProfileStore` trait the app layer talks to
//! - Per-player read-modify-write under one lock (no lost updates)
//! - Live ranking snapshots pushed to subscribers after every write
//! - In-memory store and a versioned JSON file store with backup rotation

pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::sync::mpsc::{Receiver, Sender, channel};

use rand::RngCore;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::leaderboard::Leaderboard;
use crate::rating::{self, PlayerRatingProfile};
use crate::sim::GameResult;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown player: {0}")]
    UnknownPlayer(String),

    #[error("Nickname already taken: {0}")]
    NicknameTaken(String),

    #[error("No player signed in")]
    NotSignedIn,

    #[error("Store lock poisoned")]
    Poisoned,
}

/// All stored profiles keyed by player id, as seen under the store lock
pub type Roster = BTreeMap<String, PlayerRatingProfile>;

/// Closure applied to a player's current profile inside the store lock.
///
/// The roster is the locked table, so checks against other players
/// (nickname uniqueness) see the same state the write lands on.
pub type Update<'a> = &'a mut dyn FnMut(
    Option<PlayerRatingProfile>,
    &Roster,
) -> Result<PlayerRatingProfile, StoreError>;

fn fold_result(
    player_id: &str,
    current: Option<PlayerRatingProfile>,
    result: &GameResult,
) -> PlayerRatingProfile {
    match current {
        Some(mut profile) => {
            profile.record(result);
            profile
        }
        None => PlayerRatingProfile::from_first_result(player_id, result),
    }
}

/// Repository of player profiles
pub trait ProfileStore: Send + Sync {
    fn get_profile(&self, player_id: &str) -> Result<Option<PlayerRatingProfile>, StoreError>;

    /// Atomically replace a player's profile with `apply(current)`
    fn update(&self, player_id: &str, apply: Update<'_>)
    -> Result<PlayerRatingProfile, StoreError>;

    /// Every stored profile, unordered
    fn profiles(&self) -> Result<Vec<PlayerRatingProfile>, StoreError>;

    /// Receive a fresh leaderboard now and after every write
    fn subscribe(&self) -> Result<Receiver<Leaderboard>, StoreError>;

    /// Fold a finished game into the player's totals, creating the profile if needed
    fn save_result(
        &self,
        player_id: &str,
        result: &GameResult,
    ) -> Result<PlayerRatingProfile, StoreError> {
        self.update(player_id, &mut |current, _| {
            Ok(fold_result(player_id, current, result))
        })
    }

    /// Fold a finished game into the player's totals and re-rate them from
    /// the updated profile, all in one locked write
    fn save_and_rate(
        &self,
        player_id: &str,
        result: &GameResult,
        rng: &mut dyn RngCore,
    ) -> Result<PlayerRatingProfile, StoreError> {
        self.update(player_id, &mut |current, _| {
            let mut profile = fold_result(player_id, current, result);
            profile.rating = rating::adjust(&profile, result, &mut *rng);
            Ok(profile)
        })
    }

    fn update_rating(&self, player_id: &str, rating: i32) -> Result<(), StoreError> {
        self.update(player_id, &mut |current, _| {
            let mut profile = current.ok_or_else(|| StoreError::UnknownPlayer(player_id.into()))?;
            profile.rating = rating;
            Ok(profile)
        })?;
        Ok(())
    }

    fn is_nickname_taken(&self, nickname: &str) -> Result<bool, StoreError> {
        Ok(self.profiles()?.iter().any(|p| p.username == nickname))
    }

    fn update_username(&self, player_id: &str, nickname: &str) -> Result<(), StoreError> {
        self.update(player_id, &mut |current, roster| {
            let mut profile = current.ok_or_else(|| StoreError::UnknownPlayer(player_id.into()))?;
            if roster.values().any(|p| p.username == nickname) {
                return Err(StoreError::NicknameTaken(nickname.into()));
            }
            profile.username = nickname.to_string();
            Ok(profile)
        })?;
        log::info!("Username updated for player {}", player_id);
        Ok(())
    }

    fn rankings(&self) -> Result<Leaderboard, StoreError> {
        Ok(Leaderboard::from_profiles(self.profiles()?))
    }
}

/// Profiles plus ranking subscribers, guarded by the owning store's lock
#[derive(Debug, Default)]
pub(crate) struct Table {
    pub profiles: Roster,
    watchers: Vec<Sender<Leaderboard>>,
}

impl Table {
    pub fn from_profiles(profiles: Vec<PlayerRatingProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.id.clone(), p)).collect(),
            watchers: Vec::new(),
        }
    }

    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard::from_profiles(self.profiles.values().cloned().collect())
    }

    pub fn apply(
        &mut self,
        player_id: &str,
        apply: Update<'_>,
    ) -> Result<PlayerRatingProfile, StoreError> {
        let updated = apply(self.profiles.get(player_id).cloned(), &self.profiles)?;
        self.profiles.insert(player_id.to_string(), updated.clone());
        Ok(updated)
    }

    pub fn subscribe(&mut self) -> Receiver<Leaderboard> {
        let (tx, rx) = channel();
        // Receiver is alive, send can't fail
        let _ = tx.send(self.leaderboard());
        self.watchers.push(tx);
        rx
    }

    /// Push the current leaderboard, dropping subscribers that hung up
    pub fn notify(&mut self) {
        if self.watchers.is_empty() {
            return;
        }
        let board = self.leaderboard();
        self.watchers.retain(|tx| tx.send(board.clone()).is_ok());
    }
}
