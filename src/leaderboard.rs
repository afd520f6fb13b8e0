//! Rating leaderboard
//!
//! Snapshot of player profiles ordered by rating, highest first.

use serde::{Deserialize, Serialize};

use crate::rating::PlayerRatingProfile;

/// Named reaction-time tiers (inclusive ms ranges)
const REACTION_CATEGORIES: [(&str, u64, u64); 19] = [
    ("Cheetah", 200, 300),
    ("Usain Bolt", 301, 350),
    ("F1 Racer", 351, 400),
    ("Pro Boxer", 401, 450),
    ("Table Tennis Player", 451, 500),
    ("Astronaut", 501, 550),
    ("Michael Jordan", 551, 600),
    ("Baseball Player", 601, 650),
    ("Tiger", 651, 700),
    ("Teenager (Age 15-20)", 701, 750),
    ("Adult (Age 25-30)", 751, 800),
    ("Football Quarterback", 801, 850),
    ("Dog", 851, 900),
    ("Adult (Age 30-40)", 901, 950),
    ("Lion", 951, 1000),
    ("Adult (Age 40-50)", 1001, 1050),
    ("Senior (Age 60-65)", 1051, 1100),
    ("Cat", 1101, 1150),
    ("Turtle", 1151, 1200),
];

/// Tier name for an average reaction time
pub fn reaction_category(avg_reaction_time_ms: u64) -> &'static str {
    REACTION_CATEGORIES
        .iter()
        .find(|(_, min, max)| (*min..=*max).contains(&avg_reaction_time_ms))
        .map(|(name, _, _)| *name)
        .unwrap_or("Unknown")
}

/// Players ordered by rating
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Leaderboard {
    pub entries: Vec<PlayerRatingProfile>,
}

impl Leaderboard {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build from unordered profiles. Ties keep input order.
    pub fn from_profiles(mut profiles: Vec<PlayerRatingProfile>) -> Self {
        profiles.sort_by(|a, b| b.rating.cmp(&a.rating));
        Self { entries: profiles }
    }

    /// 1-indexed rank of a player
    pub fn rank_of(&self, player_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|p| p.id == player_id)
            .map(|i| i + 1)
    }

    /// Profile of a player, if ranked
    pub fn find(&self, player_id: &str) -> Option<&PlayerRatingProfile> {
        self.entries.iter().find(|p| p.id == player_id)
    }

    /// Top `n` players
    pub fn top(&self, n: usize) -> &[PlayerRatingProfile] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Get the top rating (if any)
    pub fn top_rating(&self) -> Option<i32> {
        self.entries.first().map(|p| p.rating)
    }
}
