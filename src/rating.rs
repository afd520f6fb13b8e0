//! Rating adjustment
//!
//! After every scored session the player's rating moves by the sum of a fixed
//! set of reward and penalty rules, comparing the session against the
//! player's running averages. Pure: the only randomness (the minor
//! improvement reward) comes from the RNG the caller passes in.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::GameResult;

/// Persisted per-player summary
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerRatingProfile {
    pub id: String,
    #[serde(default)]
    pub username: String,
    pub rating: i32,
    pub avg_reaction_time_ms: u64,
    pub games_played: u32,
    pub total_score: u64,
    pub max_score: u32,
    pub average_score: u32,
}

impl PlayerRatingProfile {
    /// Profile for a player whose first scored game is `result`
    pub fn from_first_result(id: &str, result: &GameResult) -> Self {
        Self {
            id: id.to_string(),
            username: String::new(),
            rating: 0,
            avg_reaction_time_ms: result.avg_reaction_time_ms,
            games_played: 1,
            total_score: result.final_score as u64,
            max_score: result.final_score,
            average_score: result.final_score,
        }
    }

    /// Fold one more game into the running totals and averages
    pub fn record(&mut self, result: &GameResult) {
        let games = self.games_played as u64 + 1;
        let total_reaction =
            self.avg_reaction_time_ms * self.games_played as u64 + result.avg_reaction_time_ms;

        self.total_score += result.final_score as u64;
        self.games_played += 1;
        self.average_score = (self.total_score / games) as u32;
        self.max_score = self.max_score.max(result.final_score);
        self.avg_reaction_time_ms = total_reaction / games;
    }
}

/// The individual rules, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RatingRule {
    /// Score far below average, or the round timer ran out
    Underperformance,
    /// Much faster than usual but inaccurate
    ReactionAbuse,
    /// Beat both the score and the reaction averages
    CombinedImprovement,
    /// Small gain in one dimension
    MinorImprovement,
    /// Scored high but reacted much slower than usual
    SlowReaction,
    /// Well above average on both
    Consistency,
}

/// Deltas produced by one rating pass
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assessment {
    pub deltas: Vec<(RatingRule, f64)>,
}

impl Assessment {
    pub fn fired(&self, rule: RatingRule) -> bool {
        self.deltas.iter().any(|(r, _)| *r == rule)
    }

    pub fn total(&self) -> f64 {
        self.deltas.iter().map(|(_, d)| d).sum()
    }

    /// Apply to `rating`, rounding and flooring at 0
    pub fn apply(&self, rating: i32) -> i32 {
        (rating as f64 + self.total()).round().max(0.0) as i32
    }
}

/// Evaluate every rule for `result` against `profile`
///
/// Rules that would divide by a zero average are skipped.
pub fn assess<R: Rng + ?Sized>(
    profile: &PlayerRatingProfile,
    result: &GameResult,
    rng: &mut R,
) -> Assessment {
    let avg_score = profile.average_score as f64;
    let avg_rt = profile.avg_reaction_time_ms as f64;
    let score = result.final_score as f64;
    let rt = result.avg_reaction_time_ms as f64;

    let mut out = Assessment::default();

    if avg_score > 0.0 && (score < avg_score * 0.6 || result.timed_out) {
        let deficit = ((avg_score - score) / avg_score).min(1.0);
        out.deltas.push((RatingRule::Underperformance, -(deficit * 100.0)));
    }

    if rt > 0.0 && rt < avg_rt * 0.8 && score < avg_score * 0.7 {
        let reaction_factor = (avg_rt / rt).max(1.0);
        out.deltas
            .push((RatingRule::ReactionAbuse, -((reaction_factor - 1.0) * 100.0)));
    }

    if avg_score > 0.0 && rt > 0.0 && score > avg_score && rt < avg_rt {
        let score_factor = (score / avg_score).max(1.0);
        let reaction_factor = (avg_rt / rt).max(1.0);
        let improvement = 0.6 * reaction_factor + 0.4 * score_factor;
        out.deltas
            .push((RatingRule::CombinedImprovement, (improvement - 1.0) * 150.0));
    } else if score > avg_score * 1.1 || rt < avg_rt * 0.9 {
        let reward = rng.random_range(20..=50);
        out.deltas.push((RatingRule::MinorImprovement, reward as f64));
    }

    if avg_rt > 0.0 && score > avg_score && rt > avg_rt * 1.3 {
        let deficit = rt - avg_rt;
        out.deltas
            .push((RatingRule::SlowReaction, -(deficit / avg_rt * 70.0)));
    }

    if score >= avg_score * 1.2 && rt <= avg_rt * 0.9 {
        let lead = (result.final_score as i64 - profile.average_score as i64) / 10;
        out.deltas.push((RatingRule::Consistency, (40 + lead) as f64));
    }

    out
}

/// New rating for `profile` after `result`, never below 0
pub fn adjust<R: Rng + ?Sized>(
    profile: &PlayerRatingProfile,
    result: &GameResult,
    rng: &mut R,
) -> i32 {
    let assessment = assess(profile, result, rng);
    let rating = assessment.apply(profile.rating);
    log::debug!(
        "Rating {} -> {} ({:?})",
        profile.rating,
        rating,
        assessment.deltas
    );
    rating
}
