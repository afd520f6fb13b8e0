//! Dot Reflex - a reaction-time dot game core
//!
//! Core modules:
//! - `sim`: Deterministic game core (board layout, round timer, session state machine)
//! - `rating`: Rating adjustment after each scored session
//! - `leaderboard`: Rankings ordered by rating
//! - `persistence`: Player profile repository with serialized per-player writes
//! - `platform`: Collaborators the core talks to (identity, haptics, ads)
//! - `app`: App layer wiring session results to the collaborators

pub mod app;
pub mod leaderboard;
pub mod persistence;
pub mod platform;
pub mod rating;
pub mod settings;
pub mod sim;

pub use app::App;
pub use leaderboard::Leaderboard;
pub use rating::PlayerRatingProfile;
pub use settings::Settings;

/// Game tuning constants
pub mod consts {
    /// Dot diameter at the start of a session
    pub const INITIAL_DOT_SIZE: f32 = 43.0;
    /// Dots never shrink below this diameter
    pub const MIN_DOT_SIZE: f32 = 38.0;
    /// Diameter lost on every difficulty step
    pub const DOT_SHRINK_STEP: f32 = 1.5;
    /// Gap between neighbouring cells (layout units)
    pub const DOT_GAP: f32 = 20.0;

    /// Board sizes a session climbs through, in order
    pub const DOT_LADDER: [u32; 5] = [4, 9, 16, 25, 36];
    /// Boards at or above this size switch to palette colours
    pub const PALETTE_MODE_MIN_DOTS: u32 = 16;
    /// Every n-th correct tap raises the difficulty
    pub const HITS_PER_LEVEL: u32 = 3;

    /// Rounds 1..=5 are warm-up: misses there discard reaction data and no result is submitted
    pub const PRACTICE_ROUNDS: u32 = 5;

    /// Round timer for the early rounds (ms)
    pub const BASE_ROUND_MS: u64 = 2000;
    /// Slack added on top of the rolling average once the timer adapts (ms)
    pub const DYNAMIC_SLACK_MS: u64 = 300;
    /// Round from which the timer adapts to the rolling reaction average
    pub const ADAPTIVE_ROUND: u32 = 10;

    /// Displayed time budget at game start (ms)
    pub const START_TIME_BUDGET_MS: u64 = 3000;
    /// Lower bound of the displayed time budget (ms)
    pub const MIN_TIME_BUDGET_MS: u64 = 1000;
    /// Dot count used as divisor is capped here
    pub const TIME_BUDGET_DOT_CAP: u32 = 30;

    /// Target darkening: factor = min(BASE + STEP * hits, MAX)
    pub const DARKEN_BASE: f32 = 0.2;
    pub const DARKEN_STEP: f32 = 0.03;
    pub const DARKEN_MAX: f32 = 0.8;

    /// Lost sessions in a row before an interstitial is shown
    pub const AD_LOSS_THRESHOLD: u32 = 3;
}
