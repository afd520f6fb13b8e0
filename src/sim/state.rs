//! Game state and core value types
//!
//! `GameState` is a plain value: the session replaces it wholesale on every
//! transition, so any clone is a consistent snapshot.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameStatus {
    /// Idle, board empty
    #[default]
    Stopped,
    /// A round is live and waiting for a tap
    Started,
    /// Session ended by a miss or a timeout
    GameOver,
}

/// RGBA colour with channels in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build from a packed 0xAARRGGBB value
    pub fn from_argb(argb: u32) -> Self {
        let channel = |shift: u32| ((argb >> shift) & 0xff) as f32 / 255.0;
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
            a: channel(24),
        }
    }

    /// Pack to 0xAARRGGBB
    pub fn to_argb(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.a) << 24) | (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Multiply each RGB channel by `factor`, alpha unchanged
    pub fn darken(&self, factor: f32) -> Self {
        Self {
            r: (self.r * factor).clamp(0.0, 1.0),
            g: (self.g * factor).clamp(0.0, 1.0),
            b: (self.b * factor).clamp(0.0, 1.0),
            a: self.a,
        }
    }
}

/// Base colours for large boards, indexed by `round % PALETTE.len()`
pub const PALETTE: [u32; 22] = [
    0xffffb7b7, 0xffffc7b7, 0xffffd7b7, 0xffffe7b7, 0xfffff4b7, 0xfff4ffb7, 0xffe8ffb7, 0xffd8ffb7,
    0xffcefb70, 0xffa7cd5b, 0xff7fcd5b, 0xff5bcd82, 0xff5bcdb2, 0xff5bc7cd, 0xff5bb7cd, 0xff5ba7cd,
    0xff5b9fcd, 0xff5b87cd, 0xff5b6fcd, 0xff5b57cd, 0xff5b3fcd, 0xff5b27cd,
];

/// A single tappable dot. Recreated every round, never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    /// Top-left of the cell in layout units
    pub pos: Vec2,
    /// Diameter
    pub size: f32,
    pub color: Color,
    pub is_target: bool,
}

/// Authoritative session state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Current board in row-major order
    pub dots: Vec<Dot>,
    pub score: u32,
    /// Current round (1-based while playing, 0 once the game is over)
    pub round: u32,
    /// Displayed per-round time budget
    pub time_left_ms: u64,
    /// Current rung of the dot ladder
    pub max_dots: u32,
    /// Rolling average while playing, final average after game over
    pub avg_reaction_time_ms: u64,
    pub status: GameStatus,
}

impl Default for GameState {
    fn default() -> Self {
        Self::stopped()
    }
}

impl GameState {
    /// The idle state a session starts in and resets to
    pub fn stopped() -> Self {
        Self {
            dots: Vec::new(),
            score: 0,
            round: 1,
            time_left_ms: 0,
            max_dots: DOT_LADDER[0],
            avg_reaction_time_ms: 0,
            status: GameStatus::Stopped,
        }
    }

    /// Index of the target dot, if a board is live
    pub fn target_index(&self) -> Option<usize> {
        self.dots.iter().position(|d| d.is_target)
    }

    /// Side of the rendered grid (derived from the board, not `max_dots`)
    pub fn grid_side(&self) -> usize {
        (self.dots.len() as f64).sqrt().ceil() as usize
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Started
    }
}

/// Outcome of one finished session, handed to rating/persistence once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub final_score: u32,
    /// 0 when reaction data was discarded or no hit was recorded
    pub avg_reaction_time_ms: u64,
    pub rounds_played: u32,
    pub timed_out: bool,
}

/// Counters that outlive a single game
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Games finished since the session was created
    pub games_played: u32,
}
