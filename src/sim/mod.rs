//! Deterministic game core
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time is passed in as milliseconds, never read from the system clock
//! - Seeded RNG only
//! - No rendering, persistence or platform dependencies

pub mod difficulty;
pub mod queue;
pub mod session;
pub mod state;
pub mod timer;

pub use difficulty::{layout, next_max_dots, shrink_dot, time_budget_ms};
pub use queue::{SessionDriver, SessionInput};
pub use session::{ClickOutcome, GameSession, SessionError, SessionEvent};
pub use state::{Color, Dot, GameResult, GameState, GameStatus, SessionStats};
pub use timer::{RoundTimer, TimerHandle, round_duration_ms};
