//! Game session state machine
//!
//! `Stopped -> Started -> GameOver`, with `GameOver -> Stopped` on reset and
//! `GameOver -> Started` on a new game. The session owns the authoritative
//! `GameState`, the round timer and the per-game accumulators. Every
//! transition replaces the state wholesale.
//!
//! Operations must be serialized by the host. `SessionDriver` does that with
//! a single-consumer event queue.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use thiserror::Error;

use super::difficulty::{layout, next_max_dots, shrink_dot, time_budget_ms};
use super::state::{GameResult, GameState, GameStatus, SessionStats};
use super::timer::{RoundTimer, TimerHandle, dynamic_limit_ms, round_duration_ms};
use crate::consts::*;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a game is already running (round {0})")]
    AlreadyRunning(u32),
}

/// What a tap did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No game running or index off the board; nothing changed
    Ignored,
    /// Target tapped, next round is live
    Hit { reaction_ms: u64 },
    /// Decoy tapped, game over
    Miss,
    /// Tap arrived after the late-round time limit, game over as a timeout
    LateTimeout,
}

/// Notifications for the app layer (haptics, ads, persistence)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionEvent {
    Started,
    Hit { round: u32, reaction_ms: u64 },
    LevelUp { max_dots: u32, dot_size: f32 },
    GameOver {
        timed_out: bool,
        /// Reaction data was discarded (miss during warm-up)
        warm_up: bool,
        /// Present only when the game left the practice phase
        result: Option<GameResult>,
    },
}

/// One player's game session
#[derive(Debug, Clone)]
pub struct GameSession {
    state: GameState,
    seed: u64,
    rng: Pcg32,
    timer: RoundTimer,
    dot_size: f32,
    correct_choices: u32,
    reaction_times: Vec<u64>,
    round_started_ms: u64,
    stats: SessionStats,
    events: Vec<SessionEvent>,
}

impl GameSession {
    pub fn new(seed: u64) -> Self {
        Self {
            state: GameState::stopped(),
            seed,
            rng: Pcg32::seed_from_u64(seed),
            timer: RoundTimer::new(),
            dot_size: INITIAL_DOT_SIZE,
            correct_choices: 0,
            reaction_times: Vec::new(),
            round_started_ms: 0,
            stats: SessionStats::default(),
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Owned copy for observers
    pub fn snapshot(&self) -> GameState {
        self.state.clone()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn dot_size(&self) -> f32 {
        self.dot_size
    }

    pub fn correct_choices(&self) -> u32 {
        self.correct_choices
    }

    /// Handle of the live round countdown
    pub fn timer_handle(&self) -> Option<TimerHandle> {
        self.timer.live_handle()
    }

    /// Milliseconds left on the live countdown
    pub fn time_remaining_ms(&self, now_ms: u64) -> u64 {
        self.timer.remaining_ms(now_ms)
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Force `Stopped` and clear every per-game accumulator
    pub fn reset(&mut self) {
        self.timer.cancel_all();
        self.state = GameState::stopped();
        self.dot_size = INITIAL_DOT_SIZE;
        self.correct_choices = 0;
        self.reaction_times.clear();
        self.round_started_ms = 0;
    }

    /// Start round 1 on a fresh 4-dot board
    pub fn start_new_game(&mut self, now_ms: u64) -> Result<(), SessionError> {
        if self.state.status == GameStatus::Started {
            return Err(SessionError::AlreadyRunning(self.state.round));
        }
        self.reset();

        let max_dots = DOT_LADDER[0];
        self.state = GameState {
            dots: layout(max_dots, self.dot_size, 1, 0, &mut self.rng),
            score: 0,
            round: 1,
            time_left_ms: START_TIME_BUDGET_MS,
            max_dots,
            avg_reaction_time_ms: 0,
            status: GameStatus::Started,
        };
        self.restart_timer(now_ms);
        self.events.push(SessionEvent::Started);
        log::info!("Game started (seed {})", self.seed);
        Ok(())
    }

    /// Handle a tap on `index`
    pub fn on_dot_clicked(&mut self, index: usize, now_ms: u64) -> ClickOutcome {
        if !self.state.is_running() {
            return ClickOutcome::Ignored;
        }
        let Some(dot) = self.state.dots.get(index) else {
            log::debug!("Ignoring tap on dot {} (board has {})", index, self.state.dots.len());
            return ClickOutcome::Ignored;
        };
        let is_target = dot.is_target;
        let reaction_ms = now_ms.saturating_sub(self.round_started_ms);

        // The countdown may already be due when the tap lands; late rounds
        // re-check the limit here instead of trusting delivery order.
        if self.state.round > ADAPTIVE_ROUND
            && reaction_ms > dynamic_limit_ms(self.state.avg_reaction_time_ms)
        {
            log::debug!("Late tap after {}ms in round {}", reaction_ms, self.state.round);
            self.end_game(true, false);
            return ClickOutcome::LateTimeout;
        }

        if is_target {
            self.register_hit(reaction_ms, now_ms);
            ClickOutcome::Hit { reaction_ms }
        } else {
            let warm_up = self.state.round <= PRACTICE_ROUNDS;
            self.end_game(false, warm_up);
            ClickOutcome::Miss
        }
    }

    /// The round countdown ran out
    pub fn on_timer_expired(&mut self) -> Option<GameResult> {
        if !self.state.is_running() {
            return None;
        }
        self.end_game(true, false)
    }

    /// Fire the round countdown if it is due. Returns true if the game ended.
    pub fn poll_timer(&mut self, now_ms: u64) -> bool {
        if self.timer.poll(now_ms).is_some() {
            self.on_timer_expired();
            return true;
        }
        false
    }

    /// Finish the game. Returns the result to submit, if the game got past
    /// the practice phase.
    pub fn end_game(&mut self, timed_out: bool, ignore_reaction_time: bool) -> Option<GameResult> {
        self.timer.cancel_all();
        let was_running = self.state.is_running();
        let rounds_played = self.state.round;

        let avg_reaction_time_ms = if ignore_reaction_time {
            0
        } else {
            mean(&self.reaction_times)
        };

        self.state = GameState {
            dots: Vec::new(),
            round: 0,
            time_left_ms: 0,
            avg_reaction_time_ms,
            status: GameStatus::GameOver,
            ..self.state.clone()
        };

        if !was_running {
            return None;
        }
        self.stats.games_played += 1;

        let result = (rounds_played > PRACTICE_ROUNDS).then_some(GameResult {
            final_score: self.state.score,
            avg_reaction_time_ms,
            rounds_played,
            timed_out,
        });
        log::info!(
            "Game over: score {}, round {}, avg reaction {}ms, timed out: {}, scored: {}",
            self.state.score,
            rounds_played,
            avg_reaction_time_ms,
            timed_out,
            result.is_some()
        );
        self.events.push(SessionEvent::GameOver {
            timed_out,
            warm_up: ignore_reaction_time,
            result,
        });
        result
    }

    fn register_hit(&mut self, reaction_ms: u64, now_ms: u64) {
        self.reaction_times.push(reaction_ms);
        self.correct_choices += 1;

        let round = self.state.round;
        let avg_reaction_time_ms = if round >= ADAPTIVE_ROUND {
            mean(&self.reaction_times)
        } else {
            self.state.avg_reaction_time_ms
        };
        self.events.push(SessionEvent::Hit { round, reaction_ms });

        let next_round = round + 1;
        let (max_dots, time_left_ms) = if self.correct_choices % HITS_PER_LEVEL == 0 {
            self.dot_size = shrink_dot(self.dot_size);
            let next = next_max_dots(self.state.max_dots);
            log::debug!("Difficulty up: {} dots, diameter {}", next, self.dot_size);
            self.events.push(SessionEvent::LevelUp {
                max_dots: next,
                dot_size: self.dot_size,
            });
            (next, time_budget_ms(next))
        } else {
            (self.state.max_dots, self.state.time_left_ms)
        };

        self.state = GameState {
            dots: layout(
                max_dots,
                self.dot_size,
                next_round,
                self.correct_choices,
                &mut self.rng,
            ),
            score: self.state.score + 1,
            round: next_round,
            time_left_ms,
            max_dots,
            avg_reaction_time_ms,
            status: GameStatus::Started,
        };
        self.restart_timer(now_ms);
    }

    fn restart_timer(&mut self, now_ms: u64) {
        let duration = round_duration_ms(self.state.round, self.state.avg_reaction_time_ms);
        self.timer.start(now_ms, duration);
        self.round_started_ms = now_ms;
    }
}

/// Truncating mean, 0 for no samples
fn mean(samples: &[u64]) -> u64 {
    if samples.is_empty() {
        0
    } else {
        samples.iter().sum::<u64>() / samples.len() as u64
    }
}
