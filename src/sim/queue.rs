//! Single-consumer input queue in front of a `GameSession`
//!
//! Taps and commands are queued with the time they happened and applied in
//! order. Before each input the round countdown is checked at that input's
//! timestamp, so an expiry that was due first always wins the race.

use std::collections::VecDeque;

use super::session::{GameSession, SessionEvent};

/// Host input for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionInput {
    StartNewGame,
    Reset,
    Tap { index: usize },
}

#[derive(Debug, Clone, Copy)]
struct Queued {
    at_ms: u64,
    input: SessionInput,
}

/// Owns a session and serializes everything that touches it
#[derive(Debug, Clone)]
pub struct SessionDriver {
    session: GameSession,
    queue: VecDeque<Queued>,
}

impl SessionDriver {
    pub fn new(session: GameSession) -> Self {
        Self {
            session,
            queue: VecDeque::new(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Number of inputs waiting to be applied
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Queue an input that happened at `at_ms`
    pub fn push(&mut self, at_ms: u64, input: SessionInput) {
        self.queue.push_back(Queued { at_ms, input });
    }

    /// Apply every input that happened up to `now_ms`, then fire the countdown
    /// if it is due. Returns the notifications produced along the way.
    pub fn pump(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        while let Some(next) = self.queue.front().copied() {
            if next.at_ms > now_ms {
                break;
            }
            self.queue.pop_front();
            self.session.poll_timer(next.at_ms);
            self.apply(next);
        }
        self.session.poll_timer(now_ms);
        self.session.drain_events()
    }

    fn apply(&mut self, queued: Queued) {
        match queued.input {
            SessionInput::StartNewGame => {
                if let Err(e) = self.session.start_new_game(queued.at_ms) {
                    log::warn!("Start ignored: {}", e);
                }
            }
            SessionInput::Reset => self.session.reset(),
            SessionInput::Tap { index } => {
                let outcome = self.session.on_dot_clicked(index, queued.at_ms);
                log::debug!("Tap {} at {}ms: {:?}", index, queued.at_ms, outcome);
            }
        }
    }
}
