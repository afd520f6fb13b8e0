//! Round countdown
//!
//! A deadline timer driven by the caller's clock. At most one timer is live;
//! starting a new one replaces it, and each live timer expires at most once.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Identifies one `start` call. Stale handles are harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone, Copy)]
struct Countdown {
    handle: TimerHandle,
    deadline_ms: u64,
}

/// Single-slot countdown timer
#[derive(Debug, Clone, Default)]
pub struct RoundTimer {
    next_id: u64,
    live: Option<Countdown>,
}

impl RoundTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a countdown, cancelling any live one
    pub fn start(&mut self, now_ms: u64, duration_ms: u64) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.live = Some(Countdown {
            handle,
            deadline_ms: now_ms.saturating_add(duration_ms),
        });
        handle
    }

    /// Cancel `handle` if it is still live. No-op for fired or cancelled timers.
    pub fn cancel(&mut self, handle: TimerHandle) {
        if self.is_live(handle) {
            self.live = None;
        }
    }

    /// Cancel whatever is live
    pub fn cancel_all(&mut self) {
        self.live = None;
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.live.is_some_and(|c| c.handle == handle)
    }

    pub fn live_handle(&self) -> Option<TimerHandle> {
        self.live.map(|c| c.handle)
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.live.map(|c| c.deadline_ms)
    }

    /// Time until the live timer expires (0 if none is live)
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.deadline_ms()
            .map(|d| d.saturating_sub(now_ms))
            .unwrap_or(0)
    }

    /// Fire the live timer if its deadline has passed. Returns its handle exactly once.
    pub fn poll(&mut self, now_ms: u64) -> Option<TimerHandle> {
        match self.live {
            Some(c) if now_ms >= c.deadline_ms => {
                self.live = None;
                Some(c.handle)
            }
            _ => None,
        }
    }
}

/// Time limit for late rounds, derived from the rolling reaction average
pub fn dynamic_limit_ms(avg_reaction_time_ms: u64) -> u64 {
    if avg_reaction_time_ms > 0 {
        avg_reaction_time_ms + DYNAMIC_SLACK_MS
    } else {
        BASE_ROUND_MS
    }
}

/// Countdown length for `round`
pub fn round_duration_ms(round: u32, avg_reaction_time_ms: u64) -> u64 {
    if round < ADAPTIVE_ROUND {
        BASE_ROUND_MS
    } else {
        dynamic_limit_ms(avg_reaction_time_ms)
    }
}
