//! Platform collaborators
//!
//! The core never talks to devices or vendor SDKs directly. Hosts plug in:
//! - `Identity`: who is signed in
//! - `Haptics`: vibration feedback
//! - `AdNetwork`: interstitial ads
//!
//! Logging implementations are provided for headless hosts.

use crate::consts::AD_LOSS_THRESHOLD;

/// Vibration patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapticPattern {
    /// Target tapped
    Hit,
    /// Decoy tapped
    Miss,
    /// Round timer ran out
    Timeout,
}

impl HapticPattern {
    /// Off/on timings in ms, starting with an "off" delay
    pub fn timings_ms(&self) -> &'static [u64] {
        match self {
            HapticPattern::Hit => &[0, 200],
            HapticPattern::Miss => &[0, 30, 60, 30, 60, 30],
            HapticPattern::Timeout => &[0, 400],
        }
    }
}

/// Supplies the signed-in player's stable id
pub trait Identity {
    fn player_id(&self) -> Option<String>;
}

/// Fire-and-forget vibration
pub trait Haptics {
    fn pulse(&self, pattern: HapticPattern);
}

/// Interstitial ad provider
pub trait AdNetwork {
    /// Request an ad; completes asynchronously on real networks
    fn load_interstitial(&mut self);
    fn is_loaded(&self) -> bool;
    /// Show the loaded ad (consumes it). Returns false if none was loaded.
    fn show(&mut self) -> bool;
}

/// Fixed identity, `None` means signed out
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<String>);

impl Identity for StaticIdentity {
    fn player_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Haptics that only log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogHaptics;

impl Haptics for LogHaptics {
    fn pulse(&self, pattern: HapticPattern) {
        log::debug!("Haptic pulse {:?} {:?}", pattern, pattern.timings_ms());
    }
}

/// Ad network that loads instantly and only logs
#[derive(Debug, Clone, Default)]
pub struct LogAds {
    loaded: bool,
    pub shown: u32,
}

impl AdNetwork for LogAds {
    fn load_interstitial(&mut self) {
        self.loaded = true;
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn show(&mut self) -> bool {
        if !self.loaded {
            return false;
        }
        self.loaded = false;
        self.shown += 1;
        log::info!("Interstitial shown ({} so far)", self.shown);
        true
    }
}

/// Consecutive lost sessions, reset once an ad is due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LossStreak {
    count: u32,
    threshold: u32,
}

impl Default for LossStreak {
    fn default() -> Self {
        Self::new(AD_LOSS_THRESHOLD)
    }
}

impl LossStreak {
    pub fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Count a loss. Returns true when the threshold is hit (and resets).
    pub fn record_loss(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            return true;
        }
        false
    }
}
