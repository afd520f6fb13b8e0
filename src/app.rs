//! App layer
//!
//! Feeds host input through the session queue and reacts to what the session
//! reports: haptic pulses, the loss-streak interstitial, and result
//! submission (save result, then re-rate from the updated profile).
//! Persistence failures are logged and swallowed; they never touch game state.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::leaderboard::Leaderboard;
use crate::persistence::{ProfileStore, StoreError};
use crate::platform::{AdNetwork, HapticPattern, Haptics, Identity, LossStreak};
use crate::settings::Settings;
use crate::sim::{GameResult, GameSession, SessionDriver, SessionEvent, SessionInput};

pub struct App<S, I, H, A> {
    driver: SessionDriver,
    store: S,
    identity: I,
    haptics: H,
    ads: A,
    settings: Settings,
    losses: LossStreak,
    rng: Pcg32,
}

impl<S, I, H, A> App<S, I, H, A>
where
    S: ProfileStore,
    I: Identity,
    H: Haptics,
    A: AdNetwork,
{
    pub fn new(settings: Settings, store: S, identity: I, haptics: H, ads: A) -> Self {
        let seed = settings.effective_seed();
        log::info!("App starting with seed {}", seed);
        Self {
            driver: SessionDriver::new(GameSession::new(seed)),
            store,
            identity,
            haptics,
            ads,
            losses: LossStreak::new(settings.ad_loss_threshold),
            settings,
            // Independent stream so rating draws don't shift board layouts
            rng: Pcg32::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15),
        }
    }

    pub fn session(&self) -> &GameSession {
        self.driver.session()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn ads(&self) -> &A {
        &self.ads
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn losses(&self) -> LossStreak {
        self.losses
    }

    /// Queue host input that happened at `at_ms`
    pub fn input(&mut self, at_ms: u64, input: SessionInput) {
        self.driver.push(at_ms, input);
    }

    /// Process everything up to `now_ms` and react to the resulting events
    pub fn update(&mut self, now_ms: u64) -> Vec<SessionEvent> {
        let events = self.driver.pump(now_ms);
        for event in &events {
            self.handle(event);
        }
        events
    }

    fn handle(&mut self, event: &SessionEvent) {
        match *event {
            SessionEvent::Started => self.ads.load_interstitial(),
            SessionEvent::Hit { .. } => self.pulse(HapticPattern::Hit),
            SessionEvent::LevelUp { .. } => {}
            SessionEvent::GameOver {
                timed_out,
                warm_up,
                result,
            } => {
                self.pulse(if timed_out {
                    HapticPattern::Timeout
                } else {
                    HapticPattern::Miss
                });
                if timed_out || !warm_up {
                    self.record_loss();
                }
                if let Some(result) = result {
                    self.submit(&result);
                }
            }
        }
    }

    fn pulse(&self, pattern: HapticPattern) {
        if self.settings.haptic_feedback {
            self.haptics.pulse(pattern);
        }
    }

    fn record_loss(&mut self) {
        if !self.losses.record_loss() {
            log::debug!("Loss streak at {}", self.losses.count());
            return;
        }
        if self.ads.is_loaded() {
            self.ads.show();
        } else {
            log::warn!("Interstitial due but not loaded");
        }
        self.ads.load_interstitial();
    }

    /// Save a result and re-rate the player. Returns the new rating.
    ///
    /// Skipped when nobody is signed in; store failures are logged.
    pub fn submit(&mut self, result: &GameResult) -> Option<i32> {
        let Some(player_id) = self.identity.player_id() else {
            log::debug!("Not signed in, result not submitted");
            return None;
        };
        match self.rate(&player_id, result) {
            Ok(rating) => {
                log::info!("Player {} rated {}", player_id, rating);
                Some(rating)
            }
            Err(e) => {
                log::error!("Error saving game result or updating rating: {}", e);
                None
            }
        }
    }

    fn rate(&mut self, player_id: &str, result: &GameResult) -> Result<i32, StoreError> {
        let profile = self.store.save_and_rate(player_id, result, &mut self.rng)?;
        Ok(profile.rating)
    }

    /// Rename the signed-in player
    pub fn change_nickname(&self, nickname: &str) -> Result<(), StoreError> {
        let player_id = self
            .identity
            .player_id()
            .ok_or(StoreError::NotSignedIn)?;
        self.store.update_username(&player_id, nickname)
    }

    pub fn rankings(&self) -> Result<Leaderboard, StoreError> {
        self.store.rankings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::platform::{LogAds, StaticIdentity};
    use crate::rating::{self, PlayerRatingProfile};
    use crate::sim::GameStatus;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct RecordingHaptics(Rc<RefCell<Vec<HapticPattern>>>);

    impl Haptics for RecordingHaptics {
        fn pulse(&self, pattern: HapticPattern) {
            self.0.borrow_mut().push(pattern);
        }
    }

    type TestApp = App<MemoryStore, StaticIdentity, RecordingHaptics, LogAds>;

    fn app(player: Option<&str>, haptics: RecordingHaptics) -> TestApp {
        let settings = Settings {
            seed: Some(77),
            ..Settings::default()
        };
        App::new(
            settings,
            MemoryStore::new(),
            StaticIdentity(player.map(String::from)),
            haptics,
            LogAds::default(),
        )
    }

    fn result(hits: u32) -> GameResult {
        GameResult {
            final_score: hits,
            avg_reaction_time_ms: 350,
            rounds_played: hits + 1,
            timed_out: false,
        }
    }

    /// Start a game, hit `hits` targets, then tap a decoy. Returns the clock.
    fn play(app: &mut TestApp, start_ms: u64, hits: u32) -> u64 {
        let mut now = start_ms;
        app.input(now, SessionInput::StartNewGame);
        app.update(now);
        for _ in 0..hits {
            now += 350;
            let index = app.session().state().target_index().unwrap();
            app.input(now, SessionInput::Tap { index });
            app.update(now);
        }
        now += 350;
        let target = app.session().state().target_index().unwrap();
        let decoy = if target == 0 { 1 } else { 0 };
        app.input(now, SessionInput::Tap { index: decoy });
        app.update(now);
        assert_eq!(app.session().state().status, GameStatus::GameOver);
        now
    }

    #[test]
    fn test_scored_game_creates_profile() {
        let mut app = app(Some("p1"), RecordingHaptics::default());
        play(&mut app, 0, 7);

        let profile = app.store().get_profile("p1").unwrap().unwrap();
        assert_eq!(profile.games_played, 1);
        assert_eq!(profile.average_score, 7);
        assert_eq!(profile.avg_reaction_time_ms, 350);
        assert_eq!(app.rankings().unwrap().rank_of("p1"), Some(1));
    }

    #[test]
    fn test_practice_game_not_submitted() {
        let mut app = app(Some("p1"), RecordingHaptics::default());
        play(&mut app, 0, 2);
        assert_eq!(app.store().get_profile("p1").unwrap(), None);
    }

    #[test]
    fn test_signed_out_skips_submission() {
        let mut app = app(None, RecordingHaptics::default());
        play(&mut app, 0, 8);
        assert!(app.rankings().unwrap().is_empty());
    }

    #[test]
    fn test_haptic_patterns() {
        let haptics = RecordingHaptics::default();
        let mut app = app(None, haptics.clone());
        play(&mut app, 0, 2);
        assert_eq!(
            *haptics.0.borrow(),
            vec![HapticPattern::Hit, HapticPattern::Hit, HapticPattern::Miss]
        );

        haptics.0.borrow_mut().clear();
        app.input(10_000, SessionInput::StartNewGame);
        app.update(10_000);
        app.update(12_000);
        assert_eq!(*haptics.0.borrow(), vec![HapticPattern::Timeout]);
    }

    #[test]
    fn test_haptics_disabled() {
        let haptics = RecordingHaptics::default();
        let mut app = App::new(
            Settings {
                haptic_feedback: false,
                seed: Some(1),
                ..Settings::default()
            },
            MemoryStore::new(),
            StaticIdentity(None),
            haptics.clone(),
            LogAds::default(),
        );
        play(&mut app, 0, 3);
        assert!(haptics.0.borrow().is_empty());
    }

    #[test]
    fn test_interstitial_after_three_losses() {
        let mut app = app(None, RecordingHaptics::default());
        let mut now = 0;
        for _ in 0..3 {
            now = play(&mut app, now + 1000, 6);
        }
        assert_eq!(app.ads().shown, 1);
        assert_eq!(app.losses().count(), 0);
    }

    #[test]
    fn test_warm_up_miss_is_not_a_loss() {
        let mut app = app(None, RecordingHaptics::default());
        play(&mut app, 0, 1);
        assert_eq!(app.losses().count(), 0);
    }

    #[test]
    fn test_change_nickname() {
        let mut app = app(Some("p1"), RecordingHaptics::default());
        play(&mut app, 0, 6);
        app.change_nickname("flash").unwrap();
        assert_eq!(app.store().get_profile("p1").unwrap().unwrap().username, "flash");
        assert!(matches!(
            app.change_nickname("flash"),
            Err(StoreError::NicknameTaken(_))
        ));
    }

    #[test]
    fn test_change_nickname_signed_out() {
        let app = app(None, RecordingHaptics::default());
        assert!(matches!(
            app.change_nickname("flash"),
            Err(StoreError::NotSignedIn)
        ));
    }

    #[test]
    fn test_second_game_rates_from_first() {
        let mut app = app(Some("p1"), RecordingHaptics::default());
        let now = play(&mut app, 0, 7);
        let first = app.store().get_profile("p1").unwrap().unwrap();
        play(&mut app, now + 1000, 9);
        let second = app.store().get_profile("p1").unwrap().unwrap();

        let mut replay = Pcg32::seed_from_u64(77 ^ 0x9e37_79b9_7f4a_7c15);
        let mut expected = PlayerRatingProfile::from_first_result("p1", &result(7));
        expected.rating = rating::adjust(&expected, &result(7), &mut replay);
        assert_eq!(first.rating, expected.rating);
        expected.record(&result(9));
        expected.rating = rating::adjust(&expected, &result(9), &mut replay);
        assert_eq!(second.rating, expected.rating);
        assert_eq!(second.games_played, 2);
    }
}
