//! In-memory profile store

use std::sync::mpsc::Receiver;
use std::sync::{Mutex, MutexGuard};

use super::{ProfileStore, StoreError, Table, Update};
use crate::leaderboard::Leaderboard;
use crate::rating::PlayerRatingProfile;

/// Process-local store, mainly for tests and offline play
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: Mutex<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: Vec<PlayerRatingProfile>) -> Self {
        Self {
            table: Mutex::new(Table::from_profiles(profiles)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table>, StoreError> {
        self.table.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl ProfileStore for MemoryStore {
    fn get_profile(&self, player_id: &str) -> Result<Option<PlayerRatingProfile>, StoreError> {
        Ok(self.lock()?.profiles.get(player_id).cloned())
    }

    fn update(
        &self,
        player_id: &str,
        apply: Update<'_>,
    ) -> Result<PlayerRatingProfile, StoreError> {
        let mut table = self.lock()?;
        let updated = table.apply(player_id, apply)?;
        table.notify();
        Ok(updated)
    }

    fn profiles(&self) -> Result<Vec<PlayerRatingProfile>, StoreError> {
        Ok(self.lock()?.profiles.values().cloned().collect())
    }

    fn subscribe(&self) -> Result<Receiver<Leaderboard>, StoreError> {
        Ok(self.lock()?.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating;
    use crate::sim::GameResult;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn result(score: u32, rt: u64) -> GameResult {
        GameResult {
            final_score: score,
            avg_reaction_time_ms: rt,
            rounds_played: score + 1,
            timed_out: false,
        }
    }

    #[test]
    fn test_save_result_creates_then_aggregates() {
        let store = MemoryStore::new();
        let first = store.save_result("p1", &result(10, 500)).unwrap();
        assert_eq!(first.games_played, 1);
        assert_eq!(first.average_score, 10);

        let second = store.save_result("p1", &result(20, 300)).unwrap();
        assert_eq!(second.games_played, 2);
        assert_eq!(second.average_score, 15);
        assert_eq!(second.max_score, 20);
        assert_eq!(second.avg_reaction_time_ms, 400);
    }

    #[test]
    fn test_update_rating_unknown_player() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_rating("ghost", 10),
            Err(StoreError::UnknownPlayer(_))
        ));
        assert_eq!(store.get_profile("ghost").unwrap(), None);
    }

    #[test]
    fn test_nicknames() {
        let store = MemoryStore::new();
        store.save_result("p1", &result(1, 400)).unwrap();
        store.save_result("p2", &result(1, 400)).unwrap();

        store.update_username("p1", "zed").unwrap();
        assert!(store.is_nickname_taken("zed").unwrap());
        assert!(!store.is_nickname_taken("amy").unwrap());
        assert!(matches!(
            store.update_username("p2", "zed"),
            Err(StoreError::NicknameTaken(_))
        ));
    }

    #[test]
    fn test_concurrent_renames_claim_nickname_once() {
        let store = Arc::new(MemoryStore::new());
        store.save_result("p1", &result(1, 400)).unwrap();
        store.save_result("p2", &result(1, 400)).unwrap();

        let barrier = Arc::new(Barrier::new(2));
        let handles: Vec<_> = ["p1", "p2"]
            .into_iter()
            .map(|id| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    store.update_username(id, "zed")
                })
            })
            .collect();
        let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(StoreError::NicknameTaken(_))))
        );
        let owners = store
            .profiles()
            .unwrap()
            .into_iter()
            .filter(|p| p.username == "zed")
            .count();
        assert_eq!(owners, 1);
    }

    #[test]
    fn test_rename_unknown_player() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.update_username("ghost", "zed"),
            Err(StoreError::UnknownPlayer(_))
        ));
    }

    #[test]
    fn test_back_to_back_ratings_both_land() {
        let base = PlayerRatingProfile {
            id: "p1".into(),
            rating: 1000,
            avg_reaction_time_ms: 500,
            games_played: 10,
            total_score: 200,
            max_score: 30,
            average_score: 20,
            ..Default::default()
        };
        let store = MemoryStore::with_profiles(vec![base.clone()]);
        let first = result(25, 400);
        let second = result(30, 350);

        let mut rng = Pcg32::seed_from_u64(9);
        let after_first = store.save_and_rate("p1", &first, &mut rng).unwrap();
        let after_second = store.save_and_rate("p1", &second, &mut rng).unwrap();

        // Same draws, applied one after the other
        let mut replay = Pcg32::seed_from_u64(9);
        let mut expected = base;
        expected.record(&first);
        expected.rating = rating::adjust(&expected, &first, &mut replay);
        assert_eq!(after_first.rating, expected.rating);
        expected.record(&second);
        expected.rating = rating::adjust(&expected, &second, &mut replay);

        assert!(after_first.rating > 1000);
        assert_eq!(after_second.rating, expected.rating);
        assert_eq!(store.get_profile("p1").unwrap().unwrap().rating, expected.rating);
        assert_eq!(after_second.games_played, 12);
    }

    #[test]
    fn test_concurrent_save_and_rate_counts_every_game() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..4u64)
            .map(|seed| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    let mut rng = Pcg32::seed_from_u64(seed);
                    for _ in 0..10 {
                        store.save_and_rate("p1", &result(8, 400), &mut rng).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let profile = store.get_profile("p1").unwrap().unwrap();
        assert_eq!(profile.games_played, 40);
        assert!(profile.rating >= 0);
    }

    #[test]
    fn test_subscribers_get_snapshots() {
        let store = MemoryStore::new();
        let rx = store.subscribe().unwrap();
        assert!(rx.recv().unwrap().is_empty());

        store.save_result("p1", &result(5, 450)).unwrap();
        store.update_rating("p1", 1100).unwrap();
        let _after_save = rx.recv().unwrap();
        let after_rating = rx.recv().unwrap();
        assert_eq!(after_rating.top_rating(), Some(1100));
    }

    #[test]
    fn test_concurrent_writes_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..25 {
                        store.save_result("p1", &result(2, 300)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let profile = store.get_profile("p1").unwrap().unwrap();
        assert_eq!(profile.games_played, 200);
        assert_eq!(profile.total_score, 400);
    }
}
