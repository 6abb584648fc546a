// Per-gameweek run exclusion.
//
// Different gameweeks may be processed at the same time. A second run for a
// gameweek that is already being processed is turned away rather than
// queued. The in-process set rejects overlapping calls on one job cheaply;
// the store claim covers separate jobs and separate processes.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use fantascore_core::model::GameWeekId;
use fantascore_core::store::ScoringStore;
use tracing::warn;

#[derive(Debug, Clone, Default)]
pub struct GameweekLocks {
    active: Arc<Mutex<HashSet<GameWeekId>>>,
}

impl GameweekLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `gameweek`. Returns `None` if another run holds it.
    pub fn try_acquire(&self, gameweek: GameWeekId) -> Option<GameweekGuard> {
        let mut active = self.active.lock().expect("gameweek lock poisoned");
        if !active.insert(gameweek) {
            return None;
        }
        Some(GameweekGuard {
            active: Arc::clone(&self.active),
            gameweek,
        })
    }

    pub fn is_running(&self, gameweek: GameWeekId) -> bool {
        self.active
            .lock()
            .expect("gameweek lock poisoned")
            .contains(&gameweek)
    }
}

/// Releases its gameweek on drop.
#[derive(Debug)]
pub struct GameweekGuard {
    active: Arc<Mutex<HashSet<GameWeekId>>>,
    gameweek: GameWeekId,
}

impl GameweekGuard {
    pub fn gameweek(&self) -> GameWeekId {
        self.gameweek
    }
}

impl Drop for GameweekGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.gameweek);
        }
    }
}

/// Holds both the in-process lock and the store claim for one run. The
/// store claim is released first on drop.
pub struct RunGuard<'a, S: ScoringStore> {
    store: &'a S,
    gameweek: GameWeekId,
    _local: GameweekGuard,
}

impl<'a, S: ScoringStore> RunGuard<'a, S> {
    pub(crate) fn new(store: &'a S, local: GameweekGuard) -> Self {
        Self {
            store,
            gameweek: local.gameweek(),
            _local: local,
        }
    }

    pub fn gameweek(&self) -> GameWeekId {
        self.gameweek
    }
}

impl<S: ScoringStore> Drop for RunGuard<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.store.release_run(self.gameweek) {
            warn!("Failed to release run claim for gameweek {}: {:#}", self.gameweek, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_on_same_gameweek_is_refused() {
        let locks = GameweekLocks::new();
        let guard = locks.try_acquire(GameWeekId(1)).unwrap();
        assert!(locks.try_acquire(GameWeekId(1)).is_none());
        assert!(locks.is_running(GameWeekId(1)));
        assert_eq!(guard.gameweek(), GameWeekId(1));
    }

    #[test]
    fn different_gameweeks_run_together() {
        let locks = GameweekLocks::new();
        let _a = locks.try_acquire(GameWeekId(1)).unwrap();
        let _b = locks.try_acquire(GameWeekId(2)).unwrap();
        assert!(locks.is_running(GameWeekId(2)));
    }

    #[test]
    fn dropping_guard_releases() {
        let locks = GameweekLocks::new();
        {
            let _g = locks.try_acquire(GameWeekId(7)).unwrap();
        }
        assert!(!locks.is_running(GameWeekId(7)));
        assert!(locks.try_acquire(GameWeekId(7)).is_some());
    }

    #[test]
    fn clones_share_state() {
        let locks = GameweekLocks::new();
        let other = locks.clone();
        let _g = locks.try_acquire(GameWeekId(3)).unwrap();
        assert!(other.try_acquire(GameWeekId(3)).is_none());
    }
}
