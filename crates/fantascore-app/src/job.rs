// Weekly scoring job.
//
// One call to `process` scores every team of a finished gameweek:
// 1. Claim the gameweek and check it exists and is finished
// 2. Bulk-load teams, players, and the window's match stats
// 3. Record the run snapshot (pre-run fatigue and booster slots)
// 4. Score all teams in parallel
// 5. Coalesce fatigue updates, one per starter
// 6. Write team totals and fatigue, counting failures
// 7. Replace the leaderboard

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use fantascore_core::model::{
    BoosterSelection, GameWeekId, GameWeekStatus, Player, PlayerId, TeamId, UserFantasyTeam,
};
use fantascore_core::store::{FatigueWrite, RunSnapshot, ScoringStore};
use fantascore_engine::appearance::Appearances;
use fantascore_engine::booster::BoosterOutcome;
use fantascore_engine::fatigue::FatigueLedger;
use fantascore_engine::leaderboard::{build_leaderboard, TeamStanding};
use fantascore_engine::team::{score_team, ScoringInputs, TeamScore};
use fantascore_engine::EngineRules;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::locks::{GameweekLocks, RunGuard};

// ---------------------------------------------------------------------------
// Errors and results
// ---------------------------------------------------------------------------

/// Reasons a run is refused or aborted before anything is written.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("gameweek {0} not found")]
    NotFound(GameWeekId),

    #[error("gameweek {gameweek} is {status}; only finished gameweeks can be scored")]
    NotFinished {
        gameweek: GameWeekId,
        status: GameWeekStatus,
    },

    #[error("gameweek {0} is already being processed")]
    AlreadyRunning(GameWeekId),

    #[error("failed to load scoring inputs: {0:#}")]
    Store(anyhow::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub teams_processed: usize,
    pub leaderboard_entries: usize,
    /// Player fatigue values written.
    pub fatigue_updates: usize,
    /// Writes that failed. The run carries on past each one.
    pub failures: usize,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

pub struct ScoringJob<S> {
    store: Arc<S>,
    rules: EngineRules,
    locks: GameweekLocks,
}

impl<S> Clone for ScoringJob<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            rules: self.rules.clone(),
            locks: self.locks.clone(),
        }
    }
}

impl<S: ScoringStore> ScoringJob<S> {
    pub fn new(store: Arc<S>, rules: EngineRules) -> Self {
        Self {
            store,
            rules,
            locks: GameweekLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn locks(&self) -> &GameweekLocks {
        &self.locks
    }

    /// Claim `gameweek_id` for one run, in this process and in the store.
    pub fn claim(&self, gameweek_id: GameWeekId) -> Result<RunGuard<'_, S>, ScoringError> {
        let local = self
            .locks
            .try_acquire(gameweek_id)
            .ok_or(ScoringError::AlreadyRunning(gameweek_id))?;
        let claimed = self
            .store
            .try_claim_run(gameweek_id)
            .map_err(ScoringError::Store)?;
        if !claimed {
            return Err(ScoringError::AlreadyRunning(gameweek_id));
        }
        Ok(RunGuard::new(self.store.as_ref(), local))
    }

    /// Score one finished gameweek and publish its leaderboard.
    ///
    /// Safe to repeat: re-runs score from the snapshot taken by the first
    /// run. Fatigue is written once per gameweek, and never over a value a
    /// later gameweek has already moved.
    pub fn process(&self, gameweek_id: GameWeekId) -> Result<ProcessSummary, ScoringError> {
        let _guard = self.claim(gameweek_id)?;

        let gameweek = self
            .store
            .gameweek(gameweek_id)
            .map_err(ScoringError::Store)?
            .ok_or(ScoringError::NotFound(gameweek_id))?;
        if gameweek.status != GameWeekStatus::Finished {
            return Err(ScoringError::NotFinished {
                gameweek: gameweek_id,
                status: gameweek.status,
            });
        }

        // --- Bulk reads ---
        let mut teams = self
            .store
            .teams_for_gameweek(gameweek_id)
            .map_err(ScoringError::Store)?;
        teams.sort_by_key(|t| t.id);

        let stats = self
            .store
            .match_stats_between(gameweek.start_date, gameweek.end_date)
            .map_err(ScoringError::Store)?;
        let stat_count = stats.len();
        let appearances = Appearances::from_stats(stats);

        let rostered: BTreeSet<PlayerId> = teams
            .iter()
            .flat_map(|t| t.starters.iter().chain(t.substitutes.iter()).copied())
            .collect();
        let rostered: Vec<PlayerId> = rostered.into_iter().collect();
        let players: HashMap<PlayerId, Player> = self
            .store
            .players_by_ids(&rostered)
            .map_err(ScoringError::Store)?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        info!(
            "Scoring gameweek {} ({}): {} teams, {} stat records, {} players",
            gameweek_id,
            gameweek.name,
            teams.len(),
            stat_count,
            players.len()
        );

        // --- Run snapshot ---
        let snapshot = self
            .store
            .load_run_snapshot(gameweek_id)
            .map_err(ScoringError::Store)?;
        if !snapshot.is_empty() {
            info!(
                "Gameweek {} was scored before; reusing snapshot of {} players and {} teams",
                gameweek_id,
                snapshot.fatigue.len(),
                snapshot.boosters.len()
            );
        }
        let (baseline, selections, fresh) = resolve_snapshot(&snapshot, &teams, &players);
        if !fresh.is_empty() {
            self.store
                .save_run_snapshot(gameweek_id, &fresh)
                .map_err(ScoringError::Store)?;
        }

        // --- Scoring ---
        let inputs = ScoringInputs {
            players: &players,
            appearances: &appearances,
            baseline_fatigue: &baseline,
            evaluation_date: gameweek.end_date.date_naive(),
            rules: &self.rules,
        };
        let scores: Vec<TeamScore> = teams
            .par_iter()
            .map(|team| {
                let selection = selections.get(&team.id).copied().unwrap_or_default();
                score_team(team, selection, &inputs)
            })
            .collect();

        for score in &scores {
            if let BoosterOutcome::Refunded(reason) = score.booster {
                info!("Team {}: Recovery Boost refunded ({})", score.team_id, reason);
            }
        }

        let ledger = fatigue_ledger(&teams, &players, &appearances, &baseline, &self.rules);

        // --- Writes ---
        let mut summary = ProcessSummary {
            teams_processed: scores.len(),
            ..Default::default()
        };

        for score in &scores {
            if let Err(e) = self.store.save_team_result(score.team_id, score.total_points) {
                warn!("Failed to save result for team {}: {:#}", score.team_id, e);
                summary.failures += 1;
            }
        }

        for (player_id, update) in ledger.iter() {
            match self.store.apply_player_fatigue(
                gameweek_id,
                player_id,
                update.before,
                update.after,
            ) {
                Ok(FatigueWrite::Applied) => summary.fatigue_updates += 1,
                Ok(FatigueWrite::AlreadyApplied) => {
                    debug!("Player {}: fatigue already applied for gameweek {}", player_id, gameweek_id);
                }
                Ok(FatigueWrite::Superseded { current }) => {
                    warn!(
                        "Player {}: fatigue moved from {} to {} since gameweek {} was first scored; left as is",
                        player_id, update.before, current, gameweek_id
                    );
                }
                Err(e) => {
                    warn!("Failed to save fatigue for player {}: {:#}", player_id, e);
                    summary.failures += 1;
                }
            }
        }

        let standings = teams
            .iter()
            .zip(&scores)
            .map(|(team, score)| TeamStanding {
                team_id: team.id,
                user_id: team.user_id.clone(),
                display_name: team.display_name.clone(),
                total_points: score.total_points,
                booster_used: score.booster.applied(),
                created_at: team.created_at,
            })
            .collect();
        let entries = build_leaderboard(gameweek_id, standings);
        summary.leaderboard_entries = entries.len();

        if let Err(e) = self.store.replace_leaderboard(gameweek_id, &entries) {
            warn!("Failed to replace leaderboard for gameweek {}: {:#}", gameweek_id, e);
            summary.failures += 1;
        }

        info!(
            "Gameweek {} scored: {} teams, {} leaderboard entries, {} fatigue updates, {} failures",
            gameweek_id,
            summary.teams_processed,
            summary.leaderboard_entries,
            summary.fatigue_updates,
            summary.failures
        );

        Ok(summary)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Merge the stored snapshot with current records.
///
/// Returns the baseline fatigue of every known starter, the booster slot of
/// every team, and the rows the stored snapshot is missing.
fn resolve_snapshot(
    snapshot: &RunSnapshot,
    teams: &[UserFantasyTeam],
    players: &HashMap<PlayerId, Player>,
) -> (
    BTreeMap<PlayerId, u8>,
    BTreeMap<TeamId, BoosterSelection>,
    RunSnapshot,
) {
    let mut baseline = BTreeMap::new();
    let mut selections = BTreeMap::new();
    let mut fresh = RunSnapshot::default();

    for team in teams {
        let selection = match snapshot.boosters.get(&team.id) {
            Some(stored) => *stored,
            None => {
                let current = team.booster_selection();
                fresh.boosters.insert(team.id, current);
                current
            }
        };
        selections.insert(team.id, selection);

        for player_id in &team.starters {
            let Some(player) = players.get(player_id) else {
                continue;
            };
            if baseline.contains_key(player_id) {
                continue;
            }
            let fatigue = match snapshot.fatigue.get(player_id) {
                Some(stored) => *stored,
                None => {
                    fresh.fatigue.insert(*player_id, player.fatigue);
                    player.fatigue
                }
            };
            baseline.insert(*player_id, fatigue);
        }
    }

    (baseline, selections, fresh)
}

/// One fatigue update per known starter across all teams.
fn fatigue_ledger(
    teams: &[UserFantasyTeam],
    players: &HashMap<PlayerId, Player>,
    appearances: &Appearances,
    baseline: &BTreeMap<PlayerId, u8>,
    rules: &EngineRules,
) -> FatigueLedger {
    let mut ledger = FatigueLedger::new();
    for team in teams {
        for player_id in &team.starters {
            let Some(player) = players.get(player_id) else {
                continue;
            };
            let before = baseline.get(player_id).copied().unwrap_or(player.fatigue);
            ledger.record(
                *player_id,
                before,
                player.category,
                appearances.played(*player_id),
                &rules.fatigue,
            );
        }
    }
    ledger
}
