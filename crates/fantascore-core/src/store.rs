// Record access required by the scoring job.
//
// Reads are bulk (one call per record kind per run) so the per-team loop
// never touches storage. Writes are per record so one failing row can be
// counted without aborting the rest of the run.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::model::{
    BoosterSelection, GameWeek, GameWeekId, LeaderboardEntry, Player, PlayerId, PlayerMatchStat,
    TeamId, UserFantasyTeam,
};

/// Inputs captured by the first run of a gameweek.
///
/// Re-runs score from these values instead of the live records, which the
/// first run has already mutated (fatigue decayed, boosters cleared).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSnapshot {
    /// Pre-run fatigue of every starter scored in the gameweek.
    pub fatigue: BTreeMap<PlayerId, u8>,
    /// Booster slot of every team as it stood before the first run.
    pub boosters: BTreeMap<TeamId, BoosterSelection>,
}

impl RunSnapshot {
    pub fn is_empty(&self) -> bool {
        self.fatigue.is_empty() && self.boosters.is_empty()
    }
}

/// Result of applying one gameweek's fatigue change to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatigueWrite {
    Applied,
    /// An earlier run of the same gameweek already wrote this change.
    AlreadyApplied,
    /// The stored value no longer matches the pre-run value, so a later
    /// gameweek has moved it. Left untouched.
    Superseded { current: u8 },
}

pub trait ScoringStore: Send + Sync {
    /// Claim exclusive scoring of `gameweek` across every process sharing
    /// the store. Returns `false` if another run holds the claim.
    fn try_claim_run(&self, gameweek: GameWeekId) -> Result<bool>;

    fn release_run(&self, gameweek: GameWeekId) -> Result<()>;

    fn gameweek(&self, id: GameWeekId) -> Result<Option<GameWeek>>;

    fn teams_for_gameweek(&self, id: GameWeekId) -> Result<Vec<UserFantasyTeam>>;

    /// Players with the given ids. Unknown ids are silently absent.
    fn players_by_ids(&self, ids: &[PlayerId]) -> Result<Vec<Player>>;

    /// Stat records whose match date lies in `[start, end]`.
    fn match_stats_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PlayerMatchStat>>;

    /// Snapshot recorded by earlier runs of this gameweek (empty if none).
    fn load_run_snapshot(&self, gameweek: GameWeekId) -> Result<RunSnapshot>;

    /// Record snapshot rows that are not already present. Existing rows are
    /// never overwritten.
    fn save_run_snapshot(&self, gameweek: GameWeekId, snapshot: &RunSnapshot) -> Result<()>;

    /// Persist a team's total and clear its booster slot.
    fn save_team_result(&self, team: TeamId, total_points: f64) -> Result<()>;

    /// Move a player's fatigue from `before` to `after` for `gameweek`.
    ///
    /// The write happens at most once per gameweek and only while the
    /// stored value still equals `before`.
    fn apply_player_fatigue(
        &self,
        gameweek: GameWeekId,
        player: PlayerId,
        before: u8,
        after: u8,
    ) -> Result<FatigueWrite>;

    /// Atomically swap the gameweek's leaderboard for `entries`.
    fn replace_leaderboard(&self, gameweek: GameWeekId, entries: &[LeaderboardEntry])
        -> Result<()>;

    fn load_leaderboard(&self, gameweek: GameWeekId) -> Result<Vec<LeaderboardEntry>>;
}
