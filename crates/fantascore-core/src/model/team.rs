// User fantasy teams, boosters, and leaderboard rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::gameweek::GameWeekId;
use super::player::PlayerId;

/// Primary key of a user fantasy team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One-shot, per-gameweek team enhancement. "No booster" is `None` at the
/// use site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Booster {
    /// Captain's points are doubled on top of the captain multiplier.
    DoubleImpact,
    /// Whole team total is multiplied after team bonuses.
    GoldenGame,
    /// Target's fatigue counts as full for this team's scoring.
    RecoveryBoost,
}

impl Booster {
    pub fn from_str_booster(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['_', '-', ' '], "").as_str() {
            "doubleimpact" => Some(Booster::DoubleImpact),
            "goldengame" => Some(Booster::GoldenGame),
            "recoveryboost" => Some(Booster::RecoveryBoost),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Booster::DoubleImpact => "DoubleImpact",
            Booster::GoldenGame => "GoldenGame",
            Booster::RecoveryBoost => "RecoveryBoost",
        }
    }
}

impl fmt::Display for Booster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A team's booster slot as chosen at draft time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoosterSelection {
    pub booster: Option<Booster>,
    /// Only meaningful for `RecoveryBoost`.
    pub target: Option<PlayerId>,
}

/// A user's drafted team for one gameweek.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFantasyTeam {
    pub id: TeamId,
    pub user_id: String,
    pub display_name: String,
    pub gameweek_id: GameWeekId,
    /// Ordered starting line-up.
    pub starters: Vec<PlayerId>,
    pub substitutes: Vec<PlayerId>,
    pub captain: PlayerId,
    #[serde(default)]
    pub booster_used: Option<Booster>,
    #[serde(default)]
    pub booster_target: Option<PlayerId>,
    #[serde(default)]
    pub total_points: f64,
    pub created_at: DateTime<Utc>,
}

impl UserFantasyTeam {
    pub fn booster_selection(&self) -> BoosterSelection {
        BoosterSelection {
            booster: self.booster_used,
            target: self.booster_target,
        }
    }

    pub fn is_starter(&self, player: PlayerId) -> bool {
        self.starters.contains(&player)
    }
}

/// One ranked row of a gameweek leaderboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub gameweek_id: GameWeekId,
    pub team_id: TeamId,
    pub user_id: String,
    pub display_name: String,
    pub total_points: f64,
    /// 1-based, contiguous.
    pub rank: u32,
    /// Booster that was actually applied (refunded boosters show as `None`).
    pub booster_used: Option<Booster>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booster_parses_loose_spellings() {
        assert_eq!(Booster::from_str_booster("DoubleImpact"), Some(Booster::DoubleImpact));
        assert_eq!(Booster::from_str_booster("golden_game"), Some(Booster::GoldenGame));
        assert_eq!(Booster::from_str_booster("Recovery Boost"), Some(Booster::RecoveryBoost));
        assert_eq!(Booster::from_str_booster("2"), None);
    }

    #[test]
    fn bench_players_are_not_starters() {
        let team = UserFantasyTeam {
            id: TeamId(1),
            user_id: "u1".into(),
            display_name: "Team".into(),
            gameweek_id: GameWeekId(1),
            starters: vec![PlayerId(1), PlayerId(2)],
            substitutes: vec![PlayerId(3)],
            captain: PlayerId(1),
            booster_used: None,
            booster_target: None,
            total_points: 0.0,
            created_at: Utc::now(),
        };
        assert!(team.is_starter(PlayerId(2)));
        assert!(!team.is_starter(PlayerId(3)));
        assert!(!team.is_starter(PlayerId(4)));
    }
}
