// Booster resolution.
//
// A team's single booster is resolved before any of its starters are
// scored. Recovery Boost is the only booster that can be refunded.

use std::fmt;

use fantascore_core::model::{Booster, BoosterSelection, PlayerId, UserFantasyTeam};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BoosterRules {
    /// Team-total multiplier for Golden Game, applied after bonuses.
    pub golden_game: f64,
}

impl Default for BoosterRules {
    fn default() -> Self {
        Self { golden_game: 1.2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefundReason {
    NoTarget,
    /// Target is on the bench or not on the team at all.
    TargetNotStarting(PlayerId),
    TargetDidNotPlay(PlayerId),
}

impl fmt::Display for RefundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundReason::NoTarget => write!(f, "no target designated"),
            RefundReason::TargetNotStarting(id) => write!(f, "target {id} is not a starter"),
            RefundReason::TargetDidNotPlay(id) => write!(f, "target {id} did not play"),
        }
    }
}

/// What a team's booster slot resolves to for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoosterOutcome {
    None,
    DoubleImpact,
    GoldenGame,
    RecoveryBoost { target: PlayerId },
    Refunded(RefundReason),
}

impl BoosterOutcome {
    /// The booster that takes effect, if any. Refunds report `None`.
    pub fn applied(&self) -> Option<Booster> {
        match self {
            BoosterOutcome::None | BoosterOutcome::Refunded(_) => None,
            BoosterOutcome::DoubleImpact => Some(Booster::DoubleImpact),
            BoosterOutcome::GoldenGame => Some(Booster::GoldenGame),
            BoosterOutcome::RecoveryBoost { .. } => Some(Booster::RecoveryBoost),
        }
    }

    pub fn double_impact_active(&self) -> bool {
        matches!(self, BoosterOutcome::DoubleImpact)
    }

    /// Player whose fatigue is treated as full for this team.
    pub fn recovery_target(&self) -> Option<PlayerId> {
        match self {
            BoosterOutcome::RecoveryBoost { target } => Some(*target),
            _ => None,
        }
    }

    pub fn is_refunded(&self) -> bool {
        matches!(self, BoosterOutcome::Refunded(_))
    }

    /// Factor applied to the post-bonus team sum.
    pub fn team_multiplier(&self, rules: &BoosterRules) -> f64 {
        match self {
            BoosterOutcome::GoldenGame => rules.golden_game,
            _ => 1.0,
        }
    }
}

/// Resolve a team's booster selection.
///
/// `played` reports whether a player logged any minutes in the gameweek.
pub fn resolve(
    selection: BoosterSelection,
    team: &UserFantasyTeam,
    played: impl Fn(PlayerId) -> bool,
) -> BoosterOutcome {
    match selection.booster {
        None => BoosterOutcome::None,
        Some(Booster::DoubleImpact) => BoosterOutcome::DoubleImpact,
        Some(Booster::GoldenGame) => BoosterOutcome::GoldenGame,
        Some(Booster::RecoveryBoost) => {
            let Some(target) = selection.target else {
                return BoosterOutcome::Refunded(RefundReason::NoTarget);
            };
            if !team.is_starter(target) {
                BoosterOutcome::Refunded(RefundReason::TargetNotStarting(target))
            } else if !played(target) {
                BoosterOutcome::Refunded(RefundReason::TargetDidNotPlay(target))
            } else {
                BoosterOutcome::RecoveryBoost { target }
            }
        }
    }
}
