// Per-player scoring.
//
// Evaluation order is fixed: flat bonuses, per-action points, the
// position's rating multiplier, fatigue, then captain and Double Impact.
// Every multiplicative step scales the whole accumulated value.

use fantascore_core::model::{PlayerMatchStat, Position, StatKind};
use serde::Deserialize;

// ---------------------------------------------------------------------------
// Point tables
// ---------------------------------------------------------------------------

/// Flat bonus for playing more than the minutes threshold.
pub fn minutes_bonus(position: Position) -> f64 {
    match position {
        Position::Goalkeeper => 2.0,
        Position::Defender => 2.0,
        Position::Midfielder => 1.5,
        Position::Attacker => 1.0,
    }
}

/// Flat bonus for a clean sheet, also gated on the minutes threshold.
pub fn clean_sheet_bonus(position: Position) -> f64 {
    match position {
        Position::Goalkeeper => 4.0,
        Position::Defender => 4.0,
        Position::Midfielder => 1.0,
        Position::Attacker => 0.0,
    }
}

/// Position amplifier applied to the accumulated base. Always > 1.
pub fn rating_multiplier(position: Position) -> f64 {
    match position {
        Position::Goalkeeper => 1.2,
        Position::Defender => 1.15,
        Position::Midfielder => 1.1,
        Position::Attacker => 1.05,
    }
}

/// Points per unit of a counted action for a position. Negative values
/// penalise.
pub fn per_action(kind: StatKind, position: Position) -> f64 {
    use Position::*;
    use StatKind::*;

    match (kind, position) {
        (Goals, Goalkeeper) => 10.0,
        (Goals, Defender) => 6.0,
        (Goals, Midfielder) => 5.0,
        (Goals, Attacker) => 4.0,

        (Assists, Goalkeeper) => 6.0,
        (Assists, Defender) => 4.0,
        (Assists, Midfielder | Attacker) => 3.0,

        (ShotsOnTarget, Goalkeeper) => 1.0,
        (ShotsOnTarget, Defender) => 0.8,
        (ShotsOnTarget, Midfielder) => 0.6,
        (ShotsOnTarget, Attacker) => 0.5,

        (Saves, Goalkeeper) => 1.0,
        (Saves, _) => 0.0,

        (PenaltiesScored, _) => 3.0,
        (PenaltiesMissed, _) => -4.0,

        (PenaltiesSaved, Goalkeeper) => 5.0,
        (PenaltiesSaved, _) => 0.0,

        (YellowCards, _) => -1.0,
        (RedCards, _) => -3.0,

        (GoalsConceded, Goalkeeper | Defender) => -1.0,
        (GoalsConceded, Midfielder) => -0.5,
        (GoalsConceded, Attacker) => 0.0,

        (Interceptions, Goalkeeper | Attacker) => 0.2,
        (Interceptions, Defender) => 0.4,
        (Interceptions, Midfielder) => 0.3,

        (Tackles, Goalkeeper | Attacker) => 0.2,
        (Tackles, Defender) => 0.5,
        (Tackles, Midfielder) => 0.4,

        (DuelsWon, Goalkeeper) => 0.1,
        (DuelsWon, _) => 0.2,

        (DuelsLost, _) => -0.1,

        (DribblesSucceeded, Goalkeeper) => 0.1,
        (DribblesSucceeded, Defender) => 0.2,
        (DribblesSucceeded, Midfielder) => 0.3,
        (DribblesSucceeded, Attacker) => 0.4,

        (FoulsCommitted, _) => -0.3,
        (FoulsSuffered, _) => 0.1,
    }
}

// ---------------------------------------------------------------------------
// Configurable multipliers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    /// Minutes a player must exceed to earn the flat bonuses.
    pub minutes_threshold: u32,
    pub captain_multiplier: f64,
    /// Applied on top of the captain multiplier when Double Impact is active.
    pub double_impact_multiplier: f64,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            minutes_threshold: 60,
            captain_multiplier: 1.1,
            double_impact_multiplier: 2.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Points for one player's stat record. Unrounded.
///
/// `double_impact_active` only has an effect when `is_captain` is set.
pub fn score(
    stats: &PlayerMatchStat,
    position: Position,
    fatigue: u8,
    is_captain: bool,
    double_impact_active: bool,
    rules: &ScoringRules,
) -> f64 {
    let mut base = 0.0;

    let full_shift = stats.minutes_played > rules.minutes_threshold;
    if full_shift {
        base += minutes_bonus(position);
    }
    if stats.clean_sheet && full_shift {
        base += clean_sheet_bonus(position);
    }

    for (kind, value) in stats.nonzero_actions() {
        base += per_action(kind, position) * f64::from(value);
    }

    base *= rating_multiplier(position);
    base *= f64::from(fatigue.min(100)) / 100.0;

    if is_captain {
        base *= rules.captain_multiplier;
        if double_impact_active {
            base *= rules.double_impact_multiplier;
        }
    }

    base
}
