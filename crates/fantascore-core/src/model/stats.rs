// Per-player, per-fixture match statistics.
//
// Records are produced by the ingestion side and are immutable here. The
// counted actions form a closed set (`StatKind`) so scoring tables can be
// matched exhaustively.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::player::PlayerId;

/// Primary key of a real-world fixture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureId(pub i64);

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Counted actions that carry a per-position point value.
///
/// Minutes played and clean sheets are not in this set: they award flat
/// bonuses gated on the minutes threshold rather than per-unit points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatKind {
    Goals,
    Assists,
    ShotsOnTarget,
    Saves,
    PenaltiesScored,
    PenaltiesMissed,
    PenaltiesSaved,
    YellowCards,
    RedCards,
    GoalsConceded,
    Interceptions,
    Tackles,
    DuelsWon,
    DuelsLost,
    DribblesSucceeded,
    FoulsCommitted,
    FoulsSuffered,
}

impl StatKind {
    pub const ALL: [StatKind; 17] = [
        StatKind::Goals,
        StatKind::Assists,
        StatKind::ShotsOnTarget,
        StatKind::Saves,
        StatKind::PenaltiesScored,
        StatKind::PenaltiesMissed,
        StatKind::PenaltiesSaved,
        StatKind::YellowCards,
        StatKind::RedCards,
        StatKind::GoalsConceded,
        StatKind::Interceptions,
        StatKind::Tackles,
        StatKind::DuelsWon,
        StatKind::DuelsLost,
        StatKind::DribblesSucceeded,
        StatKind::FoulsCommitted,
        StatKind::FoulsSuffered,
    ];

    /// Column name used in the database and in CSV exports.
    pub fn column(&self) -> &'static str {
        match self {
            StatKind::Goals => "goals",
            StatKind::Assists => "assists",
            StatKind::ShotsOnTarget => "shots_on_target",
            StatKind::Saves => "saves",
            StatKind::PenaltiesScored => "penalties_scored",
            StatKind::PenaltiesMissed => "penalties_missed",
            StatKind::PenaltiesSaved => "penalties_saved",
            StatKind::YellowCards => "yellow_cards",
            StatKind::RedCards => "red_cards",
            StatKind::GoalsConceded => "goals_conceded",
            StatKind::Interceptions => "interceptions",
            StatKind::Tackles => "tackles",
            StatKind::DuelsWon => "duels_won",
            StatKind::DuelsLost => "duels_lost",
            StatKind::DribblesSucceeded => "dribbles_succeeded",
            StatKind::FoulsCommitted => "fouls_committed",
            StatKind::FoulsSuffered => "fouls_suffered",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// One player's statistics for one fixture.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerMatchStat {
    pub player_id: PlayerId,
    pub fixture_id: FixtureId,
    pub match_date: DateTime<Utc>,
    pub minutes_played: u32,
    pub clean_sheet: bool,
    pub goals: u32,
    pub assists: u32,
    pub shots_on_target: u32,
    pub saves: u32,
    pub penalties_scored: u32,
    pub penalties_missed: u32,
    pub penalties_saved: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub goals_conceded: u32,
    pub interceptions: u32,
    pub tackles: u32,
    pub duels_won: u32,
    pub duels_lost: u32,
    pub dribbles_succeeded: u32,
    pub fouls_committed: u32,
    pub fouls_suffered: u32,
    /// Provider match rating (continuous, typically 0-10).
    pub rating: f64,
}

impl PlayerMatchStat {
    /// Value of a single counted action.
    pub fn value(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Goals => self.goals,
            StatKind::Assists => self.assists,
            StatKind::ShotsOnTarget => self.shots_on_target,
            StatKind::Saves => self.saves,
            StatKind::PenaltiesScored => self.penalties_scored,
            StatKind::PenaltiesMissed => self.penalties_missed,
            StatKind::PenaltiesSaved => self.penalties_saved,
            StatKind::YellowCards => self.yellow_cards,
            StatKind::RedCards => self.red_cards,
            StatKind::GoalsConceded => self.goals_conceded,
            StatKind::Interceptions => self.interceptions,
            StatKind::Tackles => self.tackles,
            StatKind::DuelsWon => self.duels_won,
            StatKind::DuelsLost => self.duels_lost,
            StatKind::DribblesSucceeded => self.dribbles_succeeded,
            StatKind::FoulsCommitted => self.fouls_committed,
            StatKind::FoulsSuffered => self.fouls_suffered,
        }
    }

    /// Mutable access to a counted action, used by loaders that fill the
    /// record column by column.
    pub fn value_mut(&mut self, kind: StatKind) -> &mut u32 {
        match kind {
            StatKind::Goals => &mut self.goals,
            StatKind::Assists => &mut self.assists,
            StatKind::ShotsOnTarget => &mut self.shots_on_target,
            StatKind::Saves => &mut self.saves,
            StatKind::PenaltiesScored => &mut self.penalties_scored,
            StatKind::PenaltiesMissed => &mut self.penalties_missed,
            StatKind::PenaltiesSaved => &mut self.penalties_saved,
            StatKind::YellowCards => &mut self.yellow_cards,
            StatKind::RedCards => &mut self.red_cards,
            StatKind::GoalsConceded => &mut self.goals_conceded,
            StatKind::Interceptions => &mut self.interceptions,
            StatKind::Tackles => &mut self.tackles,
            StatKind::DuelsWon => &mut self.duels_won,
            StatKind::DuelsLost => &mut self.duels_lost,
            StatKind::DribblesSucceeded => &mut self.dribbles_succeeded,
            StatKind::FoulsCommitted => &mut self.fouls_committed,
            StatKind::FoulsSuffered => &mut self.fouls_suffered,
        }
    }

    /// Counted actions with a non-zero value, in table order.
    pub fn nonzero_actions(&self) -> impl Iterator<Item = (StatKind, u32)> + '_ {
        StatKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.value(kind)))
            .filter(|&(_, v)| v > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_and_value_mut_agree_for_every_kind() {
        let mut stat = PlayerMatchStat::default();
        for (i, kind) in StatKind::ALL.into_iter().enumerate() {
            *stat.value_mut(kind) = i as u32 + 1;
        }
        for (i, kind) in StatKind::ALL.into_iter().enumerate() {
            assert_eq!(stat.value(kind), i as u32 + 1, "mismatch for {kind}");
        }
    }

    #[test]
    fn nonzero_actions_skips_zero_values() {
        let stat = PlayerMatchStat {
            goals: 2,
            yellow_cards: 1,
            ..Default::default()
        };
        let actions: Vec<_> = stat.nonzero_actions().collect();
        assert_eq!(
            actions,
            vec![(StatKind::Goals, 2), (StatKind::YellowCards, 1)]
        );
    }

    #[test]
    fn column_names_are_unique() {
        let mut names: Vec<&str> = StatKind::ALL.iter().map(|k| k.column()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), StatKind::ALL.len());
    }
}
