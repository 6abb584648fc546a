// Team scoring: booster resolution, per-starter points, bonuses, and the
// rounded team total.
//
// `score_team` has no side effects, so the job can run it for every team in
// parallel. Fatigue writes are decided separately by the job.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use fantascore_core::model::{BoosterSelection, Player, PlayerId, TeamId, UserFantasyTeam};
use tracing::warn;

use crate::appearance::Appearances;
use crate::bonus::{self, TeamBonuses};
use crate::booster::{self, BoosterOutcome};
use crate::fatigue::MAX_FATIGUE;
use crate::leaderboard::round_total;
use crate::scoring;
use crate::EngineRules;

/// Everything a team needs to be scored, prefetched once per run.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub players: &'a HashMap<PlayerId, Player>,
    pub appearances: &'a Appearances,
    /// Fatigue each player entered the gameweek with. Players missing here
    /// fall back to their stored value.
    pub baseline_fatigue: &'a BTreeMap<PlayerId, u8>,
    /// Date player ages are taken on.
    pub evaluation_date: NaiveDate,
    pub rules: &'a EngineRules,
}

impl ScoringInputs<'_> {
    pub fn fatigue_of(&self, player: &Player) -> u8 {
        self.baseline_fatigue
            .get(&player.id)
            .copied()
            .unwrap_or(player.fatigue)
            .min(MAX_FATIGUE)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarterScore {
    pub player_id: PlayerId,
    /// Unrounded, summed over every fixture in the window.
    pub points: f64,
    pub played: bool,
    /// Fatigue the points were scaled by.
    pub fatigue: u8,
    pub is_captain: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamScore {
    pub team_id: TeamId,
    pub booster: BoosterOutcome,
    pub starters: Vec<StarterScore>,
    pub bonuses: TeamBonuses,
    /// Sum of starter points before bonuses and boosters.
    pub starter_sum: f64,
    /// Rounded to one decimal; what gets persisted and ranked.
    pub total_points: f64,
}

/// Score one team.
///
/// `selection` is the booster slot to resolve, which may come from a run
/// snapshot rather than the team record.
pub fn score_team(
    team: &UserFantasyTeam,
    selection: BoosterSelection,
    inputs: &ScoringInputs<'_>,
) -> TeamScore {
    let rules = inputs.rules;
    let outcome = booster::resolve(selection, team, |id| inputs.appearances.played(id));
    let recovery_target = outcome.recovery_target();

    let mut captain_applied = false;
    let mut starters = Vec::with_capacity(team.starters.len());
    let mut lineup: Vec<&Player> = Vec::with_capacity(team.starters.len());

    for &player_id in &team.starters {
        let is_captain = !captain_applied && player_id == team.captain;
        captain_applied |= is_captain;

        let Some(player) = inputs.players.get(&player_id) else {
            warn!("team {}: starter {} has no player record, scoring 0", team.id, player_id);
            starters.push(StarterScore {
                player_id,
                points: 0.0,
                played: false,
                fatigue: 0,
                is_captain,
            });
            continue;
        };
        lineup.push(player);

        let fatigue = if recovery_target == Some(player_id) {
            MAX_FATIGUE
        } else {
            inputs.fatigue_of(player)
        };

        let points: f64 = inputs
            .appearances
            .records(player_id)
            .iter()
            .map(|stats| {
                scoring::score(
                    stats,
                    player.position,
                    fatigue,
                    is_captain,
                    outcome.double_impact_active(),
                    &rules.scoring,
                )
            })
            .sum();

        starters.push(StarterScore {
            player_id,
            points,
            played: inputs.appearances.played(player_id),
            fatigue,
            is_captain,
        });
    }

    let starter_sum: f64 = starters.iter().map(|s| s.points).sum();
    let bonuses = bonus::evaluate(&lineup, inputs.evaluation_date, &rules.bonus);
    let team_sum = bonuses.apply(starter_sum, &rules.bonus) * outcome.team_multiplier(&rules.booster);

    TeamScore {
        team_id: team.id,
        booster: outcome,
        starters,
        bonuses,
        starter_sum,
        total_points: round_total(team_sum),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booster::RefundReason;
    use chrono::{TimeZone, Utc};
    use fantascore_core::model::{
        Booster, Category, FixtureId, GameWeekId, PlayerMatchStat, Position,
    };

    struct Fixture {
        players: HashMap<PlayerId, Player>,
        appearances: Appearances,
        baseline: BTreeMap<PlayerId, u8>,
        rules: EngineRules,
    }

    impl Fixture {
        fn new(players: Vec<Player>, stats: Vec<PlayerMatchStat>) -> Self {
            Self {
                players: players.into_iter().map(|p| (p.id, p)).collect(),
                appearances: Appearances::from_stats(stats),
                baseline: BTreeMap::new(),
                rules: EngineRules::default(),
            }
        }

        fn inputs(&self) -> ScoringInputs<'_> {
            ScoringInputs {
                players: &self.players,
                appearances: &self.appearances,
                baseline_fatigue: &self.baseline,
                evaluation_date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
                rules: &self.rules,
            }
        }
    }

    fn player(id: i64, position: Position, category: Category, fatigue: u8) -> Player {
        Player {
            id: PlayerId(id),
            name: format!("Player {id}"),
            position,
            category,
            birthdate: NaiveDate::from_ymd_opt(1998, 3, 14).unwrap(),
            fatigue,
        }
    }

    fn keeper_stat(id: i64, fixture: i64) -> PlayerMatchStat {
        PlayerMatchStat {
            player_id: PlayerId(id),
            fixture_id: FixtureId(fixture),
            minutes_played: 90,
            clean_sheet: true,
            saves: 4,
            ..Default::default()
        }
    }

    fn team(starters: &[i64], subs: &[i64], captain: i64) -> UserFantasyTeam {
        UserFantasyTeam {
            id: TeamId(1),
            user_id: "u1".into(),
            display_name: "Team".into(),
            gameweek_id: GameWeekId(1),
            starters: starters.iter().copied().map(PlayerId).collect(),
            substitutes: subs.iter().copied().map(PlayerId).collect(),
            captain: PlayerId(captain),
            booster_used: None,
            booster_target: None,
            total_points: 0.0,
            created_at: Utc.with_ymd_and_hms(2024, 8, 1, 0, 0, 0).unwrap(),
        }
    }

    fn select(booster: Booster, target: Option<i64>) -> BoosterSelection {
        BoosterSelection {
            booster: Some(booster),
            target: target.map(PlayerId),
        }
    }

    #[test]
    fn star_keeper_alone_scores_twelve() {
        let fx = Fixture::new(
            vec![player(1, Position::Goalkeeper, Category::Star, 100)],
            vec![keeper_stat(1, 10)],
        );
        let t = team(&[1], &[], 2);
        let score = score_team(&t, BoosterSelection::default(), &fx.inputs());
        assert_eq!(score.total_points, 12.0);
        assert!(!score.bonuses.any());
        assert_eq!(score.booster, BoosterOutcome::None);
    }

    #[test]
    fn captain_counted_once_even_if_listed_twice() {
        let fx = Fixture::new(
            vec![player(1, Position::Goalkeeper, Category::Star, 100)],
            vec![keeper_stat(1, 10)],
        );
        let t = team(&[1, 1], &[], 1);
        let score = score_team(&t, BoosterSelection::default(), &fx.inputs());
        let captains = score.starters.iter().filter(|s| s.is_captain).count();
        assert_eq!(captains, 1);
    }

    #[test]
    fn double_impact_adds_exactly_the_captains_extra() {
        let fx = Fixture::new(
            vec![
                player(1, Position::Goalkeeper, Category::Star, 100),
                player(2, Position::Defender, Category::Star, 100),
            ],
            vec![keeper_stat(1, 10), keeper_stat(2, 10)],
        );
        let t = team(&[1, 2], &[], 1);
        let plain = score_team(&t, BoosterSelection::default(), &fx.inputs());
        let boosted = score_team(&t, select(Booster::DoubleImpact, None), &fx.inputs());

        let captain_plain = plain.starters[0].points;
        let expected_gain = captain_plain * (fx.rules.scoring.double_impact_multiplier - 1.0);
        assert!((boosted.starter_sum - plain.starter_sum - expected_gain).abs() < 1e-9);
        assert_eq!(plain.starters[1].points, boosted.starters[1].points);
    }

    #[test]
    fn recovery_boost_forces_full_fatigue_for_this_team() {
        let mut fx = Fixture::new(
            vec![player(1, Position::Goalkeeper, Category::Star, 50)],
            vec![keeper_stat(1, 10)],
        );
        fx.baseline.insert(PlayerId(1), 50);
        let t = team(&[1], &[], 2);

        let plain = score_team(&t, BoosterSelection::default(), &fx.inputs());
        assert_eq!(plain.starters[0].fatigue, 50);
        assert_eq!(plain.total_points, 6.0);

        let boosted = score_team(&t, select(Booster::RecoveryBoost, Some(1)), &fx.inputs());
        assert_eq!(boosted.starters[0].fatigue, 100);
        assert_eq!(boosted.total_points, 12.0);
        // Inputs untouched for the next team.
        assert_eq!(fx.baseline[&PlayerId(1)], 50);
    }

    #[test]
    fn recovery_boost_on_benched_target_refunds_even_if_played() {
        let fx = Fixture::new(
            vec![
                player(1, Position::Goalkeeper, Category::Star, 100),
                player(2, Position::Goalkeeper, Category::Key, 40),
            ],
            vec![keeper_stat(1, 10), keeper_stat(2, 11)],
        );
        let t = team(&[1], &[2], 1);
        let score = score_team(&t, select(Booster::RecoveryBoost, Some(2)), &fx.inputs());
        assert_eq!(
            score.booster,
            BoosterOutcome::Refunded(RefundReason::TargetNotStarting(PlayerId(2)))
        );
        assert_eq!(score.booster.applied(), None);
        assert_eq!(score.starters.len(), 1);
    }

    #[test]
    fn golden_game_applies_after_bonuses() {
        let fx = Fixture::new(
            vec![player(1, Position::Goalkeeper, Category::Wild, 100)],
            vec![keeper_stat(1, 10)],
        );
        let t = team(&[1], &[], 2);
        let score = score_team(&t, select(Booster::GoldenGame, None), &fx.inputs());
        // 12 * 1.25 * 1.4 * 1.2
        assert_eq!(score.total_points, 25.2);
    }

    #[test]
    fn did_not_play_and_unknown_starters_score_zero() {
        let fx = Fixture::new(
            vec![player(1, Position::Midfielder, Category::Key, 100)],
            Vec::new(),
        );
        let t = team(&[1, 42], &[], 1);
        let score = score_team(&t, BoosterSelection::default(), &fx.inputs());
        assert!(score.starters.iter().all(|s| s.points == 0.0 && !s.played));
        assert_eq!(score.total_points, 0.0);
    }

    #[test]
    fn multiple_fixtures_are_summed() {
        let fx = Fixture::new(
            vec![player(1, Position::Goalkeeper, Category::Star, 100)],
            vec![keeper_stat(1, 10), keeper_stat(1, 11)],
        );
        let t = team(&[1], &[], 2);
        let score = score_team(&t, BoosterSelection::default(), &fx.inputs());
        assert_eq!(score.total_points, 24.0);
    }
}
