// Leaderboard ranking.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use fantascore_core::model::{Booster, GameWeekId, LeaderboardEntry, TeamId};

/// Round a team sum to one decimal place, half away from zero.
pub fn round_total(team_sum: f64) -> f64 {
    (team_sum * 10.0).round() / 10.0
}

/// A scored team as the leaderboard sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStanding {
    pub team_id: TeamId,
    pub user_id: String,
    pub display_name: String,
    /// Already rounded.
    pub total_points: f64,
    pub booster_used: Option<Booster>,
    pub created_at: DateTime<Utc>,
}

/// Descending by total, then earlier creation, then lower team id.
fn standing_order(a: &TeamStanding, b: &TeamStanding) -> Ordering {
    b.total_points
        .total_cmp(&a.total_points)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.team_id.cmp(&b.team_id))
}

/// Rank every standing. Ranks are `1..=N` with no gaps, ties included.
pub fn build_leaderboard(gameweek: GameWeekId, mut standings: Vec<TeamStanding>) -> Vec<LeaderboardEntry> {
    standings.sort_by(standing_order);

    standings
        .into_iter()
        .enumerate()
        .map(|(i, s)| LeaderboardEntry {
            gameweek_id: gameweek,
            team_id: s.team_id,
            user_id: s.user_id,
            display_name: s.display_name,
            total_points: s.total_points,
            rank: i as u32 + 1,
            booster_used: s.booster_used,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn standing(team: i64, total: f64, created_minute: u32) -> TeamStanding {
        TeamStanding {
            team_id: TeamId(team),
            user_id: format!("user-{team}"),
            display_name: format!("Team {team}"),
            total_points: total,
            booster_used: None,
            created_at: Utc.with_ymd_and_hms(2024, 8, 1, 10, created_minute, 0).unwrap(),
        }
    }

    #[test]
    fn rounds_to_one_decimal() {
        assert_eq!(round_total(12.04), 12.0);
        assert_eq!(round_total(12.06), 12.1);
        assert_eq!(round_total(-3.25), -3.3);
        assert_eq!(round_total(0.0), 0.0);
    }

    #[test]
    fn ranks_are_contiguous_and_descending() {
        let board = build_leaderboard(
            GameWeekId(3),
            vec![
                standing(1, 10.0, 0),
                standing(2, 55.5, 0),
                standing(3, -2.0, 0),
                standing(4, 31.2, 0),
            ],
        );
        let ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4]);
        assert!(board.windows(2).all(|w| w[0].total_points >= w[1].total_points));
        assert!(board.iter().all(|e| e.gameweek_id == GameWeekId(3)));
        assert_eq!(board[0].team_id, TeamId(2));
    }

    #[test]
    fn ties_break_on_creation_then_id() {
        let board = build_leaderboard(
            GameWeekId(1),
            vec![
                standing(9, 20.0, 5),
                standing(7, 20.0, 5),
                standing(8, 20.0, 1),
            ],
        );
        let order: Vec<TeamId> = board.iter().map(|e| e.team_id).collect();
        assert_eq!(order, vec![TeamId(8), TeamId(7), TeamId(9)]);
        let ranks: Vec<u32> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3]);
    }

    #[test]
    fn ordering_ignores_input_order() {
        let mut input = vec![standing(1, 5.0, 0), standing(2, 5.0, 0), standing(3, 8.0, 0)];
        let a = build_leaderboard(GameWeekId(1), input.clone());
        input.reverse();
        let b = build_leaderboard(GameWeekId(1), input);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_gives_empty_board() {
        assert!(build_leaderboard(GameWeekId(1), Vec::new()).is_empty());
    }
}
