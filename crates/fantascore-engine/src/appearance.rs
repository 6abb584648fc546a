// Index of which players featured in a gameweek, built once per run from
// the bulk stat fetch.

use std::collections::HashMap;

use fantascore_core::model::{PlayerId, PlayerMatchStat};

/// Stat records grouped by player.
#[derive(Debug, Clone, Default)]
pub struct Appearances {
    by_player: HashMap<PlayerId, Vec<PlayerMatchStat>>,
}

impl Appearances {
    pub fn from_stats(stats: impl IntoIterator<Item = PlayerMatchStat>) -> Self {
        let mut by_player: HashMap<PlayerId, Vec<PlayerMatchStat>> = HashMap::new();
        for stat in stats {
            by_player.entry(stat.player_id).or_default().push(stat);
        }
        for records in by_player.values_mut() {
            records.sort_by_key(|s| s.fixture_id);
        }
        Self { by_player }
    }

    /// All records for the player in the window. Empty means Did-Not-Play.
    pub fn records(&self, player: PlayerId) -> &[PlayerMatchStat] {
        self.by_player
            .get(&player)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total minutes across every fixture in the window.
    pub fn minutes(&self, player: PlayerId) -> u32 {
        self.records(player).iter().map(|s| s.minutes_played).sum()
    }

    /// A player featured if they were on the pitch for at least one minute.
    /// A record with zero minutes (unused substitute) does not count.
    pub fn played(&self, player: PlayerId) -> bool {
        self.minutes(player) > 0
    }

    pub fn player_count(&self) -> usize {
        self.by_player.len()
    }

    pub fn record_count(&self) -> usize {
        self.by_player.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fantascore_core::model::FixtureId;

    fn stat(player: i64, fixture: i64, minutes: u32) -> PlayerMatchStat {
        PlayerMatchStat {
            player_id: PlayerId(player),
            fixture_id: FixtureId(fixture),
            minutes_played: minutes,
            ..Default::default()
        }
    }

    #[test]
    fn missing_player_did_not_play() {
        let apps = Appearances::from_stats(vec![stat(1, 1, 90)]);
        assert!(apps.records(PlayerId(2)).is_empty());
        assert!(!apps.played(PlayerId(2)));
    }

    #[test]
    fn zero_minute_record_is_not_an_appearance() {
        let apps = Appearances::from_stats(vec![stat(1, 1, 0)]);
        assert_eq!(apps.records(PlayerId(1)).len(), 1);
        assert!(!apps.played(PlayerId(1)));
    }

    #[test]
    fn minutes_sum_across_fixtures_in_fixture_order() {
        let apps = Appearances::from_stats(vec![stat(1, 9, 30), stat(1, 4, 0), stat(2, 1, 90)]);
        assert_eq!(apps.minutes(PlayerId(1)), 30);
        assert!(apps.played(PlayerId(1)));
        let fixtures: Vec<_> = apps.records(PlayerId(1)).iter().map(|s| s.fixture_id.0).collect();
        assert_eq!(fixtures, vec![4, 9]);
        assert_eq!(apps.player_count(), 2);
        assert_eq!(apps.record_count(), 3);
    }
}
