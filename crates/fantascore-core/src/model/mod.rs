// Domain records shared by the scoring engine and its persistence layer.

pub mod gameweek;
pub mod player;
pub mod stats;
pub mod team;

pub use gameweek::{GameWeek, GameWeekId, GameWeekStatus};
pub use player::{Category, Player, PlayerId, Position};
pub use stats::{FixtureId, PlayerMatchStat, StatKind};
pub use team::{Booster, BoosterSelection, LeaderboardEntry, TeamId, UserFantasyTeam};
