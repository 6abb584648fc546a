// Gameweek calendar entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key of a gameweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameWeekId(pub i64);

impl fmt::Display for GameWeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a gameweek: `Upcoming -> Live -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameWeekStatus {
    Upcoming,
    Live,
    Finished,
}

impl GameWeekStatus {
    pub fn from_str_status(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "upcoming" => Some(GameWeekStatus::Upcoming),
            "live" => Some(GameWeekStatus::Live),
            "finished" => Some(GameWeekStatus::Finished),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            GameWeekStatus::Upcoming => "upcoming",
            GameWeekStatus::Live => "live",
            GameWeekStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for GameWeekStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A scoring period bounded by start and end timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameWeek {
    pub id: GameWeekId,
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: GameWeekStatus,
}

impl GameWeek {
    /// Whether a match played at `ts` belongs to this gameweek. Both bounds
    /// are inclusive.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start_date <= ts && ts <= self.end_date
    }
}
