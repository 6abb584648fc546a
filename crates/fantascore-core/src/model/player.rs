// Player identity, position, and category tier.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key of a player record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Football positions. Every scoring table is keyed by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Attacker,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Attacker,
    ];

    /// Parse a position string.
    ///
    /// Accepts the short codes used in provider exports ("GK", "DEF", "MID",
    /// "ATT"/"FWD") as well as the full names, case-insensitively.
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "GK" | "G" | "GOALKEEPER" => Some(Position::Goalkeeper),
            "DEF" | "D" | "DEFENDER" => Some(Position::Defender),
            "MID" | "M" | "MIDFIELDER" => Some(Position::Midfielder),
            "ATT" | "FWD" | "F" | "A" | "ATTACKER" => Some(Position::Attacker),
            _ => None,
        }
    }

    /// Return the short code for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Attacker => "ATT",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Quality/price tier. Drives fatigue decay and team bonus eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Star,
    Key,
    Wild,
}

impl Category {
    pub fn from_str_category(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "STAR" => Some(Category::Star),
            "KEY" => Some(Category::Key),
            "WILD" => Some(Category::Wild),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Category::Star => "Star",
            Category::Key => "Key",
            Category::Wild => "Wild",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// A player as seen by the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    pub category: Category,
    pub birthdate: NaiveDate,
    /// Stamina in `0..=100`. Only the scoring job writes this.
    pub fatigue: u8,
}

impl Player {
    /// Age in whole years on the given date.
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        let mut age = date.year() - self.birthdate.year();
        if (date.month(), date.day()) < (self.birthdate.month(), self.birthdate.day()) {
            age -= 1;
        }
        age.max(0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player_born(y: i32, m: u32, d: u32) -> Player {
        Player {
            id: PlayerId(1),
            name: "Test".into(),
            position: Position::Midfielder,
            category: Category::Key,
            birthdate: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            fatigue: 100,
        }
    }

    #[test]
    fn from_str_pos_short_codes() {
        assert_eq!(Position::from_str_pos("GK"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_str_pos("def"), Some(Position::Defender));
        assert_eq!(Position::from_str_pos("Mid"), Some(Position::Midfielder));
        assert_eq!(Position::from_str_pos("FWD"), Some(Position::Attacker));
        assert_eq!(Position::from_str_pos("ATT"), Some(Position::Attacker));
    }

    #[test]
    fn from_str_pos_invalid() {
        assert_eq!(Position::from_str_pos(""), None);
        assert_eq!(Position::from_str_pos("SS"), None);
    }

    #[test]
    fn display_str_roundtrip() {
        for pos in Position::ALL {
            assert_eq!(Position::from_str_pos(pos.display_str()), Some(pos));
        }
        for cat in [Category::Star, Category::Key, Category::Wild] {
            assert_eq!(Category::from_str_category(cat.display_str()), Some(cat));
        }
    }

    #[test]
    fn age_counts_completed_years_only() {
        let p = player_born(1994, 6, 15);
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), 29);
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()), 30);
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()), 30);
    }

    #[test]
    fn age_before_birth_is_zero() {
        let p = player_born(2030, 1, 1);
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()), 0);
    }
}
