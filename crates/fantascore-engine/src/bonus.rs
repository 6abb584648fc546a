// Team-composition bonuses over a line-up's starters.

use chrono::NaiveDate;
use fantascore_core::model::{Category, Player};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BonusRules {
    /// No starter is a Star.
    pub no_star: f64,
    /// Every starter is Wild.
    pub crazy: f64,
    /// Average starter age at or above `vintage_min_average_age`.
    pub vintage: f64,
    pub vintage_min_average_age: f64,
}

impl Default for BonusRules {
    fn default() -> Self {
        Self {
            no_star: 1.25,
            crazy: 1.4,
            vintage: 1.2,
            vintage_min_average_age: 30.0,
        }
    }
}

/// Which bonuses a line-up earned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamBonuses {
    pub no_star: bool,
    pub crazy: bool,
    pub vintage: bool,
}

impl TeamBonuses {
    /// Combined factor. Bonuses compound: an all-Wild line-up earns both
    /// `no_star` and `crazy`.
    pub fn multiplier(&self, rules: &BonusRules) -> f64 {
        let mut m = 1.0;
        if self.no_star {
            m *= rules.no_star;
        }
        if self.crazy {
            m *= rules.crazy;
        }
        if self.vintage {
            m *= rules.vintage;
        }
        m
    }

    pub fn apply(&self, team_sum: f64, rules: &BonusRules) -> f64 {
        team_sum * self.multiplier(rules)
    }

    pub fn any(&self) -> bool {
        self.no_star || self.crazy || self.vintage
    }
}

/// Mean age of the starters on `on`, or `None` for an empty line-up.
pub fn average_age(starters: &[&Player], on: NaiveDate) -> Option<f64> {
    if starters.is_empty() {
        return None;
    }
    let total: u32 = starters.iter().map(|p| p.age_on(on)).sum();
    Some(f64::from(total) / starters.len() as f64)
}

/// Bonuses earned by `starters`, with ages taken on `on`.
///
/// An empty line-up earns nothing.
pub fn evaluate(starters: &[&Player], on: NaiveDate, rules: &BonusRules) -> TeamBonuses {
    let Some(avg_age) = average_age(starters, on) else {
        return TeamBonuses::default();
    };

    TeamBonuses {
        no_star: starters.iter().all(|p| p.category != Category::Star),
        crazy: starters.iter().all(|p| p.category == Category::Wild),
        vintage: avg_age >= rules.vintage_min_average_age,
    }
}
