// Fatigue tracker: per-player stamina in 0..=100.
//
// Playing drains stamina by a per-category amount, resting restores a fixed
// amount. Each player's update is computed once per run in a `FatigueLedger`
// and written after every team has been scored.

use std::collections::BTreeMap;

use fantascore_core::model::{Category, PlayerId};
use serde::Deserialize;

pub const MAX_FATIGUE: u8 = 100;

/// Fatigue regained by a player who did not feature.
pub const REST_GAIN: u8 = 10;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FatigueRules {
    pub rest_gain: u8,
    pub decay: DecayRules,
}

/// Fatigue lost by a player who featured, by category.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DecayRules {
    pub star: u8,
    pub key: u8,
    pub wild: u8,
}

impl Default for FatigueRules {
    fn default() -> Self {
        Self {
            rest_gain: REST_GAIN,
            decay: DecayRules::default(),
        }
    }
}

impl Default for DecayRules {
    fn default() -> Self {
        Self {
            star: 20,
            key: 10,
            wild: 0,
        }
    }
}

impl FatigueRules {
    pub fn decay_for(&self, category: Category) -> u8 {
        match category {
            Category::Star => self.decay.star,
            Category::Key => self.decay.key,
            Category::Wild => self.decay.wild,
        }
    }
}

/// New fatigue after one gameweek.
///
/// Out-of-range inputs are clamped to 100 first, so the result is always in
/// `0..=100`.
pub fn update_fatigue(current: u8, category: Category, played: bool, rules: &FatigueRules) -> u8 {
    let current = current.min(MAX_FATIGUE);
    if played {
        current.saturating_sub(rules.decay_for(category))
    } else {
        current.saturating_add(rules.rest_gain).min(MAX_FATIGUE)
    }
}

/// One player's fatigue transition for the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatigueUpdate {
    pub before: u8,
    pub after: u8,
    pub played: bool,
}

/// Run-scoped, coalesced fatigue updates keyed by player.
///
/// The first `record` for a player wins; later calls for the same player
/// are no-ops. The outcome only depends on whether the player featured, so
/// which team reaches the player first does not matter.
#[derive(Debug, Clone, Default)]
pub struct FatigueLedger {
    updates: BTreeMap<PlayerId, FatigueUpdate>,
}

impl FatigueLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if this call recorded a new update.
    pub fn record(
        &mut self,
        player: PlayerId,
        before: u8,
        category: Category,
        played: bool,
        rules: &FatigueRules,
    ) -> bool {
        if self.updates.contains_key(&player) {
            return false;
        }
        let after = update_fatigue(before, category, played, rules);
        self.updates.insert(
            player,
            FatigueUpdate {
                before: before.min(MAX_FATIGUE),
                after,
                played,
            },
        );
        true
    }

    pub fn get(&self, player: PlayerId) -> Option<&FatigueUpdate> {
        self.updates.get(&player)
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Updates in ascending player id order.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &FatigueUpdate)> {
        self.updates.iter().map(|(id, u)| (*id, u))
    }
}
