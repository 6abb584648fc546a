// Tunable engine parameters, one table per component. Deserialized from
// the `[fatigue]`, `[scoring]`, `[bonus]` and `[booster]` sections of
// engine.toml.

use serde::Deserialize;

use crate::bonus::BonusRules;
use crate::booster::BoosterRules;
use crate::fatigue::FatigueRules;
use crate::scoring::ScoringRules;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineRules {
    pub fatigue: FatigueRules,
    pub scoring: ScoringRules,
    pub bonus: BonusRules,
    pub booster: BoosterRules,
}
