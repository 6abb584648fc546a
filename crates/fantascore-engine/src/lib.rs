// Scoring engine: per-player points, fatigue, team bonuses, boosters, and
// leaderboard ranking. Everything here is pure; persistence lives in
// fantascore-core and orchestration in fantascore-app.

pub mod appearance;
pub mod bonus;
pub mod booster;
pub mod fatigue;
pub mod leaderboard;
pub mod rules;
pub mod scoring;
pub mod team;

pub use rules::EngineRules;
