// Scoring job orchestration, configuration, and operator tooling.

pub mod config;
pub mod import;
pub mod job;
pub mod locks;
pub mod logging;
