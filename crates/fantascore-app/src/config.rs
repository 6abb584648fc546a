// Configuration loading and parsing (engine.toml).

use fantascore_engine::bonus::BonusRules;
use fantascore_engine::booster::BoosterRules;
use fantascore_engine::fatigue::{FatigueRules, MAX_FATIGUE};
use fantascore_engine::scoring::ScoringRules;
use fantascore_engine::EngineRules;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that replaces `database.path`.
pub const DB_PATH_ENV: &str = "FANTASCORE_DB";

const DB_FILE_NAME: &str = "fantascore.db";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub rules: EngineRules,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Empty selects the platform data directory.
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: String,
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: "logs".into(),
            filter: "fantascore_app=info,fantascore_engine=info,fantascore_core=info,warn".into(),
        }
    }
}

impl Config {
    /// Resolved database location.
    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        if !self.database.path.trim().is_empty() {
            return Ok(PathBuf::from(self.database.path.trim()));
        }
        let dirs = directories::ProjectDirs::from("", "", "fantascore").ok_or_else(|| {
            ConfigError::ValidationError {
                field: "database.path".into(),
                message: "no platform data directory available; set a path explicitly".into(),
            }
        })?;
        Ok(dirs.data_dir().join(DB_FILE_NAME))
    }
}

// ---------------------------------------------------------------------------
// engine.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire engine.toml file.
#[derive(Debug, Clone, Deserialize)]
struct EngineFile {
    #[serde(default)]
    database: DatabaseConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    fatigue: FatigueRules,
    #[serde(default)]
    scoring: ScoringRules,
    #[serde(default)]
    bonus: BonusRules,
    #[serde(default)]
    booster: BoosterRules,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load `config/engine.toml` relative to `base_dir`.
///
/// Does not copy defaults or read the environment. Prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("engine.toml");
    let text = read_file(&path)?;
    let file: EngineFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        database: file.database,
        logging: file.logging,
        rules: EngineRules {
            fatigue: file.fatigue,
            scoring: file.scoring,
            bonus: file.bonus,
            booster: file.booster,
        },
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the fantascore-app directory or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying defaults
/// first and applying environment overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    let mut config = load_config_from(&cwd)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Apply environment overrides through `lookup` (normally `std::env::var`).
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(path) = lookup(DB_PATH_ENV).filter(|p| !p.trim().is_empty()) {
        config.database.path = path;
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let rules = &config.rules;

    let fatigue_fields: &[(&str, u8)] = &[
        ("fatigue.rest_gain", rules.fatigue.rest_gain),
        ("fatigue.decay.star", rules.fatigue.decay.star),
        ("fatigue.decay.key", rules.fatigue.decay.key),
        ("fatigue.decay.wild", rules.fatigue.decay.wild),
    ];
    for (name, val) in fatigue_fields {
        if *val > MAX_FATIGUE {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be at most {MAX_FATIGUE}, got {val}"),
            });
        }
    }

    if rules.scoring.minutes_threshold > 120 {
        return Err(ConfigError::ValidationError {
            field: "scoring.minutes_threshold".into(),
            message: format!("must be at most 120, got {}", rules.scoring.minutes_threshold),
        });
    }

    let multiplier_fields: &[(&str, f64)] = &[
        ("scoring.captain_multiplier", rules.scoring.captain_multiplier),
        ("scoring.double_impact_multiplier", rules.scoring.double_impact_multiplier),
        ("bonus.no_star", rules.bonus.no_star),
        ("bonus.crazy", rules.bonus.crazy),
        ("bonus.vintage", rules.bonus.vintage),
        ("booster.golden_game", rules.booster.golden_game),
    ];
    for (name, val) in multiplier_fields {
        if !val.is_finite() || *val <= 0.0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: format!("must be > 0, got {val}"),
            });
        }
    }

    let age = rules.bonus.vintage_min_average_age;
    if !age.is_finite() || age <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "bonus.vintage_min_average_age".into(),
            message: format!("must be > 0, got {age}"),
        });
    }

    if config.logging.dir.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "logging.dir".into(),
            message: "must not be empty".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Helper: returns the fantascore-app crate root
    /// (works whether tests run from the crate root or the workspace root).
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("crates/fantascore-app/defaults").exists() {
            cwd.join("crates/fantascore-app")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    /// Temp dir with `config/engine.toml` holding the shipped defaults with
    /// `from` replaced by `to`.
    fn config_with(from: &str, to: &str) -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let defaults = fs::read_to_string(project_root().join("defaults/engine.toml")).unwrap();
        assert!(defaults.contains(from), "defaults missing `{from}`");
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join("config/engine.toml"),
            defaults.replacen(from, to, 1),
        )
        .unwrap();
        tmp
    }

    fn expect_validation_field(err: ConfigError, expected: &str) {
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, expected),
            other => panic!("expected ValidationError for {expected}, got: {other}"),
        }
    }

    #[test]
    fn shipped_defaults_match_builtin_rules() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("defaults")).unwrap();
        fs::copy(
            project_root().join("defaults/engine.toml"),
            tmp.path().join("defaults/engine.toml"),
        )
        .unwrap();
        ensure_config_files(tmp.path()).expect("should copy default configs");

        let config = load_config_from(tmp.path()).expect("defaults should load");
        assert_eq!(config.rules, EngineRules::default());
        assert_eq!(config.database.path, "");
        assert_eq!(config.logging.dir, "logs");
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("config")).unwrap();
        fs::write(
            tmp.path().join("config/engine.toml"),
            "[scoring]\ncaptain_multiplier = 1.5\n",
        )
        .unwrap();

        let config = load_config_from(tmp.path()).unwrap();
        assert_eq!(config.rules.scoring.captain_multiplier, 1.5);
        assert_eq!(config.rules.scoring.minutes_threshold, 60);
        assert_eq!(config.rules.fatigue, FatigueRules::default());
    }

    #[test]
    fn rejects_decay_above_hundred() {
        let tmp = config_with("star = 20", "star = 120");
        expect_validation_field(load_config_from(tmp.path()).unwrap_err(), "fatigue.decay.star");
    }

    #[test]
    fn rejects_zero_multiplier() {
        let tmp = config_with("golden_game = 1.2", "golden_game = 0.0");
        expect_validation_field(load_config_from(tmp.path()).unwrap_err(), "booster.golden_game");
    }

    #[test]
    fn rejects_negative_captain_multiplier() {
        let tmp = config_with("captain_multiplier = 1.1", "captain_multiplier = -1.1");
        expect_validation_field(
            load_config_from(tmp.path()).unwrap_err(),
            "scoring.captain_multiplier",
        );
    }

    #[test]
    fn rejects_minutes_threshold_beyond_match_length() {
        let tmp = config_with("minutes_threshold = 60", "minutes_threshold = 200");
        expect_validation_field(
            load_config_from(tmp.path()).unwrap_err(),
            "scoring.minutes_threshold",
        );
    }

    #[test]
    fn rejects_zero_vintage_age() {
        let tmp = config_with("vintage_min_average_age = 30.0", "vintage_min_average_age = 0.0");
        expect_validation_field(
            load_config_from(tmp.path()).unwrap_err(),
            "bonus.vintage_min_average_age",
        );
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = config_with("[booster]", "[booster");
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::ParseError { path, .. } => assert!(path.ends_with("engine.toml")),
            other => panic!("expected ParseError, got: {other}"),
        }
    }

    #[test]
    fn file_not_found_for_missing_engine_toml() {
        let tmp = tempfile::tempdir().unwrap();
        match load_config_from(tmp.path()).unwrap_err() {
            ConfigError::FileNotFound { path } => assert!(path.ends_with("engine.toml")),
            other => panic!("expected FileNotFound, got: {other}"),
        }
    }

    #[test]
    fn env_override_replaces_db_path() {
        let tmp = config_with("path = \"\"", "path = \"from-file.db\"");
        let mut config = load_config_from(tmp.path()).unwrap();

        apply_env_overrides(&mut config, |_| None);
        assert_eq!(config.db_path().unwrap(), PathBuf::from("from-file.db"));

        apply_env_overrides(&mut config, |key| {
            (key == DB_PATH_ENV).then(|| "/tmp/override.db".to_string())
        });
        assert_eq!(config.db_path().unwrap(), PathBuf::from("/tmp/override.db"));
    }

    #[test]
    fn blank_env_override_is_ignored() {
        let tmp = config_with("path = \"\"", "path = \"kept.db\"");
        let mut config = load_config_from(tmp.path()).unwrap();
        apply_env_overrides(&mut config, |_| Some("  ".into()));
        assert_eq!(config.database.path, "kept.db");
    }

    #[test]
    fn ensure_config_files_copies_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults_dir = tmp.path().join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::copy(
            project_root().join("defaults/engine.toml"),
            defaults_dir.join("engine.toml"),
        )
        .unwrap();
        fs::write(defaults_dir.join("engine.toml.example"), "# example\n").unwrap();

        let copied = ensure_config_files(tmp.path()).expect("should succeed");
        assert_eq!(copied.len(), 1);
        assert!(tmp.path().join("config/engine.toml").exists());
        assert!(!tmp.path().join("config/engine.toml.example").exists());
    }

    #[test]
    fn ensure_config_files_skips_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let defaults_dir = tmp.path().join("defaults");
        let config_dir = tmp.path().join("config");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::create_dir_all(&config_dir).unwrap();
        fs::copy(
            project_root().join("defaults/engine.toml"),
            defaults_dir.join("engine.toml"),
        )
        .unwrap();
        fs::write(config_dir.join("engine.toml"), "# custom\n").unwrap();

        let copied = ensure_config_files(tmp.path()).expect("should succeed");
        assert!(copied.is_empty());
        let content = fs::read_to_string(config_dir.join("engine.toml")).unwrap();
        assert_eq!(content, "# custom\n");
    }

    #[test]
    fn ensure_config_files_errors_when_both_dirs_missing() {
        let tmp = tempfile::tempdir().unwrap();
        match ensure_config_files(tmp.path()).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("neither defaults/ nor config/"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }
    }
}
