// Record loaders for operator tooling.
//
// Players and match stats come as CSV exports in the engine's own shapes;
// teams and the gameweek calendar come as JSON arrays. Provider-specific
// formats are not handled here.

use chrono::{DateTime, NaiveDate, Utc};
use fantascore_core::model::{
    Category, FixtureId, GameWeek, Player, PlayerId, PlayerMatchStat, Position, UserFantasyTeam,
};
use fantascore_engine::fatigue::MAX_FATIGUE;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw CSV serde structs (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: i64,
    name: String,
    position: String,
    category: String,
    birthdate: NaiveDate,
    #[serde(default = "full_fatigue")]
    fatigue: u32,
}

fn full_fatigue() -> u32 {
    u32::from(MAX_FATIGUE)
}

/// Counters missing from the export default to zero. Extra columns are
/// ignored.
#[derive(Debug, Deserialize)]
struct RawMatchStat {
    player_id: i64,
    fixture_id: i64,
    match_date: DateTime<Utc>,
    minutes_played: u32,
    #[serde(default)]
    clean_sheet: bool,
    #[serde(default)]
    goals: u32,
    #[serde(default)]
    assists: u32,
    #[serde(default)]
    shots_on_target: u32,
    #[serde(default)]
    saves: u32,
    #[serde(default)]
    penalties_scored: u32,
    #[serde(default)]
    penalties_missed: u32,
    #[serde(default)]
    penalties_saved: u32,
    #[serde(default)]
    yellow_cards: u32,
    #[serde(default)]
    red_cards: u32,
    #[serde(default)]
    goals_conceded: u32,
    #[serde(default)]
    interceptions: u32,
    #[serde(default)]
    tackles: u32,
    #[serde(default)]
    duels_won: u32,
    #[serde(default)]
    duels_lost: u32,
    #[serde(default)]
    dribbles_succeeded: u32,
    #[serde(default)]
    fouls_committed: u32,
    #[serde(default)]
    fouls_suffered: u32,
    #[serde(default)]
    rating: f64,
}

impl From<RawMatchStat> for PlayerMatchStat {
    fn from(raw: RawMatchStat) -> Self {
        PlayerMatchStat {
            player_id: PlayerId(raw.player_id),
            fixture_id: FixtureId(raw.fixture_id),
            match_date: raw.match_date,
            minutes_played: raw.minutes_played,
            clean_sheet: raw.clean_sheet,
            goals: raw.goals,
            assists: raw.assists,
            shots_on_target: raw.shots_on_target,
            saves: raw.saves,
            penalties_scored: raw.penalties_scored,
            penalties_missed: raw.penalties_missed,
            penalties_saved: raw.penalties_saved,
            yellow_cards: raw.yellow_cards,
            red_cards: raw.red_cards,
            goals_conceded: raw.goals_conceded,
            interceptions: raw.interceptions,
            tackles: raw.tackles,
            duels_won: raw.duels_won,
            duels_lost: raw.duels_lost,
            dribbles_succeeded: raw.dribbles_succeeded,
            fouls_committed: raw.fouls_committed,
            fouls_suffered: raw.fouls_suffered,
            rating: raw.rating,
        }
    }
}

// ---------------------------------------------------------------------------
// Reader-based loaders (private, enable testing without temp files)
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<Vec<Player>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut players = Vec::new();
    for result in reader.deserialize::<RawPlayer>() {
        match result {
            Ok(raw) => {
                let name = raw.name.trim().to_string();
                let Some(position) = Position::from_str_pos(&raw.position) else {
                    warn!("skipping player '{}': unknown position '{}'", name, raw.position);
                    continue;
                };
                let Some(category) = Category::from_str_category(&raw.category) else {
                    warn!("skipping player '{}': unknown category '{}'", name, raw.category);
                    continue;
                };
                if raw.fatigue > u32::from(MAX_FATIGUE) {
                    warn!("skipping player '{}': fatigue {} out of range", name, raw.fatigue);
                    continue;
                }
                players.push(Player {
                    id: PlayerId(raw.id),
                    name,
                    position,
                    category,
                    birthdate: raw.birthdate,
                    fatigue: raw.fatigue as u8,
                });
            }
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
            }
        }
    }
    Ok(players)
}

fn load_match_stats_from_reader<R: Read>(rdr: R) -> Result<Vec<PlayerMatchStat>, csv::Error> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut stats = Vec::new();
    for result in reader.deserialize::<RawMatchStat>() {
        match result {
            Ok(raw) => {
                if !raw.rating.is_finite() {
                    warn!(
                        "skipping stat for player {} fixture {}: non-finite rating",
                        raw.player_id, raw.fixture_id
                    );
                    continue;
                }
                stats.push(raw.into());
            }
            Err(e) => {
                warn!("skipping malformed stat row: {}", e);
            }
        }
    }
    Ok(stats)
}

fn load_json_from_reader<T: DeserializeOwned, R: Read>(rdr: R) -> Result<Vec<T>, serde_json::Error> {
    serde_json::from_reader(rdr)
}

// ---------------------------------------------------------------------------
// Public file loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, ImportError> {
    std::fs::File::open(path).map_err(|e| ImportError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_players(path: &Path) -> Result<Vec<Player>, ImportError> {
    load_players_from_reader(open(path)?).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

pub fn load_match_stats(path: &Path) -> Result<Vec<PlayerMatchStat>, ImportError> {
    load_match_stats_from_reader(open(path)?).map_err(|e| ImportError::Csv {
        path: path.display().to_string(),
        source: e,
    })
}

/// Teams from a JSON array. Every team must name its captain among its
/// starters.
pub fn load_teams(path: &Path) -> Result<Vec<UserFantasyTeam>, ImportError> {
    let teams: Vec<UserFantasyTeam> =
        load_json_from_reader(open(path)?).map_err(|e| ImportError::Json {
            path: path.display().to_string(),
            source: e,
        })?;
    for team in &teams {
        if !team.is_starter(team.captain) {
            return Err(ImportError::Validation(format!(
                "team {}: captain {} is not a starter",
                team.id, team.captain
            )));
        }
    }
    Ok(teams)
}

/// Gameweeks from a JSON array. Windows must not end before they start.
pub fn load_gameweeks(path: &Path) -> Result<Vec<GameWeek>, ImportError> {
    let gameweeks: Vec<GameWeek> =
        load_json_from_reader(open(path)?).map_err(|e| ImportError::Json {
            path: path.display().to_string(),
            source: e,
        })?;
    for gw in &gameweeks {
        if gw.end_date < gw.start_date {
            return Err(ImportError::Validation(format!(
                "gameweek {}: end_date is before start_date",
                gw.id
            )));
        }
    }
    Ok(gameweeks)
}
