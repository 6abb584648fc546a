// SQLite persistence layer for players, match stats, teams, and leaderboards.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::{debug, warn};

use crate::model::{
    Booster, BoosterSelection, Category, FixtureId, GameWeek, GameWeekId, GameWeekStatus,
    LeaderboardEntry, Player, PlayerId, PlayerMatchStat, Position, StatKind, TeamId,
    UserFantasyTeam,
};
use crate::store::{FatigueWrite, RunSnapshot, ScoringStore};

/// A run claim older than this is assumed to belong to a crashed process
/// and may be taken over.
const STALE_CLAIM_MINUTES: i64 = 60;

/// SQLite-backed record store. Implements [`ScoringStore`] for the scoring
/// job and carries the seeding operations used by import tooling and tests.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS players (
                id        INTEGER PRIMARY KEY,
                name      TEXT NOT NULL,
                position  TEXT NOT NULL,
                category  TEXT NOT NULL,
                birthdate TEXT NOT NULL,
                fatigue   INTEGER NOT NULL DEFAULT 100 CHECK (fatigue BETWEEN 0 AND 100)
            );

            CREATE TABLE IF NOT EXISTS player_match_stats (
                player_id          INTEGER NOT NULL,
                fixture_id         INTEGER NOT NULL,
                match_date         TEXT NOT NULL,
                minutes_played     INTEGER NOT NULL DEFAULT 0,
                clean_sheet        INTEGER NOT NULL DEFAULT 0,
                goals              INTEGER NOT NULL DEFAULT 0,
                assists            INTEGER NOT NULL DEFAULT 0,
                shots_on_target    INTEGER NOT NULL DEFAULT 0,
                saves              INTEGER NOT NULL DEFAULT 0,
                penalties_scored   INTEGER NOT NULL DEFAULT 0,
                penalties_missed   INTEGER NOT NULL DEFAULT 0,
                penalties_saved    INTEGER NOT NULL DEFAULT 0,
                yellow_cards       INTEGER NOT NULL DEFAULT 0,
                red_cards          INTEGER NOT NULL DEFAULT 0,
                goals_conceded     INTEGER NOT NULL DEFAULT 0,
                interceptions      INTEGER NOT NULL DEFAULT 0,
                tackles            INTEGER NOT NULL DEFAULT 0,
                duels_won          INTEGER NOT NULL DEFAULT 0,
                duels_lost         INTEGER NOT NULL DEFAULT 0,
                dribbles_succeeded INTEGER NOT NULL DEFAULT 0,
                fouls_committed    INTEGER NOT NULL DEFAULT 0,
                fouls_suffered     INTEGER NOT NULL DEFAULT 0,
                rating             REAL NOT NULL DEFAULT 0,
                PRIMARY KEY (player_id, fixture_id)
            );

            CREATE TABLE IF NOT EXISTS gameweeks (
                id         INTEGER PRIMARY KEY,
                name       TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date   TEXT NOT NULL,
                status     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fantasy_teams (
                id             INTEGER PRIMARY KEY,
                user_id        TEXT NOT NULL,
                display_name   TEXT NOT NULL,
                gameweek_id    INTEGER NOT NULL,
                captain_id     INTEGER NOT NULL,
                booster_used   TEXT,
                booster_target INTEGER,
                total_points   REAL NOT NULL DEFAULT 0,
                created_at     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fantasy_team_players (
                team_id   INTEGER NOT NULL REFERENCES fantasy_teams(id) ON DELETE CASCADE,
                player_id INTEGER NOT NULL REFERENCES players(id),
                role      TEXT NOT NULL CHECK (role IN ('starter', 'substitute')),
                slot      INTEGER NOT NULL,
                PRIMARY KEY (team_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS leaderboard_entries (
                gameweek_id  INTEGER NOT NULL,
                team_id      INTEGER NOT NULL,
                user_id      TEXT NOT NULL,
                display_name TEXT NOT NULL,
                total_points REAL NOT NULL,
                rank         INTEGER NOT NULL,
                booster_used TEXT,
                PRIMARY KEY (gameweek_id, team_id)
            );

            CREATE TABLE IF NOT EXISTS scoring_fatigue_snapshots (
                gameweek_id    INTEGER NOT NULL,
                player_id      INTEGER NOT NULL,
                fatigue_before INTEGER NOT NULL,
                fatigue_after  INTEGER,
                PRIMARY KEY (gameweek_id, player_id)
            );

            CREATE TABLE IF NOT EXISTS scoring_booster_snapshots (
                gameweek_id    INTEGER NOT NULL,
                team_id        INTEGER NOT NULL,
                booster_used   TEXT,
                booster_target INTEGER,
                PRIMARY KEY (gameweek_id, team_id)
            );

            CREATE TABLE IF NOT EXISTS scoring_runs (
                gameweek_id INTEGER PRIMARY KEY,
                claimed_at  TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_stats_match_date ON player_match_stats(match_date);
             CREATE INDEX IF NOT EXISTS idx_teams_gameweek ON fantasy_teams(gameweek_id);",
        )
        .context("failed to create indexes")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Seeding (import tooling and tests)
    // ------------------------------------------------------------------

    /// Insert a player or overwrite the existing row with the same id.
    pub fn upsert_player(&self, player: &Player) -> Result<()> {
        let conn = self.conn();
        upsert_player_on(&conn, player)
    }

    /// Import players in a single transaction. Returns the number of rows
    /// written.
    pub fn import_players(&self, players: &[Player]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        for player in players {
            upsert_player_on(&tx, player)?;
        }
        tx.commit().context("failed to commit player import")?;
        Ok(players.len())
    }

    /// Load a single player by id.
    pub fn player(&self, id: PlayerId) -> Result<Option<Player>> {
        Ok(self.players_by_ids(&[id])?.into_iter().next())
    }

    /// Insert one stat record. A record with the same (player, fixture) key
    /// is replaced.
    pub fn insert_match_stat(&self, stat: &PlayerMatchStat) -> Result<()> {
        let conn = self.conn();
        insert_match_stat_on(&conn, stat)
    }

    /// Import stat records in a single transaction. Returns the number of
    /// rows written.
    pub fn import_match_stats(&self, stats: &[PlayerMatchStat]) -> Result<usize> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin import transaction")?;
        for stat in stats {
            insert_match_stat_on(&tx, stat)?;
        }
        tx.commit().context("failed to commit match stat import")?;
        Ok(stats.len())
    }

    pub fn upsert_gameweek(&self, gameweek: &GameWeek) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO gameweeks (id, name, start_date, end_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name       = excluded.name,
                start_date = excluded.start_date,
                end_date   = excluded.end_date,
                status     = excluded.status",
            params![
                gameweek.id,
                gameweek.name,
                fmt_ts(&gameweek.start_date),
                fmt_ts(&gameweek.end_date),
                gameweek.status,
            ],
        )
        .context("failed to upsert gameweek")?;
        Ok(())
    }

    /// Insert a team (or replace it wholesale, squad included) in one
    /// transaction.
    pub fn insert_team(&self, team: &UserFantasyTeam) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin team transaction")?;

        tx.execute(
            "INSERT OR REPLACE INTO fantasy_teams
                (id, user_id, display_name, gameweek_id, captain_id, booster_used, booster_target, total_points, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                team.id,
                team.user_id,
                team.display_name,
                team.gameweek_id,
                team.captain,
                team.booster_used,
                team.booster_target,
                team.total_points,
                fmt_ts(&team.created_at),
            ],
        )
        .with_context(|| format!("failed to insert team {}", team.id))?;

        tx.execute(
            "DELETE FROM fantasy_team_players WHERE team_id = ?1",
            params![team.id],
        )
        .context("failed to clear team squad")?;

        let squad = team
            .starters
            .iter()
            .enumerate()
            .map(|(slot, id)| (id, "starter", slot))
            .chain(
                team.substitutes
                    .iter()
                    .enumerate()
                    .map(|(slot, id)| (id, "substitute", slot)),
            );
        for (player_id, role, slot) in squad {
            tx.execute(
                "INSERT INTO fantasy_team_players (team_id, player_id, role, slot)
                 VALUES (?1, ?2, ?3, ?4)",
                params![team.id, player_id, role, slot as i64],
            )
            .with_context(|| format!("failed to add player {player_id} to team {}", team.id))?;
        }

        tx.commit().context("failed to commit team insert")?;
        Ok(())
    }

    /// Load a single team by id, squad included.
    pub fn team(&self, id: TeamId) -> Result<Option<UserFantasyTeam>> {
        let conn = self.conn();
        let mut teams = query_teams(&conn, "WHERE id = ?1", id.0)?;
        Ok(teams.pop())
    }
}

// ---------------------------------------------------------------------------
// ScoringStore implementation
// ---------------------------------------------------------------------------

impl ScoringStore for Database {
    fn try_claim_run(&self, gameweek: GameWeekId) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin run claim transaction")?;

        let now = Utc::now();
        let cutoff = now - chrono::Duration::minutes(STALE_CLAIM_MINUTES);
        let stale = tx
            .execute(
                "DELETE FROM scoring_runs WHERE gameweek_id = ?1 AND claimed_at < ?2",
                params![gameweek, fmt_ts(&cutoff)],
            )
            .context("failed to clear stale run claim")?;
        if stale > 0 {
            warn!("Taking over stale run claim for gameweek {}", gameweek);
        }

        let inserted = tx
            .execute(
                "INSERT OR IGNORE INTO scoring_runs (gameweek_id, claimed_at) VALUES (?1, ?2)",
                params![gameweek, fmt_ts(&now)],
            )
            .context("failed to record run claim")?;

        tx.commit().context("failed to commit run claim")?;
        Ok(inserted == 1)
    }

    fn release_run(&self, gameweek: GameWeekId) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "DELETE FROM scoring_runs WHERE gameweek_id = ?1",
            params![gameweek],
        )
        .with_context(|| format!("failed to release run claim for gameweek {gameweek}"))?;
        Ok(())
    }

    fn gameweek(&self, id: GameWeekId) -> Result<Option<GameWeek>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT id, name, start_date, end_date, status FROM gameweeks WHERE id = ?1")
            .context("failed to prepare gameweek query")?;

        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(GameWeek {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    start_date: ts_column(row, 2)?,
                    end_date: ts_column(row, 3)?,
                    status: row.get(4)?,
                })
            })
            .context("failed to query gameweek")?;

        match rows.next() {
            Some(row) => Ok(Some(row.context("failed to read gameweek row")?)),
            None => Ok(None),
        }
    }

    fn teams_for_gameweek(&self, id: GameWeekId) -> Result<Vec<UserFantasyTeam>> {
        let conn = self.conn();
        query_teams(&conn, "WHERE gameweek_id = ?1", id.0)
    }

    fn players_by_ids(&self, ids: &[PlayerId]) -> Result<Vec<Player>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = (1..=ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT id, name, position, category, birthdate, fatigue
             FROM players WHERE id IN ({placeholders}) ORDER BY id"
        );

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql).context("failed to prepare player query")?;
        let players = stmt
            .query_map(params_from_iter(ids), player_from_row)
            .context("failed to query players")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map player rows")?;
        Ok(players)
    }

    fn match_stats_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<PlayerMatchStat>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {} FROM player_match_stats
             WHERE match_date BETWEEN ?1 AND ?2
             ORDER BY player_id, fixture_id",
            stat_columns()
        );
        let mut stmt = conn
            .prepare(&sql)
            .context("failed to prepare match stats query")?;

        let stats = stmt
            .query_map(params![fmt_ts(&start), fmt_ts(&end)], stat_from_row)
            .context("failed to query match stats")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map match stat rows")?;
        Ok(stats)
    }

    fn load_run_snapshot(&self, gameweek: GameWeekId) -> Result<RunSnapshot> {
        let conn = self.conn();
        let mut snapshot = RunSnapshot::default();

        let mut stmt = conn
            .prepare(
                "SELECT player_id, fatigue_before FROM scoring_fatigue_snapshots
                 WHERE gameweek_id = ?1",
            )
            .context("failed to prepare fatigue snapshot query")?;
        let rows = stmt
            .query_map(params![gameweek], |row| {
                Ok((row.get::<_, PlayerId>(0)?, row.get::<_, u8>(1)?))
            })
            .context("failed to query fatigue snapshot")?;
        for row in rows {
            let (player, fatigue) = row.context("failed to read fatigue snapshot row")?;
            snapshot.fatigue.insert(player, fatigue);
        }

        let mut stmt = conn
            .prepare(
                "SELECT team_id, booster_used, booster_target FROM scoring_booster_snapshots
                 WHERE gameweek_id = ?1",
            )
            .context("failed to prepare booster snapshot query")?;
        let rows = stmt
            .query_map(params![gameweek], |row| {
                Ok((
                    row.get::<_, TeamId>(0)?,
                    BoosterSelection {
                        booster: row.get(1)?,
                        target: row.get(2)?,
                    },
                ))
            })
            .context("failed to query booster snapshot")?;
        for row in rows {
            let (team, selection) = row.context("failed to read booster snapshot row")?;
            snapshot.boosters.insert(team, selection);
        }

        Ok(snapshot)
    }

    fn save_run_snapshot(&self, gameweek: GameWeekId, snapshot: &RunSnapshot) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin snapshot transaction")?;

        for (player, fatigue) in &snapshot.fatigue {
            tx.execute(
                "INSERT OR IGNORE INTO scoring_fatigue_snapshots (gameweek_id, player_id, fatigue_before)
                 VALUES (?1, ?2, ?3)",
                params![gameweek, player, fatigue],
            )
            .context("failed to record fatigue snapshot")?;
        }
        for (team, selection) in &snapshot.boosters {
            tx.execute(
                "INSERT OR IGNORE INTO scoring_booster_snapshots (gameweek_id, team_id, booster_used, booster_target)
                 VALUES (?1, ?2, ?3, ?4)",
                params![gameweek, team, selection.booster, selection.target],
            )
            .context("failed to record booster snapshot")?;
        }

        tx.commit().context("failed to commit run snapshot")?;
        debug!(
            "Recorded run snapshot for gameweek {}: {} players, {} teams",
            gameweek,
            snapshot.fatigue.len(),
            snapshot.boosters.len()
        );
        Ok(())
    }

    fn save_team_result(&self, team: TeamId, total_points: f64) -> Result<()> {
        let conn = self.conn();
        let updated = conn
            .execute(
                "UPDATE fantasy_teams
                 SET total_points = ?1, booster_used = NULL, booster_target = NULL
                 WHERE id = ?2",
                params![total_points, team],
            )
            .with_context(|| format!("failed to save result for team {team}"))?;
        if updated == 0 {
            bail!("team {team} does not exist");
        }
        Ok(())
    }

    fn apply_player_fatigue(
        &self,
        gameweek: GameWeekId,
        player: PlayerId,
        before: u8,
        after: u8,
    ) -> Result<FatigueWrite> {
        let mut conn = self.conn();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to begin fatigue transaction")?;

        let written: Option<u8> = tx
            .query_row(
                "SELECT fatigue_after FROM scoring_fatigue_snapshots
                 WHERE gameweek_id = ?1 AND player_id = ?2",
                params![gameweek, player],
                |row| row.get::<_, Option<u8>>(0),
            )
            .optional()
            .with_context(|| format!("failed to read fatigue snapshot for player {player}"))?
            .flatten();
        if written.is_some() {
            return Ok(FatigueWrite::AlreadyApplied);
        }

        let current: u8 = tx
            .query_row(
                "SELECT fatigue FROM players WHERE id = ?1",
                params![player],
                |row| row.get::<_, u8>(0),
            )
            .optional()
            .with_context(|| format!("failed to read fatigue for player {player}"))?
            .with_context(|| format!("player {player} does not exist"))?;
        if current != before {
            return Ok(FatigueWrite::Superseded { current });
        }

        tx.execute(
            "UPDATE players SET fatigue = ?1 WHERE id = ?2",
            params![after, player],
        )
        .with_context(|| format!("failed to save fatigue for player {player}"))?;
        tx.execute(
            "INSERT INTO scoring_fatigue_snapshots (gameweek_id, player_id, fatigue_before, fatigue_after)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(gameweek_id, player_id) DO UPDATE SET fatigue_after = excluded.fatigue_after",
            params![gameweek, player, before, after],
        )
        .with_context(|| format!("failed to record fatigue result for player {player}"))?;

        tx.commit().context("failed to commit fatigue update")?;
        Ok(FatigueWrite::Applied)
    }

    fn replace_leaderboard(
        &self,
        gameweek: GameWeekId,
        entries: &[LeaderboardEntry],
    ) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin leaderboard transaction")?;

        tx.execute(
            "DELETE FROM leaderboard_entries WHERE gameweek_id = ?1",
            params![gameweek],
        )
        .context("failed to clear previous leaderboard")?;

        for entry in entries {
            tx.execute(
                "INSERT INTO leaderboard_entries
                    (gameweek_id, team_id, user_id, display_name, total_points, rank, booster_used)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    gameweek,
                    entry.team_id,
                    entry.user_id,
                    entry.display_name,
                    entry.total_points,
                    entry.rank,
                    entry.booster_used,
                ],
            )
            .with_context(|| format!("failed to insert leaderboard row for team {}", entry.team_id))?;
        }

        tx.commit().context("failed to commit leaderboard")?;
        debug!("Replaced leaderboard for gameweek {} with {} entries", gameweek, entries.len());
        Ok(())
    }

    fn load_leaderboard(&self, gameweek: GameWeekId) -> Result<Vec<LeaderboardEntry>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT gameweek_id, team_id, user_id, display_name, total_points, rank, booster_used
                 FROM leaderboard_entries WHERE gameweek_id = ?1 ORDER BY rank",
            )
            .context("failed to prepare leaderboard query")?;

        let entries = stmt
            .query_map(params![gameweek], |row| {
                Ok(LeaderboardEntry {
                    gameweek_id: row.get(0)?,
                    team_id: row.get(1)?,
                    user_id: row.get(2)?,
                    display_name: row.get(3)?,
                    total_points: row.get(4)?,
                    rank: row.get(5)?,
                    booster_used: row.get(6)?,
                })
            })
            .context("failed to query leaderboard")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map leaderboard rows")?;
        Ok(entries)
    }
}

// ---------------------------------------------------------------------------
// Row helpers
// ---------------------------------------------------------------------------

/// Timestamps are stored as fixed-width RFC 3339 UTC text so that string
/// comparison in SQL matches chronological order.
fn fmt_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn ts_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn player_from_row(row: &Row<'_>) -> rusqlite::Result<Player> {
    Ok(Player {
        id: row.get(0)?,
        name: row.get(1)?,
        position: row.get(2)?,
        category: row.get(3)?,
        birthdate: date_column(row, 4)?,
        fatigue: row.get(5)?,
    })
}

fn upsert_player_on(conn: &Connection, player: &Player) -> Result<()> {
    conn.execute(
        "INSERT INTO players (id, name, position, category, birthdate, fatigue)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(id) DO UPDATE SET
            name      = excluded.name,
            position  = excluded.position,
            category  = excluded.category,
            birthdate = excluded.birthdate,
            fatigue   = excluded.fatigue",
        params![
            player.id,
            player.name,
            player.position,
            player.category,
            player.birthdate.format("%Y-%m-%d").to_string(),
            player.fatigue,
        ],
    )
    .with_context(|| format!("failed to upsert player {}", player.id))?;
    Ok(())
}

/// Column list shared by stat inserts and selects: identity columns, the
/// counted actions in `StatKind::ALL` order, then the rating.
fn stat_columns() -> String {
    let mut columns = vec!["player_id", "fixture_id", "match_date", "minutes_played", "clean_sheet"];
    columns.extend(StatKind::ALL.iter().map(|k| k.column()));
    columns.push("rating");
    columns.join(", ")
}

/// Index of the first counted action in `stat_columns()`.
const STAT_ACTIONS_OFFSET: usize = 5;

fn stat_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerMatchStat> {
    let mut stat = PlayerMatchStat {
        player_id: row.get(0)?,
        fixture_id: row.get(1)?,
        match_date: ts_column(row, 2)?,
        minutes_played: row.get(3)?,
        clean_sheet: row.get(4)?,
        rating: row.get(STAT_ACTIONS_OFFSET + StatKind::ALL.len())?,
        ..Default::default()
    };
    for (i, kind) in StatKind::ALL.into_iter().enumerate() {
        *stat.value_mut(kind) = row.get(STAT_ACTIONS_OFFSET + i)?;
    }
    Ok(stat)
}

fn insert_match_stat_on(conn: &Connection, stat: &PlayerMatchStat) -> Result<()> {
    let column_count = STAT_ACTIONS_OFFSET + StatKind::ALL.len() + 1;
    let placeholders = (1..=column_count)
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT OR REPLACE INTO player_match_stats ({}) VALUES ({placeholders})",
        stat_columns()
    );

    let mut values: Vec<Value> = vec![
        Value::Integer(stat.player_id.0),
        Value::Integer(stat.fixture_id.0),
        Value::Text(fmt_ts(&stat.match_date)),
        Value::Integer(i64::from(stat.minutes_played)),
        Value::Integer(i64::from(stat.clean_sheet)),
    ];
    values.extend(
        StatKind::ALL
            .into_iter()
            .map(|kind| Value::Integer(i64::from(stat.value(kind)))),
    );
    values.push(Value::Real(stat.rating));

    conn.execute(&sql, params_from_iter(values))
        .with_context(|| {
            format!(
                "failed to insert stats for player {} fixture {}",
                stat.player_id, stat.fixture_id
            )
        })?;
    Ok(())
}

/// Load teams matching `filter` (a WHERE clause with a single `?1`
/// parameter) together with their squads.
fn query_teams(conn: &Connection, filter: &str, arg: i64) -> Result<Vec<UserFantasyTeam>> {
    let sql = format!(
        "SELECT id, user_id, display_name, gameweek_id, captain_id, booster_used, booster_target, total_points, created_at
         FROM fantasy_teams {filter} ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql).context("failed to prepare team query")?;
    let mut teams = stmt
        .query_map(params![arg], |row| {
            Ok(UserFantasyTeam {
                id: row.get(0)?,
                user_id: row.get(1)?,
                display_name: row.get(2)?,
                gameweek_id: row.get(3)?,
                captain: row.get(4)?,
                booster_used: row.get(5)?,
                booster_target: row.get(6)?,
                total_points: row.get(7)?,
                created_at: ts_column(row, 8)?,
                starters: Vec::new(),
                substitutes: Vec::new(),
            })
        })
        .context("failed to query teams")?
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to map team rows")?;

    let index: HashMap<TeamId, usize> = teams.iter().enumerate().map(|(i, t)| (t.id, i)).collect();

    let squad_sql = format!(
        "SELECT team_id, player_id, role FROM fantasy_team_players
         WHERE team_id IN (SELECT id FROM fantasy_teams {filter})
         ORDER BY team_id, slot"
    );
    let mut stmt = conn
        .prepare(&squad_sql)
        .context("failed to prepare squad query")?;
    let rows = stmt
        .query_map(params![arg], |row| {
            Ok((
                row.get::<_, TeamId>(0)?,
                row.get::<_, PlayerId>(1)?,
                row.get::<_, String>(2)?,
            ))
        })
        .context("failed to query squads")?;

    for row in rows {
        let (team_id, player_id, role) = row.context("failed to read squad row")?;
        let Some(&i) = index.get(&team_id) else {
            continue;
        };
        match role.as_str() {
            "starter" => teams[i].starters.push(player_id),
            _ => teams[i].substitutes.push(player_id),
        }
    }

    Ok(teams)
}

// ---------------------------------------------------------------------------
// Column conversions for domain types
// ---------------------------------------------------------------------------

macro_rules! id_sql {
    ($($ty:ident),*) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($ty)
            }
        }
    )*};
}

id_sql!(PlayerId, FixtureId, GameWeekId, TeamId);

macro_rules! enum_sql {
    ($($ty:ident => $parse:expr),*) => {$(
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.display_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                ($parse)(text).ok_or_else(|| {
                    FromSqlError::Other(format!("unknown {} value '{text}'", stringify!($ty)).into())
                })
            }
        }
    )*};
}

enum_sql!(
    Position => Position::from_str_pos,
    Category => Category::from_str_category,
    Booster => Booster::from_str_booster,
    GameWeekStatus => GameWeekStatus::from_str_status
);
