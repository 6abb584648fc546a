// Fantascore entry point.
//
// Startup sequence:
// 1. Parse the command line
// 2. Load config (copying defaults on first start)
// 3. Initialize tracing (log to file, not terminal)
// 4. Open the database
// 5. Run the requested command

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use fantascore_app::config;
use fantascore_app::import;
use fantascore_app::job::ScoringJob;
use fantascore_app::logging;
use fantascore_core::db::Database;
use fantascore_core::model::GameWeekId;
use fantascore_core::store::ScoringStore;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "fantascore")]
#[command(about = "Weekly fantasy scoring engine - score gameweeks, inspect leaderboards, import records")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one or more finished gameweeks and publish their leaderboards
    Process {
        /// Gameweek ids; distinct gameweeks run concurrently
        #[arg(required = true)]
        gameweeks: Vec<i64>,
    },

    /// Print the stored leaderboard of a gameweek
    Leaderboard {
        gameweek: i64,
    },

    /// Load records into the database
    Import {
        #[command(subcommand)]
        kind: ImportKind,
    },
}

#[derive(Subcommand)]
enum ImportKind {
    /// Players from CSV (id,name,position,category,birthdate[,fatigue])
    Players { path: PathBuf },
    /// Per-fixture match stats from CSV
    Stats { path: PathBuf },
    /// Drafted teams from a JSON array
    Teams { path: PathBuf },
    /// Gameweek calendar from a JSON array
    Gameweeks { path: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config().context("failed to load configuration")?;

    let log_path = logging::init_tracing(&config.logging)?;
    info!("Fantascore starting up, logging to {}", log_path.display());

    let db_path = config.db_path()?;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db = Database::open(&db_path.to_string_lossy()).context("failed to open database")?;
    info!("Database opened at {}", db_path.display());

    match cli.command {
        Commands::Process { gameweeks } => process(db, config.rules, gameweeks).await,
        Commands::Leaderboard { gameweek } => print_leaderboard(&db, GameWeekId(gameweek)),
        Commands::Import { kind } => run_import(&db, kind),
    }
}

async fn process(
    db: Database,
    rules: fantascore_engine::EngineRules,
    gameweeks: Vec<i64>,
) -> anyhow::Result<()> {
    let job = ScoringJob::new(Arc::new(db), rules);

    let mut seen = std::collections::BTreeSet::new();
    let handles: Vec<_> = gameweeks
        .into_iter()
        .filter(|gw| {
            let first = seen.insert(*gw);
            if !first {
                eprintln!("gameweek {gw}: listed more than once, running it once");
            }
            first
        })
        .map(|gw| {
            let job = job.clone();
            let id = GameWeekId(gw);
            (id, tokio::task::spawn_blocking(move || job.process(id)))
        })
        .collect();

    let mut failed = 0;
    for (id, handle) in handles {
        match handle.await {
            Ok(Ok(summary)) => {
                println!(
                    "gameweek {id}: {} teams, {} leaderboard entries, {} fatigue updates, {} failures",
                    summary.teams_processed,
                    summary.leaderboard_entries,
                    summary.fatigue_updates,
                    summary.failures
                );
                if summary.failures > 0 {
                    failed += 1;
                }
            }
            Ok(Err(e)) => {
                error!("Gameweek {} not scored: {}", id, e);
                eprintln!("gameweek {id}: {e}");
                failed += 1;
            }
            Err(e) => {
                error!("Scoring task for gameweek {} panicked: {}", id, e);
                eprintln!("gameweek {id}: scoring task failed: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} gameweek run(s) did not complete cleanly; re-run to retry");
    }
    Ok(())
}

fn print_leaderboard(db: &Database, gameweek: GameWeekId) -> anyhow::Result<()> {
    let entries = db
        .load_leaderboard(gameweek)
        .with_context(|| format!("failed to load leaderboard for gameweek {gameweek}"))?;
    if entries.is_empty() {
        println!("no leaderboard for gameweek {gameweek}");
        return Ok(());
    }

    println!("{:>4}  {:<24} {:<16} {:>8}  booster", "rank", "team", "user", "points");
    for e in &entries {
        println!(
            "{:>4}  {:<24} {:<16} {:>8.1}  {}",
            e.rank,
            e.display_name,
            e.user_id,
            e.total_points,
            e.booster_used.map(|b| b.display_str()).unwrap_or("-")
        );
    }
    Ok(())
}

fn run_import(db: &Database, kind: ImportKind) -> anyhow::Result<()> {
    match kind {
        ImportKind::Players { path } => {
            let players = import::load_players(&path)?;
            let n = db.import_players(&players)?;
            info!("Imported {} players from {}", n, path.display());
            println!("imported {n} players");
        }
        ImportKind::Stats { path } => {
            let stats = import::load_match_stats(&path)?;
            let n = db.import_match_stats(&stats)?;
            info!("Imported {} match stat records from {}", n, path.display());
            println!("imported {n} match stat records");
        }
        ImportKind::Teams { path } => {
            let teams = import::load_teams(&path)?;
            for team in &teams {
                db.insert_team(team)?;
            }
            info!("Imported {} teams from {}", teams.len(), path.display());
            println!("imported {} teams", teams.len());
        }
        ImportKind::Gameweeks { path } => {
            let gameweeks = import::load_gameweeks(&path)?;
            for gw in &gameweeks {
                db.upsert_gameweek(gw)?;
            }
            info!("Imported {} gameweeks from {}", gameweeks.len(), path.display());
            println!("imported {} gameweeks", gameweeks.len());
        }
    }
    Ok(())
}
