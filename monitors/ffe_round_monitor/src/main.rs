use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{error, info};

use ffe_round_monitor::config::MonitorConfig;
use ffe_round_monitor::fetch::PageFetcher;
use ffe_round_monitor::monitor::RoundMonitor;
use ffe_round_monitor::notify::LogNotifier;
use ffe_round_monitor::page_parser::parse_round_page;
use ffe_round_monitor::prefs::PrefsStore;
use ffe_round_monitor::store::{self, GameStore};
use ffe_round_monitor::web::{self, AppState};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Poll a tournament round and notify when watched players finish
    Watch {
        /// Tournament id (falls back to the last-used one)
        #[arg(short, long)]
        tournament: Option<u32>,
        /// Round number (falls back to the last-used one)
        #[arg(short, long)]
        round: Option<u32>,
        /// Poll interval in seconds (overrides config)
        #[arg(short, long)]
        interval: Option<u64>,
    },
    /// Run a single fetch cycle and print the snapshot as JSON
    Once {
        #[arg(short, long)]
        tournament: Option<u32>,
        #[arg(short, long)]
        round: Option<u32>,
    },
    /// Parse a saved results page and print the extracted games
    ParseFile {
        /// Path to the HTML file to parse
        #[arg(short, long)]
        file: String,
        #[arg(short, long, default_value_t = 0)]
        tournament: u32,
        #[arg(short, long, default_value_t = 0)]
        round: u32,
    },
    /// Manage the watched player list
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },
}

#[derive(Debug, Subcommand)]
enum WatchlistAction {
    /// Add a player name (exact match against the results page)
    Add { name: String },
    /// Remove a player name
    Remove { name: String },
    /// Print the current list
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = MonitorConfig::from_env();

    match cli.command {
        Commands::Watch {
            tournament,
            round,
            interval,
        } => {
            let pool = store::connect(&config.storage.database_url).await?;
            let game_store = GameStore::new(pool.clone());
            let prefs = PrefsStore::new(pool);

            let (tournament, round) = resolve_target(&prefs, tournament, round).await?;
            prefs.save_last_target(tournament, round).await?;

            let monitor = RoundMonitor::new(
                PageFetcher::new(&config)?,
                game_store,
                prefs,
                Arc::new(LogNotifier),
            );

            let state = AppState::default();
            web::serve(state.clone(), config.monitoring.status_port).await?;

            let interval_secs = interval.unwrap_or(config.monitoring.poll_interval_secs);
            info!(
                "monitoring tournament {} round {} every {}s",
                tournament, round, interval_secs
            );

            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            let shutdown = tokio::signal::ctrl_c();
            tokio::pin!(shutdown);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match monitor.run_cycle(tournament, round).await {
                            Ok(Some(report)) => state.publish(report.snapshot),
                            Ok(None) => {}
                            Err(e) => {
                                error!("cycle failed: {}", e);
                                state.record_failure(&e);
                            }
                        }
                    }
                    _ = &mut shutdown => {
                        info!("stopping monitor");
                        break;
                    }
                }
            }
        }
        Commands::Once { tournament, round } => {
            let pool = store::connect(&config.storage.database_url).await?;
            let game_store = GameStore::new(pool.clone());
            let prefs = PrefsStore::new(pool);

            let (tournament, round) = resolve_target(&prefs, tournament, round).await?;
            prefs.save_last_target(tournament, round).await?;

            let monitor = RoundMonitor::new(
                PageFetcher::new(&config)?,
                game_store,
                prefs,
                Arc::new(LogNotifier),
            );

            if let Some(report) = monitor.run_cycle(tournament, round).await? {
                println!("{}", serde_json::to_string_pretty(&report.snapshot)?);
            }
        }
        Commands::ParseFile {
            file,
            tournament,
            round,
        } => {
            let html = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file))?;
            let page = parse_round_page(&html, tournament, round, chrono::Utc::now());
            info!(
                "parsed {}: {} games, {} players",
                file,
                page.games.len(),
                page.players.len()
            );
            println!("{}", serde_json::to_string_pretty(&page.games)?);
        }
        Commands::Watchlist { action } => {
            let pool = store::connect(&config.storage.database_url).await?;
            let prefs = PrefsStore::new(pool);
            match action {
                WatchlistAction::Add { name } => {
                    prefs.add_to_watch_list(&name).await?;
                    println!("watching {}", name);
                }
                WatchlistAction::Remove { name } => {
                    prefs.remove_from_watch_list(&name).await?;
                    println!("no longer watching {}", name);
                }
                WatchlistAction::List => {
                    let mut names: Vec<String> = prefs.watch_list().await?.into_iter().collect();
                    names.sort();
                    for name in names {
                        println!("{}", name);
                    }
                }
            }
        }
    }

    Ok(())
}

async fn resolve_target(
    prefs: &PrefsStore,
    tournament: Option<u32>,
    round: Option<u32>,
) -> Result<(u32, u32)> {
    let tournament = match tournament {
        Some(id) => id,
        None => match prefs.last_tournament_id().await? {
            Some(id) => id,
            None => bail!("no tournament id given and none saved from a previous run"),
        },
    };
    let round = match round {
        Some(r) => r,
        None => match prefs.last_round().await? {
            Some(r) => r,
            None => bail!("no round given and none saved from a previous run"),
        },
    };
    Ok((tournament, round))
}
