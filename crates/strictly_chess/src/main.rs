//! Strictly Chess - terminal client
//!
//! Play a clocked game against a roster bot or hot-seat, resume a saved
//! game, or list the bots.

#![warn(missing_docs)]

mod cli;
mod terminal;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use cli::{Cli, Command};
use std::path::PathBuf;
use strictly_chess::{ArenaConfig, BotProfile, GameMode, GameSession, SavedGame, TimeControl, roster};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so the board on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ArenaConfig::from_file(path)?,
        None => ArenaConfig::default(),
    };

    match cli.command {
        Command::Play {
            bot,
            hot_seat,
            minutes,
            increment,
            save,
        } => run_play(config, bot, hot_seat, minutes, increment, save).await,
        Command::Resume { file } => run_resume(config, file).await,
        Command::Bots => {
            list_bots();
            Ok(())
        }
    }
}

/// Start a new game
#[instrument(skip(config))]
async fn run_play(
    config: ArenaConfig,
    bot: Option<String>,
    hot_seat: bool,
    minutes: Option<u32>,
    increment: Option<u32>,
    save: Option<PathBuf>,
) -> Result<()> {
    let base = config.time_control();
    let time_control = TimeControl::new(
        minutes.unwrap_or(*base.minutes()),
        increment.unwrap_or(*base.increment_secs()),
    )?;

    let mode = if hot_seat {
        GameMode::HotSeat
    } else {
        let key = bot.unwrap_or_else(|| config.default_bot().clone());
        let profile = BotProfile::find(&key)
            .with_context(|| format!("Unknown bot '{}', see `strictly_chess bots`", key))?;
        GameMode::VersusBot { bot: profile }
    };

    info!(mode = %mode.label(), %time_control, "Starting new game");
    let session = GameSession::new(session_id(), mode, time_control);

    let mut options = config.session_options();
    if let Some(path) = save {
        options = options.autosave(path);
    }
    terminal::play(session, options).await
}

/// Resume a saved game
#[instrument(skip(config))]
async fn run_resume(config: ArenaConfig, file: PathBuf) -> Result<()> {
    let saved = SavedGame::load(&file)?;
    info!(saved_at = %saved.saved_at(), plies = saved.moves().len(), "Resuming game");
    let session = saved.into_session(session_id())?;
    let options = config.session_options().autosave(file);
    terminal::play(session, options).await
}

fn list_bots() {
    for bot in roster() {
        println!(
            "{:<16} {:<16} {:>5}  {}",
            bot.id(),
            bot.name(),
            bot.elo(),
            bot.description()
        );
    }
}

fn session_id() -> String {
    format!("local-{}", Utc::now().timestamp_millis())
}
