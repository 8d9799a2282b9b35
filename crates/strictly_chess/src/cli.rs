//! Command-line interface for strictly_chess.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Chess - clocked chess against a bot or across the table
#[derive(Parser, Debug)]
#[command(name = "strictly_chess")]
#[command(about = "Clocked chess in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Arena configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new game
    Play {
        /// Bot opponent (roster id or name); defaults to the configured bot
        #[arg(short, long, conflicts_with = "hot_seat")]
        bot: Option<String>,

        /// Both sides play at this terminal
        #[arg(long)]
        hot_seat: bool,

        /// Base time per side in minutes
        #[arg(short, long)]
        minutes: Option<u32>,

        /// Seconds added after each move
        #[arg(short, long)]
        increment: Option<u32>,

        /// Save the game to this file after every move
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Resume a saved game
    Resume {
        /// Saved game file
        file: PathBuf,
    },

    /// List the bot opponents
    Bots,
}
