//! Saved games: resume an interrupted game from a JSON file.
//!
//! A save holds the move list rather than a position, so restoring goes
//! through the rules engine move by move and the move sheet, history and
//! repetition counts come back exactly as they were.

use crate::arbiter::GameMode;
use crate::config::TimeControl;
use crate::games::chess::MoveRejection;
use crate::session::GameSession;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

/// An interrupted game.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct SavedGame {
    /// How the sides were seated.
    mode: GameMode,
    /// Time control of the game.
    time_control: TimeControl,
    /// Moves played so far, in UCI notation.
    moves: Vec<String>,
    /// White's clock at save time.
    white_remaining: u32,
    /// Black's clock at save time.
    black_remaining: u32,
    /// When the save was written.
    saved_at: DateTime<Utc>,
}

impl SavedGame {
    /// Captures the live state of a session.
    #[instrument(skip(session), fields(session_id = %session.id()))]
    pub fn capture(session: &GameSession) -> Self {
        Self {
            mode: session.mode().clone(),
            time_control: *session.time_control(),
            moves: session
                .rules()
                .moves()
                .iter()
                .map(|m| m.uci().to_string())
                .collect(),
            white_remaining: session.clock().white_remaining(),
            black_remaining: session.clock().black_remaining(),
            saved_at: Utc::now(),
        }
    }

    /// Writes the save as pretty JSON.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display(), plies = self.moves.len()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PersistenceError::new(format!("Failed to encode saved game: {}", e)))?;
        std::fs::write(path.as_ref(), json)
            .map_err(|e| PersistenceError::new(format!("Failed to write saved game: {}", e)))?;
        debug!("Game saved");
        Ok(())
    }

    /// Reads a save file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let json = std::fs::read_to_string(path.as_ref())
            .map_err(|e| PersistenceError::new(format!("Failed to read saved game: {}", e)))?;
        let saved: Self = serde_json::from_str(&json)
            .map_err(|e| PersistenceError::new(format!("Failed to decode saved game: {}", e)))?;
        info!(plies = saved.moves.len(), saved_at = %saved.saved_at, "Saved game loaded");
        Ok(saved)
    }

    /// Deletes a save file. A missing file is not an error.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn remove(path: impl AsRef<Path>) -> Result<(), PersistenceError> {
        match std::fs::remove_file(path.as_ref()) {
            Ok(()) => {
                info!("Saved game removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PersistenceError::new(format!(
                "Failed to remove saved game: {}",
                e
            ))),
        }
    }

    /// Rebuilds the session by replaying the moves.
    #[instrument(skip(self, id))]
    pub fn into_session(self, id: impl Into<String>) -> Result<GameSession, PersistenceError> {
        GameSession::restore(
            id,
            self.mode,
            self.time_control,
            &self.moves,
            self.white_remaining,
            self.black_remaining,
        )
        .map_err(PersistenceError::from)
    }
}

/// Saved game could not be written, read or replayed.
#[derive(Debug, Clone, Display, Error)]
#[display("Persistence error: {} at {}:{}", message, file, line)]
pub struct PersistenceError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl PersistenceError {
    /// Creates a new persistence error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<MoveRejection> for PersistenceError {
    #[track_caller]
    fn from(err: MoveRejection) -> Self {
        Self::new(format!("Saved moves do not replay: {}", err))
    }
}
