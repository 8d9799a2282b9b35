//! Terminal states of a game.

use super::types::Side;
use serde::{Deserialize, Serialize};

/// Why a game was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    /// Side to move has no legal move and is not in check.
    #[strum(serialize = "stalemate")]
    Stalemate,
    /// Neither side can deliver mate.
    #[strum(serialize = "insufficient material")]
    InsufficientMaterial,
    /// Fifty moves by each side without a capture or pawn move.
    #[strum(serialize = "fifty-move rule")]
    FiftyMoves,
    /// Same position three times with the same side to move.
    #[strum(serialize = "threefold repetition")]
    Repetition,
    /// Both players agreed.
    #[strum(serialize = "agreement")]
    Agreement,
}

/// Outcome of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    /// The loser was checkmated.
    Checkmate {
        /// Side that delivered mate.
        winner: Side,
    },
    /// A clock reached zero.
    Timeout {
        /// Side whose clock ran out.
        flagged: Side,
    },
    /// A player resigned.
    Resignation {
        /// Side that resigned.
        resigned: Side,
    },
    /// The game was drawn.
    Draw(DrawReason),
}

impl GameOutcome {
    /// Returns the winner if there is one.
    pub fn winner(&self) -> Option<Side> {
        match self {
            GameOutcome::Checkmate { winner } => Some(*winner),
            GameOutcome::Timeout { flagged } => Some(flagged.opponent()),
            GameOutcome::Resignation { resigned } => Some(resigned.opponent()),
            GameOutcome::Draw(_) => None,
        }
    }

    /// Returns true if the game was a draw.
    pub fn is_draw(&self) -> bool {
        matches!(self, GameOutcome::Draw(_))
    }

    /// PGN-style result string.
    pub fn result(&self) -> &'static str {
        match self.winner() {
            Some(Side::White) => "1-0",
            Some(Side::Black) => "0-1",
            None => "1/2-1/2",
        }
    }
}

impl std::fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameOutcome::Checkmate { winner } => write!(f, "{} wins by checkmate", winner),
            GameOutcome::Timeout { flagged } => {
                write!(f, "{} wins on time ({} flagged)", flagged.opponent(), flagged)
            }
            GameOutcome::Resignation { resigned } => {
                write!(f, "{} wins, {} resigned", resigned.opponent(), resigned)
            }
            GameOutcome::Draw(reason) => write!(f, "Draw by {}", reason),
        }
    }
}
