//! First-class move types.
//!
//! A [`MoveRequest`] is a player's intent (two clicks on the board, a typed
//! move, a remote update). An [`AnnotatedMove`] is a legal move in a given
//! position, annotated with everything the presentation layer and the bot
//! heuristic need to know about it; the move list is a list of these.

use super::types::{PieceKind, Side};
use shakmaty::Square;
use std::str::FromStr;
use tracing::instrument;

/// Who is asking for a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Actor {
    /// The participant at this board (clicks or typed moves).
    Local,
    /// The synthetic opponent.
    Bot,
    /// The opponent on the other end of an online game.
    Remote,
}

/// A requested move: origin, destination and an optional promotion choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRequest {
    /// Square the piece moves from.
    pub from: Square,
    /// Square the piece moves to.
    pub to: Square,
    /// Explicit promotion piece, if the caller offered one.
    pub promotion: Option<PieceKind>,
}

impl MoveRequest {
    /// Creates a request without an explicit promotion choice.
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// Sets an explicit promotion piece.
    pub fn with_promotion(mut self, promotion: PieceKind) -> Self {
        self.promotion = Some(promotion);
        self
    }
}

impl FromStr for MoveRequest {
    type Err = MoveRejection;

    /// Parses `e2e4`, `e7e8q` or `e2 e4`.
    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.split_whitespace().collect();
        if !(compact.len() == 4 || compact.len() == 5) || !compact.is_ascii() {
            return Err(MoveRejection::InvalidNotation(s.to_string()));
        }

        let from = compact[0..2]
            .parse::<Square>()
            .map_err(|_| MoveRejection::InvalidNotation(s.to_string()))?;
        let to = compact[2..4]
            .parse::<Square>()
            .map_err(|_| MoveRejection::InvalidNotation(s.to_string()))?;

        let promotion = match compact[4..].chars().next() {
            None => None,
            Some('q') => Some(PieceKind::Queen),
            Some('r') => Some(PieceKind::Rook),
            Some('b') => Some(PieceKind::Bishop),
            Some('n') => Some(PieceKind::Knight),
            Some(_) => return Err(MoveRejection::InvalidNotation(s.to_string())),
        };

        Ok(Self { from, to, promotion })
    }
}

impl std::fmt::Display for MoveRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

/// Feedback cue for an applied move, in priority order mate > check >
/// capture > plain move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum MoveFeedback {
    /// Quiet move.
    Move,
    /// A piece was taken.
    Capture,
    /// The opponent is in check.
    Check,
    /// The opponent is checkmated.
    Mate,
}

/// A legal move annotated with capture, promotion and check information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedMove {
    pub(crate) inner: shakmaty::Move,
    pub(crate) ply: usize,
    pub(crate) side: Side,
    pub(crate) piece: PieceKind,
    pub(crate) from: Square,
    pub(crate) to: Square,
    pub(crate) captured: Option<PieceKind>,
    pub(crate) promotion: Option<PieceKind>,
    pub(crate) is_check: bool,
    pub(crate) is_checkmate: bool,
    pub(crate) san: String,
    pub(crate) uci: String,
}

impl AnnotatedMove {
    /// Zero-based ply index in the move list.
    pub fn ply(&self) -> usize {
        self.ply
    }

    /// Side that made the move.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Kind of the moving piece.
    pub fn piece(&self) -> PieceKind {
        self.piece
    }

    /// Origin square (the king's square for castling).
    pub fn from(&self) -> Square {
        self.from
    }

    /// Destination square (the king's destination for castling).
    pub fn to(&self) -> Square {
        self.to
    }

    /// Kind of the captured piece, if any.
    pub fn captured(&self) -> Option<PieceKind> {
        self.captured
    }

    /// Promotion piece, if the move promoted.
    pub fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    /// True if the move promoted a pawn.
    pub fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// True if the move gives check (including mate).
    pub fn is_check(&self) -> bool {
        self.is_check
    }

    /// True if the move delivers checkmate.
    pub fn is_checkmate(&self) -> bool {
        self.is_checkmate
    }

    /// Standard algebraic notation with check suffix (`Nf3`, `exd5`, `Qh7#`).
    pub fn san(&self) -> &str {
        &self.san
    }

    /// UCI notation (`e2e4`, `e7e8q`, castling as `e1g1`).
    pub fn uci(&self) -> &str {
        &self.uci
    }

    /// Feedback cue for the presentation layer.
    pub fn feedback(&self) -> MoveFeedback {
        if self.is_checkmate {
            MoveFeedback::Mate
        } else if self.is_check {
            MoveFeedback::Check
        } else if self.captured.is_some() {
            MoveFeedback::Capture
        } else {
            MoveFeedback::Move
        }
    }
}

impl std::fmt::Display for AnnotatedMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.san)
    }
}

/// Why a move attempt was refused.
///
/// Every variant is recoverable: the session state is unchanged when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum MoveRejection {
    /// The game has already ended.
    #[display("Game is already over")]
    GameOver,

    /// A clock has reached zero.
    #[display("{} has run out of time", _0)]
    ClockFlagged(Side),

    /// The actor tried to move for the side that is not to move.
    #[display("It's not {}'s turn ({} to move)", seat, to_move)]
    OutOfTurn {
        /// Side the actor is seated at.
        seat: Side,
        /// Side actually to move.
        to_move: Side,
    },

    /// The actor has no seat in this game (e.g. a bot move in hot-seat play).
    #[display("The {} player has no seat in this game", _0)]
    NotSeated(Actor),

    /// The rules engine refused the move.
    #[display("Illegal move {}{}", from, to)]
    IllegalMove {
        /// Origin square.
        from: Square,
        /// Destination square.
        to: Square,
    },

    /// The move text could not be parsed.
    #[display("Cannot parse move '{}'", _0)]
    InvalidNotation(String),

    /// The board was showing an earlier position; it is back on the live
    /// one and the move was not played.
    #[display("Board was showing history, returned to the live position")]
    ViewingHistory,
}

impl std::error::Error for MoveRejection {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_and_spaced() {
        let compact: MoveRequest = "e2e4".parse().unwrap();
        let spaced: MoveRequest = "e2 e4".parse().unwrap();
        assert_eq!(compact, spaced);
        assert_eq!(compact.from, Square::E2);
        assert_eq!(compact.to, Square::E4);
        assert_eq!(compact.promotion, None);
    }

    #[test]
    fn test_parse_promotion_suffix() {
        let request: MoveRequest = "a7a8n".parse().unwrap();
        assert_eq!(request.promotion, Some(PieceKind::Knight));
        assert_eq!(request.to_string(), "a7a8n");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "e9e4".parse::<MoveRequest>(),
            Err(MoveRejection::InvalidNotation(_))
        ));
        assert!(matches!(
            "e2e4k".parse::<MoveRequest>(),
            Err(MoveRejection::InvalidNotation(_))
        ));
        assert!("resign".parse::<MoveRequest>().is_err());
    }

    #[test]
    fn test_rejection_messages() {
        let err = MoveRejection::OutOfTurn {
            seat: Side::Black,
            to_move: Side::White,
        };
        assert_eq!(err.to_string(), "It's not black's turn (white to move)");
        let err = MoveRejection::IllegalMove {
            from: Square::E2,
            to: Square::E5,
        };
        assert_eq!(err.to_string(), "Illegal move e2e5");
    }
}
