//! Rules engine adapter.
//!
//! [`RulesEngine`] owns the authoritative position and the move list. It is
//! a thin layer over `shakmaty`, which does all legality checking; this
//! module only translates between board clicks and engine moves, annotates
//! moves for display, and adds the draw bookkeeping `shakmaty` leaves to
//! the caller (fifty-move rule, threefold repetition).
//!
//! The only way to change the position is [`RulesEngine::apply_move`].

use super::action::{AnnotatedMove, MoveRejection, MoveRequest};
use super::outcome::{DrawReason, GameOutcome};
use super::types::{BoardSnapshot, PieceKind, Side};
use derive_more::{Display, Error};
use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::Uci;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Move, Position, Rank, Role, Square};
use tracing::{debug, instrument, warn};

/// Half-moves without capture or pawn move that end the game.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of one position that end the game.
const REPETITION_LIMIT: usize = 3;

/// Replaying a move prefix failed.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Replay failed at ply {}: {} is not legal", ply, uci)]
pub struct ReplayError {
    /// Ply that could not be replayed.
    pub ply: usize,
    /// The offending move in UCI notation.
    pub uci: String,
}

/// Authoritative game state: position plus the moves that produced it.
#[derive(Debug, Clone)]
pub struct RulesEngine {
    initial: Chess,
    position: Chess,
    moves: Vec<AnnotatedMove>,
    position_keys: Vec<String>,
}

impl RulesEngine {
    /// Creates an engine at the standard initial position.
    #[instrument]
    pub fn new() -> Self {
        let initial = Chess::default();
        let key = position_key(&initial);
        Self {
            position: initial.clone(),
            initial,
            moves: Vec::new(),
            position_keys: vec![key],
        }
    }

    /// Rebuilds an engine by playing a UCI move list from the initial position.
    #[instrument(skip(moves), fields(count = moves.len()))]
    pub fn from_uci_moves<S: AsRef<str>>(moves: &[S]) -> Result<Self, MoveRejection> {
        let mut engine = Self::new();
        for uci in moves {
            let request: MoveRequest = uci.as_ref().parse()?;
            engine.apply_move(request)?;
        }
        debug!(plies = engine.moves.len(), "Rebuilt position from move list");
        Ok(engine)
    }

    /// Side to move in the live position.
    pub fn side_to_move(&self) -> Side {
        self.position.turn().into()
    }

    /// Moves applied so far, oldest first.
    pub fn moves(&self) -> &[AnnotatedMove] {
        &self.moves
    }

    /// Snapshot of the live board.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::from_position(&self.position)
    }

    /// FEN of the live position.
    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    /// All legal moves in the live position, optionally only those leaving `from`.
    #[instrument(skip(self))]
    pub fn legal_moves(&self, from: Option<Square>) -> Vec<AnnotatedMove> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| self.annotate(m))
            .filter(|m| from.is_none_or(|sq| m.from == sq))
            .collect()
    }

    /// Destination squares for the piece on `square`.
    ///
    /// Empty when the square is empty or holds a piece of the side not to move.
    #[instrument(skip(self))]
    pub fn legal_targets(&self, square: Square) -> Vec<Square> {
        match self.position.board().piece_at(square) {
            Some(piece) if Side::from(piece.color) == self.side_to_move() => {
                let mut targets: Vec<Square> = self
                    .legal_moves(Some(square))
                    .into_iter()
                    .map(|m| m.to)
                    .collect();
                // promotions produce one move per piece kind
                targets.sort();
                targets.dedup();
                targets
            }
            _ => Vec::new(),
        }
    }

    /// Returns the side owning the piece on `square`, if any.
    pub fn owner_of(&self, square: Square) -> Option<Side> {
        self.position
            .board()
            .piece_at(square)
            .map(|piece| piece.color.into())
    }

    /// Applies a move if it is legal.
    ///
    /// A pawn reaching the last rank without an explicit choice promotes to a
    /// queen. On rejection nothing changes.
    #[instrument(skip(self, request), fields(request = %request, ply = self.moves.len()))]
    pub fn apply_move(&mut self, request: MoveRequest) -> Result<AnnotatedMove, MoveRejection> {
        let promotion = request
            .promotion
            .map(Role::from)
            .or_else(|| self.needs_promotion(request.from, request.to).then_some(Role::Queen));
        let wanted = Uci::Normal {
            from: request.from,
            to: request.to,
            promotion,
        };

        let Some(m) = self
            .position
            .legal_moves()
            .into_iter()
            .find(|m| m.to_uci(CastlingMode::Standard) == wanted)
        else {
            warn!("Rules engine rejected move");
            return Err(MoveRejection::IllegalMove {
                from: request.from,
                to: request.to,
            });
        };

        let annotated = self.annotate(&m);
        self.position.play_unchecked(&m);
        self.position_keys.push(position_key(&self.position));
        self.moves.push(annotated.clone());

        debug!(san = %annotated.san, side = %annotated.side, "Move applied");
        Ok(annotated)
    }

    /// True if the live position is checkmate.
    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    /// True if the side to move is in check.
    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    /// Reason the live position is drawn, if it is.
    pub fn draw_reason(&self) -> Option<DrawReason> {
        if self.position.is_stalemate() {
            Some(DrawReason::Stalemate)
        } else if self.position.is_insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else if self.position.halfmoves() >= FIFTY_MOVE_HALFMOVES {
            Some(DrawReason::FiftyMoves)
        } else if self.repetitions() >= REPETITION_LIMIT {
            Some(DrawReason::Repetition)
        } else {
            None
        }
    }

    /// True if the live position is drawn.
    pub fn is_draw(&self) -> bool {
        self.draw_reason().is_some()
    }

    /// True if the board itself ends the game (mate or draw).
    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    /// Board-decided outcome, if any.
    pub fn outcome(&self) -> Option<GameOutcome> {
        if self.is_checkmate() {
            Some(GameOutcome::Checkmate {
                winner: self.side_to_move().opponent(),
            })
        } else {
            self.draw_reason().map(GameOutcome::Draw)
        }
    }

    /// Rebuilds the position after the first `plies` moves by full replay
    /// from the initial position.
    #[instrument(skip(self), fields(total = self.moves.len()))]
    pub fn replay(&self, plies: usize) -> Result<BoardSnapshot, ReplayError> {
        let mut position = self.initial.clone();
        for played in self.moves.iter().take(plies) {
            if !position.is_legal(&played.inner) {
                warn!(ply = played.ply, uci = %played.uci, "Replay hit an illegal move");
                return Err(ReplayError {
                    ply: played.ply,
                    uci: played.uci.clone(),
                });
            }
            position.play_unchecked(&played.inner);
        }
        Ok(BoardSnapshot::from_position(&position))
    }

    /// Number of times the live position has occurred.
    fn repetitions(&self) -> usize {
        match self.position_keys.last() {
            Some(current) => self.position_keys.iter().filter(|k| *k == current).count(),
            None => 0,
        }
    }

    /// True if moving the piece on `from` to `to` is a pawn reaching the last rank.
    fn needs_promotion(&self, from: Square, to: Square) -> bool {
        matches!(
            self.position.board().piece_at(from),
            Some(piece) if piece.role == Role::Pawn
        ) && matches!(to.rank(), Rank::First | Rank::Eighth)
    }

    /// Annotates a legal move of the live position.
    fn annotate(&self, m: &Move) -> AnnotatedMove {
        let mut after = self.position.clone();
        after.play_unchecked(m);
        let is_checkmate = after.is_checkmate();
        let is_check = after.is_check();

        let mut san = San::from_move(&self.position, m).to_string();
        if is_checkmate {
            san.push('#');
        } else if is_check {
            san.push('+');
        }

        let uci = m.to_uci(CastlingMode::Standard);
        let (from, to) = match &uci {
            Uci::Normal { from, to, .. } => (*from, *to),
            _ => (m.from().unwrap_or(m.to()), m.to()),
        };

        AnnotatedMove {
            inner: m.clone(),
            ply: self.moves.len(),
            side: self.side_to_move(),
            piece: PieceKind::from(m.role()),
            from,
            to,
            captured: m.capture().map(PieceKind::from),
            promotion: m.promotion().map(PieceKind::from),
            is_check,
            is_checkmate,
            san,
            uci: uci.to_string(),
        }
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Position identity for repetition counting: placement, side to move,
/// castling rights and en passant square (FEN without the move counters).
fn position_key(position: &Chess) -> String {
    let fen = Fen::from_position(position.clone(), EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
impl RulesEngine {
    /// Engine starting from an arbitrary FEN position.
    pub(crate) fn from_fen(fen: &str) -> Self {
        let setup: Fen = fen.parse().unwrap();
        let initial: Chess = setup.into_position(CastlingMode::Standard).unwrap();
        let key = position_key(&initial);
        Self {
            position: initial.clone(),
            initial,
            moves: Vec::new(),
            position_keys: vec![key],
        }
    }

    /// Replaces the move list while leaving the position alone.
    pub(crate) fn replace_moves(&mut self, moves: Vec<AnnotatedMove>) {
        self.moves = moves;
    }
}
