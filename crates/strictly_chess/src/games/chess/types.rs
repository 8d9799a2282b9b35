//! Core domain types for chess positions as seen by the presentation layer.

use serde::{Deserialize, Serialize};
use shakmaty::{File, Rank, Role, Square};
use strum::Display;

/// A side of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    /// White (moves first).
    White,
    /// Black.
    Black,
}

impl Side {
    /// Returns the opposing side.
    pub fn opponent(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl From<shakmaty::Color> for Side {
    fn from(color: shakmaty::Color) -> Self {
        match color {
            shakmaty::Color::White => Side::White,
            shakmaty::Color::Black => Side::Black,
        }
    }
}

impl From<Side> for shakmaty::Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => shakmaty::Color::White,
            Side::Black => shakmaty::Color::Black,
        }
    }
}

/// Kind of chess piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PieceKind {
    /// Pawn.
    Pawn,
    /// Knight.
    Knight,
    /// Bishop.
    Bishop,
    /// Rook.
    Rook,
    /// Queen.
    Queen,
    /// King.
    King,
}

impl PieceKind {
    /// Conventional material value (pawn=1 ... queen=9, king=0).
    pub fn value(self) -> i32 {
        match self {
            PieceKind::Pawn => 1,
            PieceKind::Knight | PieceKind::Bishop => 3,
            PieceKind::Rook => 5,
            PieceKind::Queen => 9,
            PieceKind::King => 0,
        }
    }

    /// Lowercase letter used in UCI promotion suffixes and board text.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

impl From<Role> for PieceKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Pawn => PieceKind::Pawn,
            Role::Knight => PieceKind::Knight,
            Role::Bishop => PieceKind::Bishop,
            Role::Rook => PieceKind::Rook,
            Role::Queen => PieceKind::Queen,
            Role::King => PieceKind::King,
        }
    }
}

impl From<PieceKind> for Role {
    fn from(kind: PieceKind) -> Self {
        match kind {
            PieceKind::Pawn => Role::Pawn,
            PieceKind::Knight => Role::Knight,
            PieceKind::Bishop => Role::Bishop,
            PieceKind::Rook => Role::Rook,
            PieceKind::Queen => Role::Queen,
            PieceKind::King => Role::King,
        }
    }
}

/// A piece on a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    /// Owner of the piece.
    pub side: Side,
    /// What the piece is.
    pub kind: PieceKind,
}

impl Piece {
    /// Board-text symbol: uppercase for white, lowercase for black.
    pub fn symbol(&self) -> char {
        let letter = self.kind.letter();
        match self.side {
            Side::White => letter.to_ascii_uppercase(),
            Side::Black => letter,
        }
    }
}

impl From<shakmaty::Piece> for Piece {
    fn from(piece: shakmaty::Piece) -> Self {
        Self {
            side: piece.color.into(),
            kind: piece.role.into(),
        }
    }
}

/// Read-only 8x8 board grid.
///
/// Row 0 is rank 8 and column 0 is file a, matching how a board is drawn
/// from white's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    rows: [[Option<Piece>; 8]; 8],
    side_to_move: Side,
}

impl BoardSnapshot {
    /// Builds a snapshot from a rules-engine position.
    pub(crate) fn from_position(position: &shakmaty::Chess) -> Self {
        use shakmaty::Position;

        let board = position.board();
        let mut rows = [[None; 8]; 8];
        for (row, cells) in rows.iter_mut().enumerate() {
            for (col, cell) in cells.iter_mut().enumerate() {
                *cell = board.piece_at(square_at(row, col)).map(Piece::from);
            }
        }
        Self {
            rows,
            side_to_move: position.turn().into(),
        }
    }

    /// Returns the piece at the given grid coordinates.
    pub fn get(&self, row: usize, col: usize) -> Option<Piece> {
        self.rows.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    /// Returns the piece on a named square.
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        let row = 7 - square.rank() as usize;
        let col = square.file() as usize;
        self.get(row, col)
    }

    /// Returns all rows, rank 8 first.
    pub fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.rows
    }

    /// Side to move in this snapshot.
    pub fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    /// Formats the board as text, rank 8 at the top.
    pub fn display(&self) -> String {
        let mut result = String::new();
        for (row, cells) in self.rows.iter().enumerate() {
            result.push_str(&format!("{} ", 8 - row));
            for cell in cells {
                result.push(' ');
                result.push(cell.map(|p| p.symbol()).unwrap_or('.'));
            }
            result.push('\n');
        }
        result.push_str("   a b c d e f g h");
        result
    }
}

/// Maps grid coordinates (row 0 = rank 8) to a square.
fn square_at(row: usize, col: usize) -> Square {
    Square::from_coords(File::new(col as u32), Rank::new(7 - row as u32))
}
