//! Chess: rules adapter, move types, outcomes and record invariants.

mod action;
mod outcome;
mod rules;
mod types;

pub mod invariants;

pub use action::{Actor, AnnotatedMove, MoveFeedback, MoveRejection, MoveRequest};
pub use outcome::{DrawReason, GameOutcome};
pub use rules::{ReplayError, RulesEngine};
pub use types::{BoardSnapshot, Piece, PieceKind, Side};
