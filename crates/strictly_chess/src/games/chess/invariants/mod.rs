//! First-class invariants for a chess game record.
//!
//! Invariants are properties of the rules engine that must hold after every
//! applied move. The session checks them in debug builds; tests check them
//! directly.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

impl<S, I1, I2, I3> InvariantSet<S> for (I1, I2, I3)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
    I3: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }
        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }
        if !I3::holds(state) {
            violations.push(InvariantViolation::new(I3::description()));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl<S, I1, I2> InvariantSet<S> for (I1, I2)
where
    I1: Invariant<S>,
    I2: Invariant<S>,
{
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
        let mut violations = Vec::new();
        if !I1::holds(state) {
            violations.push(InvariantViolation::new(I1::description()));
        }
        if !I2::holds(state) {
            violations.push(InvariantViolation::new(I2::description()));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

mod alternating_turn;
mod ply_numbering;
mod replay_consistent;

pub use alternating_turn::AlternatingTurnInvariant;
pub use ply_numbering::PlyNumberingInvariant;
pub use replay_consistent::ReplayConsistentInvariant;

/// All chess record invariants as a composable set.
pub type ChessInvariants = (
    AlternatingTurnInvariant,
    PlyNumberingInvariant,
    ReplayConsistentInvariant,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::RulesEngine;

    #[test]
    fn test_invariant_set_holds_for_new_game() {
        let engine = RulesEngine::new();
        assert!(ChessInvariants::check_all(&engine).is_ok());
    }

    #[test]
    fn test_invariant_set_holds_after_castling_and_capture() {
        let engine = RulesEngine::from_uci_moves(&[
            "e2e4", "d7d5", "e4d5", "g8f6", "g1f3", "f6d5", "f1c4", "e7e6", "e1g1",
        ])
        .unwrap();
        assert!(ChessInvariants::check_all(&engine).is_ok());
    }

    #[test]
    fn test_two_invariants_as_set() {
        type TwoInvariants = (AlternatingTurnInvariant, PlyNumberingInvariant);
        let engine = RulesEngine::from_uci_moves(&["d2d4", "d7d5"]).unwrap();
        assert!(TwoInvariants::check_all(&engine).is_ok());
    }
}
