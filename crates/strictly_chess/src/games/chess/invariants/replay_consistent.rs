//! Replay consistency invariant: the move list reproduces the live board.

use super::super::RulesEngine;
use super::Invariant;

/// Invariant: replaying every recorded move from the initial position
/// yields exactly the live board.
///
/// This is what makes history browsing trustworthy: any prefix of the move
/// list is a reproducible position.
pub struct ReplayConsistentInvariant;

impl Invariant<RulesEngine> for ReplayConsistentInvariant {
    fn holds(engine: &RulesEngine) -> bool {
        engine
            .replay(engine.moves().len())
            .is_ok_and(|snapshot| snapshot == engine.snapshot())
    }

    fn description() -> &'static str {
        "Replaying the move list reproduces the live position"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_matches_after_en_passant() {
        let engine =
            RulesEngine::from_uci_moves(&["e2e4", "a7a6", "e4e5", "d7d5", "e5d6"]).unwrap();
        assert!(ReplayConsistentInvariant::holds(&engine));
    }
}
