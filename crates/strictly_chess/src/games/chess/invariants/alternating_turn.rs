//! Alternating turn invariant: white, black, white, black, ...

use super::super::{RulesEngine, Side};
use super::Invariant;

/// Invariant: sides alternate, white first, and the side to move follows
/// from the number of plies.
pub struct AlternatingTurnInvariant;

impl Invariant<RulesEngine> for AlternatingTurnInvariant {
    fn holds(engine: &RulesEngine) -> bool {
        let moves = engine.moves();

        if moves.first().is_some_and(|m| m.side() != Side::White) {
            return false;
        }
        if moves.windows(2).any(|pair| pair[0].side() == pair[1].side()) {
            return false;
        }

        let expected = if moves.len() % 2 == 0 {
            Side::White
        } else {
            Side::Black
        };
        engine.side_to_move() == expected
    }

    fn description() -> &'static str {
        "Sides alternate turns (white, black, white, ...)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_game_holds() {
        assert!(AlternatingTurnInvariant::holds(&RulesEngine::new()));
    }

    #[test]
    fn test_odd_ply_count_leaves_black_to_move() {
        let engine = RulesEngine::from_uci_moves(&["e2e4", "e7e5", "g1f3"]).unwrap();
        assert!(AlternatingTurnInvariant::holds(&engine));
        assert_eq!(engine.side_to_move(), Side::Black);
    }
}
