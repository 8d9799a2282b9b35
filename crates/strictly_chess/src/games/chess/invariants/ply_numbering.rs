//! Ply numbering invariant: move list entries are numbered 0, 1, 2, ...

use super::super::RulesEngine;
use super::Invariant;

/// Invariant: the i-th recorded move carries ply index i.
pub struct PlyNumberingInvariant;

impl Invariant<RulesEngine> for PlyNumberingInvariant {
    fn holds(engine: &RulesEngine) -> bool {
        engine
            .moves()
            .iter()
            .enumerate()
            .all(|(index, played)| played.ply() == index)
    }

    fn description() -> &'static str {
        "Move list ply indices are contiguous from zero"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbering_after_moves() {
        let engine = RulesEngine::from_uci_moves(&["c2c4", "c7c5", "b1c3"]).unwrap();
        assert!(PlyNumberingInvariant::holds(&engine));
        assert_eq!(engine.moves()[2].ply(), 2);
    }
}
