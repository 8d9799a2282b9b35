//! History cursor: browse earlier positions without touching live play.
//!
//! The cursor only ever reads the rules engine. A scrubbed position is
//! rebuilt by full replay of a move-list prefix and cached until the cursor
//! moves again; the clock and the arbiter never see it.

use crate::games::chess::{BoardSnapshot, RulesEngine, Side};
use tracing::{debug, instrument, warn};

/// Where the cursor points.
///
/// `At(n)` is the position after the first `n` plies, so `At(0)` is the
/// initial position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorIndex {
    /// Following the live position.
    #[default]
    Live,
    /// Showing the position after this many plies.
    At(usize),
}

/// Label for the scrubber UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryLabel {
    /// Showing the live position.
    Live,
    /// Showing the initial position.
    Start,
    /// Showing the position right after a move.
    AfterPly {
        /// Full-move number (1-based).
        move_number: usize,
        /// Side that made the move.
        side: Side,
        /// The move in SAN.
        san: String,
    },
}

impl std::fmt::Display for HistoryLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryLabel::Live => write!(f, "live"),
            HistoryLabel::Start => write!(f, "start"),
            HistoryLabel::AfterPly {
                move_number,
                side: Side::White,
                san,
            } => write!(f, "{}. {}", move_number, san),
            HistoryLabel::AfterPly {
                move_number,
                side: Side::Black,
                san,
            } => write!(f, "{}... {}", move_number, san),
        }
    }
}

/// Read-only view into the move list.
#[derive(Debug, Clone, Default)]
pub struct HistoryCursor {
    index: CursorIndex,
    cached: Option<BoardSnapshot>,
}

impl HistoryCursor {
    /// Creates a cursor following the live position.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current index.
    pub fn index(&self) -> CursorIndex {
        self.index
    }

    /// True while following the live position.
    pub fn is_live(&self) -> bool {
        self.index == CursorIndex::Live
    }

    /// Steps one ply back. From live this shows the position before the
    /// last move; at the initial position it does nothing.
    ///
    /// Returns true if the cursor moved. A board that cannot be rebuilt
    /// leaves the cursor live and returns false.
    #[instrument(skip(self, rules), fields(index = ?self.index, plies = rules.moves().len()))]
    pub fn step_back(&mut self, rules: &RulesEngine) -> bool {
        let target = match self.index {
            CursorIndex::Live => match rules.moves().len() {
                0 => return false,
                len => len - 1,
            },
            CursorIndex::At(0) => return false,
            CursorIndex::At(plies) => plies - 1,
        };
        self.show(rules, target)
    }

    /// Steps one ply forward, returning to live after the last move.
    /// Does nothing when already live.
    ///
    /// Returns true if the cursor moved.
    #[instrument(skip(self, rules), fields(index = ?self.index, plies = rules.moves().len()))]
    pub fn step_forward(&mut self, rules: &RulesEngine) -> bool {
        match self.index {
            CursorIndex::Live => false,
            CursorIndex::At(plies) if plies + 1 >= rules.moves().len() => {
                self.jump_live();
                true
            }
            CursorIndex::At(plies) => self.show(rules, plies + 1),
        }
    }

    /// Returns to the live position.
    pub fn jump_live(&mut self) {
        if !self.is_live() {
            debug!("History cursor back to live");
        }
        self.index = CursorIndex::Live;
        self.cached = None;
    }

    /// Board to display: the live board, or the replayed one when scrubbed.
    pub fn displayed(&self, rules: &RulesEngine) -> BoardSnapshot {
        match (&self.index, &self.cached) {
            (CursorIndex::At(_), Some(snapshot)) => snapshot.clone(),
            _ => rules.snapshot(),
        }
    }

    /// Ply highlighted on the move sheet: the last move shown on the board.
    pub fn highlighted_ply(&self, rules: &RulesEngine) -> Option<usize> {
        match self.index {
            CursorIndex::Live => rules.moves().len().checked_sub(1),
            CursorIndex::At(plies) => plies.checked_sub(1),
        }
    }

    /// Label for the scrubber UI.
    pub fn label(&self, rules: &RulesEngine) -> HistoryLabel {
        match self.index {
            CursorIndex::Live => HistoryLabel::Live,
            CursorIndex::At(0) => HistoryLabel::Start,
            CursorIndex::At(plies) => match rules.moves().get(plies - 1) {
                Some(played) => HistoryLabel::AfterPly {
                    move_number: (plies - 1) / 2 + 1,
                    side: played.side(),
                    san: played.san().to_string(),
                },
                None => HistoryLabel::Live,
            },
        }
    }

    /// Rebuilds and caches the board after `plies` moves, clamping to live
    /// if the replay fails.
    fn show(&mut self, rules: &RulesEngine, plies: usize) -> bool {
        match rules.replay(plies) {
            Ok(snapshot) => {
                debug!(plies, "History cursor moved");
                self.index = CursorIndex::At(plies);
                self.cached = Some(snapshot);
                true
            }
            Err(e) => {
                warn!(error = %e, "History reconstruction failed, returning to live");
                self.jump_live();
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_back_on_empty_game_is_noop() {
        let rules = RulesEngine::new();
        let mut cursor = HistoryCursor::new();
        assert!(!cursor.step_back(&rules));
        assert!(cursor.is_live());
    }

    #[test]
    fn test_scrub_after_single_move() {
        let rules = RulesEngine::from_uci_moves(&["e2e4"]).unwrap();
        let mut cursor = HistoryCursor::new();

        assert!(cursor.step_back(&rules));
        assert_eq!(cursor.index(), CursorIndex::At(0));
        assert_eq!(cursor.displayed(&rules), RulesEngine::new().snapshot());
        assert_eq!(cursor.label(&rules), HistoryLabel::Start);

        assert!(!cursor.step_back(&rules));

        assert!(cursor.step_forward(&rules));
        assert!(cursor.is_live());
        assert_eq!(cursor.displayed(&rules), rules.snapshot());
        assert!(!cursor.step_forward(&rules));
    }

    #[test]
    fn test_labels_follow_move_numbers() {
        let rules = RulesEngine::from_uci_moves(&["e2e4", "e7e5", "g1f3"]).unwrap();
        let mut cursor = HistoryCursor::new();
        cursor.step_back(&rules);
        assert_eq!(cursor.label(&rules).to_string(), "1... e5");
        cursor.step_back(&rules);
        assert_eq!(cursor.label(&rules).to_string(), "1. e4");
        assert_eq!(cursor.highlighted_ply(&rules), Some(0));
        cursor.jump_live();
        assert_eq!(cursor.label(&rules).to_string(), "live");
        assert_eq!(cursor.highlighted_ply(&rules), Some(2));
    }

    #[test]
    fn test_unreplayable_history_falls_back_to_live() {
        let mut rules = RulesEngine::from_uci_moves(&["e2e4", "e7e5", "g1f3"]).unwrap();
        let mut cursor = HistoryCursor::new();
        assert!(cursor.step_back(&rules));
        assert_eq!(cursor.index(), CursorIndex::At(2));

        let moves = rules.moves().to_vec();
        rules.replace_moves(vec![moves[1].clone(), moves[0].clone(), moves[2].clone()]);

        assert!(!cursor.step_back(&rules));
        assert!(cursor.is_live());
        assert_eq!(cursor.displayed(&rules), rules.snapshot());
        assert_eq!(cursor.label(&rules), HistoryLabel::Live);
    }
}
