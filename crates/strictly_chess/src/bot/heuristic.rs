//! Strength-scaled move choice.
//!
//! With probability [`skill_factor`] the bot plays one of its best-scored
//! moves, picked uniformly from a pool whose width shrinks as strength
//! rises. Otherwise it plays any legal move, which is how weak bots
//! blunder. There is no search: a move is scored only by what it does
//! immediately.

use crate::games::chess::{AnnotatedMove, RulesEngine};
use rand::Rng;
use rand::seq::IndexedRandom;
use shakmaty::Square;
use tracing::{debug, instrument};

/// Strength at which the bot always plays from its best-scored pool.
pub const MAX_STRENGTH: u32 = 3000;

/// Smallest chance of a considered move, even for the weakest bot.
const MIN_SKILL: f64 = 0.05;

const CAPTURE_WEIGHT: i32 = 10;
const MATE_BONUS: i32 = 1000;
const CHECK_BONUS: i32 = 50;
const CENTER_BONUS: i32 = 5;
const CENTER: [Square; 4] = [Square::D4, Square::D5, Square::E4, Square::E5];

/// Probability of playing from the best-scored pool.
pub fn skill_factor(strength: u32) -> f64 {
    (f64::from(strength) / f64::from(MAX_STRENGTH)).clamp(MIN_SKILL, 1.0)
}

/// Number of top-scored candidates the bot chooses among.
pub fn pool_width(strength: u32) -> usize {
    match strength {
        2800.. => 1,
        2000.. => 2,
        1400.. => 3,
        800.. => 4,
        _ => 5,
    }
}

/// Immediate value of a move.
///
/// A capture is worth ten times the victim minus the attacker, so pawn
/// takes queen outscores queen takes pawn. Mate and check add a bonus,
/// and so does landing on one of the four center squares.
pub fn score(candidate: &AnnotatedMove) -> i32 {
    let mut total = 0;
    if let Some(victim) = candidate.captured() {
        total += victim.value() * CAPTURE_WEIGHT - candidate.piece().value();
    }
    if candidate.is_checkmate() {
        total += MATE_BONUS;
    } else if candidate.is_check() {
        total += CHECK_BONUS;
    }
    if CENTER.contains(&candidate.to()) {
        total += CENTER_BONUS;
    }
    total
}

/// Move chooser for one bot strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BotHeuristic {
    strength: u32,
}

impl BotHeuristic {
    /// Creates a heuristic for the given strength (rating).
    pub fn new(strength: u32) -> Self {
        Self { strength }
    }

    /// Chooses a legal move for the side to move, or `None` if there is none.
    ///
    /// The choice is only a suggestion: the caller plays it through the
    /// normal move pipeline.
    #[instrument(skip(self, rules, rng), fields(strength = self.strength))]
    pub fn choose<R: Rng + ?Sized>(
        &self,
        rules: &RulesEngine,
        rng: &mut R,
    ) -> Option<AnnotatedMove> {
        let mut candidates = rules.legal_moves(None);
        if candidates.is_empty() {
            debug!("No legal moves, bot passes");
            return None;
        }

        let roll: f64 = rng.random();
        if roll >= skill_factor(self.strength) {
            let pick = candidates.choose(rng).cloned();
            debug!(roll, chosen = ?pick.as_ref().map(|m| m.san()), "Bot plays a random move");
            return pick;
        }

        // stable: equal scores keep rules-engine order
        candidates.sort_by_key(|m| std::cmp::Reverse(score(m)));
        let width = pool_width(self.strength).min(candidates.len());
        let pick = candidates[..width].choose(rng).cloned();
        debug!(
            roll,
            width,
            chosen = ?pick.as_ref().map(|m| m.san()),
            "Bot plays a considered move"
        );
        pick
    }
}
