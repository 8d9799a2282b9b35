//! Synthetic opponents: the named roster and the move heuristic.

mod heuristic;
mod roster;

pub use heuristic::{BotHeuristic, pool_width, score, skill_factor};
pub use roster::{BotProfile, roster};
