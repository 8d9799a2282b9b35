//! Strictly Chess library - the clock and turn core of a chess board
//!
//! A game is a [`GameSession`]: a rules engine (backed by `shakmaty`), two
//! countdown clocks, a turn arbiter that decides who may move, and a
//! history cursor for browsing earlier positions. An [`Orchestrator`] drives
//! one session on a single tokio task, so ticks, board input, delayed bot
//! replies and remote moves never interleave.
//!
//! # Architecture
//!
//! - **Rules**: [`RulesEngine`] adapts `shakmaty` (legality, SAN, draws, replay)
//! - **Clock**: [`ClockEngine`] counts down the side to move, flags once
//! - **Arbiter**: [`TurnArbiter`] gates every move and resets history
//! - **History**: [`HistoryCursor`] rebuilds past boards by full replay
//! - **Bot**: [`BotHeuristic`] picks moves scaled by a [`BotProfile`] rating
//! - **View**: [`SessionView`] is what a board screen draws
//!
//! # Example
//!
//! ```
//! use strictly_chess::{Actor, GameMode, GameSession, TimeControl};
//!
//! let mut session = GameSession::new("demo", GameMode::HotSeat, TimeControl::default());
//! session.start();
//! session.attempt_move(Actor::Local, "e2e4".parse()?)?;
//! assert_eq!(session.rules().moves()[0].san(), "e4");
//! # Ok::<(), strictly_chess::MoveRejection>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod arbiter;
mod bot;
mod clock;
mod config;
mod games;
mod history;
mod orchestrator;
mod persistence;
mod relay;
mod session;
mod view;

// Crate-level exports - Chess domain
pub use games::chess::invariants::{
    AlternatingTurnInvariant, ChessInvariants, Invariant, InvariantSet, InvariantViolation,
    PlyNumberingInvariant, ReplayConsistentInvariant,
};
pub use games::chess::{
    Actor, AnnotatedMove, BoardSnapshot, DrawReason, GameOutcome, MoveFeedback, MoveRejection,
    MoveRequest, Piece, PieceKind, ReplayError, RulesEngine, Side,
};

// Crate-level exports - Clock
pub use clock::{ClockEngine, ClockSignal, format_clock};

// Crate-level exports - Turn arbitration
pub use arbiter::{GameMode, TurnArbiter, TurnAssignment, Verdict};

// Crate-level exports - History
pub use history::{CursorIndex, HistoryCursor, HistoryLabel};

// Crate-level exports - Bots
pub use bot::{BotHeuristic, BotProfile, pool_width, roster, score, skill_factor};

// Crate-level exports - Session
pub use session::{BotTicket, ClickOutcome, GameSession, MoveApplied, SessionId};

// Crate-level exports - Presentation
pub use view::{ClockView, MoveSheetRow, SessionView, captured_pieces, move_sheet};

// Crate-level exports - Event loop and online boundary
pub use orchestrator::{Command, GameEvent, Orchestrator};
pub use relay::{ChannelRelay, MoveRelay, MoveSubmission, forward_remote, spawn_relay};

// Crate-level exports - Configuration and persistence
pub use config::{ArenaConfig, ConfigError, MAX_INCREMENT_SECS, MAX_MINUTES, SessionOptions, TimeControl};
pub use persistence::{PersistenceError, SavedGame};
