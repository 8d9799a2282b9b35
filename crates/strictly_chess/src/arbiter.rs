//! Turn arbitration: who may move, and the single move pipeline.
//!
//! [`TurnArbiter::attempt`] is the only caller of
//! [`RulesEngine::apply_move`]. Human, bot and remote moves all pass
//! through it, so the clock increment, the history reset and the bot
//! scheduling decision happen in one place for every move.

use crate::bot::BotProfile;
use crate::clock::ClockEngine;
use crate::games::chess::{
    Actor, AnnotatedMove, GameOutcome, MoveRejection, MoveRequest, RulesEngine, Side,
};
use crate::history::HistoryCursor;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// How the two sides of a game are seated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameMode {
    /// Both sides are played at this board.
    HotSeat,
    /// The local participant plays white against a bot.
    VersusBot {
        /// The opponent.
        bot: BotProfile,
    },
    /// The local participant plays one side of an online game.
    Online {
        /// Backend identifier of the game.
        game_id: String,
        /// Side assigned to the local participant at match time.
        local: Side,
    },
}

impl GameMode {
    /// Short label for logs and headers.
    pub fn label(&self) -> String {
        match self {
            GameMode::HotSeat => "hot-seat".to_string(),
            GameMode::VersusBot { bot } => format!("vs {} ({})", bot.name(), bot.elo()),
            GameMode::Online { game_id, local } => format!("online {} as {}", game_id, local),
        }
    }
}

/// Which side each actor is allowed to move. Fixed for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnAssignment {
    local: Option<Side>,
    bot: Option<Side>,
    remote: Option<Side>,
    unconstrained: bool,
}

impl TurnAssignment {
    /// Seats the actors for a game mode.
    #[instrument]
    pub fn for_mode(mode: &GameMode) -> Self {
        match mode {
            GameMode::HotSeat => Self {
                local: None,
                bot: None,
                remote: None,
                unconstrained: true,
            },
            GameMode::VersusBot { .. } => Self {
                local: Some(Side::White),
                bot: Some(Side::Black),
                remote: None,
                unconstrained: false,
            },
            GameMode::Online { local, .. } => Self {
                local: Some(*local),
                bot: None,
                remote: Some(local.opponent()),
                unconstrained: false,
            },
        }
    }

    /// Side the local participant plays; `None` in hot-seat play.
    pub fn local_side(&self) -> Option<Side> {
        self.local
    }

    /// Side the bot plays, if there is a bot.
    pub fn bot_side(&self) -> Option<Side> {
        self.bot
    }

    /// Side the remote opponent plays, if online.
    pub fn remote_side(&self) -> Option<Side> {
        self.remote
    }

    /// Checks that `actor` may move for `to_move`.
    #[instrument(skip(self))]
    pub fn permits(&self, actor: Actor, to_move: Side) -> Result<(), MoveRejection> {
        if actor == Actor::Local && self.unconstrained {
            return Ok(());
        }
        let seat = match actor {
            Actor::Local => self.local,
            Actor::Bot => self.bot,
            Actor::Remote => self.remote,
        };
        match seat {
            None => Err(MoveRejection::NotSeated(actor)),
            Some(side) if side != to_move => Err(MoveRejection::OutOfTurn {
                seat: side,
                to_move,
            }),
            Some(_) => Ok(()),
        }
    }
}

/// Result of a move that went through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// The applied move.
    pub played: AnnotatedMove,
    /// Outcome if the move ended the game on the board.
    pub outcome: Option<GameOutcome>,
    /// True if the bot should now be scheduled to reply.
    pub bot_due: bool,
}

/// Gatekeeper for move attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnArbiter {
    assignment: TurnAssignment,
}

impl TurnArbiter {
    /// Creates an arbiter for a game mode.
    #[instrument]
    pub fn new(mode: &GameMode) -> Self {
        Self {
            assignment: TurnAssignment::for_mode(mode),
        }
    }

    /// The seating this arbiter enforces.
    pub fn assignment(&self) -> &TurnAssignment {
        &self.assignment
    }

    /// Checks every precondition that does not need the rules engine.
    ///
    /// Fails closed on a finished game, a flagged clock, or an actor moving
    /// out of turn.
    #[instrument(skip(self, rules, clock))]
    pub fn precheck(
        &self,
        actor: Actor,
        finished: bool,
        rules: &RulesEngine,
        clock: &ClockEngine,
    ) -> Result<(), MoveRejection> {
        if finished || rules.is_game_over() {
            return Err(MoveRejection::GameOver);
        }
        if let Some(side) = clock.flagged() {
            return Err(MoveRejection::ClockFlagged(side));
        }
        self.assignment.permits(actor, rules.side_to_move())
    }

    /// Runs the move pipeline.
    ///
    /// On success the move is in the move list and the history cursor is
    /// live. If the board ended the game the clock is stopped; otherwise the
    /// mover is credited the increment. On rejection nothing has changed.
    #[instrument(skip(self, request, rules, clock, cursor), fields(request = %request))]
    pub fn attempt(
        &self,
        actor: Actor,
        request: MoveRequest,
        finished: bool,
        rules: &mut RulesEngine,
        clock: &mut ClockEngine,
        cursor: &mut HistoryCursor,
    ) -> Result<Verdict, MoveRejection> {
        if let Err(rejection) = self.precheck(actor, finished, rules, clock) {
            warn!(%rejection, "Move refused before reaching rules engine");
            return Err(rejection);
        }

        let played = rules.apply_move(request)?;
        cursor.jump_live();

        let outcome = rules.outcome();
        match outcome {
            Some(_) => clock.stop(),
            None => clock.credit_increment(played.side()),
        }

        let bot_due = outcome.is_none()
            && self.assignment.bot_side() == Some(rules.side_to_move());

        info!(
            san = %played.san(),
            side = %played.side(),
            ply = played.ply(),
            bot_due,
            "Move accepted"
        );
        if let Some(outcome) = &outcome {
            debug!(%outcome, "Move ended the game");
        }

        Ok(Verdict {
            played,
            outcome,
            bot_due,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::BotProfile;
    use crate::config::TimeControl;
    use shakmaty::Square;

    struct Fixture {
        rules: RulesEngine,
        clock: ClockEngine,
        cursor: HistoryCursor,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_control(TimeControl::default())
        }

        fn with_control(control: TimeControl) -> Self {
            let mut clock = ClockEngine::new();
            clock.start(&control);
            Self {
                rules: RulesEngine::new(),
                clock,
                cursor: HistoryCursor::new(),
            }
        }

        fn attempt(
            &mut self,
            arbiter: &TurnArbiter,
            actor: Actor,
            uci: &str,
        ) -> Result<Verdict, MoveRejection> {
            arbiter.attempt(
                actor,
                uci.parse().unwrap(),
                false,
                &mut self.rules,
                &mut self.clock,
                &mut self.cursor,
            )
        }
    }

    fn versus_bot() -> GameMode {
        GameMode::VersusBot {
            bot: BotProfile::with_strength(1200),
        }
    }

    #[test]
    fn test_hot_seat_moves_both_sides() {
        let arbiter = TurnArbiter::new(&GameMode::HotSeat);
        let mut fixture = Fixture::new();
        assert!(fixture.attempt(&arbiter, Actor::Local, "e2e4").is_ok());
        assert!(fixture.attempt(&arbiter, Actor::Local, "e7e5").is_ok());
        assert_eq!(fixture.rules.moves().len(), 2);
    }

    #[test]
    fn test_bot_scheduled_after_human_move() {
        let arbiter = TurnArbiter::new(&versus_bot());
        let mut fixture = Fixture::new();
        let verdict = fixture.attempt(&arbiter, Actor::Local, "e2e4").unwrap();
        assert!(verdict.bot_due);

        let rejected = fixture.attempt(&arbiter, Actor::Local, "e7e5");
        assert_eq!(
            rejected,
            Err(MoveRejection::OutOfTurn {
                seat: Side::White,
                to_move: Side::Black
            })
        );

        let verdict = fixture.attempt(&arbiter, Actor::Bot, "e7e5").unwrap();
        assert!(!verdict.bot_due);
    }

    #[test]
    fn test_online_black_cannot_move_white() {
        let mode = GameMode::Online {
            game_id: "g1".to_string(),
            local: Side::Black,
        };
        let arbiter = TurnArbiter::new(&mode);
        assert_eq!(arbiter.assignment().local_side(), Some(Side::Black));
        assert_eq!(arbiter.assignment().remote_side(), Some(Side::White));
        assert_eq!(arbiter.assignment().bot_side(), None);
        let mut fixture = Fixture::new();
        let result = fixture.attempt(&arbiter, Actor::Local, "e2e4");
        assert!(matches!(result, Err(MoveRejection::OutOfTurn { .. })));
        assert!(fixture.rules.moves().is_empty());

        assert!(fixture.attempt(&arbiter, Actor::Remote, "e2e4").is_ok());
        assert!(fixture.attempt(&arbiter, Actor::Local, "e7e5").is_ok());
    }

    #[test]
    fn test_unseated_actor_rejected() {
        let arbiter = TurnArbiter::new(&GameMode::HotSeat);
        let mut fixture = Fixture::new();
        assert_eq!(
            fixture.attempt(&arbiter, Actor::Bot, "e2e4"),
            Err(MoveRejection::NotSeated(Actor::Bot))
        );
    }

    #[test]
    fn test_flagged_clock_blocks_moves() {
        let arbiter = TurnArbiter::new(&GameMode::HotSeat);
        let mut fixture = Fixture::new();
        fixture.clock = ClockEngine::new();
        fixture.clock.resume(1, 60, 0);
        fixture.clock.tick(Side::White);
        assert_eq!(
            fixture.attempt(&arbiter, Actor::Local, "e2e4"),
            Err(MoveRejection::ClockFlagged(Side::White))
        );
    }

    #[test]
    fn test_mating_move_stops_clock_and_skips_bot() {
        let arbiter = TurnArbiter::new(&GameMode::HotSeat);
        let mut fixture = Fixture::new();
        for uci in ["f2f3", "e7e5", "g2g4"] {
            fixture.attempt(&arbiter, Actor::Local, uci).unwrap();
        }
        let verdict = fixture.attempt(&arbiter, Actor::Local, "d8h4").unwrap();
        assert_eq!(
            verdict.outcome,
            Some(GameOutcome::Checkmate {
                winner: Side::Black
            })
        );
        assert!(!fixture.clock.is_running());
        assert_eq!(
            fixture.attempt(&arbiter, Actor::Local, "a2a3"),
            Err(MoveRejection::GameOver)
        );
    }

    #[test]
    fn test_mating_move_earns_no_increment() {
        let arbiter = TurnArbiter::new(&GameMode::HotSeat);
        let mut fixture = Fixture::with_control(TimeControl::new(1, 5).unwrap());
        for uci in ["f2f3", "e7e5", "g2g4"] {
            fixture.attempt(&arbiter, Actor::Local, uci).unwrap();
        }
        assert_eq!(fixture.clock.white_remaining(), 70);
        assert_eq!(fixture.clock.black_remaining(), 65);

        let verdict = fixture.attempt(&arbiter, Actor::Local, "d8h4").unwrap();
        assert!(verdict.outcome.is_some());
        assert_eq!(fixture.clock.black_remaining(), 65);
        assert_eq!(fixture.clock.white_remaining(), 70);
    }

    #[test]
    fn test_illegal_move_leaves_cursor_alone() {
        let arbiter = TurnArbiter::new(&GameMode::HotSeat);
        let mut fixture = Fixture::new();
        fixture.attempt(&arbiter, Actor::Local, "e2e4").unwrap();
        fixture.cursor.step_back(&fixture.rules);
        let result = fixture.attempt(&arbiter, Actor::Local, "e7e4");
        assert_eq!(
            result,
            Err(MoveRejection::IllegalMove {
                from: Square::E7,
                to: Square::E4
            })
        );
        assert!(!fixture.cursor.is_live());
    }
}
