//! One game of chess: the rules engine, both clocks, the arbiter and the
//! history cursor, owned together.
//!
//! Every state change goes through a `GameSession` method, and every move
//! goes through [`GameSession::attempt_move`] and from there through the
//! turn arbiter. Timers live outside the session (see the orchestrator);
//! the session only hands out [`BotTicket`]s and ignores any it no longer
//! expects.

use crate::arbiter::{GameMode, TurnArbiter, TurnAssignment};
use crate::bot::{BotHeuristic, BotProfile};
use crate::clock::{ClockEngine, ClockSignal};
use crate::config::TimeControl;
use crate::games::chess::invariants::{ChessInvariants, InvariantSet};
use crate::games::chess::{
    Actor, AnnotatedMove, DrawReason, GameOutcome, MoveRejection, MoveRequest, RulesEngine, Side,
};
use crate::history::{HistoryCursor, HistoryLabel};
use rand::Rng;
use shakmaty::Square;
use tracing::{debug, info, instrument, warn};

/// Unique identifier for a game session.
pub type SessionId = String;

/// Handle for one scheduled bot move.
///
/// Only the most recently issued ticket is honored; a timer that fires
/// with an older one (or after the game ended) does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BotTicket(u64);

/// A move that made it through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveApplied {
    /// The applied move.
    pub played: AnnotatedMove,
    /// Who made it.
    pub actor: Actor,
    /// Outcome if the move ended the game.
    pub outcome: Option<GameOutcome>,
    /// Set when the bot should reply after its delay.
    pub bot_ticket: Option<BotTicket>,
}

/// What a board click did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The board was scrubbed; the click only returned it to live.
    ReturnedToLive,
    /// A piece was selected; these are its destinations.
    Selected {
        /// Selected square.
        square: Square,
        /// Legal destinations for hint rendering.
        targets: Vec<Square>,
    },
    /// The selected piece was clicked again and released.
    Deselected,
    /// The click completed a move.
    Moved(MoveApplied),
    /// The click completed a refused move and did not select anything.
    Rejected(MoveRejection),
    /// Nothing to do (empty square, opponent piece, finished game).
    Ignored,
}

/// A single game with its clocks and history.
#[derive(Debug, Clone)]
pub struct GameSession {
    id: SessionId,
    mode: GameMode,
    time_control: TimeControl,
    rules: RulesEngine,
    clock: ClockEngine,
    arbiter: TurnArbiter,
    cursor: HistoryCursor,
    selection: Option<Square>,
    outcome: Option<GameOutcome>,
    pending_bot: Option<BotTicket>,
    next_ticket: u64,
    torn_down: bool,
}

impl GameSession {
    /// Creates a session at the initial position. Clocks are set but not
    /// running until [`GameSession::start`].
    #[instrument(skip(id, mode))]
    pub fn new(id: impl Into<SessionId>, mode: GameMode, time_control: TimeControl) -> Self {
        let id = id.into();
        info!(session_id = %id, mode = %mode.label(), "Creating game session");
        Self {
            id,
            arbiter: TurnArbiter::new(&mode),
            mode,
            time_control,
            rules: RulesEngine::new(),
            clock: ClockEngine::new(),
            cursor: HistoryCursor::new(),
            selection: None,
            outcome: None,
            pending_bot: None,
            next_ticket: 0,
            torn_down: false,
        }
    }

    /// Rebuilds a session from a move list and the clocks at save time.
    ///
    /// The clocks resume running with the saved values; the one-shot start
    /// is consumed, so a later [`GameSession::start`] cannot reset them.
    #[instrument(skip(id, mode, moves), fields(plies = moves.len()))]
    pub fn restore<S: AsRef<str>>(
        id: impl Into<SessionId>,
        mode: GameMode,
        time_control: TimeControl,
        moves: &[S],
        white_remaining: u32,
        black_remaining: u32,
    ) -> Result<Self, MoveRejection> {
        let mut session = Self::new(id, mode, time_control);
        session.rules = RulesEngine::from_uci_moves(moves)?;
        session.clock.resume(
            white_remaining,
            black_remaining,
            *time_control.increment_secs(),
        );

        if let Some(outcome) = session.rules.outcome() {
            session.finish(outcome);
        } else if white_remaining == 0 || black_remaining == 0 {
            let flagged = if white_remaining == 0 {
                Side::White
            } else {
                Side::Black
            };
            session.finish(GameOutcome::Timeout { flagged });
        }

        info!(
            session_id = %session.id,
            white_remaining,
            black_remaining,
            to_move = %session.rules.side_to_move(),
            "Game session restored"
        );
        Ok(session)
    }

    /// Starts the clocks (once per game).
    ///
    /// Returns a bot ticket if the bot is to move right away, as after
    /// restoring a game saved on the bot's turn.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn start(&mut self) -> Option<BotTicket> {
        if self.torn_down || self.outcome.is_some() {
            return None;
        }
        if !self.clock.is_started() {
            self.clock.start(&self.time_control);
            info!(time_control = %self.time_control, "Game started");
        }
        if self.bot_to_move() {
            Some(self.schedule_bot())
        } else {
            None
        }
    }

    /// Delivers one second of real time to the side to move.
    ///
    /// The side is read from the live position at delivery time. After
    /// game over or teardown this is a no-op.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn tick(&mut self) -> Option<ClockSignal> {
        if self.torn_down || self.outcome.is_some() {
            debug!("Stale tick ignored");
            return None;
        }
        let signal = self.clock.tick(self.rules.side_to_move())?;
        if let ClockSignal::Timeout(flagged) = signal {
            self.finish(GameOutcome::Timeout { flagged });
        }
        Some(signal)
    }

    /// Runs a move through the arbiter.
    ///
    /// On rejection the session is unchanged. On success the selection is
    /// cleared, the cursor is live, and a bot ticket is issued when the bot
    /// is to reply.
    #[instrument(skip(self, request), fields(session_id = %self.id, request = %request))]
    pub fn attempt_move(
        &mut self,
        actor: Actor,
        request: MoveRequest,
    ) -> Result<MoveApplied, MoveRejection> {
        if self.torn_down {
            warn!("Move after teardown ignored");
            return Err(MoveRejection::GameOver);
        }
        if actor == Actor::Local && !self.cursor.is_live() {
            debug!("Local move while scrubbed, returning to live instead");
            self.cursor.jump_live();
            self.selection = None;
            return Err(MoveRejection::ViewingHistory);
        }

        let verdict = self.arbiter.attempt(
            actor,
            request,
            self.outcome.is_some(),
            &mut self.rules,
            &mut self.clock,
            &mut self.cursor,
        )?;

        debug_assert!(
            ChessInvariants::check_all(&self.rules).is_ok(),
            "Game record invariants violated after {}",
            verdict.played
        );

        self.selection = None;
        if let Some(outcome) = verdict.outcome {
            self.finish(outcome);
        }
        let bot_ticket = verdict.bot_due.then(|| self.schedule_bot());

        Ok(MoveApplied {
            played: verdict.played,
            actor,
            outcome: verdict.outcome,
            bot_ticket,
        })
    }

    /// Handles a click on the displayed board.
    #[instrument(skip(self), fields(session_id = %self.id, selection = ?self.selection))]
    pub fn click(&mut self, square: Square) -> ClickOutcome {
        if !self.cursor.is_live() {
            self.cursor.jump_live();
            self.selection = None;
            return ClickOutcome::ReturnedToLive;
        }
        if self.torn_down || self.outcome.is_some() {
            return ClickOutcome::Ignored;
        }

        let rejection = match self.selection {
            Some(from) if from == square => {
                self.selection = None;
                return ClickOutcome::Deselected;
            }
            Some(from) => match self.attempt_move(Actor::Local, MoveRequest::new(from, square)) {
                Ok(applied) => return ClickOutcome::Moved(applied),
                Err(rejection) => {
                    debug!(%rejection, "Move refused, treating click as new selection");
                    Some(rejection)
                }
            },
            None => None,
        };

        match self.select(square) {
            Some(targets) => ClickOutcome::Selected { square, targets },
            None => match rejection {
                Some(rejection) => ClickOutcome::Rejected(rejection),
                None => ClickOutcome::Ignored,
            },
        }
    }

    /// Destinations for the piece on `square` in the live position.
    pub fn legal_targets(&self, square: Square) -> Vec<Square> {
        self.rules.legal_targets(square)
    }

    /// Plays the bot's move for `ticket`.
    ///
    /// Returns `Ok(None)` when the ticket is stale, the game is over, or
    /// the bot has no move.
    #[instrument(skip(self, rng), fields(session_id = %self.id))]
    pub fn run_bot<R: Rng + ?Sized>(
        &mut self,
        ticket: BotTicket,
        rng: &mut R,
    ) -> Result<Option<MoveApplied>, MoveRejection> {
        if self.torn_down || self.pending_bot != Some(ticket) {
            warn!(?ticket, pending = ?self.pending_bot, "Stale bot ticket ignored");
            return Ok(None);
        }
        self.pending_bot = None;

        let Some(profile) = self.bot_profile() else {
            return Ok(None);
        };
        let heuristic = BotHeuristic::new(*profile.elo());
        let Some(choice) = heuristic.choose(&self.rules, rng) else {
            return Ok(None);
        };

        let request = MoveRequest {
            from: choice.from(),
            to: choice.to(),
            promotion: choice.promotion(),
        };
        self.attempt_move(Actor::Bot, request).map(Some)
    }

    /// Applies a move received from the online opponent.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn apply_remote(&mut self, uci: &str) -> Result<MoveApplied, MoveRejection> {
        let request: MoveRequest = uci.parse()?;
        self.attempt_move(Actor::Remote, request)
    }

    /// Scrubs one ply back. Returns true if the displayed board changed.
    pub fn step_back(&mut self) -> bool {
        self.selection = None;
        self.cursor.step_back(&self.rules)
    }

    /// Scrubs one ply forward. Returns true if the displayed board changed.
    pub fn step_forward(&mut self) -> bool {
        self.cursor.step_forward(&self.rules)
    }

    /// Returns the displayed board to the live position.
    pub fn jump_live(&mut self) {
        self.cursor.jump_live();
    }

    /// Ends the game with `side` resigning.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn resign(&mut self, side: Side) -> Result<GameOutcome, MoveRejection> {
        self.ensure_open()?;
        let outcome = GameOutcome::Resignation { resigned: side };
        self.finish(outcome);
        Ok(outcome)
    }

    /// Ends the game as a draw by agreement.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn agree_draw(&mut self) -> Result<GameOutcome, MoveRejection> {
        self.ensure_open()?;
        let outcome = GameOutcome::Draw(DrawReason::Agreement);
        self.finish(outcome);
        Ok(outcome)
    }

    /// Offers a draw on behalf of the local participant.
    ///
    /// At a shared board both players are present, so the offer is taken.
    /// Bots and remote opponents decline.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn offer_draw(&mut self) -> Result<Option<GameOutcome>, MoveRejection> {
        self.ensure_open()?;
        match self.mode {
            GameMode::HotSeat => self.agree_draw().map(Some),
            _ => {
                info!("Draw offer declined");
                Ok(None)
            }
        }
    }

    /// Side the local participant resigns for: its own side, or the side to
    /// move at a shared board.
    pub fn local_side(&self) -> Side {
        self.assignment()
            .local_side()
            .unwrap_or_else(|| self.rules.side_to_move())
    }

    /// Abandons the session. Later ticks, bot tickets and moves are no-ops.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.pending_bot = None;
        self.selection = None;
        self.clock.stop();
        info!("Game session torn down");
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// How the sides are seated.
    pub fn mode(&self) -> &GameMode {
        &self.mode
    }

    /// Time control the game was started with.
    pub fn time_control(&self) -> &TimeControl {
        &self.time_control
    }

    /// Live rules engine (read-only).
    pub fn rules(&self) -> &RulesEngine {
        &self.rules
    }

    /// Both clocks.
    pub fn clock(&self) -> &ClockEngine {
        &self.clock
    }

    /// History cursor.
    pub fn cursor(&self) -> &HistoryCursor {
        &self.cursor
    }

    /// Scrubber label for the displayed position.
    pub fn history_label(&self) -> HistoryLabel {
        self.cursor.label(&self.rules)
    }

    /// Selected square, if a piece is selected.
    pub fn selection(&self) -> Option<Square> {
        self.selection
    }

    /// Final outcome once the game is over.
    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    /// True once the game has ended.
    pub fn is_over(&self) -> bool {
        self.outcome.is_some()
    }

    /// True after [`GameSession::teardown`].
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Ticket the session is currently waiting on, if any.
    pub fn pending_bot(&self) -> Option<BotTicket> {
        self.pending_bot
    }

    /// Seating for this game.
    pub fn assignment(&self) -> &TurnAssignment {
        self.arbiter.assignment()
    }

    /// Bot opponent, in versus-bot mode.
    pub fn bot_profile(&self) -> Option<&BotProfile> {
        match &self.mode {
            GameMode::VersusBot { bot } => Some(bot),
            _ => None,
        }
    }

    /// Selects `square` if the local participant may move its piece.
    fn select(&mut self, square: Square) -> Option<Vec<Square>> {
        let to_move = self.rules.side_to_move();
        let selectable = self.rules.owner_of(square) == Some(to_move)
            && self.assignment().permits(Actor::Local, to_move).is_ok();
        if !selectable {
            self.selection = None;
            return None;
        }
        let targets = self.rules.legal_targets(square);
        debug!(%square, targets = targets.len(), "Piece selected");
        self.selection = Some(square);
        Some(targets)
    }

    fn bot_to_move(&self) -> bool {
        self.assignment().bot_side() == Some(self.rules.side_to_move())
    }

    fn schedule_bot(&mut self) -> BotTicket {
        self.next_ticket += 1;
        let ticket = BotTicket(self.next_ticket);
        self.pending_bot = Some(ticket);
        debug!(?ticket, "Bot move scheduled");
        ticket
    }

    fn ensure_open(&self) -> Result<(), MoveRejection> {
        if self.torn_down || self.outcome.is_some() {
            Err(MoveRejection::GameOver)
        } else {
            Ok(())
        }
    }

    /// Records the outcome, freezes the clocks and cancels the bot.
    fn finish(&mut self, outcome: GameOutcome) {
        self.outcome = Some(outcome);
        self.clock.stop();
        self.pending_bot = None;
        self.selection = None;
        info!(%outcome, result = outcome.result(), "Game over");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn hot_seat() -> GameSession {
        let mut session = GameSession::new("test", GameMode::HotSeat, TimeControl::default());
        session.start();
        session
    }

    fn versus(elo: u32) -> GameSession {
        let mode = GameMode::VersusBot {
            bot: BotProfile::with_strength(elo),
        };
        let mut session = GameSession::new("bot", mode, TimeControl::default());
        session.start();
        session
    }

    #[test]
    fn test_click_select_then_move() {
        let mut session = hot_seat();
        let outcome = session.click(Square::E2);
        assert_eq!(
            outcome,
            ClickOutcome::Selected {
                square: Square::E2,
                targets: vec![Square::E3, Square::E4]
            }
        );
        assert!(matches!(session.click(Square::E4), ClickOutcome::Moved(_)));
        assert_eq!(session.selection(), None);
        assert_eq!(session.rules().moves().len(), 1);
    }

    #[test]
    fn test_failed_move_click_reselects() {
        let mut session = hot_seat();
        session.click(Square::G1);
        let outcome = session.click(Square::B1);
        assert!(matches!(outcome, ClickOutcome::Selected { square: Square::B1, .. }));
        assert!(session.rules().moves().is_empty());
    }

    #[test]
    fn test_click_while_scrubbed_only_returns_live() {
        let mut session = hot_seat();
        session.click(Square::E2);
        session.click(Square::E4);
        assert!(session.step_back());
        assert_eq!(session.click(Square::E7), ClickOutcome::ReturnedToLive);
        assert!(session.cursor().is_live());
        assert_eq!(session.selection(), None);
    }

    #[test]
    fn test_typed_move_while_scrubbed_only_returns_live() {
        let mut session = hot_seat();
        session
            .attempt_move(Actor::Local, "e2e4".parse().unwrap())
            .unwrap();
        assert!(session.step_back());
        assert_eq!(
            session.attempt_move(Actor::Local, "e7e5".parse().unwrap()),
            Err(MoveRejection::ViewingHistory)
        );
        assert!(session.cursor().is_live());
        assert_eq!(session.rules().moves().len(), 1);
        assert!(session.attempt_move(Actor::Local, "e7e5".parse().unwrap()).is_ok());
    }

    #[test]
    fn test_stale_bot_ticket_is_noop() {
        let mut session = versus(1200);
        let applied = session
            .attempt_move(Actor::Local, "e2e4".parse().unwrap())
            .unwrap();
        let ticket = applied.bot_ticket.unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let reply = session.run_bot(ticket, &mut rng).unwrap();
        assert!(reply.is_some());
        assert_eq!(session.rules().moves().len(), 2);

        assert_eq!(session.run_bot(ticket, &mut rng), Ok(None));
        assert_eq!(session.rules().moves().len(), 2);
    }

    #[test]
    fn test_resign_freezes_clock_and_cancels_bot() {
        let mut session = versus(800);
        session
            .attempt_move(Actor::Local, "d2d4".parse().unwrap())
            .unwrap();
        assert!(session.pending_bot().is_some());
        let outcome = session.resign(Side::White).unwrap();
        assert_eq!(outcome.winner(), Some(Side::Black));
        assert!(session.pending_bot().is_none());
        assert!(!session.clock().is_running());
        assert_eq!(session.tick(), None);
        assert_eq!(session.resign(Side::White), Err(MoveRejection::GameOver));
    }

    #[test]
    fn test_draw_offer_depends_on_mode() {
        let mut bot_game = versus(400);
        assert_eq!(bot_game.offer_draw(), Ok(None));
        assert!(!bot_game.is_over());

        let mut shared = hot_seat();
        assert_eq!(
            shared.offer_draw(),
            Ok(Some(GameOutcome::Draw(DrawReason::Agreement)))
        );
    }

    #[test]
    fn test_teardown_makes_everything_noop() {
        let mut session = hot_seat();
        assert!(!session.is_torn_down());
        session.teardown();
        assert!(session.is_torn_down());
        assert_eq!(session.tick(), None);
        assert_eq!(
            session.attempt_move(Actor::Local, "e2e4".parse().unwrap()),
            Err(MoveRejection::GameOver)
        );
    }

    #[test]
    fn test_restore_resumes_clocks_without_reset() {
        let mut session = GameSession::restore(
            "saved",
            GameMode::HotSeat,
            TimeControl::default(),
            &["e2e4", "e7e5"],
            42,
            37,
        )
        .unwrap();
        assert_eq!(session.start(), None);
        assert_eq!(session.clock().white_remaining(), 42);
        assert_eq!(session.clock().black_remaining(), 37);
        assert_eq!(session.rules().side_to_move(), Side::White);
    }
}
