//! Event loop for one game.
//!
//! Everything that changes a session (one-second ticks, board input, the
//! delayed bot reply, remote moves) arrives here and is handled to
//! completion before the next event is polled. A tick therefore always sees
//! the position as left by the last complete move.

use crate::arbiter::GameMode;
use crate::config::SessionOptions;
use crate::games::chess::{Actor, AnnotatedMove, GameOutcome, MoveFeedback, MoveRejection, MoveRequest};
use crate::history::HistoryLabel;
use crate::persistence::SavedGame;
use crate::relay::{MoveRelay, MoveSubmission, spawn_relay};
use crate::session::{BotTicket, ClickOutcome, GameSession, MoveApplied};
use crate::view::SessionView;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use shakmaty::Square;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, instrument, warn};

const TICK: Duration = Duration::from_secs(1);

/// Input to a running game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Click on a board square.
    Click(Square),
    /// A typed move from the local participant.
    Move(MoveRequest),
    /// A move from the online opponent, in UCI notation.
    Remote(String),
    /// Scrub one ply back.
    StepBack,
    /// Scrub one ply forward.
    StepForward,
    /// Return the board to the live position.
    JumpLive,
    /// The local participant resigns.
    Resign,
    /// The local participant offers a draw.
    OfferDraw,
    /// Leave the game screen.
    Teardown,
}

/// Output of a running game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Clocks are running.
    Started {
        /// White's clock in seconds.
        white: u32,
        /// Black's clock in seconds.
        black: u32,
    },
    /// A move was applied.
    MoveApplied {
        /// The move.
        played: AnnotatedMove,
        /// Who made it.
        by: Actor,
        /// Sound cue for it.
        feedback: MoveFeedback,
    },
    /// A piece was selected.
    Selected {
        /// Selected square.
        square: Square,
        /// Hint squares.
        targets: Vec<Square>,
    },
    /// A move or command was refused.
    Rejected(MoveRejection),
    /// One second went by.
    ClockTick {
        /// White's clock in seconds.
        white: u32,
        /// Black's clock in seconds.
        black: u32,
    },
    /// The displayed board changed without a move.
    HistoryMoved(HistoryLabel),
    /// The bot is about to move.
    BotThinking,
    /// The opponent declined a draw offer.
    DrawDeclined,
    /// The game ended.
    GameOver(GameOutcome),
}

/// Drives one [`GameSession`].
pub struct Orchestrator {
    session: GameSession,
    options: SessionOptions,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<GameEvent>,
    relay: Option<Box<dyn MoveRelay>>,
    outbox: Option<mpsc::UnboundedSender<MoveSubmission>>,
    views: Option<watch::Sender<SessionView>>,
    rng: StdRng,
    bot_due_tx: mpsc::UnboundedSender<BotTicket>,
    bot_due_rx: mpsc::UnboundedReceiver<BotTicket>,
    bot_timer: Option<JoinHandle<()>>,
}

impl Orchestrator {
    /// Creates an orchestrator for a session.
    pub fn new(
        session: GameSession,
        options: SessionOptions,
        commands: mpsc::UnboundedReceiver<Command>,
        events: mpsc::UnboundedSender<GameEvent>,
    ) -> Self {
        let (bot_due_tx, bot_due_rx) = mpsc::unbounded_channel();
        Self {
            session,
            options,
            commands,
            events,
            relay: None,
            outbox: None,
            views: None,
            rng: StdRng::from_os_rng(),
            bot_due_tx,
            bot_due_rx,
            bot_timer: None,
        }
    }

    /// Publishes local moves through `relay` (online games).
    ///
    /// The relay runs on its own task once the game starts, so a slow
    /// submission never holds up ticks or input.
    pub fn with_relay(mut self, relay: Box<dyn MoveRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    /// Publishes a fresh [`SessionView`] ahead of every event.
    pub fn with_views(mut self, views: watch::Sender<SessionView>) -> Self {
        self.views = Some(views);
        self
    }

    /// Replaces the bot's random source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Session being driven.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Runs until the game ends, the session is torn down, or the command
    /// channel closes.
    ///
    /// Returns the outcome, or `None` if the game was abandoned.
    #[instrument(skip(self), fields(session_id = %self.session.id()))]
    pub async fn run(mut self) -> Result<Option<GameOutcome>> {
        info!(mode = %self.session.mode().label(), "Starting game orchestration");

        if let Some(relay) = self.relay.take() {
            let (outbox, _task) = spawn_relay(relay);
            self.outbox = Some(outbox);
        }

        if let Some(ticket) = self.session.start() {
            self.schedule_bot(ticket)?;
        }
        self.emit(GameEvent::Started {
            white: self.session.clock().white_remaining(),
            black: self.session.clock().black_remaining(),
        })?;

        let mut ticker = interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !self.session.is_over() {
            let clock_running = self.session.clock().is_running();
            tokio::select! {
                biased;
                command = self.commands.recv() => match command {
                    Some(Command::Teardown) | None => {
                        self.teardown();
                        return Ok(None);
                    }
                    Some(command) => self.handle(command)?,
                },
                Some(ticket) = self.bot_due_rx.recv() => self.play_bot(ticket)?,
                _ = ticker.tick(), if clock_running => self.on_tick()?,
            }
        }

        self.cancel_bot_timer();
        let outcome = self.session.outcome();
        if let Some(outcome) = outcome {
            if let Some(path) = &self.options.autosave {
                if let Err(e) = SavedGame::remove(path) {
                    warn!(error = %e, "Could not remove saved game");
                }
            }
            self.emit(GameEvent::GameOver(outcome))?;
        }
        Ok(outcome)
    }

    #[instrument(skip(self))]
    fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Click(square) => match self.session.click(square) {
                ClickOutcome::Moved(applied) => self.after_move(applied)?,
                ClickOutcome::Selected { square, targets } => {
                    self.emit(GameEvent::Selected { square, targets })?
                }
                ClickOutcome::ReturnedToLive => self.emit_history()?,
                ClickOutcome::Rejected(rejection) => self.emit(GameEvent::Rejected(rejection))?,
                ClickOutcome::Deselected | ClickOutcome::Ignored => {}
            },
            Command::Move(request) => match self.session.attempt_move(Actor::Local, request) {
                Err(MoveRejection::ViewingHistory) => self.emit_history()?,
                result => self.settle(result)?,
            },
            Command::Remote(uci) => {
                let result = self.session.apply_remote(&uci);
                self.settle(result)?;
            }
            Command::StepBack => {
                if self.session.step_back() {
                    self.emit_history()?;
                }
            }
            Command::StepForward => {
                if self.session.step_forward() {
                    self.emit_history()?;
                }
            }
            Command::JumpLive => {
                self.session.jump_live();
                self.emit_history()?;
            }
            Command::Resign => {
                let side = self.session.local_side();
                if let Err(rejection) = self.session.resign(side) {
                    self.emit(GameEvent::Rejected(rejection))?;
                }
            }
            Command::OfferDraw => match self.session.offer_draw() {
                Ok(Some(_)) => {}
                Ok(None) => self.emit(GameEvent::DrawDeclined)?,
                Err(rejection) => self.emit(GameEvent::Rejected(rejection))?,
            },
            Command::Teardown => self.teardown(),
        }
        Ok(())
    }

    fn settle(&mut self, result: std::result::Result<MoveApplied, MoveRejection>) -> Result<()> {
        match result {
            Ok(applied) => self.after_move(applied),
            Err(rejection) => {
                warn!(%rejection, "Move rejected");
                self.emit(GameEvent::Rejected(rejection))
            }
        }
    }

    /// Publishes, saves and schedules the reply after a successful move.
    #[instrument(skip(self, applied), fields(san = %applied.played.san(), by = %applied.actor))]
    fn after_move(&mut self, applied: MoveApplied) -> Result<()> {
        if applied.actor == Actor::Local {
            self.publish(&applied.played);
        }
        if applied.outcome.is_none() {
            self.autosave();
        }
        let feedback = applied.played.feedback();
        self.emit(GameEvent::MoveApplied {
            played: applied.played,
            by: applied.actor,
            feedback,
        })?;
        if let Some(ticket) = applied.bot_ticket {
            self.schedule_bot(ticket)?;
        }
        Ok(())
    }

    fn play_bot(&mut self, ticket: BotTicket) -> Result<()> {
        self.bot_timer = None;
        match self.session.run_bot(ticket, &mut self.rng) {
            Ok(Some(applied)) => self.after_move(applied),
            Ok(None) => Ok(()),
            Err(rejection) => {
                warn!(%rejection, "Bot move rejected");
                self.emit(GameEvent::Rejected(rejection))
            }
        }
    }

    fn on_tick(&mut self) -> Result<()> {
        if self.session.tick().is_some() {
            self.emit(GameEvent::ClockTick {
                white: self.session.clock().white_remaining(),
                black: self.session.clock().black_remaining(),
            })?;
        }
        Ok(())
    }

    /// Arms the bot timer, replacing any pending one.
    #[instrument(skip(self))]
    fn schedule_bot(&mut self, ticket: BotTicket) -> Result<()> {
        self.cancel_bot_timer();
        let delay = self.options.bot_delay;
        let due = self.bot_due_tx.clone();
        self.bot_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // the loop may already be gone
            let _ = due.send(ticket);
        }));
        debug!(?delay, "Bot timer armed");
        self.emit(GameEvent::BotThinking)
    }

    fn cancel_bot_timer(&mut self) {
        if let Some(timer) = self.bot_timer.take() {
            timer.abort();
            debug!("Bot timer cancelled");
        }
    }

    fn teardown(&mut self) {
        self.cancel_bot_timer();
        self.session.teardown();
    }

    /// Queues a local move for the relay task.
    fn publish(&self, played: &AnnotatedMove) {
        let GameMode::Online { game_id, .. } = self.session.mode() else {
            return;
        };
        let Some(outbox) = &self.outbox else {
            return;
        };
        let submission = MoveSubmission::new(
            game_id.clone(),
            played.ply(),
            played.uci().to_string(),
            self.session.rules().fen(),
        );
        if outbox.send(submission).is_err() {
            warn!("Relay task gone, move not published");
        }
    }

    fn autosave(&self) {
        let Some(path) = &self.options.autosave else {
            return;
        };
        if let Err(e) = SavedGame::capture(&self.session).save(path) {
            warn!(error = %e, "Autosave failed");
        }
    }

    fn emit_history(&self) -> Result<()> {
        self.emit(GameEvent::HistoryMoved(self.session.history_label()))
    }

    fn emit(&self, event: GameEvent) -> Result<()> {
        if let Some(views) = &self.views {
            views.send_replace(SessionView::of(
                &self.session,
                self.options.critical_threshold_secs,
            ));
        }
        self.events
            .send(event)
            .context("Game event receiver dropped")
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.cancel_bot_timer();
    }
}
