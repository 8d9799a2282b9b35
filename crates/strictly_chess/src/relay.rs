//! Online-mode boundary.
//!
//! The backend is out of scope; the core only needs somewhere to send the
//! local side's moves and a feed of the opponent's moves. Outgoing moves go
//! through a [`MoveRelay`]. Incoming moves are turned into
//! [`Command::Remote`] and enter the same pipeline as clicks.

use crate::orchestrator::Command;
use anyhow::{Context, Result};
use async_trait::async_trait;
use derive_new::new;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// A locally made move, as published to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct MoveSubmission {
    /// Backend identifier of the game.
    pub game_id: String,
    /// Zero-based ply of the move.
    pub ply: usize,
    /// The move in UCI notation.
    pub uci: String,
    /// Position after the move.
    pub fen: String,
}

/// Outgoing half of an online connection.
#[async_trait]
pub trait MoveRelay: Send {
    /// Publishes a local move. Fire-and-forget from the game's view: a
    /// failure is logged, never rolled back.
    async fn submit(&mut self, submission: MoveSubmission) -> Result<()>;
}

/// Relay over an in-process channel, for tests and for bridging to a
/// transport task.
#[derive(Debug, Clone)]
pub struct ChannelRelay {
    outgoing: mpsc::UnboundedSender<MoveSubmission>,
}

impl ChannelRelay {
    /// Creates a relay and the receiver its submissions arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MoveSubmission>) {
        let (outgoing, rx) = mpsc::unbounded_channel();
        (Self { outgoing }, rx)
    }
}

#[async_trait]
impl MoveRelay for ChannelRelay {
    #[instrument(skip(self), fields(game_id = %submission.game_id, ply = submission.ply))]
    async fn submit(&mut self, submission: MoveSubmission) -> Result<()> {
        debug!(uci = %submission.uci, "Submitting move");
        self.outgoing
            .send(submission)
            .context("Move relay channel closed")?;
        Ok(())
    }
}

/// Moves a relay onto its own task.
///
/// Submissions sent on the returned channel are delivered in order, one at
/// a time, while the caller carries on. The task ends once every sender is
/// dropped and the queue is drained.
#[instrument(skip_all)]
pub fn spawn_relay(
    mut relay: Box<dyn MoveRelay>,
) -> (mpsc::UnboundedSender<MoveSubmission>, JoinHandle<()>) {
    let (outbox, mut queue) = mpsc::unbounded_channel::<MoveSubmission>();
    let task = tokio::spawn(async move {
        while let Some(submission) = queue.recv().await {
            let ply = submission.ply;
            if let Err(e) = relay.submit(submission).await {
                warn!(ply, error = %e, "Move submission failed");
            }
        }
        debug!("Relay queue closed");
    });
    (outbox, task)
}

/// Forwards the opponent's moves (UCI text) into a session's command
/// channel until either side closes.
#[instrument(skip_all)]
pub fn forward_remote(
    mut remote: mpsc::UnboundedReceiver<String>,
    commands: mpsc::UnboundedSender<Command>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(uci) = remote.recv().await {
            debug!(%uci, "Remote move received");
            if commands.send(Command::Remote(uci)).is_err() {
                warn!("Session gone, dropping remote feed");
                return;
            }
        }
        info!("Remote feed closed");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channel_relay_delivers_submissions() {
        let (mut relay, mut rx) = ChannelRelay::new();
        let submission = MoveSubmission::new("g1".to_string(), 0, "e2e4".to_string(), "fen".to_string());
        relay.submit(submission.clone()).await.unwrap();
        assert_eq!(rx.recv().await, Some(submission));
    }

    #[tokio::test]
    async fn test_closed_channel_is_an_error() {
        let (mut relay, rx) = ChannelRelay::new();
        drop(rx);
        let submission = MoveSubmission::new("g1".to_string(), 0, "e2e4".to_string(), "fen".to_string());
        assert!(relay.submit(submission).await.is_err());
    }

    #[tokio::test]
    async fn test_spawned_relay_keeps_order() {
        let (relay, mut rx) = ChannelRelay::new();
        let (outbox, task) = spawn_relay(Box::new(relay));
        for (ply, uci) in ["e2e4", "g1f3"].into_iter().enumerate() {
            outbox
                .send(MoveSubmission::new("g1".to_string(), ply, uci.to_string(), "fen".to_string()))
                .unwrap();
        }
        drop(outbox);
        task.await.unwrap();
        assert_eq!(rx.recv().await.map(|s| s.uci), Some("e2e4".to_string()));
        assert_eq!(rx.recv().await.map(|s| s.uci), Some("g1f3".to_string()));
    }

    #[tokio::test]
    async fn test_forward_remote_wraps_commands() {
        let (remote_tx, remote_rx) = mpsc::unbounded_channel();
        let (command_tx, mut command_rx) = mpsc::unbounded_channel();
        let handle = forward_remote(remote_rx, command_tx);
        remote_tx.send("e7e5".to_string()).unwrap();
        drop(remote_tx);
        handle.await.unwrap();
        assert!(matches!(command_rx.recv().await, Some(Command::Remote(uci)) if uci == "e7e5"));
    }
}
