//! Line-oriented terminal client.
//!
//! Reads moves and commands from stdin, prints the board after every event
//! except clock ticks, and returns when the game ends.

use anyhow::{Context, Result};
use shakmaty::Square;
use strictly_chess::{
    Command, GameEvent, GameSession, MoveRequest, Orchestrator, SessionOptions, SessionView,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument};

const HELP: &str = "moves: e2e4, e7e8q or e2 e4 | select: e2 | back, forward, live, resign, draw, quit";

/// What a line of input means.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Send(Command),
    Help,
    Invalid(String),
}

fn parse_input(line: &str) -> Input {
    let text = line.trim().to_ascii_lowercase();
    match text.as_str() {
        "" | "help" | "?" => Input::Help,
        "back" | "b" => Input::Send(Command::StepBack),
        "forward" | "f" => Input::Send(Command::StepForward),
        "live" | "l" => Input::Send(Command::JumpLive),
        "resign" => Input::Send(Command::Resign),
        "draw" => Input::Send(Command::OfferDraw),
        "quit" | "q" | "exit" => Input::Send(Command::Teardown),
        _ => {
            if let Ok(square) = text.parse::<Square>() {
                return Input::Send(Command::Click(square));
            }
            match text.parse::<MoveRequest>() {
                Ok(request) => Input::Send(Command::Move(request)),
                Err(e) => Input::Invalid(e.to_string()),
            }
        }
    }
}

/// Plays one session in the terminal.
#[instrument(skip_all, fields(session_id = %session.id()))]
pub async fn play(session: GameSession, options: SessionOptions) -> Result<()> {
    let critical = options.critical_threshold_secs;
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (view_tx, view_rx) = watch::channel(SessionView::of(&session, critical));

    let orchestrator = Orchestrator::new(session, options, command_rx, event_tx).with_views(view_tx);
    let game = tokio::spawn(orchestrator.run());

    let input_tx = command_tx.clone();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_input(&line) {
                Input::Send(command) => {
                    if input_tx.send(command).is_err() {
                        break;
                    }
                }
                Input::Help => println!("{}", HELP),
                Input::Invalid(message) => println!("{} ({})", message, HELP),
            }
        }
        debug!("Input closed");
    });

    println!("{}", HELP);
    while let Some(event) = event_rx.recv().await {
        match &event {
            GameEvent::ClockTick { .. } => continue,
            GameEvent::MoveApplied { played, by, feedback } => {
                println!("\n{} {} ({})", by, played.san(), feedback);
            }
            GameEvent::Selected { square, targets } => {
                let hints: Vec<String> = targets.iter().map(|t| t.to_string()).collect();
                println!("{} selected: {}", square, hints.join(" "));
                continue;
            }
            GameEvent::Rejected(rejection) => {
                println!("{}", rejection);
                continue;
            }
            GameEvent::BotThinking => {
                println!("Bot is thinking...");
                continue;
            }
            GameEvent::DrawDeclined => {
                println!("Draw offer declined");
                continue;
            }
            GameEvent::Started { .. } | GameEvent::HistoryMoved(_) | GameEvent::GameOver(_) => {}
        }
        println!("{}", view_rx.borrow().render_text());
    }

    reader.abort();
    drop(command_tx);
    let outcome = game.await.context("Game task panicked")??;
    match outcome {
        Some(outcome) => info!(%outcome, "Game finished"),
        None => println!("Game left unfinished"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_navigation_words() {
        assert_eq!(parse_input("back"), Input::Send(Command::StepBack));
        assert_eq!(parse_input(" Forward "), Input::Send(Command::StepForward));
        assert_eq!(parse_input("q"), Input::Send(Command::Teardown));
    }

    #[test]
    fn test_parse_square_and_moves() {
        assert_eq!(parse_input("e2"), Input::Send(Command::Click(Square::E2)));
        assert_eq!(
            parse_input("e2 e4"),
            Input::Send(Command::Move(MoveRequest::new(Square::E2, Square::E4)))
        );
        assert!(matches!(parse_input("xyz"), Input::Invalid(_)));
    }
}
