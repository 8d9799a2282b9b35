//! Presentation snapshot of a session.
//!
//! A [`SessionView`] is everything a board screen draws: the displayed
//! board (live or scrubbed), both clocks, move hints, the move sheet and the
//! status line. It is rebuilt from the session after every event and never
//! written back.

use crate::clock::format_clock;
use crate::games::chess::{BoardSnapshot, GameOutcome, PieceKind, Side};
use crate::history::HistoryLabel;
use crate::session::GameSession;
use serde::Serialize;
use shakmaty::Square;
use tracing::instrument;

/// One side's clock as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockView {
    /// Side the clock belongs to.
    pub side: Side,
    /// Seconds left.
    pub remaining: u32,
    /// `m:ss` text.
    pub label: String,
    /// True under the critical threshold.
    pub critical: bool,
    /// True while this clock is running.
    pub active: bool,
}

/// One numbered line of the move sheet (`12. Nf3 Nc6`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveSheetRow {
    /// Full-move number.
    pub number: usize,
    /// White's move in SAN.
    pub white: String,
    /// Black's reply, if played.
    pub black: Option<String>,
}

impl std::fmt::Display for MoveSheetRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}. {}", self.number, self.white)?;
        if let Some(black) = &self.black {
            write!(f, " {}", black)?;
        }
        Ok(())
    }
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    /// Board to draw (the scrubbed board while browsing history).
    pub board: BoardSnapshot,
    /// White's clock.
    pub white_clock: ClockView,
    /// Black's clock.
    pub black_clock: ClockView,
    /// Selected square, if any.
    pub selection: Option<Square>,
    /// Hint squares for the selection.
    pub hints: Vec<Square>,
    /// Scrubber label (`live`, `start`, `1... e5`).
    pub history_label: String,
    /// True while the board shows the live position.
    pub live: bool,
    /// Move sheet, one row per full move.
    pub move_sheet: Vec<MoveSheetRow>,
    /// Ply highlighted on the move sheet.
    pub highlighted_ply: Option<usize>,
    /// Pieces white has taken.
    pub captured_by_white: Vec<PieceKind>,
    /// Pieces black has taken.
    pub captured_by_black: Vec<PieceKind>,
    /// Side to move in the live position.
    pub to_move: Side,
    /// True if the side to move is in check.
    pub in_check: bool,
    /// Final outcome, once the game is over.
    pub outcome: Option<GameOutcome>,
}

impl SessionView {
    /// Builds the view of a session.
    #[instrument(skip(session), fields(session_id = %session.id()))]
    pub fn of(session: &GameSession, critical_threshold_secs: u32) -> Self {
        let rules = session.rules();
        let clock = session.clock();
        let to_move = rules.side_to_move();

        let clock_view = |side: Side| {
            let remaining = clock.remaining(side);
            ClockView {
                side,
                remaining,
                label: format_clock(remaining),
                critical: clock.is_critical(side, critical_threshold_secs),
                active: clock.is_running() && side == to_move,
            }
        };

        let hints = match (session.cursor().is_live(), session.selection()) {
            (true, Some(square)) => session.legal_targets(square),
            _ => Vec::new(),
        };

        let (captured_by_white, captured_by_black) = captured_pieces(session);
        let label: HistoryLabel = session.history_label();

        Self {
            board: session.cursor().displayed(rules),
            white_clock: clock_view(Side::White),
            black_clock: clock_view(Side::Black),
            selection: session.selection(),
            hints,
            history_label: label.to_string(),
            live: session.cursor().is_live(),
            move_sheet: move_sheet(session),
            highlighted_ply: session.cursor().highlighted_ply(rules),
            captured_by_white,
            captured_by_black,
            to_move,
            in_check: rules.is_check(),
            outcome: session.outcome(),
        }
    }

    /// Status line: the result, or whose move it is.
    pub fn status(&self) -> String {
        match &self.outcome {
            Some(outcome) => outcome.to_string(),
            None if self.in_check => format!("{} to move (check)", self.to_move),
            None => format!("{} to move", self.to_move),
        }
    }

    /// Renders the view as plain text for a terminal.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&clock_line(&self.black_clock, &self.captured_by_black));
        out.push('\n');
        out.push_str(&self.board.display());
        out.push('\n');
        out.push_str(&clock_line(&self.white_clock, &self.captured_by_white));
        out.push('\n');

        if !self.live {
            out.push_str(&format!("[history: {}]\n", self.history_label));
        }

        let last_rows: Vec<String> = self
            .move_sheet
            .iter()
            .rev()
            .take(3)
            .rev()
            .map(|row| row.to_string())
            .collect();
        if !last_rows.is_empty() {
            out.push_str(&last_rows.join("  "));
            out.push('\n');
        }

        out.push_str(&self.status());
        out
    }
}

fn clock_line(clock: &ClockView, captured: &[PieceKind]) -> String {
    let marker = if clock.active { ">" } else { " " };
    let urgency = if clock.critical { " !" } else { "" };
    let taken: String = captured.iter().map(|kind| kind.letter()).collect();
    format!("{} {:<5} {:>6}{} {}", marker, clock.side, clock.label, urgency, taken)
        .trim_end()
        .to_string()
}

/// Move sheet rows in SAN, numbered by full move.
pub fn move_sheet(session: &GameSession) -> Vec<MoveSheetRow> {
    session
        .rules()
        .moves()
        .chunks(2)
        .enumerate()
        .map(|(index, pair)| MoveSheetRow {
            number: index + 1,
            white: pair[0].san().to_string(),
            black: pair.get(1).map(|m| m.san().to_string()),
        })
        .collect()
}

/// Pieces taken by white and by black, in capture order.
pub fn captured_pieces(session: &GameSession) -> (Vec<PieceKind>, Vec<PieceKind>) {
    let mut by_white = Vec::new();
    let mut by_black = Vec::new();
    for played in session.rules().moves() {
        if let Some(kind) = played.captured() {
            match played.side() {
                Side::White => by_white.push(kind),
                Side::Black => by_black.push(kind),
            }
        }
    }
    (by_white, by_black)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbiter::GameMode;
    use crate::config::TimeControl;
    use crate::games::chess::Actor;

    fn session_with(moves: &[&str]) -> GameSession {
        let mut session = GameSession::new("view", GameMode::HotSeat, TimeControl::default());
        session.start();
        for uci in moves {
            session
                .attempt_move(Actor::Local, uci.parse().unwrap())
                .unwrap();
        }
        session
    }

    #[test]
    fn test_move_sheet_pairs_moves() {
        let session = session_with(&["e2e4", "e7e5", "g1f3"]);
        let rows = move_sheet(&session);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].to_string(), "1. e4 e5");
        assert_eq!(rows[1].to_string(), "2. Nf3");
    }

    #[test]
    fn test_captures_are_split_by_side() {
        let session = session_with(&["e2e4", "d7d5", "e4d5", "d8d5"]);
        let (by_white, by_black) = captured_pieces(&session);
        assert_eq!(by_white, vec![PieceKind::Pawn]);
        assert_eq!(by_black, vec![PieceKind::Pawn]);
    }

    #[test]
    fn test_view_marks_active_clock_and_hints() {
        let mut session = session_with(&[]);
        session.click(Square::G1);
        let view = SessionView::of(&session, 30);
        assert!(view.white_clock.active);
        assert!(!view.black_clock.active);
        assert_eq!(view.white_clock.label, "10:00");
        assert_eq!(view.hints, vec![Square::F3, Square::H3]);
        assert_eq!(view.status(), "white to move");
    }

    #[test]
    fn test_scrubbed_view_shows_history() {
        let mut session = session_with(&["e2e4"]);
        session.step_back();
        let view = SessionView::of(&session, 30);
        assert!(!view.live);
        assert_eq!(view.history_label, "start");
        assert_eq!(view.highlighted_ply, None);
        assert!(view.render_text().contains("[history: start]"));
    }
}
