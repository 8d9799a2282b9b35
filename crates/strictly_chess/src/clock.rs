//! Per-side countdown clocks.
//!
//! The clock never decides whose turn it is: every [`ClockEngine::tick`]
//! is told the side to move, read from the live position at the instant
//! the tick is delivered. Starting is one-shot per game, so re-creating
//! views or re-running setup code can never reset elapsed time.

use crate::config::TimeControl;
use crate::games::chess::Side;
use tracing::{debug, info, instrument, warn};

/// What a delivered tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockSignal {
    /// One second was taken from `side`.
    Ticked {
        /// Side whose clock ran.
        side: Side,
        /// Seconds left for that side.
        remaining: u32,
    },
    /// `side` just reached zero. Raised once per game.
    Timeout(Side),
}

/// Clock state for both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockEngine {
    white_remaining: u32,
    black_remaining: u32,
    increment_secs: u32,
    started: bool,
    running: bool,
    flagged: Option<Side>,
}

impl ClockEngine {
    /// Creates an unstarted clock with no time on it.
    #[instrument]
    pub fn new() -> Self {
        Self {
            white_remaining: 0,
            black_remaining: 0,
            increment_secs: 0,
            started: false,
            running: false,
            flagged: None,
        }
    }

    /// Sets both clocks from the time control and starts running.
    ///
    /// Returns `false` (and changes nothing) if this clock was already
    /// started for the current game.
    #[instrument(skip(self), fields(time_control = %control))]
    pub fn start(&mut self, control: &TimeControl) -> bool {
        self.resume(
            control.base_secs(),
            control.base_secs(),
            *control.increment_secs(),
        )
    }

    /// Starts running from explicit remaining times (resuming a saved game).
    ///
    /// Shares the one-shot guard with [`ClockEngine::start`].
    #[instrument(skip(self))]
    pub fn resume(&mut self, white_remaining: u32, black_remaining: u32, increment_secs: u32) -> bool {
        if self.started {
            warn!("Clock already started for this game, ignoring");
            return false;
        }
        self.white_remaining = white_remaining;
        self.black_remaining = black_remaining;
        self.increment_secs = increment_secs;
        self.started = true;
        self.running = true;
        info!(white_remaining, black_remaining, increment_secs, "Clock started");
        true
    }

    /// Takes one second from the side to move.
    ///
    /// Returns `None` when the clock is not running (not started, stopped
    /// at game over, or already flagged).
    #[instrument(skip(self))]
    pub fn tick(&mut self, to_move: Side) -> Option<ClockSignal> {
        if !self.running {
            debug!("Tick ignored, clock not running");
            return None;
        }

        let remaining = self.remaining_mut(to_move);
        *remaining = remaining.saturating_sub(1);
        let left = *remaining;

        if left == 0 {
            self.running = false;
            self.flagged = Some(to_move);
            info!(side = %to_move, "Clock flagged");
            return Some(ClockSignal::Timeout(to_move));
        }

        debug!(side = %to_move, remaining = left, "Tick");
        Some(ClockSignal::Ticked {
            side: to_move,
            remaining: left,
        })
    }

    /// Adds the increment to the side that just moved.
    #[instrument(skip(self))]
    pub fn credit_increment(&mut self, mover: Side) {
        if !self.running || self.increment_secs == 0 {
            return;
        }
        let increment = self.increment_secs;
        let remaining = self.remaining_mut(mover);
        *remaining = remaining.saturating_add(increment);
        debug!(side = %mover, remaining = *remaining, "Increment credited");
    }

    /// Freezes both clocks at their current values.
    #[instrument(skip(self))]
    pub fn stop(&mut self) {
        if self.running {
            info!(
                white_remaining = self.white_remaining,
                black_remaining = self.black_remaining,
                "Clock stopped"
            );
        }
        self.running = false;
    }

    /// Seconds left for `side`.
    pub fn remaining(&self, side: Side) -> u32 {
        match side {
            Side::White => self.white_remaining,
            Side::Black => self.black_remaining,
        }
    }

    /// Seconds left for white.
    pub fn white_remaining(&self) -> u32 {
        self.white_remaining
    }

    /// Seconds left for black.
    pub fn black_remaining(&self) -> u32 {
        self.black_remaining
    }

    /// Seconds credited per move.
    pub fn increment_secs(&self) -> u32 {
        self.increment_secs
    }

    /// True once the clock has been started for this game.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// True while ticks take time off.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Side whose clock reached zero, if any.
    pub fn flagged(&self) -> Option<Side> {
        self.flagged
    }

    /// True when `side` has less than `threshold_secs` left.
    pub fn is_critical(&self, side: Side, threshold_secs: u32) -> bool {
        self.remaining(side) < threshold_secs
    }

    fn remaining_mut(&mut self, side: Side) -> &mut u32 {
        match side {
            Side::White => &mut self.white_remaining,
            Side::Black => &mut self.black_remaining,
        }
    }
}

impl Default for ClockEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats seconds as `m:ss`.
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(minutes: u32, increment: u32) -> ClockEngine {
        let mut clock = ClockEngine::new();
        assert!(clock.start(&TimeControl::new(minutes, increment).unwrap()));
        clock
    }

    #[test]
    fn test_unstarted_clock_ignores_ticks() {
        let mut clock = ClockEngine::new();
        assert_eq!(clock.tick(Side::White), None);
        assert_eq!(clock.white_remaining(), 0);
    }

    #[test]
    fn test_start_is_one_shot() {
        let mut clock = started(1, 0);
        clock.tick(Side::White);
        assert_eq!(clock.white_remaining(), 59);

        assert!(!clock.start(&TimeControl::new(5, 0).unwrap()));
        assert_eq!(clock.white_remaining(), 59);
        assert_eq!(clock.black_remaining(), 60);
    }

    #[test]
    fn test_tick_only_touches_side_to_move() {
        let mut clock = started(1, 0);
        assert_eq!(
            clock.tick(Side::Black),
            Some(ClockSignal::Ticked {
                side: Side::Black,
                remaining: 59
            })
        );
        assert_eq!(clock.white_remaining(), 60);
    }

    #[test]
    fn test_timeout_raised_once() {
        let mut clock = ClockEngine::new();
        clock.resume(2, 60, 0);
        assert!(matches!(clock.tick(Side::White), Some(ClockSignal::Ticked { .. })));
        assert_eq!(clock.tick(Side::White), Some(ClockSignal::Timeout(Side::White)));
        assert_eq!(clock.tick(Side::White), None);
        assert_eq!(clock.tick(Side::Black), None);
        assert_eq!(clock.white_remaining(), 0);
        assert_eq!(clock.flagged(), Some(Side::White));
    }

    #[test]
    fn test_increment_credited_while_running() {
        let mut clock = started(1, 5);
        clock.tick(Side::White);
        clock.credit_increment(Side::White);
        assert_eq!(clock.white_remaining(), 64);

        clock.stop();
        clock.credit_increment(Side::Black);
        assert_eq!(clock.black_remaining(), 60);
    }

    #[test]
    fn test_stop_freezes_values() {
        let mut clock = started(1, 0);
        clock.tick(Side::White);
        clock.stop();
        assert_eq!(clock.tick(Side::White), None);
        assert_eq!(clock.white_remaining(), 59);
        assert!(clock.is_started());
        assert!(!clock.is_running());
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(600), "10:00");
        assert_eq!(format_clock(59), "0:59");
        assert_eq!(format_clock(61), "1:01");
    }

    #[test]
    fn test_critical_threshold() {
        let mut clock = ClockEngine::new();
        clock.resume(30, 29, 0);
        assert!(!clock.is_critical(Side::White, 30));
        assert!(clock.is_critical(Side::Black, 30));
    }
}
