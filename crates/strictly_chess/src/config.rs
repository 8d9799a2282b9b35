//! Arena configuration: time control, bot pacing, clock display thresholds.

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Longest base time offered, in minutes.
pub const MAX_MINUTES: u32 = 60;

/// Largest per-move increment, in seconds.
pub const MAX_INCREMENT_SECS: u32 = 60;

/// Base time and per-move increment for both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct TimeControl {
    /// Base time per side, in minutes.
    #[serde(default = "default_minutes")]
    minutes: u32,

    /// Seconds added to the mover's clock after each move.
    #[serde(default)]
    increment_secs: u32,
}

impl TimeControl {
    /// Creates a validated time control.
    #[instrument]
    pub fn new(minutes: u32, increment_secs: u32) -> Result<Self, ConfigError> {
        let control = Self {
            minutes,
            increment_secs,
        };
        control.validate()?;
        Ok(control)
    }

    /// Base time per side in seconds.
    pub fn base_secs(&self) -> u32 {
        self.minutes * 60
    }

    /// Checks the bounds offered by the play screen (1..=60 minutes).
    #[instrument]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_MINUTES).contains(&self.minutes) {
            return Err(ConfigError::new(format!(
                "Time control must be 1-{} minutes, got {}",
                MAX_MINUTES, self.minutes
            )));
        }
        if self.increment_secs > MAX_INCREMENT_SECS {
            return Err(ConfigError::new(format!(
                "Increment must be at most {} seconds, got {}",
                MAX_INCREMENT_SECS, self.increment_secs
            )));
        }
        Ok(())
    }
}

impl Default for TimeControl {
    fn default() -> Self {
        Self {
            minutes: default_minutes(),
            increment_secs: 0,
        }
    }
}

impl std::fmt::Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.minutes, self.increment_secs)
    }
}

/// Configuration file for the arena (`strictly_chess.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Default time control for new games.
    #[serde(default)]
    time_control: TimeControl,

    /// Delay before the bot plays, in milliseconds.
    #[serde(default = "default_bot_delay_ms")]
    bot_delay_ms: u64,

    /// Clocks under this many seconds are shown as critical.
    #[serde(default = "default_critical_threshold_secs")]
    critical_threshold_secs: u32,

    /// Roster id of the default bot opponent.
    #[serde(default = "default_bot")]
    default_bot: String,
}

#[instrument]
fn default_minutes() -> u32 {
    10
}

#[instrument]
fn default_bot_delay_ms() -> u64 {
    800
}

#[instrument]
fn default_critical_threshold_secs() -> u32 {
    30
}

#[instrument]
fn default_bot() -> String {
    "junior".to_string()
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            time_control: TimeControl::default(),
            bot_delay_ms: default_bot_delay_ms(),
            critical_threshold_secs: default_critical_threshold_secs(),
            default_bot: default_bot(),
        }
    }
}

impl ArenaConfig {
    /// Loads configuration from TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ConfigError::new(format!("Failed to read config file: {}", e))
        })?;

        let config = Self::from_toml(&content)?;
        info!(time_control = %config.time_control, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.time_control.validate()?;
        Ok(config)
    }

    /// Session runtime options derived from this configuration.
    #[instrument(skip(self))]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions::default()
            .bot_delay(Duration::from_millis(self.bot_delay_ms))
            .critical_threshold_secs(self.critical_threshold_secs)
    }
}

/// Runtime options for driving one game session.
#[derive(Debug, Clone, PartialEq, Eq, Setters)]
#[setters(into)]
pub struct SessionOptions {
    /// Delay before a scheduled bot move is played.
    pub bot_delay: Duration,
    /// Clocks under this many seconds are flagged critical in views.
    pub critical_threshold_secs: u32,
    /// File the game is saved to after every move, if any.
    #[setters(strip_option)]
    pub autosave: Option<PathBuf>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            bot_delay: Duration::from_millis(default_bot_delay_ms()),
            critical_threshold_secs: default_critical_threshold_secs(),
            autosave: None,
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ArenaConfig::from_toml("").unwrap();
        assert_eq!(config, ArenaConfig::default());
        assert_eq!(*config.time_control().minutes(), 10);
        assert_eq!(*config.bot_delay_ms(), 800);
    }

    #[test]
    fn test_time_control_bounds() {
        assert!(TimeControl::new(0, 0).is_err());
        assert!(TimeControl::new(61, 0).is_err());
        assert!(TimeControl::new(5, 61).is_err());
        let control = TimeControl::new(3, 2).unwrap();
        assert_eq!(control.base_secs(), 180);
        assert_eq!(control.to_string(), "3+2");
    }

    #[test]
    fn test_session_options_follow_config() {
        let config = ArenaConfig::from_toml("bot_delay_ms = 250\ncritical_threshold_secs = 10\n")
            .unwrap();
        let options = config.session_options();
        assert_eq!(options.bot_delay, Duration::from_millis(250));
        assert_eq!(options.critical_threshold_secs, 10);
        assert!(options.autosave.is_none());
    }
}
