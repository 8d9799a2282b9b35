//! Arena configuration loading.

use std::io::Write;
use std::time::Duration;
use strictly_chess::{ArenaConfig, BotProfile, TimeControl};

#[test]
fn test_load_partial_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "default_bot = \"master-mind\"").unwrap();
    writeln!(file, "[time_control]").unwrap();
    writeln!(file, "minutes = 3").unwrap();
    writeln!(file, "increment_secs = 2").unwrap();

    let config = ArenaConfig::from_file(file.path()).unwrap();
    assert_eq!(config.time_control(), &TimeControl::new(3, 2).unwrap());
    assert_eq!(*config.bot_delay_ms(), 800);
    assert!(BotProfile::find(config.default_bot()).is_some());
    assert_eq!(config.session_options().bot_delay, Duration::from_millis(800));
}

#[test]
fn test_out_of_range_minutes_rejected() {
    let err = ArenaConfig::from_toml("[time_control]\nminutes = 90\n").unwrap_err();
    assert!(err.message.contains("1-60 minutes"));
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ArenaConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.message.contains("Failed to read config file"));
}

#[test]
fn test_default_bot_is_on_roster() {
    let config = ArenaConfig::default();
    assert_eq!(
        BotProfile::find(config.default_bot()).map(|b| *b.elo()),
        Some(400)
    );
}
