//! Named bot opponents.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// A bot opponent. Its strength is its rating.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, Serialize, Deserialize)]
pub struct BotProfile {
    /// Stable identifier (`casual-carl`).
    id: String,
    /// Display name (`Casual Carl`).
    name: String,
    /// Rating, used as the heuristic strength.
    elo: u32,
    /// One-line description for the opponent picker.
    description: String,
}

impl BotProfile {
    /// Creates a profile.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        elo: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            elo,
            description: description.into(),
        }
    }

    /// An anonymous bot of the given strength.
    pub fn with_strength(elo: u32) -> Self {
        Self::new(
            format!("custom-{}", elo),
            format!("Bot {}", elo),
            elo,
            "Custom strength",
        )
    }

    /// Looks up a roster bot by id or by name, ignoring case.
    #[instrument]
    pub fn find(key: &str) -> Option<Self> {
        roster()
            .into_iter()
            .find(|bot| bot.id.eq_ignore_ascii_case(key) || bot.name.eq_ignore_ascii_case(key))
    }
}

/// The opponents offered on the play screen, weakest first.
pub fn roster() -> Vec<BotProfile> {
    vec![
        BotProfile::new(
            "junior",
            "Junior",
            400,
            "Learning the rules. Makes random moves.",
        ),
        BotProfile::new(
            "casual-carl",
            "Casual Carl",
            800,
            "Plays occasionally. Blunders often.",
        ),
        BotProfile::new(
            "strategic-sarah",
            "Strategic Sarah",
            1200,
            "Solid fundamentals. Hard to trick.",
        ),
        BotProfile::new(
            "tactical-tom",
            "Tactical Tom",
            1600,
            "Aggressive style. Watch your queen!",
        ),
        BotProfile::new(
            "master-mind",
            "Master Mind",
            2200,
            "Fide Master level. Very few mistakes.",
        ),
        BotProfile::new(
            "deep-blue",
            "Deep Blue",
            3000,
            "Super Grandmaster engine. Unbeatable.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_is_sorted_by_strength() {
        let bots = roster();
        assert_eq!(bots.len(), 6);
        assert!(bots.windows(2).all(|pair| pair[0].elo() < pair[1].elo()));
    }

    #[test]
    fn test_find_by_id_or_name() {
        assert_eq!(*BotProfile::find("deep-blue").unwrap().elo(), 3000);
        assert_eq!(BotProfile::find("Casual Carl").unwrap().id(), "casual-carl");
        assert!(BotProfile::find("nobody").is_none());
    }

    #[test]
    fn test_top_bots_describe_their_titles() {
        let master = BotProfile::find("master-mind").unwrap();
        assert_eq!(master.description(), "Fide Master level. Very few mistakes.");
        let engine = BotProfile::find("deep-blue").unwrap();
        assert_eq!(engine.description(), "Super Grandmaster engine. Unbeatable.");
    }
}
