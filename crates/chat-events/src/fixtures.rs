//! Sample data fixtures for testing.
//!
//! This module provides ready-made test data for other crates to use.
//! Enable the `test-fixtures` feature to access these helpers.
//!
//! # Example
//!
//! ```ignore
//! // In your Cargo.toml:
//! // [dev-dependencies]
//! // chat-events = { path = "../chat-events", features = ["test-fixtures"] }
//!
//! use chat_events::fixtures;
//!
//! let messages = fixtures::sample_messages();
//! let cast = fixtures::sample_profiles();
//! ```

use crate::{Message, ParticipantProfile};

/// Returns sample messages from the fixtures file.
///
/// Contains 6 messages between the human (id 0), Mira (id 1), Bo (id 2)
/// and Kes (id 3):
/// - 1 unclassified human message
/// - 1 addressed greeting (high mood)
/// - 2 gossip messages (one addressed with a subject, one vague to the room)
/// - 1 initiative message (mid mood)
/// - 1 room-wide goodbye (low mood)
pub fn sample_messages() -> Vec<Message> {
    let jsonl = include_str!("../tests/fixtures/sample_messages.jsonl");
    jsonl
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            Message::from_jsonl(l).unwrap_or_else(|e| {
                panic!("Failed to parse message line: {}\nError: {}", l, e)
            })
        })
        .collect()
}

/// Returns the participant profiles referenced by [`sample_messages`].
pub fn sample_profiles() -> Vec<ParticipantProfile> {
    let json = include_str!("../tests/fixtures/sample_profiles.json");
    serde_json::from_str(json).expect("Failed to parse sample_profiles.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MessageKind;

    #[test]
    fn test_fixtures_load() {
        let messages = sample_messages();
        assert_eq!(messages.len(), 6);
        assert!(messages.iter().any(|m| m.kind == MessageKind::Gossip && m.about.is_some()));

        let profiles = sample_profiles();
        assert_eq!(profiles.len(), 4);
        assert_eq!(profiles.iter().filter(|p| p.is_human).count(), 1);
    }
}
