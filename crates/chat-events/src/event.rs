//! Chat Event Stream
//!
//! The records a presentation layer receives: roster changes, posted messages
//! and free-text system announcements. Serialized one per line (JSONL).

use serde::{Deserialize, Serialize};

use crate::message::{Message, ParticipantId, ParticipantProfile};
use crate::timestamp::SimTime;

/// One observable change in the chat room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChatEvent {
    ParticipantJoined {
        at: SimTime,
        participant: ParticipantProfile,
    },
    ParticipantLeft {
        at: SimTime,
        participant: ParticipantProfile,
    },
    MessagePosted {
        message: Message,
    },
    SystemAnnouncement {
        at: SimTime,
        text: String,
    },
}

impl ChatEvent {
    /// When the event happened on the session clock.
    pub fn at(&self) -> SimTime {
        match self {
            ChatEvent::ParticipantJoined { at, .. }
            | ChatEvent::ParticipantLeft { at, .. }
            | ChatEvent::SystemAnnouncement { at, .. } => *at,
            ChatEvent::MessagePosted { message } => message.created_at,
        }
    }

    /// Returns the posted message, if this is a message event.
    pub fn message(&self) -> Option<&Message> {
        match self {
            ChatEvent::MessagePosted { message } => Some(message),
            _ => None,
        }
    }

    /// Returns true if the event involves `id` as a roster change or sender.
    pub fn involves(&self, id: ParticipantId) -> bool {
        match self {
            ChatEvent::ParticipantJoined { participant, .. }
            | ChatEvent::ParticipantLeft { participant, .. } => participant.id == id,
            ChatEvent::MessagePosted { message } => {
                message.from.id == id
                    || message.is_addressed_to(id)
                    || message.about.as_ref().is_some_and(|a| a.id == id)
            }
            ChatEvent::SystemAnnouncement { .. } => false,
        }
    }

    /// Serializes to a single JSON line.
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses from a single JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: u32, name: &str) -> ParticipantProfile {
        ParticipantProfile {
            id: ParticipantId(id),
            name: name.to_string(),
            color: "green".to_string(),
            avatar: String::new(),
            personality: "cheerful".to_string(),
            is_human: false,
        }
    }

    #[test]
    fn test_event_tagging() {
        let event = ChatEvent::ParticipantJoined {
            at: SimTime::from_secs(4),
            participant: profile(3, "Chatty"),
        };
        let line = event.to_jsonl().unwrap();
        assert!(line.contains("\"event\":\"participant_joined\""));
        assert_eq!(ChatEvent::from_jsonl(&line).unwrap(), event);
        assert_eq!(event.at(), SimTime::from_secs(4));
        assert!(event.involves(ParticipantId(3)));
        assert!(!event.involves(ParticipantId(4)));
    }

    #[test]
    fn test_announcement_involves_nobody() {
        let event = ChatEvent::SystemAnnouncement {
            at: SimTime::ZERO,
            text: "Welcome".to_string(),
        };
        assert!(!event.involves(ParticipantId(0)));
        assert!(event.message().is_none());
    }
}
