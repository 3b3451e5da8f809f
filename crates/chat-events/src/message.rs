//! Message Types
//!
//! Participants, message kinds, mood bands and the immutable message record
//! shared between the engine and presentation layers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::timestamp::SimTime;

/// Upper bound (exclusive) of the low mood band.
pub const LOW_BAND_CEILING: f32 = 0.33;

/// Upper bound (exclusive) of the mid mood band.
pub const MID_BAND_CEILING: f32 = 0.66;

/// Unique identifier for a participant, stable for the session lifetime.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "participant_{:04}", self.0)
    }
}

/// Sequential identifier for a posted message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg_{:08}", self.0)
    }
}

/// Lightweight reference to a participant, captured when a message is composed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub id: ParticipantId,
    pub name: String,
}

impl ParticipantRef {
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Presentation attributes of a participant.
///
/// Opaque to the engine apart from the name; renderers use the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantProfile {
    pub id: ParticipantId,
    pub name: String,
    /// Bubble/nametag colour
    pub color: String,
    /// Avatar reference (path, URL or emoji)
    pub avatar: String,
    /// Flavour tag; never affects scheduling
    pub personality: String,
    pub is_human: bool,
}

impl ParticipantProfile {
    pub fn to_ref(&self) -> ParticipantRef {
        ParticipantRef::new(self.id, self.name.clone())
    }
}

/// What a message is trying to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Greeting,
    Gossip,
    Initiative,
    Goodbye,
    /// Unclassified, e.g. free text typed by the human
    None,
}

impl MessageKind {
    /// Returns all message kind variants.
    pub fn all() -> &'static [MessageKind] {
        &[
            MessageKind::Greeting,
            MessageKind::Gossip,
            MessageKind::Initiative,
            MessageKind::Goodbye,
            MessageKind::None,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Greeting => "greeting",
            MessageKind::Gossip => "gossip",
            MessageKind::Initiative => "initiative",
            MessageKind::Goodbye => "goodbye",
            MessageKind::None => "none",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized message kind name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown message kind '{0}', expected one of greeting, gossip, initiative, goodbye, none")]
pub struct ParseKindError(pub String);

impl FromStr for MessageKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greeting" => Ok(MessageKind::Greeting),
            "gossip" => Ok(MessageKind::Gossip),
            "initiative" => Ok(MessageKind::Initiative),
            "goodbye" => Ok(MessageKind::Goodbye),
            "none" => Ok(MessageKind::None),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}

/// Coarse friendliness band of a mood value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodBand {
    Low,
    Mid,
    High,
}

impl MoodBand {
    /// Classifies a mood in [0, 1].
    pub fn from_mood(mood: f32) -> Self {
        if mood < LOW_BAND_CEILING {
            MoodBand::Low
        } else if mood < MID_BAND_CEILING {
            MoodBand::Mid
        } else {
            MoodBand::High
        }
    }

    pub fn all() -> &'static [MoodBand] {
        &[MoodBand::Low, MoodBand::Mid, MoodBand::High]
    }
}

/// A composed message whose text is fixed but which has not been posted yet.
///
/// Bots compose first, then "type" for a while; the draft becomes a
/// [`Message`] when it is posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDraft {
    pub from: ParticipantRef,
    pub to: Option<ParticipantRef>,
    pub kind: MessageKind,
    pub about: Option<ParticipantRef>,
    pub mood: f32,
    pub text: String,
}

impl MessageDraft {
    /// Finalizes the draft into an immutable message.
    pub fn post(self, id: MessageId, created_at: SimTime) -> Message {
        Message {
            id,
            from: self.from,
            to: self.to,
            kind: self.kind,
            about: self.about,
            mood: self.mood,
            text: self.text,
            created_at,
        }
    }

    /// Every participant this draft refers to: sender, target and subject.
    pub fn referenced_ids(&self) -> Vec<ParticipantId> {
        let mut ids = vec![self.from.id];
        ids.extend(self.to.as_ref().map(|p| p.id));
        ids.extend(self.about.as_ref().map(|p| p.id));
        ids
    }
}

/// An immutable chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from: ParticipantRef,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to: Option<ParticipantRef>,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub about: Option<ParticipantRef>,
    /// Friendliness in [0, 1]
    pub mood: f32,
    pub text: String,
    pub created_at: SimTime,
}

impl Message {
    pub fn mood_band(&self) -> MoodBand {
        MoodBand::from_mood(self.mood)
    }

    /// Returns true if the message is addressed to `id`.
    pub fn is_addressed_to(&self, id: ParticipantId) -> bool {
        self.to.as_ref().is_some_and(|to| to.id == id)
    }

    /// Mood relative to neutral, in [-0.5, 0.5].
    pub fn signed_mood(&self) -> f32 {
        self.mood - 0.5
    }

    /// Text length in characters.
    pub fn text_len(&self) -> usize {
        self.text.chars().count()
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

    fn draft(kind: MessageKind, mood: f32) -> MessageDraft {
        MessageDraft {
            from: ParticipantRef::new(ParticipantId(1), "Mira"),
            to: Some(ParticipantRef::new(ParticipantId(2), "Bo")),
            kind,
            about: None,
            mood,
            text: "hi Bo".to_string(),
        }
    }

    #[test]
    fn test_mood_band_boundaries() {
        assert_eq!(MoodBand::from_mood(0.0), MoodBand::Low);
        assert_eq!(MoodBand::from_mood(0.329), MoodBand::Low);
        assert_eq!(MoodBand::from_mood(0.33), MoodBand::Mid);
        assert_eq!(MoodBand::from_mood(0.659), MoodBand::Mid);
        assert_eq!(MoodBand::from_mood(0.66), MoodBand::High);
        assert_eq!(MoodBand::from_mood(0.999), MoodBand::High);
    }

    #[test]
    fn test_kind_parsing_is_strict() {
        for kind in MessageKind::all() {
            assert_eq!(kind.as_str().parse::<MessageKind>().unwrap(), *kind);
        }
        assert_eq!(" Gossip ".parse::<MessageKind>().unwrap(), MessageKind::Gossip);

        let err = "farewell".parse::<MessageKind>().unwrap_err();
        assert!(err.to_string().contains("farewell"));
    }

    #[test]
    fn test_draft_post_keeps_text() {
        let message = draft(MessageKind::Greeting, 0.8).post(MessageId(7), SimTime::from_secs(3));
        assert_eq!(message.text, "hi Bo");
        assert_eq!(message.id, MessageId(7));
        assert_eq!(message.created_at, SimTime::from_secs(3));
        assert!(message.is_addressed_to(ParticipantId(2)));
        assert!(!message.is_addressed_to(ParticipantId(1)));
        assert_eq!(message.mood_band(), MoodBand::High);
    }

    #[test]
    fn test_message_jsonl() {
        let message = draft(MessageKind::Gossip, 0.2).post(MessageId(1), SimTime::ZERO);
        let line = message.to_jsonl().unwrap();
        assert!(line.contains("\"kind\":\"gossip\""));
        assert!(!line.contains("about"));
        assert_eq!(Message::from_jsonl(&line).unwrap(), message);
    }

    #[test]
    fn test_referenced_ids() {
        let mut d = draft(MessageKind::Gossip, 0.5);
        d.about = Some(ParticipantRef::new(ParticipantId(3), "Kes"));
        assert_eq!(
            d.referenced_ids(),
            vec![ParticipantId(1), ParticipantId(2), ParticipantId(3)]
        );
    }
}
