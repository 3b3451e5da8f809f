//! Shared message and event types for the chatroom simulation.
//!
//! This crate contains pure data structures with no engine logic.
//! It is a dependency for the engine and for any presentation layer.

pub mod event;
pub mod message;
pub mod timestamp;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

// Re-export timestamp types
pub use timestamp::{ParseTimeError, SimTime, MILLIS_PER_SECOND};

// Re-export message types
pub use message::{
    Message, MessageDraft, MessageId, MessageKind, MoodBand, ParseKindError, ParticipantId,
    ParticipantProfile, ParticipantRef, LOW_BAND_CEILING, MID_BAND_CEILING,
};

// Re-export event types
pub use event::ChatEvent;
