//! Presentation Output
//!
//! The narrow interface the engine reports through, plus the sinks shipped
//! with it: console transcript, JSONL event log and an in-memory recorder.

pub mod console;
pub mod jsonl;
pub mod recording;
pub mod stats;

use bevy_ecs::prelude::*;

use chat_events::{Message, ParticipantProfile, SimTime};

pub use console::ConsoleSink;
pub use jsonl::JsonlSink;
pub use recording::RecordingSink;
pub use stats::SessionStats;

/// Receiver of everything observable in the room.
pub trait PresentationSink: Send + Sync {
    fn on_participant_joined(&mut self, participant: &ParticipantProfile, at: SimTime);
    fn on_participant_left(&mut self, participant: &ParticipantProfile, at: SimTime);
    fn on_message_posted(&mut self, message: &Message);
    fn on_system_announcement(&mut self, text: &str, at: SimTime);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn on_participant_joined(&mut self, _: &ParticipantProfile, _: SimTime) {}
    fn on_participant_left(&mut self, _: &ParticipantProfile, _: SimTime) {}
    fn on_message_posted(&mut self, _: &Message) {}
    fn on_system_announcement(&mut self, _: &str, _: SimTime) {}
}

/// Forwards every call to each inner sink in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn PresentationSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl PresentationSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn push(&mut self, sink: Box<dyn PresentationSink>) {
        self.sinks.push(sink);
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl PresentationSink for FanoutSink {
    fn on_participant_joined(&mut self, participant: &ParticipantProfile, at: SimTime) {
        for sink in &mut self.sinks {
            sink.on_participant_joined(participant, at);
        }
    }

    fn on_participant_left(&mut self, participant: &ParticipantProfile, at: SimTime) {
        for sink in &mut self.sinks {
            sink.on_participant_left(participant, at);
        }
    }

    fn on_message_posted(&mut self, message: &Message) {
        for sink in &mut self.sinks {
            sink.on_message_posted(message);
        }
    }

    fn on_system_announcement(&mut self, text: &str, at: SimTime) {
        for sink in &mut self.sinks {
            sink.on_system_announcement(text, at);
        }
    }
}

/// Resource: the sink the engine reports to
#[derive(Resource)]
pub struct Presentation(pub Box<dyn PresentationSink>);

impl Presentation {
    pub fn new(sink: impl PresentationSink + 'static) -> Self {
        Self(Box::new(sink))
    }

    /// Reports a join and announces it to the room.
    pub fn participant_joined(&mut self, participant: &ParticipantProfile, at: SimTime) {
        self.0.on_participant_joined(participant, at);
        self.0
            .on_system_announcement(&format!("{} joined the chat", participant.name), at);
    }

    /// Reports a departure and announces it to the room.
    pub fn participant_left(&mut self, participant: &ParticipantProfile, at: SimTime) {
        self.0.on_participant_left(participant, at);
        self.0
            .on_system_announcement(&format!("{} left the chat", participant.name), at);
    }

    pub fn message_posted(&mut self, message: &Message) {
        self.0.on_message_posted(message);
    }

    pub fn announce(&mut self, text: &str, at: SimTime) {
        self.0.on_system_announcement(text, at);
    }
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new(NullSink)
    }
}
