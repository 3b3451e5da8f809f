//! Console Transcript
//!
//! Prints the room as a plain-text chat log stamped with the session clock.

use std::io::{self, Write};

use chat_events::{Message, ParticipantId, ParticipantProfile, SimTime};

use super::PresentationSink;

/// Label used for the human's own messages
pub const HUMAN_LABEL: &str = "You";

pub struct ConsoleSink {
    out: Box<dyn Write + Send + Sync>,
    /// Print avatar and personality when someone joins
    show_roster: bool,
    /// Learned from the join events
    human: Option<ParticipantId>,
}

impl ConsoleSink {
    pub fn new(out: impl Write + Send + Sync + 'static) -> Self {
        Self {
            out: Box::new(out),
            show_roster: false,
            human: None,
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    pub fn with_roster(mut self, show: bool) -> Self {
        self.show_roster = show;
        self
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::warn!("Console write failed: {}", e);
        }
    }
}

/// `[mm:ss] Name: text`, with the human shown as "You".
pub fn format_message(message: &Message, human_sender: bool) -> String {
    let label = if human_sender {
        HUMAN_LABEL
    } else {
        message.from.name.as_str()
    };
    format!("[{}] {}: {}", message.created_at, label, message.text)
}

pub fn format_announcement(text: &str, at: SimTime) -> String {
    format!("[{}] * {}", at, text)
}

pub fn format_roster_entry(participant: &ParticipantProfile, at: SimTime) -> String {
    format!(
        "[{}]   {} {} ({}, {})",
        at, participant.avatar, participant.name, participant.personality, participant.color
    )
}

impl PresentationSink for ConsoleSink {
    fn on_participant_joined(&mut self, participant: &ParticipantProfile, at: SimTime) {
        if participant.is_human {
            self.human = Some(participant.id);
        }
        if self.show_roster {
            let entry = format_roster_entry(participant, at);
            self.line(&entry);
        }
    }

    fn on_participant_left(&mut self, participant: &ParticipantProfile, _at: SimTime) {
        if self.human == Some(participant.id) {
            self.human = None;
        }
    }

    fn on_message_posted(&mut self, message: &Message) {
        let human_sender = self.human == Some(message.from.id);
        let text = format_message(message, human_sender);
        self.line(&text);
    }

    fn on_system_announcement(&mut self, text: &str, at: SimTime) {
        let text = format_announcement(text, at);
        self.line(&text);
    }
}
