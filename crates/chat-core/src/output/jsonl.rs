//! JSONL Event Log
//!
//! Append-only log of the session's `ChatEvent`s, one JSON object per line.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use chat_events::{ChatEvent, Message, ParticipantProfile, SimTime};

use super::PresentationSink;

pub struct JsonlSink {
    writer: Option<BufWriter<File>>,
    event_count: u64,
    /// Write failures; logging never stops the session
    error_count: u64,
}

impl JsonlSink {
    /// Creates a log at `path`, truncating any previous content.
    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            event_count: 0,
            error_count: 0,
        })
    }

    /// A sink that counts events but writes nothing
    pub fn null() -> Self {
        Self {
            writer: None,
            event_count: 0,
            error_count: 0,
        }
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    /// Appends one event.
    pub fn log(&mut self, event: &ChatEvent) -> std::io::Result<()> {
        self.event_count += 1;
        if let Some(ref mut writer) = self.writer {
            let json = serde_json::to_string(event)?;
            writeln!(writer, "{}", json)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush()?;
        }
        Ok(())
    }

    fn write(&mut self, event: ChatEvent) {
        if let Err(e) = self.log(&event) {
            self.error_count += 1;
            tracing::warn!("Failed to write chat event: {}", e);
        }
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("Failed to flush event log: {}", e);
        }
    }
}

impl PresentationSink for JsonlSink {
    fn on_participant_joined(&mut self, participant: &ParticipantProfile, at: SimTime) {
        self.write(ChatEvent::ParticipantJoined {
            at,
            participant: participant.clone(),
        });
    }

    fn on_participant_left(&mut self, participant: &ParticipantProfile, at: SimTime) {
        self.write(ChatEvent::ParticipantLeft {
            at,
            participant: participant.clone(),
        });
    }

    fn on_message_posted(&mut self, message: &Message) {
        self.write(ChatEvent::MessagePosted {
            message: message.clone(),
        });
    }

    fn on_system_announcement(&mut self, text: &str, at: SimTime) {
        self.write(ChatEvent::SystemAnnouncement {
            at,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_events::fixtures;
    use std::fs;

    #[test]
    fn test_events_written_one_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");

        {
            let mut sink = JsonlSink::new(&path).unwrap();
            let profile = fixtures::sample_profiles().remove(1);
            sink.on_participant_joined(&profile, SimTime::ZERO);
            for message in fixtures::sample_messages() {
                sink.on_message_posted(&message);
            }
            sink.on_system_announcement("Mira left the chat", SimTime::from_secs(40));
            assert_eq!(sink.event_count(), 8);
            assert_eq!(sink.error_count(), 0);
        }

        let content = fs::read_to_string(&path).unwrap();
        let events: Vec<ChatEvent> = content
            .lines()
            .map(|l| ChatEvent::from_jsonl(l).unwrap())
            .collect();
        assert_eq!(events.len(), 8);
        assert!(matches!(events[0], ChatEvent::ParticipantJoined { .. }));
        assert_eq!(events[1].message(), Some(&fixtures::sample_messages()[0]));
    }

    #[test]
    fn test_null_sink_counts_only() {
        let mut sink = JsonlSink::null();
        sink.on_system_announcement("hello", SimTime::ZERO);
        assert_eq!(sink.event_count(), 1);
        assert!(sink.flush().is_ok());
    }
}
