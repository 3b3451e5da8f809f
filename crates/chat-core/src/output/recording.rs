//! Recording Sink
//!
//! Keeps every event in a shared in-memory log. Clones share the same log, so
//! a test can hand one clone to the engine and inspect the other.

use std::sync::{Arc, Mutex, MutexGuard};

use chat_events::{ChatEvent, Message, ParticipantProfile, SimTime};

use super::PresentationSink;

#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ChatEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave the Vec half-written
    fn lock(&self) -> MutexGuard<'_, Vec<ChatEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, event: ChatEvent) {
        self.lock().push(event);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<ChatEvent> {
        self.lock().clone()
    }

    /// Posted messages in posting order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().iter().filter_map(|e| e.message().cloned()).collect()
    }

    pub fn announcements(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                ChatEvent::SystemAnnouncement { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl PresentationSink for RecordingSink {
    fn on_participant_joined(&mut self, participant: &ParticipantProfile, at: SimTime) {
        self.record(ChatEvent::ParticipantJoined {
            at,
            participant: participant.clone(),
        });
    }

    fn on_participant_left(&mut self, participant: &ParticipantProfile, at: SimTime) {
        self.record(ChatEvent::ParticipantLeft {
            at,
            participant: participant.clone(),
        });
    }

    fn on_message_posted(&mut self, message: &Message) {
        self.record(ChatEvent::MessagePosted {
            message: message.clone(),
        });
    }

    fn on_system_announcement(&mut self, text: &str, at: SimTime) {
        self.record(ChatEvent::SystemAnnouncement {
            at,
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_events::fixtures;

    #[test]
    fn test_clones_share_the_log() {
        let recorder = RecordingSink::new();
        let mut handle = recorder.clone();
        for message in fixtures::sample_messages() {
            handle.on_message_posted(&message);
        }
        handle.on_system_announcement("Welcome", SimTime::ZERO);

        assert_eq!(recorder.len(), 7);
        assert_eq!(recorder.messages(), fixtures::sample_messages());
        assert_eq!(recorder.announcements(), vec!["Welcome".to_string()]);

        recorder.clear();
        assert!(handle.is_empty());
    }
}
