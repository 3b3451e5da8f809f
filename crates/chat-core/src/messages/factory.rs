//! Message Factory
//!
//! Turns (sender, target, kind, subject, mood) into a draft with its text
//! fixed. Pure table lookup; no randomness.

use bevy_ecs::prelude::*;

use chat_events::{MessageDraft, MessageKind, MoodBand, ParticipantRef};

use super::templates::{MessageTemplates, ABOUT_PLACEHOLDER, TO_PLACEHOLDER};

/// Resource: composes message drafts from the template table
#[derive(Resource, Debug, Clone, Default)]
pub struct MessageFactory {
    templates: MessageTemplates,
}

impl MessageFactory {
    pub fn new(templates: MessageTemplates) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// Composes a draft. Gossip without a subject uses the vague variant.
    pub fn create_message(
        &self,
        from: ParticipantRef,
        to: Option<ParticipantRef>,
        kind: MessageKind,
        about: Option<ParticipantRef>,
        mood: f32,
    ) -> Result<MessageDraft, FactoryError> {
        if !mood.is_finite() || !(0.0..=1.0).contains(&mood) {
            return Err(FactoryError::InvalidMood(mood));
        }
        // Only gossip has a subject
        let about = if kind == MessageKind::Gossip { about } else { None };

        let template = self.templates.select(
            kind,
            MoodBand::from_mood(mood),
            to.is_some(),
            about.is_some(),
        );
        let mut text = template.to_string();
        if let Some(target) = &to {
            text = text.replace(TO_PLACEHOLDER, &target.name);
        }
        if let Some(subject) = &about {
            text = text.replace(ABOUT_PLACEHOLDER, &subject.name);
        }

        Ok(MessageDraft {
            from,
            to,
            kind,
            about,
            mood,
            text,
        })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FactoryError {
    #[error("mood {0} is not a finite value in [0, 1]")]
    InvalidMood(f32),
}
