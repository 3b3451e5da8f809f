//! Message Templates
//!
//! Text for every (kind, mood band) pair, with addressed and room-wide
//! variants. Templates may use `{to}` and `{about}` placeholders and can be
//! replaced wholesale from a TOML file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use chat_events::{MessageKind, MoodBand};

/// Placeholder for the addressed participant's name
pub const TO_PLACEHOLDER: &str = "{to}";
/// Placeholder for the gossip subject's name
pub const ABOUT_PLACEHOLDER: &str = "{about}";

/// One template per mood band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandedTemplates {
    pub low: String,
    pub mid: String,
    pub high: String,
}

impl BandedTemplates {
    fn new(low: &str, mid: &str, high: &str) -> Self {
        Self {
            low: low.to_string(),
            mid: mid.to_string(),
            high: high.to_string(),
        }
    }

    pub fn for_band(&self, band: MoodBand) -> &str {
        match band {
            MoodBand::Low => &self.low,
            MoodBand::Mid => &self.mid,
            MoodBand::High => &self.high,
        }
    }

    fn entries(&self) -> [(MoodBand, &str); 3] {
        [
            (MoodBand::Low, self.low.as_str()),
            (MoodBand::Mid, self.mid.as_str()),
            (MoodBand::High, self.high.as_str()),
        ]
    }
}

/// Variants for a kind that is either aimed at someone or said to the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressedTemplates {
    /// May use `{to}`
    pub addressed: BandedTemplates,
    /// Said to everyone; must not use `{to}`
    pub room: BandedTemplates,
}

/// Gossip adds a subject axis on top of addressing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GossipTemplates {
    pub addressed_about: BandedTemplates,
    /// Addressed, no specific subject
    pub addressed_vague: BandedTemplates,
    pub room_about: BandedTemplates,
    pub room_vague: BandedTemplates,
}

/// Complete template table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageTemplates {
    pub greeting: AddressedTemplates,
    pub gossip: GossipTemplates,
    pub initiative: AddressedTemplates,
    pub goodbye: AddressedTemplates,
    /// Replies to unclassified text
    pub none: AddressedTemplates,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            greeting: AddressedTemplates {
                addressed: BandedTemplates::new(
                    "Oh. It's you, {to}.",
                    "Hi {to}.",
                    "{to}! So good to see you!",
                ),
                room: BandedTemplates::new(
                    "...hey.",
                    "Hello everyone.",
                    "Hi all! Great to be here!",
                ),
            },
            gossip: GossipTemplates {
                addressed_about: BandedTemplates::new(
                    "{to}, between us, {about} is getting on my nerves.",
                    "{to}, have you talked to {about} lately?",
                    "{to}, {about} is honestly the best, don't you think?",
                ),
                addressed_vague: BandedTemplates::new(
                    "{to}, some people in here are a bit much.",
                    "{to}, heard anything interesting lately?",
                    "{to}, I love the people in this room.",
                ),
                room_about: BandedTemplates::new(
                    "Has anyone else noticed how {about} acts?",
                    "Anyone know what {about} has been up to?",
                    "Can we all agree {about} is wonderful?",
                ),
                room_vague: BandedTemplates::new(
                    "Some people here really need to relax.",
                    "So, any news?",
                    "Everyone here is so lovely today.",
                ),
            },
            initiative: AddressedTemplates {
                addressed: BandedTemplates::new(
                    "{to}, why are you always like that?",
                    "{to}, what do you think about all this?",
                    "{to}, you always have the best ideas!",
                ),
                room: BandedTemplates::new(
                    "This chat is kind of dead.",
                    "So what's everyone up to?",
                    "What a great day to chat!",
                ),
            },
            goodbye: AddressedTemplates {
                addressed: BandedTemplates::new(
                    "Whatever, {to}. I'm out.",
                    "Bye {to}.",
                    "Take care {to}, talk soon!",
                ),
                room: BandedTemplates::new(
                    "I've had enough of this. Bye.",
                    "Gotta go, bye all.",
                    "This was fun, see you all later!",
                ),
            },
            none: AddressedTemplates {
                addressed: BandedTemplates::new(
                    "Not now, {to}.",
                    "Okay {to}.",
                    "Ha, good one {to}!",
                ),
                room: BandedTemplates::new("Hm.", "I see.", "Nice!"),
            },
        }
    }
}

impl MessageTemplates {
    /// Loads templates from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses and validates templates from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, TemplateError> {
        let templates: Self = toml::from_str(content)?;
        templates.validate()?;
        Ok(templates)
    }

    /// Picks the template for a (kind, band, addressed, has-subject) slot.
    ///
    /// `has_subject` only matters for gossip.
    pub fn select(&self, kind: MessageKind, band: MoodBand, addressed: bool, has_subject: bool) -> &str {
        let banded = match kind {
            MessageKind::Gossip => match (addressed, has_subject) {
                (true, true) => &self.gossip.addressed_about,
                (true, false) => &self.gossip.addressed_vague,
                (false, true) => &self.gossip.room_about,
                (false, false) => &self.gossip.room_vague,
            },
            MessageKind::Greeting => pick(&self.greeting, addressed),
            MessageKind::Initiative => pick(&self.initiative, addressed),
            MessageKind::Goodbye => pick(&self.goodbye, addressed),
            MessageKind::None => pick(&self.none, addressed),
        };
        banded.for_band(band)
    }

    /// Rejects blank templates and placeholders that could never be bound.
    pub fn validate(&self) -> Result<(), TemplateError> {
        for (slot, banded, allows_to, allows_about) in self.slots() {
            for (band, text) in banded.entries() {
                let location = || format!("{}.{:?}", slot, band).to_lowercase();
                if text.trim().is_empty() {
                    return Err(TemplateError::Empty(location()));
                }
                if !allows_to && text.contains(TO_PLACEHOLDER) {
                    return Err(TemplateError::UnboundPlaceholder {
                        slot: location(),
                        placeholder: TO_PLACEHOLDER,
                    });
                }
                if !allows_about && text.contains(ABOUT_PLACEHOLDER) {
                    return Err(TemplateError::UnboundPlaceholder {
                        slot: location(),
                        placeholder: ABOUT_PLACEHOLDER,
                    });
                }
            }
        }
        Ok(())
    }

    /// Every template group with the placeholders it may use.
    fn slots(&self) -> Vec<(&'static str, &BandedTemplates, bool, bool)> {
        vec![
            ("greeting.addressed", &self.greeting.addressed, true, false),
            ("greeting.room", &self.greeting.room, false, false),
            ("gossip.addressed_about", &self.gossip.addressed_about, true, true),
            ("gossip.addressed_vague", &self.gossip.addressed_vague, true, false),
            ("gossip.room_about", &self.gossip.room_about, false, true),
            ("gossip.room_vague", &self.gossip.room_vague, false, false),
            ("initiative.addressed", &self.initiative.addressed, true, false),
            ("initiative.room", &self.initiative.room, false, false),
            ("goodbye.addressed", &self.goodbye.addressed, true, false),
            ("goodbye.room", &self.goodbye.room, false, false),
            ("none.addressed", &self.none.addressed, true, false),
            ("none.room", &self.none.room, false, false),
        ]
    }
}

fn pick(templates: &AddressedTemplates, addressed: bool) -> &BandedTemplates {
    if addressed {
        &templates.addressed
    } else {
        &templates.room
    }
}

/// Errors loading or validating templates.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("template `{0}` is blank")]
    Empty(String),
    /// Placeholder in a variant that never has a value for it
    #[error("template `{slot}` uses {placeholder}, which is never bound there")]
    UnboundPlaceholder {
        slot: String,
        placeholder: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates_validate() {
        assert!(MessageTemplates::default().validate().is_ok());
    }

    #[test]
    fn test_select_routes_gossip_variants() {
        let t = MessageTemplates::default();
        let text = t.select(MessageKind::Gossip, MoodBand::Mid, true, true);
        assert!(text.contains(TO_PLACEHOLDER) && text.contains(ABOUT_PLACEHOLDER));

        let text = t.select(MessageKind::Gossip, MoodBand::Low, false, false);
        assert!(!text.contains(TO_PLACEHOLDER) && !text.contains(ABOUT_PLACEHOLDER));

        assert_eq!(
            t.select(MessageKind::Goodbye, MoodBand::High, false, true),
            t.goodbye.room.high
        );
    }

    #[test]
    fn test_toml_roundtrip() {
        let text = toml::to_string_pretty(&MessageTemplates::default()).unwrap();
        let parsed = MessageTemplates::from_str(&text).unwrap();
        assert_eq!(parsed, MessageTemplates::default());
    }

    #[test]
    fn test_room_template_with_to_is_rejected() {
        let mut t = MessageTemplates::default();
        t.initiative.room.mid = "Hey {to}".to_string();
        let err = t.validate().unwrap_err();
        assert!(matches!(
            err,
            TemplateError::UnboundPlaceholder { placeholder: TO_PLACEHOLDER, .. }
        ));
        assert!(err.to_string().contains("initiative.room.mid"));
    }

    #[test]
    fn test_blank_template_is_rejected() {
        let mut t = MessageTemplates::default();
        t.gossip.room_vague.low = "   ".to_string();
        assert!(matches!(t.validate(), Err(TemplateError::Empty(_))));

        let mut t = MessageTemplates::default();
        t.gossip.addressed_vague.high = "{to}, {about}?".to_string();
        assert!(t.validate().is_err());
    }
}
