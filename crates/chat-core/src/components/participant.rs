//! Participant Components
//!
//! The participant record, its role payload and the directional relationship
//! entries it holds toward everyone else in the room.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use chat_events::{ParticipantId, ParticipantProfile, ParticipantRef, SimTime};

/// Bounds of a relationship score
pub const SCORE_LIMIT: f32 = 100.0;

/// A directional relationship held by one participant toward another.
///
/// Bots keep a numeric score; the human's entries carry only the flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// -100 (hostile) to 100 (devoted), 0 neutral; `None` for human-held entries
    pub score: Option<f32>,
    pub is_friend: bool,
    pub is_muted: bool,
}

impl Relationship {
    /// Neutral entry held by a bot
    pub fn neutral() -> Self {
        Self {
            score: Some(0.0),
            is_friend: false,
            is_muted: false,
        }
    }

    /// Entry held by the human: flags only
    pub fn unscored() -> Self {
        Self {
            score: None,
            is_friend: false,
            is_muted: false,
        }
    }

    /// Score, treating unscored entries as neutral
    pub fn score_or_neutral(&self) -> f32 {
        self.score.unwrap_or(0.0)
    }

    /// Magnitude of the score scaled to [0, 1]
    pub fn intensity(&self) -> f32 {
        (self.score_or_neutral().abs() / SCORE_LIMIT).min(1.0)
    }

    /// Sets the score, clamping to the valid range. No-op on unscored entries.
    pub fn set_score(&mut self, score: f32) {
        if let Some(current) = self.score.as_mut() {
            *current = score.clamp(-SCORE_LIMIT, SCORE_LIMIT);
        }
    }

    /// Moves the score one `step` toward neutral without overshooting.
    pub fn decay(&mut self, step: f32) {
        if let Some(score) = self.score.as_mut() {
            if score.abs() <= step {
                *score = 0.0;
            } else {
                *score -= step * score.signum();
            }
        }
    }

    /// Re-derives friend and mute flags from the score.
    pub fn refresh_standing(&mut self, friend_threshold: f32, mute_threshold: f32) {
        if let Some(score) = self.score {
            self.is_friend = score >= friend_threshold;
            self.is_muted = score <= mute_threshold;
        }
    }
}

/// Bot-only state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotState {
    /// 0..1, lower speaks more
    pub verbosity: f32,
    /// 0..1, higher types slower
    pub typing_speed: f32,
    /// Composing, replying or leaving; busy bots take on nothing new
    pub busy: bool,
    /// 0..1 aggregate contentment
    pub satisfaction: f32,
    pub has_greeted: bool,
}

impl BotState {
    pub fn new(verbosity: f32, typing_speed: f32) -> Self {
        Self {
            verbosity,
            typing_speed,
            busy: false,
            satisfaction: 0.5,
            has_greeted: false,
        }
    }

    /// 1 - verbosity
    pub fn talkativeness(&self) -> f32 {
        1.0 - self.verbosity
    }
}

/// Human or bot, with the bot payload attached to the bot variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Role {
    Human,
    Bot(BotState),
}

/// A chat participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub profile: ParticipantProfile,
    pub role: Role,
    /// Exactly one entry per other participant in the registry
    pub relationships: BTreeMap<ParticipantId, Relationship>,
    pub last_interaction: SimTime,
}

impl Participant {
    pub fn id(&self) -> ParticipantId {
        self.profile.id
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    pub fn to_ref(&self) -> ParticipantRef {
        self.profile.to_ref()
    }

    pub fn is_human(&self) -> bool {
        matches!(self.role, Role::Human)
    }

    pub fn bot(&self) -> Option<&BotState> {
        match &self.role {
            Role::Bot(state) => Some(state),
            Role::Human => None,
        }
    }

    pub fn bot_mut(&mut self) -> Option<&mut BotState> {
        match &mut self.role {
            Role::Bot(state) => Some(state),
            Role::Human => None,
        }
    }

    /// A bot that is not busy
    pub fn is_idle_bot(&self) -> bool {
        self.bot().is_some_and(|b| !b.busy)
    }

    pub fn relationship(&self, other: ParticipantId) -> Option<&Relationship> {
        self.relationships.get(&other)
    }

    pub fn relationship_mut(&mut self, other: ParticipantId) -> Option<&mut Relationship> {
        self.relationships.get_mut(&other)
    }

    /// Returns true if this participant has muted `other`.
    pub fn has_muted(&self, other: ParticipantId) -> bool {
        self.relationships.get(&other).is_some_and(|r| r.is_muted)
    }

    /// Mean score over all scored relationships, `None` if there are none.
    pub fn mean_score(&self) -> Option<f32> {
        let scores: Vec<f32> = self.relationships.values().filter_map(|r| r.score).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f32>() / scores.len() as f32)
        }
    }

    /// Entry this participant opens toward a newcomer
    pub fn fresh_relationship(&self) -> Relationship {
        if self.is_human() {
            Relationship::unscored()
        } else {
            Relationship::neutral()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bot(id: u32) -> Participant {
        Participant {
            profile: ParticipantProfile {
                id: ParticipantId(id),
                name: format!("Bot{}", id),
                color: "green".to_string(),
                avatar: String::new(),
                personality: "cheerful".to_string(),
                is_human: false,
            },
            role: Role::Bot(BotState::new(0.5, 0.5)),
            relationships: BTreeMap::new(),
            last_interaction: SimTime::ZERO,
        }
    }

    #[test]
    fn test_decay_moves_toward_zero_without_overshoot() {
        let mut rel = Relationship::neutral();
        rel.set_score(3.0);
        rel.decay(2.0);
        assert_eq!(rel.score, Some(1.0));
        rel.decay(2.0);
        assert_eq!(rel.score, Some(0.0));

        rel.set_score(-5.0);
        rel.decay(2.0);
        assert_eq!(rel.score, Some(-3.0));
    }

    #[test]
    fn test_decay_is_idempotent_at_zero() {
        let mut rel = Relationship::neutral();
        for _ in 0..10 {
            rel.decay(0.5);
            assert_eq!(rel.score, Some(0.0));
        }
    }

    #[test]
    fn test_unscored_entries_ignore_scores() {
        let mut rel = Relationship::unscored();
        rel.set_score(50.0);
        rel.decay(1.0);
        rel.refresh_standing(60.0, -90.0);
        assert_eq!(rel.score, None);
        assert_eq!(rel.score_or_neutral(), 0.0);
        assert!(!rel.is_friend);
    }

    #[test]
    fn test_set_score_clamps() {
        let mut rel = Relationship::neutral();
        rel.set_score(250.0);
        assert_eq!(rel.score, Some(SCORE_LIMIT));
        rel.set_score(-250.0);
        assert_eq!(rel.score, Some(-SCORE_LIMIT));
        assert_eq!(rel.intensity(), 1.0);
    }

    #[test]
    fn test_standing_follows_score() {
        let mut rel = Relationship::neutral();
        rel.set_score(70.0);
        rel.refresh_standing(60.0, -90.0);
        assert!(rel.is_friend && !rel.is_muted);

        rel.set_score(-95.0);
        rel.refresh_standing(60.0, -90.0);
        assert!(!rel.is_friend && rel.is_muted);
    }

    #[test]
    fn test_mean_score() {
        let mut p = bot(1);
        assert_eq!(p.mean_score(), None);

        let mut a = Relationship::neutral();
        a.set_score(40.0);
        let mut b = Relationship::neutral();
        b.set_score(-20.0);
        p.relationships.insert(ParticipantId(2), a);
        p.relationships.insert(ParticipantId(3), b);
        p.relationships.insert(ParticipantId(0), Relationship::unscored());
        assert_eq!(p.mean_score(), Some(10.0));
    }

    #[test]
    fn test_role_accessors() {
        let mut p = bot(4);
        assert!(!p.is_human());
        assert!(p.is_idle_bot());
        p.bot_mut().unwrap().busy = true;
        assert!(!p.is_idle_bot());
        assert_eq!(p.fresh_relationship(), Relationship::neutral());
    }
}
