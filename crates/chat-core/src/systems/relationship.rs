//! Relationship System
//!
//! Mood-driven score updates on every posted message and the per-tick decay
//! toward neutral.

use bevy_ecs::prelude::*;

use chat_events::Message;

use crate::components::{ParticipantRegistry, SCORE_LIMIT};
use crate::config::{EngineConfig, RelationshipConfig};

/// Moves a score by a signed mood `m = mood - 0.5`.
///
/// From neutral the score jumps by `100·m·bonus`. Agreeing moods close the
/// remaining gap to the extreme proportionally, so motion slows near ±100;
/// disagreeing moods shrink the score proportionally toward zero.
pub fn apply_mood(score: f32, signed_mood: f32, bonus: f32) -> f32 {
    let m = signed_mood;
    let updated = if score == 0.0 {
        SCORE_LIMIT * m * bonus
    } else if score.signum() == m.signum() {
        score + score.signum() * (SCORE_LIMIT - score.abs()) * m.abs() * bonus
    } else {
        score - score.signum() * score.abs() * m.abs() * bonus
    };
    updated.clamp(-SCORE_LIMIT, SCORE_LIMIT)
}

/// Updates every bot's view of the sender after a message.
///
/// Bots that muted the sender ignore it, as does everyone for a neutral mood.
pub fn update_relationships(
    registry: &mut ParticipantRegistry,
    message: &Message,
    config: &RelationshipConfig,
) {
    let sender = message.from.id;
    if !registry.exists(sender) {
        return;
    }
    let m = message.signed_mood();
    if m == 0.0 {
        return;
    }

    for participant in registry.participants_mut() {
        if participant.is_human() || participant.id() == sender {
            continue;
        }
        let bonus = if message.is_addressed_to(participant.id()) {
            config.addressing_bonus
        } else {
            1.0
        };
        let Some(rel) = participant.relationship_mut(sender) else {
            continue;
        };
        if rel.is_muted {
            continue;
        }
        let before = rel.score_or_neutral();
        rel.set_score(apply_mood(before, m, bonus));
        rel.refresh_standing(config.friend_threshold, config.mute_threshold);
    }
}

/// System: Decay every bot-held score one step toward neutral
pub fn decay_relationships(config: Res<EngineConfig>, mut registry: ResMut<ParticipantRegistry>) {
    let rel_config = &config.relationships;
    for participant in registry.participants_mut() {
        for rel in participant.relationships.values_mut() {
            rel.decay(rel_config.decay_step);
            rel.refresh_standing(rel_config.friend_threshold, rel_config.mute_threshold);
        }
    }
}
