//! Reaction System
//!
//! Fans every posted message out to the bots: relationship updates, bother
//! levels, selection of the most bothered bots and their delayed replies.

use bevy_ecs::prelude::*;
use rand::Rng;

use chat_events::{Message, MessageKind, ParticipantId, ParticipantRef};

use crate::bias::Bias;
use crate::components::{Participant, ParticipantRegistry};
use crate::config::{EngineConfig, ReactionConfig};
use crate::messages::MessageFactory;
use crate::output::SessionStats;
use crate::timers::SessionClock;
use crate::SimRng;

use super::density::density_factor;
use super::relationship::update_relationships;
use super::typing::{schedule_delivery, typing_delay_ms};
use crate::timers::TimerQueue;

/// Resource: posted messages waiting for the reaction pass
#[derive(Resource, Debug, Default)]
pub struct Inbox {
    pub messages: Vec<Message>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn drain(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Bother level from its inputs.
///
/// `draw` is a fresh uniform value; `intensity` is |score|/100 toward the sender.
pub fn bother_level(
    draw: f32,
    intensity: f32,
    verbosity: f32,
    addressed: bool,
    density_factor: f32,
    config: &ReactionConfig,
) -> f32 {
    let base = config.random_weight * draw
        + config.relationship_weight * intensity
        + config.talkativeness_weight * (1.0 - verbosity);
    let bonus = if addressed { config.addressing_bonus } else { 1.0 };
    base * bonus * density_factor
}

/// Bother level of one participant toward a message. Zero without a draw for
/// the human, the sender, busy bots and bots that muted the sender.
pub fn bother_for<R: Rng + ?Sized>(
    participant: &Participant,
    message: &Message,
    density_factor: f32,
    config: &ReactionConfig,
    rng: &mut R,
) -> f32 {
    let Some(bot) = participant.bot() else {
        return 0.0;
    };
    let sender = message.from.id;
    if bot.busy || participant.id() == sender || participant.has_muted(sender) {
        return 0.0;
    }
    let intensity = participant
        .relationship(sender)
        .map(|r| r.intensity())
        .unwrap_or(0.0);
    let draw = Bias::None.sample(rng);
    bother_level(
        draw,
        intensity,
        bot.verbosity,
        message.is_addressed_to(participant.id()),
        density_factor,
        config,
    )
}

/// Keeps candidates above `threshold`, most bothered first, at most `max`.
/// Ties keep their incoming order.
pub fn select_reactors(
    mut candidates: Vec<(ParticipantId, f32)>,
    threshold: f32,
    max: usize,
) -> Vec<(ParticipantId, f32)> {
    candidates.retain(|(_, level)| *level > threshold);
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));
    candidates.truncate(max);
    candidates
}

/// What a bot says back: (kind, to, about).
pub fn plan_response<R: Rng + ?Sized>(
    registry: &ParticipantRegistry,
    responder: ParticipantId,
    message: &Message,
    rng: &mut R,
) -> (MessageKind, Option<ParticipantRef>, Option<ParticipantRef>) {
    let sender = message.from.clone();
    match message.kind {
        MessageKind::Goodbye => (MessageKind::Goodbye, Some(sender), None),
        MessageKind::Greeting => (MessageKind::Greeting, Some(sender), None),
        MessageKind::Gossip if message.is_addressed_to(responder) => {
            let about = message
                .about
                .clone()
                .filter(|subject| registry.exists(subject.id));
            (MessageKind::Gossip, Some(sender), about)
        }
        MessageKind::Gossip => (MessageKind::Initiative, Some(sender), None),
        MessageKind::Initiative => {
            if rng.gen_bool(0.5) {
                (MessageKind::Greeting, Some(sender), None)
            } else {
                let third = registry
                    .choose_other_than(&[responder, sender.id], rng)
                    .map(|p| p.to_ref());
                (MessageKind::Gossip, third, Some(sender))
            }
        }
        MessageKind::None => (MessageKind::Greeting, Some(sender), None),
    }
}

/// System: React to every message in the inbox
#[allow(clippy::too_many_arguments)]
pub fn react_to_messages(
    config: Res<EngineConfig>,
    clock: Res<SessionClock>,
    factory: Res<MessageFactory>,
    mut rng: ResMut<SimRng>,
    mut registry: ResMut<ParticipantRegistry>,
    mut timers: ResMut<TimerQueue>,
    mut inbox: ResMut<Inbox>,
    mut stats: ResMut<SessionStats>,
) {
    let rng = &mut rng.0;

    for message in inbox.drain() {
        if !registry.exists(message.from.id) {
            tracing::debug!("Skipping reactions to {}: sender has left", message.id);
            continue;
        }

        update_relationships(&mut registry, &message, &config.relationships);

        let penalty = density_factor(registry.density(), &config.density);
        let candidates: Vec<(ParticipantId, f32)> = registry
            .participants()
            .iter()
            .filter(|p| !p.is_human())
            .map(|p| (p.id(), bother_for(p, &message, penalty, &config.reaction, rng)))
            .collect();
        let reactors = select_reactors(
            candidates,
            config.reaction.bother_threshold,
            config.reaction.max_reactions_per_message,
        );

        for (bot_id, level) in reactors {
            let (kind, to, about) = plan_response(&registry, bot_id, &message, rng);
            let mood = Bias::echoing(message.mood_band()).sample(rng);

            let Some(bot) = registry.get_mut(bot_id) else {
                continue;
            };
            let from = bot.to_ref();
            let draft = match factory.create_message(from, to, kind, about, mood) {
                Ok(draft) => draft,
                Err(e) => {
                    tracing::warn!("{} could not reply to {}: {}", bot.name(), message.id, e);
                    stats.failed_reactions += 1;
                    continue;
                }
            };
            let Some(state) = bot.bot_mut() else {
                continue;
            };
            state.busy = true;
            let delay = typing_delay_ms(
                draft.text.chars().count(),
                message.text_len(),
                state.typing_speed,
                &config.typing,
                rng,
            );
            tracing::debug!(
                "{} reacts to {} (bother {:.3}) with a {}",
                draft.from.name,
                message.id,
                level,
                kind
            );
            schedule_delivery(&mut timers, clock.now, delay, draft, true);
            stats.reactions_scheduled += 1;
        }
    }
}
