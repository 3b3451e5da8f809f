//! Initiative System
//!
//! Idle bots speaking up unprompted. Eagerness grows with idle time and
//! talkativeness and shrinks in a noisy room.

use bevy_ecs::prelude::*;
use rand::Rng;

use chat_events::{MessageKind, ParticipantId, ParticipantRef};

use crate::bias::Bias;
use crate::components::{Participant, ParticipantRegistry};
use crate::config::{EngineConfig, InitiativeConfig};
use crate::messages::MessageFactory;
use crate::output::SessionStats;
use crate::timers::{SessionClock, TimerQueue};
use crate::SimRng;

use super::density::density_factor;
use super::typing::{schedule_delivery, typing_delay_ms};

/// Ramp from `idle_min_factor` right after an interaction to 1 at `idle_max_ms`.
pub fn idle_factor(idle_ms: u64, config: &InitiativeConfig) -> f32 {
    let ramp = (idle_ms as f32 / config.idle_max_ms.max(1) as f32).min(1.0);
    config.idle_min_factor + (1.0 - config.idle_min_factor) * ramp
}

/// `draw × idle factor × talkativeness × density factor`.
pub fn eagerness(draw: f32, idle_factor: f32, verbosity: f32, density_factor: f32) -> f32 {
    draw * idle_factor * (1.0 - verbosity) * density_factor
}

/// Weighted draw of what to say; greetings dominate until the bot has greeted.
pub fn choose_kind<R: Rng + ?Sized>(has_greeted: bool, config: &InitiativeConfig, rng: &mut R) -> MessageKind {
    let greeting = if has_greeted {
        config.greeting_weight
    } else {
        config.greeting_weight_ungreeted
    };
    let candidates = [
        (MessageKind::Greeting, greeting),
        (MessageKind::Gossip, config.gossip_weight),
        (MessageKind::Initiative, config.initiative_weight),
    ];

    let total_weight: f32 = candidates.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return MessageKind::Initiative;
    }

    let mut roll = rng.gen::<f32>() * total_weight;
    for (kind, weight) in candidates {
        roll -= weight;
        if roll <= 0.0 {
            return kind;
        }
    }
    MessageKind::Initiative
}

/// Target and subject for an unprompted message of `kind`.
pub fn plan_targets<R: Rng + ?Sized>(
    registry: &ParticipantRegistry,
    speaker: &Participant,
    kind: MessageKind,
    rng: &mut R,
) -> (Option<ParticipantRef>, Option<ParticipantRef>) {
    let me = speaker.id();
    let pick = |excluded: &[ParticipantId], rng: &mut R| {
        registry.choose_other_than(excluded, rng).map(|p| p.to_ref())
    };
    match kind {
        MessageKind::Greeting => {
            // A first greeting goes to the whole room
            let has_greeted = speaker.bot().is_some_and(|b| b.has_greeted);
            if has_greeted {
                (pick(&[me], rng), None)
            } else {
                (None, None)
            }
        }
        MessageKind::Gossip => {
            let to = pick(&[me], rng);
            let mut excluded = vec![me];
            excluded.extend(to.as_ref().map(|t| t.id));
            let about = pick(&excluded, rng);
            (to, about)
        }
        _ => (pick(&[me], rng), None),
    }
}

/// System: Roll for idle bots speaking up
#[allow(clippy::too_many_arguments)]
pub fn roll_initiative(
    config: Res<EngineConfig>,
    clock: Res<SessionClock>,
    factory: Res<MessageFactory>,
    mut rng: ResMut<SimRng>,
    mut registry: ResMut<ParticipantRegistry>,
    mut timers: ResMut<TimerQueue>,
    mut stats: ResMut<SessionStats>,
) {
    let rng = &mut rng.0;
    let penalty = density_factor(registry.density(), &config.density);

    for bot_id in registry.idle_bot_ids() {
        let Some(speaker) = registry.get(bot_id) else {
            continue;
        };
        let Some(state) = speaker.bot() else {
            continue;
        };
        let idle = idle_factor(clock.now.since(speaker.last_interaction), &config.initiative);
        let level = eagerness(Bias::None.sample(rng), idle, state.verbosity, penalty);
        if level <= config.initiative.eagerness_threshold {
            continue;
        }

        let kind = choose_kind(state.has_greeted, &config.initiative, rng);
        let (to, about) = plan_targets(&registry, speaker, kind, rng);
        let standing = to
            .as_ref()
            .and_then(|t| speaker.relationship(t.id))
            .map(|r| Bias::toward(r.score_or_neutral()))
            .unwrap_or(Bias::None);
        let mood = standing.sample(rng);
        let typing_speed = state.typing_speed;

        let draft = match factory.create_message(speaker.to_ref(), to, kind, about, mood) {
            Ok(draft) => draft,
            Err(e) => {
                tracing::warn!("{} could not compose a {}: {}", speaker.name(), kind, e);
                continue;
            }
        };
        let delay = typing_delay_ms(draft.text.chars().count(), 0, typing_speed, &config.typing, rng);
        tracing::debug!("{} speaks up (eagerness {:.3})", draft.from.name, level);

        if let Some(state) = registry.get_mut(bot_id).and_then(|p| p.bot_mut()) {
            state.busy = true;
        }
        schedule_delivery(&mut timers, clock.now, delay, draft, true);
        stats.initiatives_scheduled += 1;
    }
}
