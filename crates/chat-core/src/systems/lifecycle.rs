//! Lifecycle System
//!
//! Bots joining an emptyish room, satisfaction bookkeeping, and unhappy bots
//! saying goodbye and leaving.

use bevy_ecs::prelude::*;
use rand::Rng;

use chat_events::{MessageKind, ParticipantId, SimTime};

use crate::bias::Bias;
use crate::components::{Participant, ParticipantRegistry, SCORE_LIMIT};
use crate::config::{EngineConfig, LifecycleConfig, SatisfactionConfig};
use crate::messages::MessageFactory;
use crate::output::{Presentation, SessionStats};
use crate::setup::{generate_bot_profile, generate_bot_state};
use crate::timers::{SessionClock, Task, TimerQueue};
use crate::SimRng;

use super::typing::{schedule_delivery, typing_delay_ms};

/// Per-tick join probability with `bots` bots present.
///
/// `base` in an empty room, falling to `floor` once the room is full.
pub fn join_probability(bots: usize, config: &LifecycleConfig) -> f32 {
    let full = config.room_full.max(1) as f32;
    let fill = bots.min(config.room_full) as f32 / full;
    let span = config.join_base_probability - config.join_floor_probability;
    config.join_floor_probability + span * (1.0 - fill).powf(config.join_exponent)
}

/// Comfort factor for a message density: 1 at the centre of the comfortable
/// band, `floor` at and beyond its edges.
pub fn density_bump(density: f32, config: &SatisfactionConfig) -> f32 {
    let centre = (config.density_low + config.density_high) / 2.0;
    let half_width = (config.density_high - config.density_low) / 2.0;
    if half_width <= 0.0 {
        return config.density_floor;
    }
    let t = (density - centre) / half_width;
    if t.abs() >= 1.0 {
        return config.density_floor;
    }
    config.density_floor + (1.0 - config.density_floor) * (1.0 - t * t).powf(config.density_exponent)
}

/// Satisfaction in [0, 1]: mean standing rescaled to [0, 1] times the density bump.
/// A bot with nobody else around counts as neutral.
pub fn satisfaction_of(participant: &Participant, density: f32, config: &SatisfactionConfig) -> f32 {
    let standing = participant
        .mean_score()
        .map(|mean| (mean + SCORE_LIMIT) / (2.0 * SCORE_LIMIT))
        .unwrap_or(0.5);
    (standing * density_bump(density, config)).clamp(0.0, 1.0)
}

/// Per-tick leave probability.
pub fn leave_probability(satisfaction: f32, config: &LifecycleConfig) -> f32 {
    config.leave_rate * (1.0 - satisfaction)
}

/// Generates a bot, adds it and announces it. Returns its id.
pub fn admit_bot<R: Rng + ?Sized>(
    registry: &mut ParticipantRegistry,
    rng: &mut R,
    config: &EngineConfig,
    now: SimTime,
    presentation: &mut Presentation,
    stats: &mut SessionStats,
) -> ParticipantId {
    let profile = generate_bot_profile(registry, rng);
    let state = generate_bot_state(&config.bots, rng);
    let bot = registry.add_bot(profile, state, now);
    let id = bot.id();
    let profile = bot.profile.clone();
    tracing::info!(
        "{} joined ({}, verbosity {:.2})",
        profile.name,
        profile.personality,
        bot.bot().map(|b| b.verbosity).unwrap_or_default()
    );
    presentation.participant_joined(&profile, now);
    stats.record_join(registry.bot_count());
    id
}

/// Starts a bot's departure: it goes busy, maybe says goodbye after typing
/// it, and is removed after a further random delay.
#[allow(clippy::too_many_arguments)]
pub fn begin_departure<R: Rng + ?Sized>(
    bot_id: ParticipantId,
    registry: &mut ParticipantRegistry,
    rng: &mut R,
    config: &EngineConfig,
    factory: &MessageFactory,
    timers: &mut TimerQueue,
    now: SimTime,
) {
    let lifecycle = &config.lifecycle;
    let Some(bot) = registry.get_mut(bot_id) else {
        return;
    };
    let from = bot.to_ref();
    let Some(state) = bot.bot_mut() else {
        return;
    };
    state.busy = true;
    let satisfaction = state.satisfaction;
    let typing_speed = state.typing_speed;

    let mut leave_at = now;
    if rng.gen::<f32>() < lifecycle.goodbye_probability {
        // Satisfaction mapped onto the standing scale
        let standing = satisfaction * 2.0 * SCORE_LIMIT - SCORE_LIMIT;
        let mood = Bias::toward(standing).sample(rng);
        match factory.create_message(from.clone(), None, MessageKind::Goodbye, None, mood) {
            Ok(draft) => {
                let delay = typing_delay_ms(draft.text.chars().count(), 0, typing_speed, &config.typing, rng);
                leave_at = schedule_delivery(timers, now, delay, draft, false);
            }
            Err(e) => tracing::warn!("{} could not say goodbye: {}", from.name, e),
        }
    }

    let linger = rng.gen_range(lifecycle.departure_delay_min_ms..=lifecycle.departure_delay_max_ms);
    let depart_at = leave_at.after(linger);
    tracing::info!(
        "{} is leaving (satisfaction {:.2}), gone at {}",
        from.name,
        satisfaction,
        depart_at
    );
    timers.schedule(depart_at, Task::Depart { bot: bot_id });
}

/// System: Roll for a new bot joining
pub fn roll_join(
    config: Res<EngineConfig>,
    clock: Res<SessionClock>,
    mut rng: ResMut<SimRng>,
    mut registry: ResMut<ParticipantRegistry>,
    mut presentation: ResMut<Presentation>,
    mut stats: ResMut<SessionStats>,
) {
    let rng = &mut rng.0;
    let p = join_probability(registry.bot_count(), &config.lifecycle);
    if rng.gen::<f32>() < p {
        admit_bot(&mut registry, rng, &config, clock.now, &mut presentation, &mut stats);
    }
}

/// System: Recompute every bot's satisfaction
pub fn update_satisfaction(config: Res<EngineConfig>, mut registry: ResMut<ParticipantRegistry>) {
    let density = registry.density();
    for participant in registry.participants_mut() {
        let satisfaction = satisfaction_of(participant, density, &config.satisfaction);
        if let Some(state) = participant.bot_mut() {
            state.satisfaction = satisfaction;
        }
    }
}

/// System: Roll for idle bots leaving
pub fn roll_leaves(
    config: Res<EngineConfig>,
    clock: Res<SessionClock>,
    factory: Res<MessageFactory>,
    mut rng: ResMut<SimRng>,
    mut registry: ResMut<ParticipantRegistry>,
    mut timers: ResMut<TimerQueue>,
) {
    let rng = &mut rng.0;
    for bot_id in registry.idle_bot_ids() {
        let satisfaction = registry
            .get(bot_id)
            .and_then(|p| p.bot())
            .map(|b| b.satisfaction)
            .unwrap_or(1.0);
        if rng.gen::<f32>() < leave_probability(satisfaction, &config.lifecycle) {
            begin_departure(bot_id, &mut registry, rng, &config, &factory, &mut timers, clock.now);
        }
    }
}
