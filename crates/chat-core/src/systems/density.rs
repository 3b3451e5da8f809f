//! Density System
//!
//! Tracks how busy the room is and derives the spam penalty that damps
//! reactions and initiative when it gets noisy.

use bevy_ecs::prelude::*;

use crate::components::ParticipantRegistry;
use crate::config::{DensityConfig, EngineConfig};
use crate::timers::SessionClock;

/// Penalty factor in [floor, 1]: 1 in a quiet room, shrinking as density rises.
pub fn density_factor(density: f32, config: &DensityConfig) -> f32 {
    let raw = 1.0 / (1.0 + density.max(0.0) * config.sensitivity);
    raw.max(config.penalty_floor)
}

/// System: Recompute message density over the rolling window
pub fn update_density(
    config: Res<EngineConfig>,
    clock: Res<SessionClock>,
    mut registry: ResMut<ParticipantRegistry>,
) {
    let density = registry.update_density(clock.now, config.density.window_ms, clock.elapsed_ms());
    tracing::trace!("Message density {:.3}/s at {}", density, clock.now);
}
