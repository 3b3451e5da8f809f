//! Engine Systems
//!
//! The tick stages (decay, join, density, satisfaction, leave, initiative) and
//! the per-message reaction pass.

pub mod density;
pub mod initiative;
pub mod lifecycle;
pub mod reaction;
pub mod relationship;
pub mod typing;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;

pub use density::{density_factor, update_density};
pub use initiative::{choose_kind, eagerness, idle_factor, plan_targets, roll_initiative};
pub use lifecycle::{
    admit_bot, begin_departure, density_bump, join_probability, leave_probability, roll_join,
    roll_leaves, satisfaction_of, update_satisfaction,
};
pub use reaction::{bother_for, bother_level, plan_response, react_to_messages, select_reactors, Inbox};
pub use relationship::{apply_mood, decay_relationships, update_relationships};
pub use typing::{schedule_delivery, typing_delay_ms};

/// Builds the schedule for one scheduler tick. Stages run in order on one thread.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            decay_relationships,
            roll_join,
            update_density,
            update_satisfaction,
            roll_leaves,
            roll_initiative,
        )
            .chain(),
    );
    schedule
}

/// Builds the schedule run after every posted message.
pub fn reaction_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(react_to_messages);
    schedule
}
