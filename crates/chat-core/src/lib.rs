//! Simulated Chatroom Engine Library
//!
//! Bots join and leave a chat room, react to the human and to each other, and
//! exchange templated messages driven by mood, relationship and satisfaction
//! scores. Presentation is delegated to a [`output::PresentationSink`].

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod bias;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod messages;
pub mod output;
pub mod setup;
pub mod systems;
pub mod timers;

pub use bias::{Bias, ParseBiasError};
pub use components::*;
pub use config::{ConfigError, EngineConfig};
pub use engine::ChatEngine;
pub use error::EngineError;
pub use messages::{FactoryError, MessageFactory, MessageTemplates, TemplateError};
pub use output::{
    ConsoleSink, FanoutSink, JsonlSink, NullSink, Presentation, PresentationSink, RecordingSink,
    SessionStats,
};
pub use timers::{SessionClock, Task, TimerQueue};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);
