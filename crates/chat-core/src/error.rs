//! Engine Errors

use crate::config::ConfigError;
use crate::messages::{FactoryError, TemplateError};

/// Errors surfaced by the engine's public operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Human input that is empty or whitespace only
    #[error("message text is empty")]
    EmptyMessage,
    #[error("a human participant ({0}) is already in the room")]
    HumanAlreadyPresent(String),
    #[error("no human participant has joined")]
    NoHuman,
    #[error("unknown participant {0}")]
    UnknownParticipant(chat_events::ParticipantId),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Factory(#[from] FactoryError),
}
