//! Engine State
//!
//! Participants, their relationships and the registry that owns them.

pub mod participant;
pub mod registry;

pub use participant::*;
pub use registry::*;
