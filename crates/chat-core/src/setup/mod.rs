//! Participant Setup
//!
//! Generation of bot and human profiles.

pub mod bots;

pub use bots::*;
