//! Session Statistics
//!
//! Running counts of what happened in the session, reported at the end of a run.

use bevy_ecs::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use chat_events::MessageKind;

/// Resource: session counters
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub ticks: u64,
    pub messages_posted: u64,
    pub messages_by_kind: BTreeMap<String, u64>,
    /// Deliveries dropped because a participant they named had left
    pub stale_deliveries: u64,
    /// Reactions that could not be composed
    pub failed_reactions: u64,
    pub reactions_scheduled: u64,
    pub initiatives_scheduled: u64,
    pub joins: u64,
    pub leaves: u64,
    pub peak_bots: usize,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_post(&mut self, kind: MessageKind) {
        self.messages_posted += 1;
        *self.messages_by_kind.entry(kind.as_str().to_string()).or_insert(0) += 1;
    }

    pub fn record_join(&mut self, bots_present: usize) {
        self.joins += 1;
        self.peak_bots = self.peak_bots.max(bots_present);
    }

    pub fn posts_of(&self, kind: MessageKind) -> u64 {
        self.messages_by_kind.get(kind.as_str()).copied().unwrap_or(0)
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Ticks: {}", self.ticks)?;
        writeln!(f, "Messages posted: {}", self.messages_posted)?;
        for (kind, count) in &self.messages_by_kind {
            writeln!(f, "  {}: {}", kind, count)?;
        }
        writeln!(
            f,
            "Reactions scheduled: {} ({} failed)",
            self.reactions_scheduled, self.failed_reactions
        )?;
        writeln!(f, "Initiatives scheduled: {}", self.initiatives_scheduled)?;
        writeln!(f, "Stale deliveries dropped: {}", self.stale_deliveries)?;
        write!(
            f,
            "Joins: {}, leaves: {}, peak bots: {}",
            self.joins, self.leaves, self.peak_bots
        )
    }
}
