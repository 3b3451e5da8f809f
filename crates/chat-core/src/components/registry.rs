//! Participant Registry
//!
//! The active participants in join order, the relationship matrix between
//! them and the rolling message-density window.

use bevy_ecs::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

use chat_events::{MessageId, ParticipantId, ParticipantProfile, SimTime, MILLIS_PER_SECOND};

use super::participant::{BotState, Participant, Role};
use crate::error::EngineError;

/// Resource: every participant currently in the room
#[derive(Resource, Debug, Default)]
pub struct ParticipantRegistry {
    /// Join order
    participants: Vec<Participant>,
    next_participant_id: u32,
    next_message_id: u64,
    /// Post times inside the density window, oldest first
    message_timestamps: VecDeque<SimTime>,
    /// Messages per second over the window
    message_density: f32,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the id for the next participant.
    pub fn allocate_participant_id(&mut self) -> ParticipantId {
        let id = ParticipantId(self.next_participant_id);
        self.next_participant_id += 1;
        id
    }

    /// Reserves the id for the next posted message.
    pub fn allocate_message_id(&mut self) -> MessageId {
        let id = MessageId(self.next_message_id);
        self.next_message_id += 1;
        id
    }

    /// Adds a bot with neutral relationships in both directions with everyone present.
    pub fn add_bot(&mut self, profile: ParticipantProfile, state: BotState, now: SimTime) -> &Participant {
        self.admit(profile, Role::Bot(state), now)
    }

    /// Adds the human. There is at most one.
    pub fn add_human(&mut self, profile: ParticipantProfile, now: SimTime) -> Result<&Participant, EngineError> {
        if let Some(existing) = self.human() {
            return Err(EngineError::HumanAlreadyPresent(existing.name().to_string()));
        }
        Ok(self.admit(profile, Role::Human, now))
    }

    fn admit(&mut self, mut profile: ParticipantProfile, role: Role, now: SimTime) -> &Participant {
        profile.is_human = matches!(role, Role::Human);
        let mut newcomer = Participant {
            profile,
            role,
            relationships: Default::default(),
            last_interaction: now,
        };
        let new_id = newcomer.id();

        for existing in &mut self.participants {
            let toward_newcomer = existing.fresh_relationship();
            existing.relationships.insert(new_id, toward_newcomer);
            let toward_existing = newcomer.fresh_relationship();
            newcomer.relationships.insert(existing.id(), toward_existing);
        }

        self.participants.push(newcomer);
        let index = self.participants.len() - 1;
        &self.participants[index]
    }

    /// Removes a participant and purges its id from every relationship map.
    pub fn remove(&mut self, id: ParticipantId) -> Option<Participant> {
        let index = self.participants.iter().position(|p| p.id() == id)?;
        let removed = self.participants.remove(index);
        for other in &mut self.participants {
            other.relationships.remove(&id);
        }
        Some(removed)
    }

    pub fn exists(&self, id: ParticipantId) -> bool {
        self.participants.iter().any(|p| p.id() == id)
    }

    pub fn get(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: ParticipantId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id() == id)
    }

    /// Participants in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participants_mut(&mut self) -> impl Iterator<Item = &mut Participant> {
        self.participants.iter_mut()
    }

    pub fn bots(&self) -> impl Iterator<Item = &Participant> {
        self.participants.iter().filter(|p| !p.is_human())
    }

    pub fn bot_count(&self) -> usize {
        self.bots().count()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn human(&self) -> Option<&Participant> {
        self.participants.iter().find(|p| p.is_human())
    }

    /// Ids of bots that are not busy, in join order.
    pub fn idle_bot_ids(&self) -> Vec<ParticipantId> {
        self.participants
            .iter()
            .filter(|p| p.is_idle_bot())
            .map(|p| p.id())
            .collect()
    }

    /// Uniform pick among bots that are not busy.
    pub fn choose_idle_bot<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Participant> {
        let idle: Vec<&Participant> = self.participants.iter().filter(|p| p.is_idle_bot()).collect();
        idle.choose(rng).copied()
    }

    /// Uniform pick among participants not in `excluded`.
    pub fn choose_other_than<R: Rng + ?Sized>(
        &self,
        excluded: &[ParticipantId],
        rng: &mut R,
    ) -> Option<&Participant> {
        let pool: Vec<&Participant> = self
            .participants
            .iter()
            .filter(|p| !excluded.contains(&p.id()))
            .collect();
        pool.choose(rng).copied()
    }

    /// Marks a participant as having just interacted.
    pub fn touch(&mut self, id: ParticipantId, now: SimTime) {
        if let Some(participant) = self.get_mut(id) {
            participant.last_interaction = now;
        }
    }

    /// Records a post time for density tracking.
    pub fn record_message(&mut self, at: SimTime) {
        self.message_timestamps.push_back(at);
    }

    /// Drops timestamps older than the window and recomputes density over
    /// `min(elapsed, window)`.
    pub fn update_density(&mut self, now: SimTime, window_ms: u64, elapsed_ms: u64) -> f32 {
        let cutoff = SimTime::from_millis(now.as_millis().saturating_sub(window_ms));
        while self.message_timestamps.front().is_some_and(|t| *t < cutoff) {
            self.message_timestamps.pop_front();
        }

        let span_ms = elapsed_ms.min(window_ms);
        self.message_density = if span_ms == 0 {
            0.0
        } else {
            self.message_timestamps.len() as f32 * MILLIS_PER_SECOND as f32 / span_ms as f32
        };
        self.message_density
    }

    /// Messages per second as of the last density update.
    pub fn density(&self) -> f32 {
        self.message_density
    }

    pub fn messages_in_window(&self) -> usize {
        self.message_timestamps.len()
    }
}
