//! Chat Engine
//!
//! Owns the ECS world and drives it: the session clock, the timer queue, the
//! posting pipeline and the start/stop ticker. Everything runs on the caller's
//! thread; time only moves when the caller advances it.

use bevy_ecs::prelude::*;
use bevy_ecs::system::SystemState;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use chat_events::{
    Message, MessageDraft, MessageKind, ParticipantId, ParticipantProfile, ParticipantRef, SimTime,
};

use crate::components::{Participant, ParticipantRegistry};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::messages::{MessageFactory, MessageTemplates};
use crate::output::{Presentation, PresentationSink, SessionStats};
use crate::setup::human_profile;
use crate::systems::{admit_bot, reaction_schedule, tick_schedule, Inbox};
use crate::timers::{SessionClock, Task, TimerQueue};
use crate::SimRng;

/// Announcement made when the session starts
pub const WELCOME_ANNOUNCEMENT: &str = "Welcome to the chat room";

/// Resources needed to admit a bot outside the tick schedule
type AdmitParams<'w> = (
    Res<'w, EngineConfig>,
    Res<'w, SessionClock>,
    ResMut<'w, SimRng>,
    ResMut<'w, ParticipantRegistry>,
    ResMut<'w, Presentation>,
    ResMut<'w, SessionStats>,
);

/// Start/stop state of the repeating tick
#[derive(Debug, Clone, Copy, Default)]
struct Ticker {
    running: bool,
    /// Bumped on every start and stop; ticks from older generations are ignored
    generation: u64,
    started: bool,
}

/// The chat room.
pub struct ChatEngine {
    world: World,
    tick_schedule: Schedule,
    reaction_schedule: Schedule,
    ticker: Ticker,
}

impl ChatEngine {
    /// Creates an engine after validating the configuration and templates.
    pub fn new(
        config: EngineConfig,
        templates: MessageTemplates,
        seed: u64,
        sink: impl PresentationSink + 'static,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        templates.validate()?;

        let mut world = World::new();
        world.insert_resource(config);
        world.insert_resource(SimRng(SmallRng::seed_from_u64(seed)));
        world.insert_resource(ParticipantRegistry::new());
        world.insert_resource(SessionClock::default());
        world.insert_resource(TimerQueue::new());
        world.insert_resource(MessageFactory::new(templates));
        world.insert_resource(Presentation::new(sink));
        world.insert_resource(Inbox::new());
        world.insert_resource(SessionStats::new());

        Ok(Self {
            world,
            tick_schedule: tick_schedule(),
            reaction_schedule: reaction_schedule(),
            ticker: Ticker::default(),
        })
    }

    /// Engine with default tuning and templates.
    pub fn with_defaults(seed: u64, sink: impl PresentationSink + 'static) -> Result<Self, EngineError> {
        Self::new(EngineConfig::default(), MessageTemplates::default(), seed, sink)
    }

    // --- Accessors ---

    pub fn now(&self) -> SimTime {
        self.world.resource::<SessionClock>().now
    }

    pub fn config(&self) -> &EngineConfig {
        self.world.resource::<EngineConfig>()
    }

    pub fn registry(&self) -> &ParticipantRegistry {
        self.world.resource::<ParticipantRegistry>()
    }

    /// Direct registry access, for embedding UIs and tests.
    pub fn registry_mut(&mut self) -> Mut<'_, ParticipantRegistry> {
        self.world.resource_mut::<ParticipantRegistry>()
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.registry().get(id)
    }

    pub fn stats(&self) -> &SessionStats {
        self.world.resource::<SessionStats>()
    }

    pub fn timers(&self) -> &TimerQueue {
        self.world.resource::<TimerQueue>()
    }

    /// Composed messages waiting to be posted, in the order they were scheduled.
    pub fn pending_deliveries(&self) -> Vec<MessageDraft> {
        self.timers().pending_deliveries().into_iter().cloned().collect()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn is_running(&self) -> bool {
        self.ticker.running
    }

    // --- Ticker ---

    /// Starts the repeating tick. The first start also seats the initial bots.
    pub fn start(&mut self) {
        if self.ticker.running {
            return;
        }
        if !self.ticker.started {
            self.ticker.started = true;
            let now = self.now();
            self.world.resource_mut::<SessionClock>().started_at = now;
            self.world
                .resource_mut::<Presentation>()
                .announce(WELCOME_ANNOUNCEMENT, now);
            let initial = self.config().session.initial_bots;
            for _ in 0..initial {
                self.add_bot();
            }
            tracing::info!("Session started with {} bots", initial);
        }

        self.ticker.running = true;
        self.ticker.generation += 1;
        self.schedule_tick(self.now());
    }

    /// Stops the ticker. Scheduled deliveries and departures still happen.
    pub fn stop(&mut self) {
        if self.ticker.running {
            self.ticker.running = false;
            self.ticker.generation += 1;
            tracing::debug!("Ticker stopped at {}", self.now());
        }
    }

    fn schedule_tick(&mut self, from: SimTime) {
        let interval = self.config().session.tick_interval_ms;
        let generation = self.ticker.generation;
        self.world
            .resource_mut::<TimerQueue>()
            .schedule(from.after(interval), Task::Tick { generation });
    }

    /// Runs one scheduler tick at the current time.
    pub fn step_tick(&mut self) {
        self.tick_schedule.run(&mut self.world);
        self.world.resource_mut::<SessionStats>().ticks += 1;
    }

    // --- Time ---

    /// Advances the clock by `millis`, running everything that falls due.
    pub fn advance_by(&mut self, millis: u64) {
        let target = self.now().after(millis);
        self.advance_to(target);
    }

    /// Advances the clock to `target`, running due tasks in order.
    pub fn advance_to(&mut self, target: SimTime) {
        loop {
            let Some(next) = self.world.resource_mut::<TimerQueue>().pop_due(target) else {
                break;
            };
            {
                let mut clock = self.world.resource_mut::<SessionClock>();
                clock.now = clock.now.max(next.due);
            }
            self.run_task(next.task);
        }
        let mut clock = self.world.resource_mut::<SessionClock>();
        clock.now = clock.now.max(target);
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::Tick { generation } => {
                if self.ticker.running && generation == self.ticker.generation {
                    self.step_tick();
                    self.schedule_tick(self.now());
                }
            }
            Task::Deliver {
                draft,
                release_speaker,
            } => {
                let speaker = draft.from.id;
                let posted = self.post(draft).is_some();
                if release_speaker {
                    self.release(speaker, posted);
                }
            }
            Task::Depart { bot } => {
                if self.remove_participant(bot).is_err() {
                    tracing::debug!("Departure of {} skipped: already gone", bot);
                }
            }
        }
    }

    /// Frees a bot after its delivery.
    fn release(&mut self, bot: ParticipantId, posted: bool) {
        let now = self.now();
        let mut registry = self.world.resource_mut::<ParticipantRegistry>();
        if let Some(participant) = registry.get_mut(bot) {
            participant.last_interaction = now;
            if let Some(state) = participant.bot_mut() {
                state.busy = false;
                if posted {
                    state.has_greeted = true;
                }
            }
        }
    }

    // --- Posting ---

    /// Posts a draft now: re-validates everyone it names, stamps it, hands it to
    /// the sink and runs the reaction pass. Stale drafts are dropped.
    pub fn post(&mut self, draft: MessageDraft) -> Option<Message> {
        let now = self.now();
        let missing = {
            let registry = self.world.resource::<ParticipantRegistry>();
            draft
                .referenced_ids()
                .into_iter()
                .find(|id| !registry.exists(*id))
        };
        if let Some(missing) = missing {
            tracing::debug!(
                "Dropping {} from {}: {} is no longer here",
                draft.kind,
                draft.from.name,
                missing
            );
            self.world.resource_mut::<SessionStats>().stale_deliveries += 1;
            return None;
        }

        let message = {
            let mut registry = self.world.resource_mut::<ParticipantRegistry>();
            let id = registry.allocate_message_id();
            registry.record_message(now);
            registry.touch(draft.from.id, now);
            draft.post(id, now)
        };

        self.world.resource_mut::<SessionStats>().record_post(message.kind);
        self.world.resource_mut::<Presentation>().message_posted(&message);
        self.world.resource_mut::<Inbox>().push(message.clone());
        self.reaction_schedule.run(&mut self.world);
        Some(message)
    }

    /// Posts the human's text, addressed to the first bot it mentions.
    pub fn submit_human_message(&mut self, raw_text: &str) -> Result<Message, EngineError> {
        let text = raw_text.trim();
        if text.is_empty() {
            return Err(EngineError::EmptyMessage);
        }
        let (from, to) = {
            let registry = self.registry();
            let human = registry.human().ok_or(EngineError::NoHuman)?;
            let to = registry
                .bots()
                .find(|bot| mentions(text, bot.name()))
                .map(|bot| bot.to_ref());
            (human.to_ref(), to)
        };
        let draft = MessageDraft {
            from,
            to,
            kind: MessageKind::None,
            about: None,
            mood: self.config().human.mood,
            text: text.to_string(),
        };
        self.post(draft).ok_or(EngineError::NoHuman)
    }

    // --- Roster ---

    /// Seats the human. Fails if one is already present.
    pub fn add_human(&mut self) -> Result<ParticipantProfile, EngineError> {
        let now = self.now();
        let config = self.config().human.clone();
        let profile = {
            let mut registry = self.world.resource_mut::<ParticipantRegistry>();
            if let Some(existing) = registry.human() {
                return Err(EngineError::HumanAlreadyPresent(existing.name().to_string()));
            }
            let id = registry.allocate_participant_id();
            registry.add_human(human_profile(id, &config), now)?.profile.clone()
        };
        tracing::info!("{} joined", profile.name);
        self.world
            .resource_mut::<Presentation>()
            .participant_joined(&profile, now);
        Ok(profile)
    }

    /// Generates and seats a new bot.
    pub fn add_bot(&mut self) -> ParticipantId {
        let mut state: SystemState<AdmitParams> = SystemState::new(&mut self.world);
        let (config, clock, mut rng, mut registry, mut presentation, mut stats) =
            state.get_mut(&mut self.world);
        admit_bot(
            &mut registry,
            &mut rng.0,
            &config,
            clock.now,
            &mut presentation,
            &mut stats,
        )
    }

    /// Removes a participant now and announces the departure.
    pub fn remove_participant(&mut self, id: ParticipantId) -> Result<ParticipantProfile, EngineError> {
        let now = self.now();
        let removed = self
            .world
            .resource_mut::<ParticipantRegistry>()
            .remove(id)
            .ok_or(EngineError::UnknownParticipant(id))?;
        tracing::info!("{} left", removed.name());
        if !removed.is_human() {
            self.world.resource_mut::<SessionStats>().leaves += 1;
        }
        self.world
            .resource_mut::<Presentation>()
            .participant_left(&removed.profile, now);
        Ok(removed.profile)
    }

    /// Sets the human's friend flag toward `target`.
    pub fn set_friend(&mut self, target: ParticipantId, is_friend: bool) -> Result<(), EngineError> {
        self.human_standing(target, |rel| rel.is_friend = is_friend)
    }

    /// Sets the human's mute flag toward `target`.
    pub fn set_muted(&mut self, target: ParticipantId, is_muted: bool) -> Result<(), EngineError> {
        self.human_standing(target, |rel| rel.is_muted = is_muted)
    }

    fn human_standing(
        &mut self,
        target: ParticipantId,
        apply: impl FnOnce(&mut crate::components::Relationship),
    ) -> Result<(), EngineError> {
        let mut registry = self.world.resource_mut::<ParticipantRegistry>();
        let human_id = registry.human().map(|h| h.id()).ok_or(EngineError::NoHuman)?;
        let rel = registry
            .get_mut(human_id)
            .and_then(|h| h.relationship_mut(target))
            .ok_or(EngineError::UnknownParticipant(target))?;
        apply(rel);
        Ok(())
    }

    /// Reference to a participant, if present.
    pub fn participant_ref(&self, id: ParticipantId) -> Option<ParticipantRef> {
        self.participant(id).map(|p| p.to_ref())
    }
}

/// True if `text` names `name` as `@name` or as a whole word, ignoring case.
pub fn mentions(text: &str, name: &str) -> bool {
    if name.is_empty() {
        return false;
    }
    let text = text.to_lowercase();
    let name = name.to_lowercase();
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(&name) {
        let start = search_from + offset;
        let end = start + name.len();
        let before_ok = text[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = text[end..].chars().next().map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
        search_from = start + name.chars().next().map_or(1, |c| c.len_utf8());
    }
    false
}
