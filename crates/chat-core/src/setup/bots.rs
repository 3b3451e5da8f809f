//! Bot Generation
//!
//! Random presentation attributes and behavioural traits for joining bots.

use rand::seq::SliceRandom;
use rand::Rng;

use chat_events::{ParticipantId, ParticipantProfile};

use crate::components::{BotState, ParticipantRegistry};
use crate::config::{BotConfig, HumanConfig};

const BOT_NAMES: &[&str] = &[
    "Chatty", "Mira", "Bo", "Kes", "Juno", "Pip", "Ravi", "Sol", "Tamsin", "Odo",
    "Wren", "Lux", "Nico", "Fable", "Quill", "Ember", "Dash", "Ivo", "Zuri", "Moss",
];

const BOT_COLORS: &[&str] = &[
    "green", "orange", "purple", "teal", "crimson", "goldenrod", "orchid", "slategray",
];

const BOT_AVATARS: &[&str] = &["🤖", "🦊", "🐙", "🦉", "🐢", "🦜", "🐝", "🐧"];

const PERSONALITIES: &[&str] = &[
    "cheerful", "grumpy", "curious", "shy", "sarcastic", "earnest", "dreamy", "blunt",
];

/// Picks a name nobody in the room is using, numbering repeats once the list runs out.
fn generate_name<R: Rng + ?Sized>(registry: &ParticipantRegistry, rng: &mut R) -> String {
    let taken = |name: &str| registry.participants().iter().any(|p| p.name() == name);

    let free: Vec<&str> = BOT_NAMES.iter().copied().filter(|n| !taken(*n)).collect();
    if let Some(name) = free.choose(rng) {
        return name.to_string();
    }

    let base = BOT_NAMES[rng.gen_range(0..BOT_NAMES.len())];
    let mut suffix = 2;
    loop {
        let candidate = format!("{} {}", base, suffix);
        if !taken(candidate.as_str()) {
            return candidate;
        }
        suffix += 1;
    }
}

fn pick<R: Rng + ?Sized>(options: &[&str], rng: &mut R) -> String {
    options[rng.gen_range(0..options.len())].to_string()
}

/// Generates the profile of a new bot, reserving its id.
pub fn generate_bot_profile<R: Rng + ?Sized>(
    registry: &mut ParticipantRegistry,
    rng: &mut R,
) -> ParticipantProfile {
    let name = generate_name(registry, rng);
    ParticipantProfile {
        id: registry.allocate_participant_id(),
        name,
        color: pick(BOT_COLORS, rng),
        avatar: pick(BOT_AVATARS, rng),
        personality: pick(PERSONALITIES, rng),
        is_human: false,
    }
}

/// Generates behavioural traits for a new bot.
///
/// Verbosity is the mean of two uniforms mapped onto the configured range, so
/// most bots sit near its middle.
pub fn generate_bot_state<R: Rng + ?Sized>(config: &BotConfig, rng: &mut R) -> BotState {
    let a: f32 = rng.gen();
    let b: f32 = rng.gen();
    let spread = config.verbosity_max - config.verbosity_min;
    let verbosity = config.verbosity_min + spread * (a + b) / 2.0;
    let typing_speed: f32 = rng.gen();
    BotState::new(verbosity, typing_speed)
}

/// Profile for the human participant.
pub fn human_profile(id: ParticipantId, config: &HumanConfig) -> ParticipantProfile {
    ParticipantProfile {
        id,
        name: config.name.clone(),
        color: config.color.clone(),
        avatar: config.avatar.clone(),
        personality: "human".to_string(),
        is_human: true,
    }
}
