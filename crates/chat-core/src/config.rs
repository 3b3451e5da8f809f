//! Configuration System
//!
//! Loads engine tuning parameters from tuning.toml so thresholds, curves and
//! timings can be adjusted without recompiling. Every section falls back to
//! its defaults, so a tuning file only needs the knobs it changes.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Complete engine configuration.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub session: SessionConfig,
    pub bots: BotConfig,
    pub relationships: RelationshipConfig,
    pub density: DensityConfig,
    pub reaction: ReactionConfig,
    pub typing: TypingConfig,
    pub lifecycle: LifecycleConfig,
    pub satisfaction: SatisfactionConfig,
    pub initiative: InitiativeConfig,
    pub human: HumanConfig,
}

/// Session-level timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interval between scheduler ticks
    pub tick_interval_ms: u64,
    /// Bots that join when the session starts
    pub initial_bots: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            initial_bots: 3,
        }
    }
}

/// Bot generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Lower bound of the verbosity sub-range (lower speaks more)
    pub verbosity_min: f32,
    /// Upper bound of the verbosity sub-range
    pub verbosity_max: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            verbosity_min: 0.2,
            verbosity_max: 0.9,
        }
    }
}

/// Relationship scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Multiplier on score changes when a message is addressed to the bot
    pub addressing_bonus: f32,
    /// Score moved toward neutral on every tick
    pub decay_step: f32,
    /// Score at or above which a bot counts the other as a friend
    pub friend_threshold: f32,
    /// Score at or below which a bot mutes the other
    pub mute_threshold: f32,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            addressing_bonus: 1.5,
            decay_step: 0.5,
            friend_threshold: 60.0,
            mute_threshold: -90.0,
        }
    }
}

/// Message density tracking and the spam penalty derived from it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Length of the rolling message window
    pub window_ms: u64,
    /// How quickly the penalty factor shrinks as density rises
    pub sensitivity: f32,
    /// Smallest penalty factor; activity never drops to zero from spam alone
    pub penalty_floor: f32,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            window_ms: 30_000,
            sensitivity: 1.0,
            penalty_floor: 0.15,
        }
    }
}

/// Bother level and reaction selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// Bother level a bot must exceed to react
    pub bother_threshold: f32,
    /// Upper bound on bots reacting to one message
    pub max_reactions_per_message: usize,
    /// Weight of the fresh random draw
    pub random_weight: f32,
    /// Weight of relationship magnitude toward the sender
    pub relationship_weight: f32,
    /// Weight of talkativeness (1 - verbosity)
    pub talkativeness_weight: f32,
    /// Multiplier when the message is addressed to the bot
    pub addressing_bonus: f32,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            bother_threshold: 0.6,
            max_reactions_per_message: 3,
            random_weight: 0.6,
            relationship_weight: 0.4,
            talkativeness_weight: 0.5,
            addressing_bonus: 1.5,
        }
    }
}

/// Typing delay: `base + (len_out * (speed + offset) + len_in / divisor) * jitter`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub base_ms: u64,
    /// Added to the bot's typing speed per outgoing character
    pub typing_offset: f32,
    /// Reading is this many times faster than typing
    pub reading_divisor: f32,
    /// Lower bound of the per-character jitter, in milliseconds
    pub jitter_min_ms: f32,
    /// Upper bound of the per-character jitter, in milliseconds
    pub jitter_max_ms: f32,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            base_ms: 800,
            typing_offset: 0.5,
            reading_divisor: 4.0,
            jitter_min_ms: 60.0,
            jitter_max_ms: 120.0,
        }
    }
}

/// Join and leave behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Bot count at which the join curve reaches its floor
    pub room_full: usize,
    /// Join probability per tick with an empty room
    pub join_base_probability: f32,
    /// Join probability per tick once the room is full
    pub join_floor_probability: f32,
    /// Curve exponent; higher drops faster as the room fills
    pub join_exponent: f32,
    /// Per-tick leave probability of a completely unsatisfied bot
    pub leave_rate: f32,
    /// Chance a leaving bot says goodbye first
    pub goodbye_probability: f32,
    pub departure_delay_min_ms: u64,
    pub departure_delay_max_ms: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            room_full: 12,
            join_base_probability: 0.5,
            join_floor_probability: 0.01,
            join_exponent: 2.0,
            leave_rate: 0.02,
            goodbye_probability: 0.7,
            departure_delay_min_ms: 1500,
            departure_delay_max_ms: 5000,
        }
    }
}

/// Satisfaction density bump
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SatisfactionConfig {
    /// Lower edge of the comfortable density band (messages/second)
    pub density_low: f32,
    /// Upper edge of the comfortable density band (messages/second)
    pub density_high: f32,
    /// Density factor outside the band
    pub density_floor: f32,
    /// Bump sharpness; higher narrows the peak
    pub density_exponent: f32,
}

impl Default for SatisfactionConfig {
    fn default() -> Self {
        Self {
            density_low: 0.02,
            density_high: 1.0,
            density_floor: 0.3,
            density_exponent: 2.0,
        }
    }
}

/// Unprompted speech
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitiativeConfig {
    /// Eagerness a bot must exceed to speak up
    pub eagerness_threshold: f32,
    /// Idle factor right after an interaction
    pub idle_min_factor: f32,
    /// Idle time at which the idle factor reaches 1
    pub idle_max_ms: u64,
    /// Greeting weight for a bot that has never greeted
    pub greeting_weight_ungreeted: f32,
    pub greeting_weight: f32,
    pub gossip_weight: f32,
    pub initiative_weight: f32,
}

impl Default for InitiativeConfig {
    fn default() -> Self {
        Self {
            eagerness_threshold: 0.3,
            idle_min_factor: 0.1,
            idle_max_ms: 60_000,
            greeting_weight_ungreeted: 0.8,
            greeting_weight: 0.1,
            gossip_weight: 0.45,
            initiative_weight: 0.45,
        }
    }
}

/// The human participant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HumanConfig {
    pub name: String,
    pub color: String,
    pub avatar: String,
    /// Mood assigned to human messages; 0.5 never moves relationships
    pub mood: f32,
}

impl Default for HumanConfig {
    fn default() -> Self {
        Self {
            name: "You".to_string(),
            color: "steelblue".to_string(),
            avatar: "avatars/human.png".to_string(),
            mood: 0.5,
        }
    }
}

impl EngineConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from `path`, or uses defaults if it is missing or invalid.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!("Could not load {}: {}. Using defaults.", path.display(), e);
            Self::default()
        })
    }

    /// Renders the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks every setting is inside the range the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }
        fn unit(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(invalid(field, format!("{} is outside [0, 1]", value)))
            }
        }
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(invalid(field, format!("{} must be positive", value)))
            }
        }
        fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(invalid(field, format!("{} must not be negative", value)))
            }
        }

        if self.session.tick_interval_ms == 0 {
            return Err(invalid("session.tick_interval_ms", "must be at least 1"));
        }

        let bots = &self.bots;
        if !(bots.verbosity_min > 0.0 && bots.verbosity_min < bots.verbosity_max && bots.verbosity_max < 1.0) {
            return Err(invalid(
                "bots.verbosity_min",
                format!(
                    "verbosity range [{}, {}] must be increasing and inside (0, 1)",
                    bots.verbosity_min, bots.verbosity_max
                ),
            ));
        }

        let rel = &self.relationships;
        if !(rel.addressing_bonus.is_finite() && rel.addressing_bonus >= 1.0) {
            return Err(invalid("relationships.addressing_bonus", "must be at least 1"));
        }
        positive("relationships.decay_step", rel.decay_step)?;
        if !(rel.mute_threshold < rel.friend_threshold
            && rel.mute_threshold >= -100.0
            && rel.friend_threshold <= 100.0)
        {
            return Err(invalid(
                "relationships.mute_threshold",
                "must be below friend_threshold, both within [-100, 100]",
            ));
        }

        let density = &self.density;
        if density.window_ms == 0 {
            return Err(invalid("density.window_ms", "must be at least 1"));
        }
        non_negative("density.sensitivity", density.sensitivity)?;
        unit("density.penalty_floor", density.penalty_floor)?;

        let reaction = &self.reaction;
        non_negative("reaction.bother_threshold", reaction.bother_threshold)?;
        non_negative("reaction.random_weight", reaction.random_weight)?;
        non_negative("reaction.relationship_weight", reaction.relationship_weight)?;
        non_negative("reaction.talkativeness_weight", reaction.talkativeness_weight)?;
        if !(reaction.addressing_bonus.is_finite() && reaction.addressing_bonus >= 1.0) {
            return Err(invalid("reaction.addressing_bonus", "must be at least 1"));
        }

        let typing = &self.typing;
        non_negative("typing.typing_offset", typing.typing_offset)?;
        positive("typing.reading_divisor", typing.reading_divisor)?;
        non_negative("typing.jitter_min_ms", typing.jitter_min_ms)?;
        if !(typing.jitter_min_ms <= typing.jitter_max_ms && typing.jitter_max_ms.is_finite()) {
            return Err(invalid("typing.jitter_max_ms", "must not be below jitter_min_ms"));
        }

        let lifecycle = &self.lifecycle;
        if lifecycle.room_full == 0 {
            return Err(invalid("lifecycle.room_full", "must be at least 1"));
        }
        unit("lifecycle.join_base_probability", lifecycle.join_base_probability)?;
        unit("lifecycle.join_floor_probability", lifecycle.join_floor_probability)?;
        if lifecycle.join_floor_probability > lifecycle.join_base_probability {
            return Err(invalid(
                "lifecycle.join_floor_probability",
                "must not exceed join_base_probability",
            ));
        }
        positive("lifecycle.join_exponent", lifecycle.join_exponent)?;
        unit("lifecycle.leave_rate", lifecycle.leave_rate)?;
        unit("lifecycle.goodbye_probability", lifecycle.goodbye_probability)?;
        if lifecycle.departure_delay_min_ms > lifecycle.departure_delay_max_ms {
            return Err(invalid(
                "lifecycle.departure_delay_max_ms",
                "must not be below departure_delay_min_ms",
            ));
        }

        let satisfaction = &self.satisfaction;
        non_negative("satisfaction.density_low", satisfaction.density_low)?;
        if !(satisfaction.density_low < satisfaction.density_high && satisfaction.density_high.is_finite()) {
            return Err(invalid("satisfaction.density_high", "must be above density_low"));
        }
        unit("satisfaction.density_floor", satisfaction.density_floor)?;
        positive("satisfaction.density_exponent", satisfaction.density_exponent)?;

        let initiative = &self.initiative;
        non_negative("initiative.eagerness_threshold", initiative.eagerness_threshold)?;
        unit("initiative.idle_min_factor", initiative.idle_min_factor)?;
        if initiative.idle_max_ms == 0 {
            return Err(invalid("initiative.idle_max_ms", "must be at least 1"));
        }
        for (field, weight) in [
            ("initiative.greeting_weight_ungreeted", initiative.greeting_weight_ungreeted),
            ("initiative.greeting_weight", initiative.greeting_weight),
            ("initiative.gossip_weight", initiative.gossip_weight),
            ("initiative.initiative_weight", initiative.initiative_weight),
        ] {
            non_negative(field, weight)?;
        }
        if initiative.gossip_weight + initiative.initiative_weight + initiative.greeting_weight <= 0.0 {
            return Err(invalid("initiative.gossip_weight", "kind weights must not all be zero"));
        }

        if self.human.name.trim().is_empty() {
            return Err(invalid("human.name", "must not be blank"));
        }
        unit("human.mood", self.human.mood)?;

        Ok(())
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Error rendering TOML config
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// A setting outside its valid range
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}
