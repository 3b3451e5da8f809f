//! Bias Sampler
//!
//! Biased random draws in [0, 1) used for moods, eagerness and timing jitter.
//!
//! Every non-uniform bias starts from `β = sin(u·π/2)²`, which piles mass up
//! near 0 and 1. `Polar` returns it as is; `Left` and `Right` fold it so the
//! mass sits near one end only.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use chat_events::MoodBand;

/// Largest f32 strictly below 1.0.
const BELOW_ONE: f32 = 1.0 - f32::EPSILON / 2.0;

/// Standing beyond which [`Bias::toward`] leans to one side.
const STANDING_CUTOFF: f32 = 33.0;

/// Shape of a biased draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bias {
    /// Uniform
    #[default]
    None,
    /// Bimodal, mass near 0 and 1
    Polar,
    /// Mass near 0
    Left,
    /// Mass near 1
    Right,
}

impl Bias {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bias::None => "none",
            Bias::Polar => "polar",
            Bias::Left => "left",
            Bias::Right => "right",
        }
    }

    /// Bias that tends to reproduce a mood band: extremes stay extreme,
    /// neutral diffuses toward both ends.
    pub fn echoing(band: MoodBand) -> Self {
        match band {
            MoodBand::Low => Bias::Left,
            MoodBand::Mid => Bias::Polar,
            MoodBand::High => Bias::Right,
        }
    }

    /// Bias for a standing in [-100, 100]: clearly positive leans high,
    /// clearly negative leans low, anything in between swings either way.
    pub fn toward(score: f32) -> Self {
        if score > STANDING_CUTOFF {
            Bias::Right
        } else if score < -STANDING_CUTOFF {
            Bias::Left
        } else {
            Bias::Polar
        }
    }

    /// Draws one value in [0, 1) from a single fresh uniform draw.
    pub fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> f32 {
        let u: f32 = rng.gen();
        self.shape(u)
    }

    /// Maps a uniform value in [0, 1) onto this bias.
    pub fn shape(self, u: f32) -> f32 {
        let value = match self {
            Bias::None => u,
            Bias::Polar => polar(u),
            Bias::Left => fold(polar(u)),
            Bias::Right => 1.0 - fold(polar(u)),
        };
        value.clamp(0.0, BELOW_ONE)
    }
}

fn polar(u: f32) -> f32 {
    (u * std::f32::consts::FRAC_PI_2).sin().powi(2)
}

/// Folds [0, 1] onto [0, 1] so both ends land near 0.
fn fold(beta: f32) -> f32 {
    2.0 * beta.min(1.0 - beta)
}

impl fmt::Display for Bias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized bias name.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown bias '{0}', expected one of none, polar, left, right")]
pub struct ParseBiasError(pub String);

impl FromStr for Bias {
    type Err = ParseBiasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Bias::None),
            "polar" => Ok(Bias::Polar),
            "left" => Ok(Bias::Left),
            "right" => Ok(Bias::Right),
            _ => Err(ParseBiasError(s.to_string())),
        }
    }
}
