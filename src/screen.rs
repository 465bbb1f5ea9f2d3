//! Quick behavioral screen
//!
//! A lightweight single-game summary computed from wait-game telemetry alone,
//! for callers that want immediate feedback before a full session completes.
//! Not part of the cognitive profile; the profile uses all three games.

use crate::normalizer::clamp_unit;
use crate::scoring::{PREMATURE_RATE_SATURATION, REACTION_VARIABILITY_SATURATION_MS};
use crate::types::WaitGameTelemetry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reaction time at or below which responses count as fast (milliseconds)
const REACTION_SPEED_FLOOR_MS: f64 = 250.0;

/// Reaction-time span over which slowness saturates (milliseconds)
const REACTION_SPEED_RANGE_MS: f64 = 300.0;

/// Coarse behavioral pattern over the wait-game scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenPattern {
    ImpulsiveFluctuating,
    SlowControlled,
    StrongControl,
    ModerateControl,
}

impl ScreenPattern {
    pub fn summary(&self) -> &'static str {
        match self {
            ScreenPattern::ImpulsiveFluctuating => "High impulsivity, fluctuating attention",
            ScreenPattern::SlowControlled => "Slow but controlled responses",
            ScreenPattern::StrongControl => "Strong impulse control and stable attention",
            ScreenPattern::ModerateControl => "Moderate attention and impulse control",
        }
    }
}

impl fmt::Display for ScreenPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.summary())
    }
}

/// Quick screen over wait-game telemetry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuickScreen {
    /// Premature-tap pressure, [0,1]
    pub impulsivity: f64,
    /// Response slowness, [0,1] (higher = slower)
    pub reaction_speed: f64,
    /// Timing inconsistency, [0,1]
    pub attention_variability: f64,
    /// Coarse pattern classification
    pub pattern: ScreenPattern,
}

impl QuickScreen {
    /// Compute the quick screen from wait-game telemetry
    pub fn from_wait_game(wait: &WaitGameTelemetry) -> Self {
        let premature_rate = wait.premature_taps() as f64 / wait.trials_floor() as f64;
        let impulsivity = clamp_unit(premature_rate / PREMATURE_RATE_SATURATION);

        let avg_reaction = wait.avg_reaction.unwrap_or(0.0);
        let reaction_speed =
            clamp_unit((avg_reaction - REACTION_SPEED_FLOOR_MS) / REACTION_SPEED_RANGE_MS);

        let attention_variability =
            clamp_unit(wait.reaction_variability_ms() / REACTION_VARIABILITY_SATURATION_MS);

        let pattern = classify_pattern(impulsivity, reaction_speed, attention_variability);

        Self {
            impulsivity,
            reaction_speed,
            attention_variability,
            pattern,
        }
    }
}

fn classify_pattern(
    impulsivity: f64,
    reaction_speed: f64,
    attention_variability: f64,
) -> ScreenPattern {
    if impulsivity > 0.6 && attention_variability > 0.6 {
        ScreenPattern::ImpulsiveFluctuating
    } else if reaction_speed > 0.6 {
        ScreenPattern::SlowControlled
    } else if impulsivity < 0.3 && attention_variability < 0.3 {
        ScreenPattern::StrongControl
    } else {
        ScreenPattern::ModerateControl
    }
}
