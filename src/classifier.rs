//! Advisory profile classifier boundary
//!
//! An optional external model can label a session with a behavioral profile.
//! The engine builds the normalized feature vector and treats the prediction
//! as advisory only: it is attached to the report when available and the
//! rule-based profile is never blocked or altered by it.

use crate::normalizer::clamp_unit;
use crate::types::{DomainScores, SessionTelemetry, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Feature names in vector order, for model interop
pub const PROFILE_FEATURE_NAMES: [&str; 8] = [
    "impulsivity",
    "attention",
    "memory_org",
    "reaction_speed_normalized",
    "reaction_variability_normalized",
    "skip_rate",
    "task_completion_rate",
    "avg_accuracy",
];

/// Assumed mean reaction time when the wait game reported none (milliseconds)
const DEFAULT_AVG_REACTION_MS: f64 = 350.0;

/// Behavioral profile classes the classifier may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileClass {
    Normal,
    #[serde(rename = "ADHD-Like")]
    AdhdLike,
    #[serde(rename = "Learning-Disability")]
    LearningDisability,
    Gifted,
    #[serde(rename = "Mixed-Profile")]
    MixedProfile,
}

impl ProfileClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileClass::Normal => "Normal",
            ProfileClass::AdhdLike => "ADHD-Like",
            ProfileClass::LearningDisability => "Learning-Disability",
            ProfileClass::Gifted => "Gifted",
            ProfileClass::MixedProfile => "Mixed-Profile",
        }
    }

    /// Follow-up risk implied by the profile class
    pub fn risk_level(&self) -> Severity {
        match self {
            ProfileClass::Normal | ProfileClass::Gifted => Severity::Low,
            ProfileClass::MixedProfile | ProfileClass::LearningDisability => Severity::Moderate,
            ProfileClass::AdhdLike => Severity::High,
        }
    }
}

/// Normalized feature vector fed to the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileFeatures {
    pub impulsivity: f64,
    pub attention: f64,
    pub memory_org: f64,
    pub reaction_speed_normalized: f64,
    pub reaction_variability_normalized: f64,
    pub skip_rate: f64,
    pub task_completion_rate: f64,
    pub avg_accuracy: f64,
}

impl ProfileFeatures {
    /// Build the feature vector from session telemetry and domain scores.
    ///
    /// Reaction speed is normalized over a 200-500ms window; variability over
    /// 0-200ms. An incomplete step task counts as half completion. Accuracy
    /// is the inverse of the memory/organization problem score.
    pub fn from_session(telemetry: &SessionTelemetry, scores: &DomainScores) -> Self {
        let avg_reaction = telemetry
            .wait_game
            .avg_reaction
            .unwrap_or(DEFAULT_AVG_REACTION_MS);

        Self {
            impulsivity: scores.impulsivity,
            attention: scores.attention,
            memory_org: scores.memory_organization,
            reaction_speed_normalized: clamp_unit((avg_reaction - 200.0) / 300.0),
            reaction_variability_normalized: clamp_unit(
                telemetry.wait_game.reaction_variability_ms() / 200.0,
            ),
            skip_rate: clamp_unit(telemetry.story_game.skip_rate()),
            task_completion_rate: if telemetry.step_game.task_completed() {
                1.0
            } else {
                0.5
            },
            avg_accuracy: clamp_unit(1.0 - scores.memory_organization),
        }
    }

    /// Features in [`PROFILE_FEATURE_NAMES`] order
    pub fn to_vec(&self) -> [f64; 8] {
        [
            self.impulsivity,
            self.attention,
            self.memory_org,
            self.reaction_speed_normalized,
            self.reaction_variability_normalized,
            self.skip_rate,
            self.task_completion_rate,
            self.avg_accuracy,
        ]
    }
}

/// Failure reasons at the classifier boundary
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

/// Prediction returned by an external classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePrediction {
    /// Most likely profile class
    pub profile: ProfileClass,
    /// Probability of the predicted class, [0,1]
    pub confidence: f64,
    /// Full probability distribution keyed by class name
    pub probabilities: BTreeMap<String, f64>,
    /// Risk level implied by the predicted class
    pub risk_level: Severity,
}

/// External behavioral-profile classifier.
///
/// Implementations wrap whatever model backend the deployment uses; the
/// engine only depends on this trait.
pub trait ProfileClassifier {
    fn classify(&self, features: &ProfileFeatures) -> Result<ProfilePrediction, ClassifierError>;
}
