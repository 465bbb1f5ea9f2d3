//! Core types for the MindImprint scoring pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw game telemetry, normalized telemetry, domain scores, and the
//! final cognitive profile report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioral domain assessed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Impulsivity,
    Attention,
    MemoryOrganization,
}

impl Domain {
    /// Human-readable domain name as used in narrative prompts and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Impulsivity => "Impulsivity",
            Domain::Attention => "Attention",
            Domain::MemoryOrganization => "Memory/Organization",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity level derived from a [0,1] problem score.
///
/// Higher scores always mean more behavioral concern; the same classifier is
/// used for every domain and for the overall aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Moderate,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Severity {
    /// Classify a [0,1] score into a severity level.
    ///
    /// Bins are inclusive on their lower edge: exactly 0.25 is `Moderate`,
    /// exactly 0.5 is `High`, exactly 0.75 is `VeryHigh`.
    pub fn from_score(score: f64) -> Self {
        if score < 0.25 {
            Severity::Low
        } else if score < 0.5 {
            Severity::Moderate
        } else if score < 0.75 {
            Severity::High
        } else {
            Severity::VeryHigh
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "Low",
            Severity::Moderate => "Moderate",
            Severity::High => "High",
            Severity::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Telemetry from the reaction-wait game ("Wait for Your Turn").
///
/// All fields are optional; missing values degrade toward the no-problem end
/// of the scale (0 counts, 0 ms) rather than failing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaitGameTelemetry {
    /// Number of trials presented
    #[serde(default)]
    pub total_trials: Option<u32>,
    /// Taps before the go signal
    #[serde(default)]
    pub premature_taps: Option<u32>,
    /// Mean reaction time (milliseconds)
    #[serde(default)]
    pub avg_reaction: Option<f64>,
    /// Spread of reaction times (milliseconds, standard-deviation-like)
    #[serde(default)]
    pub reaction_variability: Option<f64>,
}

impl WaitGameTelemetry {
    /// Trial count floored at 1 to avoid division by zero
    pub fn trials_floor(&self) -> u32 {
        self.total_trials.unwrap_or(0).max(1)
    }

    pub fn premature_taps(&self) -> u32 {
        self.premature_taps.unwrap_or(0)
    }

    pub fn reaction_variability_ms(&self) -> f64 {
        self.reaction_variability.unwrap_or(0.0)
    }
}

/// Telemetry from the story-reading game.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryGameTelemetry {
    /// Fraction of content skipped, [0,1]
    #[serde(default)]
    pub skip_rate: Option<f64>,
    /// Pages read out of [`STORY_PAGE_COUNT`](crate::scoring::STORY_PAGE_COUNT)
    #[serde(default)]
    pub pages_read: Option<u32>,
}

impl StoryGameTelemetry {
    pub fn skip_rate(&self) -> f64 {
        self.skip_rate.unwrap_or(0.0)
    }

    pub fn pages_read(&self) -> u32 {
        self.pages_read.unwrap_or(0)
    }
}

/// Telemetry from the step-sequencing game ("Step Builder").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepGameTelemetry {
    /// Steps placed out of order
    #[serde(default)]
    pub order_errors: Option<u32>,
    /// Whether the full sequence was completed
    #[serde(default)]
    pub task_completed: Option<bool>,
    /// Steps left out entirely
    #[serde(default)]
    pub steps_skipped: Option<u32>,
}

impl StepGameTelemetry {
    pub fn order_errors(&self) -> u32 {
        self.order_errors.unwrap_or(0)
    }

    pub fn task_completed(&self) -> bool {
        self.task_completed.unwrap_or(false)
    }

    pub fn steps_skipped(&self) -> u32 {
        self.steps_skipped.unwrap_or(0)
    }
}

/// A complete assessment session: identity, timing, and the three game
/// telemetry blocks under their wire keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTelemetry {
    /// Unique session identifier
    #[serde(default)]
    pub session_id: String,
    /// Child's age group (years)
    #[serde(default)]
    pub age_group: Option<u32>,
    /// Session start time (UTC)
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
    /// Session end time (UTC)
    #[serde(default)]
    pub session_end: Option<DateTime<Utc>>,
    /// Total play duration in seconds
    #[serde(default)]
    pub total_duration_seconds: Option<u32>,
    /// Reaction-wait game telemetry
    #[serde(default, rename = "wait_for_your_turn")]
    pub wait_game: WaitGameTelemetry,
    /// Story-reading game telemetry
    #[serde(default, rename = "story_reading")]
    pub story_game: StoryGameTelemetry,
    /// Step-sequencing game telemetry
    #[serde(default, rename = "step_builder")]
    pub step_game: StepGameTelemetry,
}

/// Quality flag indicating missing telemetry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    MissingWaitData,
    MissingReactionVariability,
    MissingStoryData,
    MissingStepData,
}

/// Session telemetry annotated with coverage and quality flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedTelemetry {
    /// Source session telemetry
    pub telemetry: SessionTelemetry,
    /// Data completeness (0-1)
    pub coverage: f64,
    /// Flags for missing telemetry blocks
    pub quality_flags: Vec<QualityFlag>,
}

/// The three domain problem scores, each in [0,1] where higher = more concern
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainScores {
    pub impulsivity: f64,
    pub attention: f64,
    pub memory_organization: f64,
}

impl DomainScores {
    /// Arithmetic mean of the three domain scores
    pub fn overall(&self) -> f64 {
        (self.impulsivity + self.attention + self.memory_organization) / 3.0
    }
}

/// Per-domain section of the cognitive profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainReport {
    /// Problem score rounded to 3 decimals
    pub score: f64,
    /// Severity level for the score
    pub level: Severity,
    /// One-sentence parent-facing conclusion
    pub conclusion: String,
    /// Supporting raw-metric summaries, fixed order
    pub evidence: Vec<String>,
}

/// The three domain reports keyed by domain name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConclusions {
    pub impulsivity: DomainReport,
    pub attention: DomainReport,
    pub memory_organization: DomainReport,
}

/// Complete cognitive profile for one assessment session.
///
/// Computed once per session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CognitiveProfile {
    /// Per-domain reports
    #[serde(rename = "cognitive_profile")]
    pub domains: DomainConclusions,
    /// Mean of the three domain scores, rounded to 3 decimals
    pub overall_score: f64,
    /// Severity level of the overall score
    pub overall_level: Severity,
    /// Concatenated advisory string (or a strong-performance message)
    pub recommendation: String,
}

/// Report producer metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Report provenance information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProvenance {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_at_utc: Option<String>,
    pub computed_at_utc: String,
}

/// Report quality metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportQuality {
    /// Telemetry completeness (0-1)
    pub coverage: f64,
    /// Overall confidence in the report (0-1)
    pub confidence: f64,
    /// Quality flags
    pub flags: Vec<String>,
}

/// Complete assessment payload emitted by the encoder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentPayload {
    pub report_version: String,
    pub producer: ReportProducer,
    pub provenance: ReportProvenance,
    pub quality: ReportQuality,
    #[serde(flatten)]
    pub profile: CognitiveProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ml_prediction: Option<crate::classifier::ProfilePrediction>,
}

/// A fully scored session, ready for encoding
#[derive(Debug, Clone)]
pub struct SessionAssessment {
    /// Normalized telemetry the profile was computed from
    pub normalized: NormalizedTelemetry,
    /// Rule-based cognitive profile
    pub profile: CognitiveProfile,
    /// Advisory classifier output, if a classifier was configured and succeeded
    pub ml_prediction: Option<crate::classifier::ProfilePrediction>,
}
