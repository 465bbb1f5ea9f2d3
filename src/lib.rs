//! MindImprint Engine - deterministic scoring for cognitive-assessment game telemetry
//!
//! The engine converts raw per-game telemetry from a children's assessment
//! game suite into behavioral domain scores through a deterministic pipeline:
//! parse → normalization → domain scoring → severity classification →
//! profile aggregation → report encoding.
//!
//! ## Modules
//!
//! - **Scoring Pipeline**: Score session telemetry into a cognitive profile report
//! - **Quick Screen**: Lightweight single-game pattern summary
//! - **Collaborator Boundaries**: Narrative generation and advisory classification traits

pub mod classifier;
pub mod encoder;
pub mod error;
pub mod narrative;
pub mod normalizer;
pub mod pipeline;
pub mod profile;
pub mod scoring;
pub mod screen;
pub mod types;

pub use error::ScoringError;
pub use pipeline::{parse_session, score_session, ScoringProcessor};

// Scoring exports
pub use scoring::{compute_attention, compute_impulsivity, compute_memory_organization};
pub use types::{CognitiveProfile, Domain, DomainScores, SessionTelemetry, Severity};

// Collaborator boundary exports
pub use classifier::{ProfileClassifier, ProfileFeatures, ProfilePrediction};
pub use narrative::{NarrativeCache, NarrativeGenerator, TemplateNarrator};

/// Engine version embedded in all assessment payloads
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for assessment payloads
pub const PRODUCER_NAME: &str = "mindimprint-engine";
