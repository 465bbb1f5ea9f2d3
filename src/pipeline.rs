//! Pipeline orchestration
//!
//! This module provides the public API of the MindImprint engine.
//! It orchestrates the full pipeline from session telemetry JSON to the
//! assessment payload.

use crate::classifier::{ProfileClassifier, ProfileFeatures};
use crate::encoder::ReportEncoder;
use crate::error::ScoringError;
use crate::narrative::{NarrativeCache, NarrativeGenerator, TemplateNarrator};
use crate::normalizer::TelemetryNormalizer;
use crate::profile::ProfileBuilder;
use crate::scoring::DomainScorer;
use crate::types::{SessionAssessment, SessionTelemetry};

/// Parse a session telemetry JSON string
pub fn parse_session(json: &str) -> Result<SessionTelemetry, ScoringError> {
    serde_json::from_str(json).map_err(|e| ScoringError::ParseError(e.to_string()))
}

/// Score a session JSON and return the assessment payload JSON (stateless, one-shot).
///
/// Uses the deterministic template narrator, a fresh narrative cache, and no
/// advisory classifier.
///
/// # Example
/// ```ignore
/// let report_json = score_session(session_json)?;
/// ```
pub fn score_session(session_json: String) -> Result<String, ScoringError> {
    // Stage 1: Parse session JSON
    let session = parse_session(&session_json)?;

    // Stage 2: Normalize telemetry (coverage + quality flags)
    let normalized = TelemetryNormalizer::normalize(session);

    // Stage 3: Score the three domains
    let scores = DomainScorer::score(&normalized);

    // Stage 4: Build the profile (fresh cache for stateless call)
    let mut cache = NarrativeCache::new();
    let profile = ProfileBuilder::build(&normalized, &scores, &TemplateNarrator, &mut cache);

    // Stage 5: Encode the payload
    let assessment = SessionAssessment {
        normalized,
        profile,
        ml_prediction: None,
    };
    let encoder = ReportEncoder::new();
    encoder.encode_to_json(&assessment)
}

/// Stateful processor for scoring a stream of sessions.
///
/// Owns the narrative cache (persistable across restarts), the configured
/// narrator, and an optional advisory classifier.
pub struct ScoringProcessor {
    narrator: Box<dyn NarrativeGenerator>,
    classifier: Option<Box<dyn ProfileClassifier>>,
    cache: NarrativeCache,
    encoder: ReportEncoder,
}

impl Default for ScoringProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoringProcessor {
    /// Create a processor with the deterministic template narrator
    pub fn new() -> Self {
        Self {
            narrator: Box::new(TemplateNarrator),
            classifier: None,
            cache: NarrativeCache::new(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Create a processor with a custom narrative generator
    pub fn with_narrator(narrator: Box<dyn NarrativeGenerator>) -> Self {
        Self {
            narrator,
            classifier: None,
            cache: NarrativeCache::new(),
            encoder: ReportEncoder::new(),
        }
    }

    /// Attach an advisory profile classifier
    pub fn with_classifier(mut self, classifier: Box<dyn ProfileClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Score one session and return the assessment payload JSON
    pub fn process(&mut self, session_json: &str) -> Result<String, ScoringError> {
        let session = parse_session(session_json)?;
        let assessment = self.assess(session);
        self.encoder.encode_to_json(&assessment)
    }

    /// Score one parsed session.
    ///
    /// Never fails: the scoring core is total, narrator failures take the
    /// template branch, and classifier failures leave the advisory field
    /// empty.
    pub fn assess(&mut self, session: SessionTelemetry) -> SessionAssessment {
        let normalized = TelemetryNormalizer::normalize(session);
        let scores = DomainScorer::score(&normalized);
        let profile =
            ProfileBuilder::build(&normalized, &scores, self.narrator.as_ref(), &mut self.cache);

        // Advisory only: a failed or absent classifier never blocks the report
        let ml_prediction = self.classifier.as_ref().and_then(|classifier| {
            let features = ProfileFeatures::from_session(&normalized.telemetry, &scores);
            classifier.classify(&features).ok()
        });

        SessionAssessment {
            normalized,
            profile,
            ml_prediction,
        }
    }

    /// Save narrative cache contents to JSON for persistence
    pub fn save_narrative_cache(&self) -> Result<String, ScoringError> {
        self.cache
            .to_json()
            .map_err(|e| ScoringError::EncodingError(e.to_string()))
    }

    /// Load narrative cache contents from JSON
    pub fn load_narrative_cache(&mut self, json: &str) -> Result<(), ScoringError> {
        self.cache = NarrativeCache::from_json(json)
            .map_err(|e| ScoringError::ParseError(e.to_string()))?;
        Ok(())
    }

    /// Number of narratives currently cached
    pub fn cached_narrative_count(&self) -> usize {
        self.cache.len()
    }

    /// Clear all cached narratives
    pub fn clear_narrative_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ClassifierError, ProfileClass, ProfilePrediction};
    use crate::narrative::{NarrativeError, NarrativeRequest};
    use std::collections::BTreeMap;

    fn sample_session_json() -> &'static str {
        r#"{
            "session_id": "sess-123-abc",
            "age_group": 7,
            "session_start": "2024-03-10T09:00:00Z",
            "session_end": "2024-03-10T09:12:00Z",
            "total_duration_seconds": 720,
            "wait_for_your_turn": {
                "total_trials": 20,
                "premature_taps": 10,
                "avg_reaction": 420.0,
                "reaction_variability": 80.0
            },
            "story_reading": {
                "skip_rate": 0.1,
                "pages_read": 3
            },
            "step_builder": {
                "order_errors": 2,
                "task_completed": true,
                "steps_skipped": 0
            }
        }"#
    }

    struct StubClassifier;

    impl ProfileClassifier for StubClassifier {
        fn classify(
            &self,
            features: &ProfileFeatures,
        ) -> Result<ProfilePrediction, ClassifierError> {
            let profile = if features.impulsivity > 0.7 {
                ProfileClass::AdhdLike
            } else {
                ProfileClass::Normal
            };
            Ok(ProfilePrediction {
                profile,
                confidence: 0.92,
                probabilities: BTreeMap::from([(profile.as_str().to_string(), 0.92)]),
                risk_level: profile.risk_level(),
            })
        }
    }

    struct BrokenClassifier;

    impl ProfileClassifier for BrokenClassifier {
        fn classify(
            &self,
            _features: &ProfileFeatures,
        ) -> Result<ProfilePrediction, ClassifierError> {
            Err(ClassifierError::Unavailable("model not loaded".to_string()))
        }
    }

    #[test]
    fn test_score_session_stateless() {
        let result = score_session(sample_session_json().to_string());
        assert!(result.is_ok());

        let payload: serde_json::Value = serde_json::from_str(&result.unwrap()).unwrap();
        assert_eq!(payload["report_version"], "1.0.0");
        assert_eq!(payload["provenance"]["session_id"], "sess-123-abc");

        let profile = &payload["cognitive_profile"];
        assert_eq!(profile["impulsivity"]["score"], 0.85);
        assert_eq!(profile["impulsivity"]["level"], "Very High");
        assert_eq!(profile["attention"]["score"], 0.25);
        assert_eq!(profile["memory_organization"]["score"], 0.07);
        assert_eq!(profile["memory_organization"]["level"], "Low");

        assert_eq!(payload["overall_score"], 0.39);
        assert_eq!(payload["overall_level"], "Moderate");

        // impulsivity > 0.6 and memory < 0.4 both fire, impulsivity first
        let recommendation = payload["recommendation"].as_str().unwrap();
        assert!(recommendation.starts_with("High impulsivity detected"));
        assert!(recommendation.contains("Organization difficulties detected"));
    }

    #[test]
    fn test_assess_is_idempotent() {
        let mut processor = ScoringProcessor::new();
        let session = parse_session(sample_session_json()).unwrap();

        let first = processor.assess(session.clone());
        let second = processor.assess(session);

        assert_eq!(first.profile, second.profile);
        assert_eq!(
            first.normalized.coverage.to_bits(),
            second.normalized.coverage.to_bits()
        );
    }

    #[test]
    fn test_processor_with_classifier() {
        let mut processor =
            ScoringProcessor::new().with_classifier(Box::new(StubClassifier));

        let json = processor.process(sample_session_json()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["ml_prediction"]["profile"], "ADHD-Like");
        assert_eq!(payload["ml_prediction"]["risk_level"], "High");
        assert_eq!(payload["ml_prediction"]["confidence"], 0.92);
    }

    #[test]
    fn test_broken_classifier_is_advisory_only() {
        let mut processor =
            ScoringProcessor::new().with_classifier(Box::new(BrokenClassifier));

        let json = processor.process(sample_session_json()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        // Rule-based report is intact, advisory field absent
        assert!(payload.get("ml_prediction").is_none());
        assert_eq!(payload["overall_score"], 0.39);
    }

    #[test]
    fn test_narrative_cache_persistence() {
        struct EchoNarrator;
        impl NarrativeGenerator for EchoNarrator {
            fn narrate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
                Ok(format!("{} is {}", request.domain, request.level))
            }
        }

        let mut processor = ScoringProcessor::with_narrator(Box::new(EchoNarrator));
        processor.process(sample_session_json()).unwrap();
        assert_eq!(processor.cached_narrative_count(), 3);

        let saved = processor.save_narrative_cache().unwrap();

        let mut restored = ScoringProcessor::with_narrator(Box::new(EchoNarrator));
        restored.load_narrative_cache(&saved).unwrap();
        assert_eq!(restored.cached_narrative_count(), 3);

        restored.clear_narrative_cache();
        assert_eq!(restored.cached_narrative_count(), 0);
    }

    #[test]
    fn test_empty_telemetry_scores_clean() {
        let result = score_session(r#"{"session_id": "bare"}"#.to_string()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&result).unwrap();

        let profile = &payload["cognitive_profile"];
        assert_eq!(profile["impulsivity"]["score"], 0.0);
        assert_eq!(profile["impulsivity"]["level"], "Low");
        // Missing story data reads as 0 pages, which is maximal reading concern
        assert_eq!(profile["memory_organization"]["score"], 0.3);

        assert_eq!(payload["quality"]["coverage"], 0.0);
        let flags = payload["quality"]["flags"].as_array().unwrap();
        assert!(flags.iter().any(|f| f == "missingwaitdata"));
    }

    #[test]
    fn test_invalid_json() {
        let result = score_session("not valid json".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_wire_format_aliases() {
        // Game blocks arrive under their wire keys
        let json = r#"{
            "session_id": "wire",
            "wait_for_your_turn": {"premature_taps": 2},
            "story_reading": {"skip_rate": 0.5},
            "step_builder": {"task_completed": false}
        }"#;
        let session = parse_session(json).unwrap();
        assert_eq!(session.wait_game.premature_taps(), 2);
        assert_eq!(session.story_game.skip_rate(), 0.5);
        assert!(!session.step_game.task_completed());
    }
}
