//! Telemetry normalization
//!
//! This module provides the clamping primitives used by every scorer and
//! annotates incoming telemetry with coverage and quality flags.
//! - Every sub-ratio is clamped to [0,1] before weighted combination
//! - Missing game blocks are flagged, never rejected

use crate::types::{NormalizedTelemetry, QualityFlag, SessionTelemetry};

/// Clamp a value to `[min, max]`.
///
/// Total: non-finite input saturates at `min` (counts as no signal).
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() {
        return min;
    }
    value.clamp(min, max)
}

/// Clamp a ratio to the canonical [0,1] score domain
pub fn clamp_unit(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Round a score to 3 decimal places for reporting
pub fn round_score(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Normalizer for annotating session telemetry with data quality
pub struct TelemetryNormalizer;

impl TelemetryNormalizer {
    /// Annotate session telemetry with coverage and quality flags.
    ///
    /// Coverage counts the telemetry fields the scorers actually read; a
    /// fully populated session has coverage 1.0. Missing fields never fail,
    /// they only lower coverage and add flags.
    pub fn normalize(telemetry: SessionTelemetry) -> NormalizedTelemetry {
        let mut quality_flags = Vec::new();
        let mut coverage_count = 0;
        let total_fields = 7; // Fields the domain scorers read

        let wait = &telemetry.wait_game;
        if wait.total_trials.is_some() {
            coverage_count += 1;
        }
        if wait.premature_taps.is_some() {
            coverage_count += 1;
        }
        if wait.total_trials.is_none() && wait.premature_taps.is_none() {
            quality_flags.push(QualityFlag::MissingWaitData);
        }
        if wait.reaction_variability.is_some() {
            coverage_count += 1;
        } else {
            quality_flags.push(QualityFlag::MissingReactionVariability);
        }

        let story = &telemetry.story_game;
        if story.skip_rate.is_some() {
            coverage_count += 1;
        }
        if story.pages_read.is_some() {
            coverage_count += 1;
        }
        if story.skip_rate.is_none() && story.pages_read.is_none() {
            quality_flags.push(QualityFlag::MissingStoryData);
        }

        let step = &telemetry.step_game;
        if step.task_completed.is_some() {
            coverage_count += 1;
        }
        if step.order_errors.is_some() || step.steps_skipped.is_some() {
            coverage_count += 1;
        }
        if step.task_completed.is_none()
            && step.order_errors.is_none()
            && step.steps_skipped.is_none()
        {
            quality_flags.push(QualityFlag::MissingStepData);
        }

        let coverage = (coverage_count as f64) / (total_fields as f64);

        NormalizedTelemetry {
            telemetry,
            coverage,
            quality_flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StepGameTelemetry, StoryGameTelemetry, WaitGameTelemetry};

    fn make_full_session() -> SessionTelemetry {
        SessionTelemetry {
            session_id: "sess-test".to_string(),
            age_group: Some(8),
            session_start: None,
            session_end: None,
            total_duration_seconds: Some(600),
            wait_game: WaitGameTelemetry {
                total_trials: Some(20),
                premature_taps: Some(4),
                avg_reaction: Some(380.0),
                reaction_variability: Some(110.0),
            },
            story_game: StoryGameTelemetry {
                skip_rate: Some(0.3),
                pages_read: Some(2),
            },
            step_game: StepGameTelemetry {
                order_errors: Some(1),
                task_completed: Some(true),
                steps_skipped: Some(0),
            },
        }
    }

    #[test]
    fn test_clamp_bounds() {
        assert_eq!(clamp_unit(-0.5), 0.0);
        assert_eq!(clamp_unit(0.0), 0.0);
        assert_eq!(clamp_unit(0.42), 0.42);
        assert_eq!(clamp_unit(1.0), 1.0);
        assert_eq!(clamp_unit(3.7), 1.0);
    }

    #[test]
    fn test_clamp_non_finite() {
        assert_eq!(clamp_unit(f64::NAN), 0.0);
        assert_eq!(clamp_unit(f64::INFINITY), 0.0);
        assert_eq!(clamp(f64::NEG_INFINITY, 0.0, 1.0), 0.0);
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(0.8512345), 0.851);
        assert_eq!(round_score(0.0695), 0.07);
        assert_eq!(round_score(1.0), 1.0);
    }

    #[test]
    fn test_full_session_coverage() {
        let normalized = TelemetryNormalizer::normalize(make_full_session());
        assert!((normalized.coverage - 1.0).abs() < 1e-9);
        assert!(normalized.quality_flags.is_empty());
    }

    #[test]
    fn test_missing_blocks_are_flagged() {
        let mut session = make_full_session();
        session.wait_game = WaitGameTelemetry::default();
        session.story_game = StoryGameTelemetry::default();

        let normalized = TelemetryNormalizer::normalize(session);
        assert!(normalized.coverage < 0.5);
        assert!(normalized
            .quality_flags
            .contains(&QualityFlag::MissingWaitData));
        assert!(normalized
            .quality_flags
            .contains(&QualityFlag::MissingReactionVariability));
        assert!(normalized
            .quality_flags
            .contains(&QualityFlag::MissingStoryData));
        assert!(!normalized
            .quality_flags
            .contains(&QualityFlag::MissingStepData));
    }

    #[test]
    fn test_empty_session_never_fails() {
        let session: SessionTelemetry =
            serde_json::from_str(r#"{"session_id": "empty"}"#).unwrap();
        let normalized = TelemetryNormalizer::normalize(session);
        assert_eq!(normalized.coverage, 0.0);
        assert_eq!(normalized.quality_flags.len(), 4);
    }
}
