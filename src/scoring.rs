//! Domain scoring
//!
//! This module converts game telemetry into the three behavioral domain
//! scores. Each scorer combines two telemetry sources with fixed weights:
//! sub-ratios are clamped to [0,1] individually, then weighted so the result
//! stays in [0,1]. Higher always means more behavioral concern.

use crate::normalizer::clamp_unit;
use crate::types::{
    DomainScores, NormalizedTelemetry, StepGameTelemetry, StoryGameTelemetry, WaitGameTelemetry,
};

/// Premature-tap rate treated as maximal impulsivity (taps per trial)
pub const PREMATURE_RATE_SATURATION: f64 = 0.5;

/// Order-error count treated as maximal impulsivity
pub const ORDER_ERROR_SATURATION: f64 = 4.0;

/// Reaction variability treated as maximal attention concern (milliseconds)
pub const REACTION_VARIABILITY_SATURATION_MS: f64 = 200.0;

/// Skipped-step count treated as maximal organization concern
pub const STEPS_SKIPPED_SATURATION: f64 = 3.0;

/// Total pages in the story game
pub const STORY_PAGE_COUNT: f64 = 3.0;

/// Residual problem score for a completed step task
const COMPLETED_TASK_RESIDUAL: f64 = 0.1;

/// Scorer for the three behavioral domains
pub struct DomainScorer;

impl DomainScorer {
    /// Compute all three domain scores from normalized telemetry
    pub fn score(normalized: &NormalizedTelemetry) -> DomainScores {
        let telemetry = &normalized.telemetry;
        DomainScores {
            impulsivity: compute_impulsivity(&telemetry.wait_game, &telemetry.step_game),
            attention: compute_attention(&telemetry.wait_game, &telemetry.story_game),
            memory_organization: compute_memory_organization(
                &telemetry.step_game,
                &telemetry.story_game,
            ),
        }
    }
}

/// Compute the impulsivity score.
///
/// Formula: `0.7 * clamp(premature_rate / 0.5) + 0.3 * clamp(order_errors / 4)`
///
/// Premature taps in the wait game are the direct signal; sequencing errors
/// are a weaker proxy for rushing.
pub fn compute_impulsivity(wait: &WaitGameTelemetry, step: &StepGameTelemetry) -> f64 {
    let premature_rate = wait.premature_taps() as f64 / wait.trials_floor() as f64;
    let wait_impulsivity = clamp_unit(premature_rate / PREMATURE_RATE_SATURATION);

    let step_impulsivity = clamp_unit(step.order_errors() as f64 / ORDER_ERROR_SATURATION);

    clamp_unit(wait_impulsivity * 0.7 + step_impulsivity * 0.3)
}

/// Compute the attention score.
///
/// Formula: `0.5 * clamp(reaction_variability / 200) + 0.5 * clamp(skip_rate)`
///
/// Timing inconsistency and reading disengagement are weighted equally as
/// independent attention-failure signals.
pub fn compute_attention(wait: &WaitGameTelemetry, story: &StoryGameTelemetry) -> f64 {
    let variability_problem =
        clamp_unit(wait.reaction_variability_ms() / REACTION_VARIABILITY_SATURATION_MS);

    // skip_rate is already a [0,1] fraction; clamp only absorbs bad input
    let skip_problem = clamp_unit(story.skip_rate());

    clamp_unit(variability_problem * 0.5 + skip_problem * 0.5)
}

/// Compute the memory/organization score.
///
/// Formula: `0.7 * org_problem + 0.3 * clamp(1 - pages_read / 3)` where
/// `org_problem` is a fixed 0.1 residual when the task was completed, and
/// `clamp(steps_skipped / 3)` otherwise. Completion overrides granular error
/// counting.
pub fn compute_memory_organization(step: &StepGameTelemetry, story: &StoryGameTelemetry) -> f64 {
    let org_problem = if step.task_completed() {
        COMPLETED_TASK_RESIDUAL
    } else {
        clamp_unit(step.steps_skipped() as f64 / STEPS_SKIPPED_SATURATION)
    };

    let pages_problem = clamp_unit(1.0 - story.pages_read() as f64 / STORY_PAGE_COUNT);

    clamp_unit(org_problem * 0.7 + pages_problem * 0.3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::TelemetryNormalizer;
    use crate::types::{Severity, SessionTelemetry};

    fn wait(trials: u32, premature: u32, variability: f64) -> WaitGameTelemetry {
        WaitGameTelemetry {
            total_trials: Some(trials),
            premature_taps: Some(premature),
            avg_reaction: Some(400.0),
            reaction_variability: Some(variability),
        }
    }

    fn story(skip_rate: f64, pages_read: u32) -> StoryGameTelemetry {
        StoryGameTelemetry {
            skip_rate: Some(skip_rate),
            pages_read: Some(pages_read),
        }
    }

    fn step(order_errors: u32, completed: bool, skipped: u32) -> StepGameTelemetry {
        StepGameTelemetry {
            order_errors: Some(order_errors),
            task_completed: Some(completed),
            steps_skipped: Some(skipped),
        }
    }

    #[test]
    fn test_impulsivity_end_to_end_scenario() {
        // rate 10/20 = 0.5 saturates the wait component; 2 order errors = 0.5
        let score = compute_impulsivity(&wait(20, 10, 0.0), &step(2, true, 0));
        assert!((score - 0.85).abs() < 1e-9);
        assert_eq!(Severity::from_score(score), Severity::VeryHigh);
    }

    #[test]
    fn test_impulsivity_saturation() {
        // rate 1.0 clamps the wait component to exactly 1.0, not above
        let score = compute_impulsivity(&wait(10, 10, 0.0), &step(0, true, 0));
        assert!((score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_impulsivity_empty_trials() {
        // total_trials 0 behaves as 1 trial with 0 premature taps
        let empty = WaitGameTelemetry {
            total_trials: Some(0),
            ..Default::default()
        };
        let score = compute_impulsivity(&empty, &StepGameTelemetry::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_impulsivity_missing_fields_are_neutral() {
        let score =
            compute_impulsivity(&WaitGameTelemetry::default(), &StepGameTelemetry::default());
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_attention_equal_weighting() {
        // 100ms variability = 0.5 problem, skip rate 0.4 → 0.25 + 0.2
        let score = compute_attention(&wait(20, 0, 100.0), &story(0.4, 3));
        assert!((score - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_attention_skip_rate_clamped() {
        // Adversarial skip rate beyond 1 saturates instead of overflowing
        let score = compute_attention(&wait(20, 0, 0.0), &story(2.5, 0));
        assert!((score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_memory_completed_task_scenario() {
        // Completed task with all pages read: 0.7*0.1 + 0.3*0 = 0.07
        let score = compute_memory_organization(&step(0, true, 0), &story(0.0, 3));
        assert!((score - 0.07).abs() < 1e-9);
        assert_eq!(Severity::from_score(score), Severity::Low);
    }

    #[test]
    fn test_memory_completion_overrides_skips() {
        // Completion pins org_problem at the 0.1 residual even with skips recorded
        let completed = compute_memory_organization(&step(0, true, 2), &story(0.0, 3));
        assert!((completed - 0.07).abs() < 1e-9);

        let incomplete = compute_memory_organization(&step(0, false, 2), &story(0.0, 3));
        assert!((incomplete - 0.7 * (2.0 / 3.0)).abs() < 1e-9);
        assert!(incomplete > completed);
    }

    #[test]
    fn test_memory_pages_problem_saturates() {
        // 0 pages read is maximal reading concern
        let score = compute_memory_organization(&step(0, true, 0), &story(0.0, 0));
        assert!((score - (0.07 + 0.3)).abs() < 1e-9);
    }

    #[test]
    fn test_all_scores_bounded() {
        let cases = [
            (wait(0, 0, -50.0), story(-1.0, 0), step(0, false, 0)),
            (wait(1, 100, 1e6), story(100.0, 100), step(100, false, 100)),
            (wait(20, 10, 200.0), story(0.5, 2), step(3, true, 1)),
        ];
        for (w, sto, ste) in cases {
            let impulsivity = compute_impulsivity(&w, &ste);
            let attention = compute_attention(&w, &sto);
            let memory = compute_memory_organization(&ste, &sto);
            for score in [impulsivity, attention, memory] {
                assert!((0.0..=1.0).contains(&score), "score {score} out of range");
            }
        }
    }

    #[test]
    fn test_scorer_is_deterministic() {
        let session: SessionTelemetry = serde_json::from_str(
            r#"{
                "session_id": "det",
                "wait_for_your_turn": {"total_trials": 18, "premature_taps": 5, "reaction_variability": 130.0},
                "story_reading": {"skip_rate": 0.35, "pages_read": 2},
                "step_builder": {"order_errors": 3, "task_completed": false, "steps_skipped": 1}
            }"#,
        )
        .unwrap();

        let normalized = TelemetryNormalizer::normalize(session);
        let first = DomainScorer::score(&normalized);
        let second = DomainScorer::score(&normalized);
        assert_eq!(first.impulsivity.to_bits(), second.impulsivity.to_bits());
        assert_eq!(first.attention.to_bits(), second.attention.to_bits());
        assert_eq!(
            first.memory_organization.to_bits(),
            second.memory_organization.to_bits()
        );
    }
}
