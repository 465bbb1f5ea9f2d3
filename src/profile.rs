//! Cognitive profile aggregation
//!
//! Builds the per-domain reports (score, level, conclusion, evidence), the
//! overall score and level, and the recommendation string from the three
//! domain scores.

use crate::narrative::{template_conclusion, NarrativeCache, NarrativeGenerator, NarrativeRequest};
use crate::normalizer::round_score;
use crate::scoring::STORY_PAGE_COUNT;
use crate::types::{
    CognitiveProfile, Domain, DomainConclusions, DomainReport, DomainScores, NormalizedTelemetry,
    Severity,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// Impulsivity score above which an impulse-control advisory fires
pub const IMPULSIVITY_ALERT_THRESHOLD: f64 = 0.6;

/// Attention score below which a focus-training advisory fires
pub const ATTENTION_ALERT_THRESHOLD: f64 = 0.4;

/// Memory/organization score below which an organization advisory fires
pub const MEMORY_ALERT_THRESHOLD: f64 = 0.4;

const RECOMMENDATION_SEPARATOR: &str = " | ";

/// Builder for the cognitive profile of one session
pub struct ProfileBuilder;

impl ProfileBuilder {
    /// Build the full cognitive profile.
    ///
    /// Conclusions are resolved through the cache first, then the narrator;
    /// a narrator failure takes the fixed template branch. Only generated
    /// text is cached.
    pub fn build(
        normalized: &NormalizedTelemetry,
        scores: &DomainScores,
        narrator: &dyn NarrativeGenerator,
        cache: &mut NarrativeCache,
    ) -> CognitiveProfile {
        let telemetry = &normalized.telemetry;

        let impulsivity = build_domain_report(
            Domain::Impulsivity,
            scores.impulsivity,
            impulsivity_metrics(normalized),
            vec![
                format!(
                    "Premature taps in Wait game: {}",
                    telemetry.wait_game.premature_taps()
                ),
                format!(
                    "Order errors in Step Builder: {}",
                    telemetry.step_game.order_errors()
                ),
            ],
            narrator,
            cache,
        );

        let attention = build_domain_report(
            Domain::Attention,
            scores.attention,
            attention_metrics(normalized),
            vec![
                format!(
                    "Reaction variability: {:.0}ms",
                    telemetry.wait_game.reaction_variability_ms()
                ),
                format!(
                    "Story skip rate: {:.1}%",
                    telemetry.story_game.skip_rate() * 100.0
                ),
            ],
            narrator,
            cache,
        );

        let memory_organization = build_domain_report(
            Domain::MemoryOrganization,
            scores.memory_organization,
            memory_metrics(normalized),
            vec![
                format!(
                    "Step Builder completed: {}",
                    if telemetry.step_game.task_completed() {
                        "Yes"
                    } else {
                        "No"
                    }
                ),
                format!("Steps skipped: {}", telemetry.step_game.steps_skipped()),
                format!(
                    "Pages read: {}/{}",
                    telemetry.story_game.pages_read(),
                    STORY_PAGE_COUNT as u32
                ),
            ],
            narrator,
            cache,
        );

        let overall = scores.overall();

        CognitiveProfile {
            domains: DomainConclusions {
                impulsivity,
                attention,
                memory_organization,
            },
            overall_score: round_score(overall),
            overall_level: Severity::from_score(overall),
            recommendation: build_recommendation(scores),
        }
    }
}

fn build_domain_report(
    domain: Domain,
    score: f64,
    metrics: BTreeMap<String, Value>,
    evidence: Vec<String>,
    narrator: &dyn NarrativeGenerator,
    cache: &mut NarrativeCache,
) -> DomainReport {
    let level = Severity::from_score(score);
    let conclusion = resolve_conclusion(domain, score, level, metrics, narrator, cache);

    DomainReport {
        score: round_score(score),
        level,
        conclusion,
        evidence,
    }
}

fn resolve_conclusion(
    domain: Domain,
    score: f64,
    level: Severity,
    metrics: BTreeMap<String, Value>,
    narrator: &dyn NarrativeGenerator,
    cache: &mut NarrativeCache,
) -> String {
    if let Some(cached) = cache.get(domain, score, level) {
        return cached.to_string();
    }

    let request = NarrativeRequest {
        domain,
        score,
        level,
        metrics,
    };

    match narrator.narrate(&request) {
        Ok(text) => {
            cache.insert(domain, score, level, text.clone());
            text
        }
        // Template branch: deterministic, never cached
        Err(_) => template_conclusion(domain, level).to_string(),
    }
}

fn impulsivity_metrics(normalized: &NormalizedTelemetry) -> BTreeMap<String, Value> {
    let telemetry = &normalized.telemetry;
    BTreeMap::from([
        (
            "premature_taps".to_string(),
            json!(telemetry.wait_game.premature_taps()),
        ),
        (
            "order_errors".to_string(),
            json!(telemetry.step_game.order_errors()),
        ),
        ("trials".to_string(), json!(telemetry.wait_game.trials_floor())),
    ])
}

fn attention_metrics(normalized: &NormalizedTelemetry) -> BTreeMap<String, Value> {
    let telemetry = &normalized.telemetry;
    BTreeMap::from([
        (
            "reaction_variability".to_string(),
            json!(telemetry.wait_game.reaction_variability_ms()),
        ),
        ("skip_rate".to_string(), json!(telemetry.story_game.skip_rate())),
        (
            "pages_read".to_string(),
            json!(telemetry.story_game.pages_read()),
        ),
    ])
}

fn memory_metrics(normalized: &NormalizedTelemetry) -> BTreeMap<String, Value> {
    let telemetry = &normalized.telemetry;
    BTreeMap::from([
        (
            "task_completed".to_string(),
            json!(telemetry.step_game.task_completed()),
        ),
        (
            "steps_skipped".to_string(),
            json!(telemetry.step_game.steps_skipped()),
        ),
        (
            "order_errors".to_string(),
            json!(telemetry.step_game.order_errors()),
        ),
        (
            "pages_read".to_string(),
            json!(telemetry.story_game.pages_read()),
        ),
    ])
}

/// Build the recommendation string from the three domain scores.
///
/// Checks run in fixed order: impulsivity, attention, memory/organization.
/// The attention and memory checks fire below their thresholds, unlike the
/// impulsivity check; this asymmetry is kept as-is for output compatibility
/// with existing consumers.
pub fn build_recommendation(scores: &DomainScores) -> String {
    let mut issues: Vec<&str> = Vec::new();

    if scores.impulsivity > IMPULSIVITY_ALERT_THRESHOLD {
        issues.push(
            "High impulsivity detected - recommend impulse control strategies (e.g., stop-and-think exercises)",
        );
    }

    if scores.attention < ATTENTION_ALERT_THRESHOLD {
        issues.push(
            "Attention challenges detected - recommend focus training and minimal distractions",
        );
    }

    if scores.memory_organization < MEMORY_ALERT_THRESHOLD {
        issues.push(
            "Organization difficulties detected - recommend structured task breakdowns and visual aids",
        );
    }

    if issues.is_empty() {
        return "User shows strong cognitive performance across all domains".to_string();
    }

    issues.join(RECOMMENDATION_SEPARATOR)
}
