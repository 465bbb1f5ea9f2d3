//! Narrative generation boundary
//!
//! Parent-facing conclusions come from an external narrative service when one
//! is configured. The boundary is an explicit `Result`: a failure selects the
//! deterministic template path, it is never swallowed inside the generator.
//! Generated text is memoized in an explicit cache owned by the caller.

use crate::types::{Domain, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Failure reasons at the narrative boundary
#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("Narrative backend unavailable: {0}")]
    Unavailable(String),

    #[error("Narrative backend timed out after {0}s")]
    Timeout(u64),

    #[error("Narrative backend returned empty text")]
    EmptyResponse,
}

/// Request for a one-sentence domain conclusion
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeRequest {
    /// Domain the sentence is about
    pub domain: Domain,
    /// Problem score, [0,1]
    pub score: f64,
    /// Severity level for the score
    pub level: Severity,
    /// Raw metrics backing the score, for prompt context (ordered)
    pub metrics: BTreeMap<String, Value>,
}

/// Generator of one-sentence parent-facing conclusions.
///
/// The engine accepts whatever string a generator returns without validating
/// its content; only errors are acted on.
pub trait NarrativeGenerator {
    fn narrate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError>;
}

/// Deterministic template narrator.
///
/// Used as the default generator and as the fallback branch when a configured
/// external generator fails. One fixed sentence per (domain, level) pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateNarrator;

impl NarrativeGenerator for TemplateNarrator {
    fn narrate(&self, request: &NarrativeRequest) -> Result<String, NarrativeError> {
        Ok(template_conclusion(request.domain, request.level).to_string())
    }
}

/// Fixed conclusion template for a (domain, level) pair
pub fn template_conclusion(domain: Domain, level: Severity) -> &'static str {
    match (domain, level) {
        (Domain::Impulsivity, Severity::Low) => {
            "Your child showed excellent patience and really thought through their actions!"
        }
        (Domain::Impulsivity, Severity::Moderate) => {
            "Your child shows good impulse control, with just occasional quick reactions as they're learning."
        }
        (Domain::Impulsivity, Severity::High) => {
            "Your child is still learning to pause before acting, which is normal\u{2014}with practice they'll improve!"
        }
        (Domain::Impulsivity, Severity::VeryHigh) => {
            "Your child tends to act quickly; with targeted practice and support, they can build stronger impulse control."
        }
        (Domain::Attention, Severity::Low) => {
            "Your child maintained wonderful focus throughout, showing strong concentration skills!"
        }
        (Domain::Attention, Severity::Moderate) => {
            "Your child generally stays focused, with occasional moments of distraction\u{2014}totally age-appropriate!"
        }
        (Domain::Attention, Severity::High) => {
            "Your child had some trouble staying focused; short activities and breaks can help build this skill."
        }
        (Domain::Attention, Severity::VeryHigh) => {
            "Your child struggled with focus; with structured support and breaks, attention can improve significantly."
        }
        (Domain::MemoryOrganization, Severity::Low) => {
            "Your child remembered and followed all the steps perfectly\u{2014}excellent organization skills!"
        }
        (Domain::MemoryOrganization, Severity::Moderate) => {
            "Your child followed most steps correctly and is building strong organizational skills."
        }
        (Domain::MemoryOrganization, Severity::High) => {
            "Your child had some trouble remembering steps; breaking tasks into smaller chunks really helps."
        }
        (Domain::MemoryOrganization, Severity::VeryHigh) => {
            "Your child struggled organizing multiple steps; visual checklists and support will make a big difference."
        }
    }
}

/// Memoization cache for generated narratives.
///
/// Keyed by domain, level, and the score truncated to whole percent, so
/// near-identical sessions reuse generated text. Owned explicitly by the
/// processor; there is no global cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NarrativeCache {
    entries: HashMap<String, String>,
}

impl NarrativeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache key for a (domain, level, score) triple
    pub fn key(domain: Domain, score: f64, level: Severity) -> String {
        format!("{}_{}_{}", domain.as_str(), level.as_str(), (score * 100.0) as i64)
    }

    pub fn get(&self, domain: Domain, score: f64, level: Severity) -> Option<&str> {
        self.entries
            .get(&Self::key(domain, score, level))
            .map(String::as_str)
    }

    pub fn insert(&mut self, domain: Domain, score: f64, level: Severity, narrative: String) {
        self.entries.insert(Self::key(domain, score, level), narrative);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Load cache contents from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize cache contents to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(domain: Domain, score: f64) -> NarrativeRequest {
        NarrativeRequest {
            domain,
            score,
            level: Severity::from_score(score),
            metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn test_template_narrator_covers_all_pairs() {
        let narrator = TemplateNarrator;
        for domain in [Domain::Impulsivity, Domain::Attention, Domain::MemoryOrganization] {
            for score in [0.1, 0.3, 0.6, 0.9] {
                let text = narrator.narrate(&request(domain, score)).unwrap();
                assert!(!text.is_empty());
            }
        }
    }

    #[test]
    fn test_template_narrator_is_deterministic() {
        let narrator = TemplateNarrator;
        let a = narrator.narrate(&request(Domain::Attention, 0.55)).unwrap();
        let b = narrator.narrate(&request(Domain::Attention, 0.55)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cache_key_scheme() {
        let key = NarrativeCache::key(Domain::MemoryOrganization, 0.666, Severity::High);
        assert_eq!(key, "Memory/Organization_High_66");
    }

    #[test]
    fn test_cache_hit_and_miss() {
        let mut cache = NarrativeCache::new();
        assert!(cache.get(Domain::Impulsivity, 0.5, Severity::High).is_none());

        cache.insert(
            Domain::Impulsivity,
            0.5,
            Severity::High,
            "cached sentence".to_string(),
        );
        assert_eq!(
            cache.get(Domain::Impulsivity, 0.5, Severity::High),
            Some("cached sentence")
        );

        // Scores in the same whole percent share an entry
        assert_eq!(
            cache.get(Domain::Impulsivity, 0.504, Severity::High),
            Some("cached sentence")
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_json_round_trip() {
        let mut cache = NarrativeCache::new();
        cache.insert(Domain::Attention, 0.2, Severity::Low, "focus!".to_string());

        let json = cache.to_json().unwrap();
        let restored = NarrativeCache::from_json(&json).unwrap();
        assert_eq!(
            restored.get(Domain::Attention, 0.2, Severity::Low),
            Some("focus!")
        );
    }
}
