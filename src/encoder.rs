//! Report encoding
//!
//! Encodes a scored session into the versioned assessment payload consumed by
//! presentation and storage layers.

use crate::error::ScoringError;
use crate::types::{
    AssessmentPayload, ReportProducer, ReportProvenance, ReportQuality, SessionAssessment,
};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use chrono::Utc;
use uuid::Uuid;

/// Current assessment report schema version
pub const REPORT_VERSION: &str = "1.0.0";

/// Confidence bump applied when an advisory prediction corroborates the report
const ML_CONFIDENCE_BONUS: f64 = 0.1;

/// Encoder for assessment payloads
pub struct ReportEncoder {
    instance_id: String,
}

impl Default for ReportEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportEncoder {
    /// Create a new encoder with a unique instance ID
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create an encoder with a specific instance ID
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Encode a scored session into an assessment payload
    pub fn encode(&self, assessment: &SessionAssessment) -> AssessmentPayload {
        let telemetry = &assessment.normalized.telemetry;
        let computed_at = Utc::now();

        let producer = ReportProducer {
            name: PRODUCER_NAME.to_string(),
            version: ENGINE_VERSION.to_string(),
            instance_id: self.instance_id.clone(),
        };

        let provenance = ReportProvenance {
            session_id: telemetry.session_id.clone(),
            age_group: telemetry.age_group,
            observed_at_utc: telemetry
                .session_start
                .or(telemetry.session_end)
                .map(|t| t.to_rfc3339()),
            computed_at_utc: computed_at.to_rfc3339(),
        };

        let quality = self.build_quality(assessment);

        AssessmentPayload {
            report_version: REPORT_VERSION.to_string(),
            producer,
            provenance,
            quality,
            profile: assessment.profile.clone(),
            ml_prediction: assessment.ml_prediction.clone(),
        }
    }

    /// Encode to pretty JSON string
    pub fn encode_to_json(&self, assessment: &SessionAssessment) -> Result<String, ScoringError> {
        let payload = self.encode(assessment);
        serde_json::to_string_pretty(&payload).map_err(ScoringError::JsonError)
    }

    fn build_quality(&self, assessment: &SessionAssessment) -> ReportQuality {
        let normalized = &assessment.normalized;

        let ml_bonus = if assessment.ml_prediction.is_some() {
            ML_CONFIDENCE_BONUS
        } else {
            0.0
        };
        let confidence = (normalized.coverage + ml_bonus).min(1.0);

        let flags: Vec<String> = normalized
            .quality_flags
            .iter()
            .map(|f| format!("{f:?}").to_lowercase())
            .collect();

        ReportQuality {
            coverage: normalized.coverage,
            confidence,
            flags,
        }
    }
}
