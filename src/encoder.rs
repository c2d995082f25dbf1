//! Response encoding
//!
//! This module turns a finished assessment into the response record returned
//! to the caller, applying output rounding and attaching producer metadata.

use crate::error::ComputeError;
use crate::types::{AssessmentResponse, ErrorResponse, ProducerInfo, SleepAssessment};
use crate::units::round_to;
use crate::{PRODUCER_NAME, SLEEPSCOPE_VERSION};
use chrono::Utc;
use uuid::Uuid;

/// Decimals kept on the BMI value
pub const BMI_DECIMALS: i32 = 2;
/// Decimals kept on the sleep score
pub const SCORE_DECIMALS: i32 = 1;

/// Encoder for producing response records
pub struct ResponseEncoder {
    instance_id: String,
}

impl Default for ResponseEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseEncoder {
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

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    /// Encode an assessment into a response record
    pub fn encode(&self, assessment: &SleepAssessment) -> AssessmentResponse {
        AssessmentResponse {
            bmi: round_to(assessment.bmi.value, BMI_DECIMALS),
            bmi_category: assessment.bmi.category,
            sleep_score: round_to(assessment.sleep_score, SCORE_DECIMALS),
            disorder_risk: assessment.risk.message().to_string(),
            report: assessment.report.as_ref().map(|r| r.text.clone()),
            producer: ProducerInfo {
                name: PRODUCER_NAME.to_string(),
                version: SLEEPSCOPE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, assessment: &SleepAssessment) -> Result<String, ComputeError> {
        let response = self.encode(assessment);
        serde_json::to_string(&response).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Encode a failure as `{"error": ..., "code": ...}`
    pub fn encode_error(&self, error: &ComputeError) -> Result<String, ComputeError> {
        serde_json::to_string(&ErrorResponse::from(error))
            .map_err(|e| ComputeError::EncodingError(e.to_string()))
    }
}
