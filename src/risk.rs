//! Sleep-disorder risk classification

use crate::error::{ensure_finite, ComputeError};
use crate::types::RiskLevel;

/// Scores below this are high risk on their own
pub const HIGH_RISK_SCORE: f64 = 4.0;
/// Scores below this (and not high risk) are moderate risk
pub const MODERATE_RISK_SCORE: f64 = 6.0;
/// Stress above this, combined with short sleep, is high risk
pub const HIGH_RISK_STRESS: i32 = 7;
/// Sleep (hours) below this, combined with high stress, is high risk
pub const HIGH_RISK_DURATION: f64 = 5.0;

/// Classifier over score, stress level and sleep duration
pub struct RiskClassifier;

impl RiskClassifier {
    /// Classify risk; the first matching rule wins.
    ///
    /// NaN or infinite inputs are rejected instead of falling into a band.
    pub fn classify(
        score: f64,
        stress_level: i32,
        sleep_duration: f64,
    ) -> Result<RiskLevel, ComputeError> {
        let score = ensure_finite("sleepScore", score)?;
        let sleep_duration = ensure_finite("sleepDuration", sleep_duration)?;

        let level = if score < HIGH_RISK_SCORE
            || (stress_level > HIGH_RISK_STRESS && sleep_duration < HIGH_RISK_DURATION)
        {
            RiskLevel::High
        } else if score < MODERATE_RISK_SCORE {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        };

        Ok(level)
    }
}
