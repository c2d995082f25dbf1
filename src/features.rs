//! Feature encoding
//!
//! This module turns user metrics into the fixed-order numeric vector the
//! predictor was trained on:
//! - Gender and occupation labels are replaced by their table codes
//! - Numeric fields pass through unchanged
//!
//! The column order is a contract with the trained model. Reordering it
//! requires retraining.

use crate::error::{ensure_finite, ComputeError};
use crate::types::{Gender, Occupation, UserMetrics};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Number of columns in the feature vector
pub const FEATURE_COUNT: usize = 10;

/// Column names, in training order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "Gender",
    "Age",
    "Occupation",
    "Sleep Duration",
    "Physical Activity Level",
    "Stress Level",
    "Systolic BP",
    "Diastolic BP",
    "Heart Rate",
    "Daily Steps",
];

pub const GENDER_COLUMN: usize = 0;
pub const OCCUPATION_COLUMN: usize = 2;

/// Encoded features in training column order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Pair each value with its column name
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl Index<usize> for FeatureVector {
    type Output = f64;

    fn index(&self, idx: usize) -> &f64 {
        &self.0[idx]
    }
}

/// Encoder for building feature vectors from user metrics
pub struct FeatureEncoder;

impl FeatureEncoder {
    /// Encode metrics into a feature vector.
    ///
    /// Fails with `UnknownCategory` on an unmapped gender or occupation label;
    /// no partial vector is produced.
    pub fn encode(metrics: &UserMetrics) -> Result<FeatureVector, ComputeError> {
        let gender = Gender::from_label(&metrics.gender)?;
        let occupation = Occupation::from_label(&metrics.occupation)?;
        let sleep_duration = ensure_finite("sleepDuration", metrics.sleep_duration)?;

        Ok(FeatureVector([
            f64::from(gender.code()),
            f64::from(metrics.age),
            f64::from(occupation.code()),
            sleep_duration,
            f64::from(metrics.activity_level),
            f64::from(metrics.stress_level),
            f64::from(metrics.systolic_bp),
            f64::from(metrics.diastolic_bp),
            f64::from(metrics.heart_rate),
            f64::from(metrics.daily_steps),
        ]))
    }
}
