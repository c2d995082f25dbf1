//! Batch request parsing and validation
//!
//! Splits JSON array and NDJSON documents into individual request records so
//! that one malformed record does not abort the rest of the batch.

use crate::error::ComputeError;
use crate::features::FeatureEncoder;
use crate::schema::request::*;
use crate::types::UserMetrics;
use crate::units::UnitConverter;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Expected input range, matching the bounds of the intake form
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FieldRange {
    pub field: &'static str,
    pub min: f64,
    pub max: f64,
}

/// Form bounds for each numeric field
pub const FORM_RANGES: [FieldRange; 10] = [
    FieldRange { field: FIELD_AGE, min: 10.0, max: 100.0 },
    FieldRange { field: FIELD_SLEEP_DURATION, min: 0.0, max: 12.0 },
    FieldRange { field: FIELD_ACTIVITY_LEVEL, min: 0.0, max: 10.0 },
    FieldRange { field: FIELD_STRESS_LEVEL, min: 1.0, max: 10.0 },
    FieldRange { field: FIELD_STEPS, min: 0.0, max: 30000.0 },
    FieldRange { field: FIELD_WEIGHT, min: 30.0, max: 150.0 },
    FieldRange { field: FIELD_HEIGHT, min: 100.0, max: 220.0 },
    FieldRange { field: FIELD_SYSTOLIC, min: 80.0, max: 180.0 },
    FieldRange { field: FIELD_DIASTOLIC, min: 50.0, max: 120.0 },
    FieldRange { field: FIELD_HEART_RATE, min: 40.0, max: 120.0 },
];

/// A value outside its form range; reported, never rejected
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeWarning {
    pub field: &'static str,
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} is outside the expected range {}-{}",
            self.field, self.value, self.min, self.max
        )
    }
}

/// Result of validating one request
#[derive(Debug)]
pub struct ValidationResult {
    pub index: usize,
    pub error: Option<ComputeError>,
    pub warnings: Vec<RangeWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

/// Adapter for splitting batch documents into request records
pub struct RequestAdapter;

impl RequestAdapter {
    /// Parse a JSON array of requests; a malformed document is an error
    pub fn parse_array(json: &str) -> Result<Vec<Value>, ComputeError> {
        let requests: Vec<Value> = serde_json::from_str(json)?;
        Ok(requests)
    }

    /// Parse NDJSON; each non-empty line becomes one record, bad lines become errors
    pub fn parse_ndjson(ndjson: &str) -> Vec<Result<Value, ComputeError>> {
        ndjson
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line_num, line)| {
                serde_json::from_str::<Value>(line.trim()).map_err(|e| {
                    ComputeError::ParseError(format!("line {}: {}", line_num + 1, e))
                })
            })
            .collect()
    }

    /// Check each request decodes, encodes and yields a BMI, without a model
    pub fn validate_requests(requests: Vec<Result<Value, ComputeError>>) -> Vec<ValidationResult> {
        requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| {
                let checked = request.and_then(|value| Self::check(&value));
                match checked {
                    Ok(metrics) => ValidationResult {
                        index,
                        error: None,
                        warnings: range_warnings(&metrics),
                    },
                    Err(error) => ValidationResult {
                        index,
                        error: Some(error),
                        warnings: Vec::new(),
                    },
                }
            })
            .collect()
    }

    fn check(value: &Value) -> Result<UserMetrics, ComputeError> {
        let metrics = parse_metrics(value)?;
        FeatureEncoder::encode(&metrics)?;
        UnitConverter::compute_bmi(metrics.weight_kg, metrics.height_cm)?;
        Ok(metrics)
    }
}

/// Values outside the intake-form bounds
pub fn range_warnings(metrics: &UserMetrics) -> Vec<RangeWarning> {
    FORM_RANGES
        .iter()
        .filter_map(|range| {
            let value = field_value(metrics, range.field)?;
            (value < range.min || value > range.max).then_some(RangeWarning {
                field: range.field,
                value,
                min: range.min,
                max: range.max,
            })
        })
        .collect()
}

fn field_value(metrics: &UserMetrics, field: &str) -> Option<f64> {
    let value = match field {
        FIELD_AGE => f64::from(metrics.age),
        FIELD_SLEEP_DURATION => metrics.sleep_duration,
        FIELD_ACTIVITY_LEVEL => f64::from(metrics.activity_level),
        FIELD_STRESS_LEVEL => f64::from(metrics.stress_level),
        FIELD_STEPS => f64::from(metrics.daily_steps),
        FIELD_WEIGHT => metrics.weight_kg,
        FIELD_HEIGHT => metrics.height_cm,
        FIELD_SYSTOLIC => f64::from(metrics.systolic_bp),
        FIELD_DIASTOLIC => f64::from(metrics.diastolic_bp),
        FIELD_HEART_RATE => f64::from(metrics.heart_rate),
        _ => return None,
    };
    Some(value)
}
