//! Assessment request record
//!
//! Inbound requests are loosely typed JSON objects. Every field is required.
//! Numbers may arrive as JSON numbers or numeric strings:
//! - integer fields accept integers, floats (truncated toward zero) and
//!   decimal-integer strings
//! - float fields accept any JSON number or a numeric string
//! - `gender` and `occupation` must be strings
//!
//! Fields are read in a fixed order and the first failure is reported.

use crate::error::ComputeError;
use crate::types::UserMetrics;
use serde_json::{Map, Value};

pub const FIELD_AGE: &str = "age";
pub const FIELD_GENDER: &str = "gender";
pub const FIELD_OCCUPATION: &str = "occupation";
pub const FIELD_SLEEP_DURATION: &str = "sleepDuration";
pub const FIELD_ACTIVITY_LEVEL: &str = "activityLevel";
pub const FIELD_STRESS_LEVEL: &str = "stressLevel";
pub const FIELD_STEPS: &str = "steps";
pub const FIELD_WEIGHT: &str = "weight";
pub const FIELD_HEIGHT: &str = "height";
pub const FIELD_SYSTOLIC: &str = "systolic";
pub const FIELD_DIASTOLIC: &str = "diastolic";
pub const FIELD_HEART_RATE: &str = "heartRate";

/// Required request fields, in read order
pub const REQUIRED_FIELDS: [&str; 12] = [
    FIELD_AGE,
    FIELD_GENDER,
    FIELD_OCCUPATION,
    FIELD_SLEEP_DURATION,
    FIELD_ACTIVITY_LEVEL,
    FIELD_STRESS_LEVEL,
    FIELD_STEPS,
    FIELD_WEIGHT,
    FIELD_HEIGHT,
    FIELD_SYSTOLIC,
    FIELD_DIASTOLIC,
    FIELD_HEART_RATE,
];

/// Decode a request object into user metrics
pub fn parse_metrics(value: &Value) -> Result<UserMetrics, ComputeError> {
    let obj = value.as_object().ok_or_else(|| ComputeError::TypeConversion {
        field: "request".to_string(),
        reason: format!("expected a JSON object, got {}", json_type(value)),
    })?;

    Ok(UserMetrics {
        age: int_field(obj, FIELD_AGE)?,
        gender: label_field(obj, FIELD_GENDER)?,
        occupation: label_field(obj, FIELD_OCCUPATION)?,
        sleep_duration: float_field(obj, FIELD_SLEEP_DURATION)?,
        activity_level: int_field(obj, FIELD_ACTIVITY_LEVEL)?,
        stress_level: int_field(obj, FIELD_STRESS_LEVEL)?,
        daily_steps: int_field(obj, FIELD_STEPS)?,
        weight_kg: float_field(obj, FIELD_WEIGHT)?,
        height_cm: float_field(obj, FIELD_HEIGHT)?,
        systolic_bp: int_field(obj, FIELD_SYSTOLIC)?,
        diastolic_bp: int_field(obj, FIELD_DIASTOLIC)?,
        heart_rate: int_field(obj, FIELD_HEART_RATE)?,
    })
}

/// Decode a request from a JSON string
pub fn parse_metrics_json(json: &str) -> Result<UserMetrics, ComputeError> {
    let value: Value = serde_json::from_str(json)?;
    parse_metrics(&value)
}

fn required<'a>(obj: &'a Map<String, Value>, field: &str) -> Result<&'a Value, ComputeError> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ComputeError::MissingField(field.to_string())),
        Some(value) => Ok(value),
    }
}

fn int_field(obj: &Map<String, Value>, field: &'static str) -> Result<i32, ComputeError> {
    let value = required(obj, field)?;

    let wide = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if !f.is_finite() || f.abs() > i64::MAX as f64 {
                    return Err(conversion(field, format!("{n} is not a valid integer")));
                }
                f.trunc() as i64
            }
        },
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| conversion(field, format!("'{s}' is not an integer")))?,
        other => {
            return Err(conversion(
                field,
                format!("expected an integer, got {}", json_type(other)),
            ))
        }
    };

    i32::try_from(wide).map_err(|_| conversion(field, format!("{wide} is out of range")))
}

fn float_field(obj: &Map<String, Value>, field: &'static str) -> Result<f64, ComputeError> {
    let value = required(obj, field)?;

    let parsed = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| conversion(field, format!("{n} is not a valid number")))?,
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| conversion(field, format!("'{s}' is not a number")))?,
        other => {
            return Err(conversion(
                field,
                format!("expected a number, got {}", json_type(other)),
            ))
        }
    };

    if !parsed.is_finite() {
        return Err(ComputeError::InvalidNumericInput {
            field,
            value: parsed,
        });
    }
    Ok(parsed)
}

fn label_field(obj: &Map<String, Value>, field: &'static str) -> Result<String, ComputeError> {
    match required(obj, field)? {
        Value::String(s) => Ok(s.clone()),
        other => Err(conversion(
            field,
            format!("expected a string, got {}", json_type(other)),
        )),
    }
}

fn conversion(field: &str, reason: String) -> ComputeError {
    ComputeError::TypeConversion {
        field: field.to_string(),
        reason,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
