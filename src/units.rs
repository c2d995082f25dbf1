//! Unit conversion
//!
//! Converts raw body measurements into a body-mass index and classifies it.
//! - Height arrives in centimetres and is converted to metres
//! - Non-positive or non-finite measurements are rejected, never coerced

use crate::error::{ensure_finite, ComputeError};
use crate::types::{BmiCategory, BmiResult};

/// Lower bound of the Normal band (inclusive)
pub const BMI_NORMAL_MIN: f64 = 18.5;
/// Lower bound of the Overweight band (inclusive)
pub const BMI_OVERWEIGHT_MIN: f64 = 25.0;

/// Converter from raw measurements to BMI
pub struct UnitConverter;

impl UnitConverter {
    /// Compute BMI from weight (kg) and height (cm)
    pub fn compute_bmi(weight_kg: f64, height_cm: f64) -> Result<BmiResult, ComputeError> {
        let weight_kg = ensure_finite("weight", weight_kg)?;
        let height_cm = ensure_finite("height", height_cm)?;

        if height_cm <= 0.0 {
            return Err(ComputeError::InvalidNumericInput {
                field: "height",
                value: height_cm,
            });
        }

        let height_m = height_cm / 100.0;
        let value = ensure_finite("bmi", weight_kg / (height_m * height_m))?;

        Ok(BmiResult {
            value,
            category: Self::categorize(value),
        })
    }

    /// Classify a BMI value; each band includes its lower bound
    pub fn categorize(bmi: f64) -> BmiCategory {
        if bmi < BMI_NORMAL_MIN {
            BmiCategory::Underweight
        } else if bmi < BMI_OVERWEIGHT_MIN {
            BmiCategory::Normal
        } else {
            BmiCategory::Overweight
        }
    }
}

/// Above 2^52 every f64 is already an integer
const EXACT_INTEGER_LIMIT: f64 = 4_503_599_627_370_496.0;

/// Round half away from zero to a fixed number of decimals.
///
/// Values too large to carry fractional digits are returned unchanged.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    if !scaled.is_finite() || scaled.abs() >= EXACT_INTEGER_LIMIT {
        return value;
    }
    scaled.round() / factor
}
