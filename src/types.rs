//! Core types for the Sleepscope pipeline
//!
//! This module defines the data structures that flow through each stage of the
//! pipeline: raw user metrics, BMI results, risk levels, the assembled
//! assessment and the serialized response records.

use crate::error::ComputeError;
use crate::features::FeatureVector;
use crate::report::SleepReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Self-reported gender, as accepted by the trained model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Female,
    Male,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Female, Gender::Male];

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Female => "Female",
            Gender::Male => "Male",
        }
    }

    /// Numeric code used in the feature vector
    pub fn code(&self) -> u8 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
        }
    }

    /// Resolve an exact label; unknown labels are an error, never a default.
    pub fn from_label(label: &str) -> Result<Self, ComputeError> {
        Self::ALL
            .into_iter()
            .find(|g| g.label() == label)
            .ok_or_else(|| ComputeError::UnknownCategory {
                kind: "gender",
                label: label.to_string(),
            })
    }
}

/// Occupation categories known to the trained model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupation {
    SoftwareEngineer,
    Doctor,
    SalesRepresentative,
    Teacher,
    Nurse,
    Engineer,
    Accountant,
    Scientist,
    Lawyer,
    Salesperson,
    Manager,
    Student,
    Athlete,
    Artist,
}

impl Occupation {
    /// All occupations, ordered by code
    pub const ALL: [Occupation; 14] = [
        Occupation::SoftwareEngineer,
        Occupation::Doctor,
        Occupation::SalesRepresentative,
        Occupation::Teacher,
        Occupation::Nurse,
        Occupation::Engineer,
        Occupation::Accountant,
        Occupation::Scientist,
        Occupation::Lawyer,
        Occupation::Salesperson,
        Occupation::Manager,
        Occupation::Student,
        Occupation::Athlete,
        Occupation::Artist,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Occupation::SoftwareEngineer => "Software Engineer",
            Occupation::Doctor => "Doctor",
            Occupation::SalesRepresentative => "Sales Representative",
            Occupation::Teacher => "Teacher",
            Occupation::Nurse => "Nurse",
            Occupation::Engineer => "Engineer",
            Occupation::Accountant => "Accountant",
            Occupation::Scientist => "Scientist",
            Occupation::Lawyer => "Lawyer",
            Occupation::Salesperson => "Salesperson",
            Occupation::Manager => "Manager",
            Occupation::Student => "Student",
            Occupation::Athlete => "Athlete",
            Occupation::Artist => "Artist",
        }
    }

    /// Numeric code used in the feature vector
    pub fn code(&self) -> u8 {
        match self {
            Occupation::SoftwareEngineer => 0,
            Occupation::Doctor => 1,
            Occupation::SalesRepresentative => 2,
            Occupation::Teacher => 3,
            Occupation::Nurse => 4,
            Occupation::Engineer => 5,
            Occupation::Accountant => 6,
            Occupation::Scientist => 7,
            Occupation::Lawyer => 8,
            Occupation::Salesperson => 9,
            Occupation::Manager => 10,
            Occupation::Student => 11,
            Occupation::Athlete => 12,
            Occupation::Artist => 13,
        }
    }

    /// Resolve an exact label; unknown labels are an error, never a default.
    pub fn from_label(label: &str) -> Result<Self, ComputeError> {
        Self::ALL
            .into_iter()
            .find(|o| o.label() == label)
            .ok_or_else(|| ComputeError::UnknownCategory {
                kind: "occupation",
                label: label.to_string(),
            })
    }
}

/// Raw metrics for a single assessment request.
///
/// Gender and occupation are kept as the labels the caller sent; they are
/// resolved to codes by the feature encoder, which is where an unknown label
/// is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetrics {
    /// Age (years)
    pub age: i32,
    /// Gender label ("Female" or "Male")
    pub gender: String,
    /// Occupation label
    pub occupation: String,
    /// Sleep duration (hours)
    pub sleep_duration: f64,
    /// Physical activity level (0-10)
    pub activity_level: i32,
    /// Stress level (1-10)
    pub stress_level: i32,
    /// Daily step count
    #[serde(rename = "steps")]
    pub daily_steps: i32,
    /// Body weight (kg)
    #[serde(rename = "weight")]
    pub weight_kg: f64,
    /// Height (cm)
    #[serde(rename = "height")]
    pub height_cm: f64,
    /// Systolic blood pressure (mmHg)
    #[serde(rename = "systolic")]
    pub systolic_bp: i32,
    /// Diastolic blood pressure (mmHg)
    #[serde(rename = "diastolic")]
    pub diastolic_bp: i32,
    /// Resting heart rate (bpm)
    #[serde(rename = "heartRate")]
    pub heart_rate: i32,
}

/// BMI band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
}

impl BmiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body-mass index and its band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BmiResult {
    pub value: f64,
    pub category: BmiCategory,
}

/// Sleep-disorder risk level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    /// Human-readable label returned to the caller
    pub fn message(&self) -> &'static str {
        match self {
            RiskLevel::High => "🚨 High risk of sleep disorder. Consult a specialist.",
            RiskLevel::Moderate => "⚠️ Moderate risk. Consider improving sleep hygiene.",
            RiskLevel::Low => "✅ Low risk. Maintain healthy sleep habits.",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Everything computed for one request, before serialization
#[derive(Debug, Clone)]
pub struct SleepAssessment {
    pub bmi: BmiResult,
    pub features: FeatureVector,
    /// Raw predictor output, unclamped and unrounded
    pub sleep_score: f64,
    pub risk: RiskLevel,
    pub report: Option<SleepReport>,
}

/// Producer metadata attached to every response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProducerInfo {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Successful response record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    /// BMI rounded to 2 decimals
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    /// Sleep score rounded to 1 decimal
    pub sleep_score: f64,
    pub disorder_risk: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    pub producer: ProducerInfo,
    pub computed_at_utc: String,
}

/// Failure response record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl From<&ComputeError> for ErrorResponse {
    fn from(e: &ComputeError) -> Self {
        Self {
            error: e.to_string(),
            code: Some(e.code().to_string()),
        }
    }
}
