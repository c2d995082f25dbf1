//! Sleepscope - Deterministic sleep-quality assessment
//!
//! Sleepscope turns a handful of self-reported health metrics into a sleep
//! assessment through a linear pipeline: unit conversion → feature encoding
//! → model scoring → risk classification → advisory report.
//!
//! ## Modules
//!
//! - **Pipeline**: [`SleepPipeline`] runs one request through every stage
//! - **Model**: the [`Predictor`] trait and the JSON-backed [`ScaledModel`]
//! - **Report**: ordered rule table producing the advisory text

pub mod encoder;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod schema;
pub mod types;
pub mod units;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::ComputeError;
pub use features::{FeatureEncoder, FeatureVector};
pub use model::{Predictor, ScaledModel};
pub use pipeline::{SharedPredictor, SleepPipeline};
pub use report::{ReportGenerator, ReportInputs, SleepReport};
pub use risk::RiskClassifier;
pub use types::{AssessmentResponse, BmiCategory, BmiResult, RiskLevel, UserMetrics};
pub use units::UnitConverter;

/// Sleepscope version embedded in every response
pub const SLEEPSCOPE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for responses
pub const PRODUCER_NAME: &str = "sleepscope";
