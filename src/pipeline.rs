//! Pipeline orchestration
//!
//! This module provides the public API for Sleepscope.
//! It runs one request through every stage, from raw metrics to the response.

use crate::encoder::ResponseEncoder;
use crate::error::ComputeError;
use crate::features::{FeatureEncoder, OCCUPATION_COLUMN};
use crate::model::{Predictor, ScaledModel};
use crate::report::{ReportGenerator, ReportInputs};
use crate::risk::RiskClassifier;
use crate::schema::parse_metrics;
use crate::types::{AssessmentResponse, SleepAssessment, UserMetrics};
use crate::units::UnitConverter;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Shared, read-only predictor handle
pub type SharedPredictor = Arc<dyn Predictor + Send + Sync>;

/// Stateless assessment pipeline.
///
/// The predictor is loaded once and shared by every request; nothing is
/// carried over from one request to the next.
#[derive(Clone)]
pub struct SleepPipeline {
    predictor: SharedPredictor,
    encoder: Arc<ResponseEncoder>,
}

impl SleepPipeline {
    /// Create a pipeline around an existing predictor
    pub fn new(predictor: SharedPredictor) -> Self {
        Self {
            predictor,
            encoder: Arc::new(ResponseEncoder::new()),
        }
    }

    /// Create a pipeline with a specific response encoder
    pub fn with_encoder(predictor: SharedPredictor, encoder: ResponseEncoder) -> Self {
        Self {
            predictor,
            encoder: Arc::new(encoder),
        }
    }

    /// Create a pipeline from a JSON model artifact
    pub fn from_model_json(json: &str) -> Result<Self, ComputeError> {
        Ok(Self::new(Arc::new(ScaledModel::from_json(json)?)))
    }

    /// Create a pipeline from a model artifact on disk
    pub fn load(model_path: &Path) -> Result<Self, ComputeError> {
        Ok(Self::new(Arc::new(ScaledModel::load(model_path)?)))
    }

    pub fn encoder(&self) -> &ResponseEncoder {
        &self.encoder
    }

    /// Run the pipeline over decoded metrics.
    ///
    /// Pipeline stages:
    /// 1. UnitConverter - BMI value and band
    /// 2. FeatureEncoder - Fixed-order feature vector
    /// 3. Predictor - Sleep-quality score
    /// 4. RiskClassifier - Disorder risk level
    /// 5. ReportGenerator - Advisory report (optional)
    pub fn assess(
        &self,
        metrics: &UserMetrics,
        include_report: bool,
    ) -> Result<SleepAssessment, ComputeError> {
        self.run_stages(metrics, include_report).map_err(rejected)
    }

    fn run_stages(
        &self,
        metrics: &UserMetrics,
        include_report: bool,
    ) -> Result<SleepAssessment, ComputeError> {
        // Stage 1: Convert units
        let bmi = UnitConverter::compute_bmi(metrics.weight_kg, metrics.height_cm)?;

        // Stage 2: Encode features
        let features = FeatureEncoder::encode(metrics)?;

        // Stage 3: Predict score
        let sleep_score = self.predictor.predict(&features)?;
        debug!(bmi = bmi.value, score = sleep_score, "scored request");

        // Stage 4: Classify risk
        let risk = RiskClassifier::classify(sleep_score, metrics.stress_level, metrics.sleep_duration)?;

        // Stage 5: Generate report
        let report = include_report.then(|| {
            ReportGenerator::generate(&ReportInputs {
                score: sleep_score,
                sleep_duration: metrics.sleep_duration,
                stress_level: metrics.stress_level,
                activity_level: metrics.activity_level,
                age: metrics.age,
                occupation_code: features[OCCUPATION_COLUMN] as u8,
                bmi_category: bmi.category,
                heart_rate: metrics.heart_rate,
                systolic_bp: metrics.systolic_bp,
                diastolic_bp: metrics.diastolic_bp,
            })
        });

        Ok(SleepAssessment {
            bmi,
            features,
            sleep_score,
            risk,
            report,
        })
    }

    /// Decode, assess and encode a single request object
    pub fn assess_request(
        &self,
        request: &Value,
        include_report: bool,
    ) -> Result<AssessmentResponse, ComputeError> {
        let metrics = parse_metrics(request).map_err(rejected)?;
        let assessment = self.assess(&metrics, include_report)?;
        Ok(self.encoder.encode(&assessment))
    }

    /// Assess a request given as a JSON string and return the response JSON
    pub fn assess_json(&self, request_json: &str, include_report: bool) -> Result<String, ComputeError> {
        let request: Value = serde_json::from_str(request_json)
            .map_err(|e| rejected(ComputeError::from(e)))?;
        let response = self.assess_request(&request, include_report)?;
        serde_json::to_string(&response).map_err(|e| ComputeError::EncodingError(e.to_string()))
    }

    /// Assess every record independently; failures stay in their slot
    pub fn assess_batch(
        &self,
        requests: Vec<Result<Value, ComputeError>>,
        include_report: bool,
    ) -> Vec<Result<AssessmentResponse, ComputeError>> {
        requests
            .into_iter()
            .map(|request| match request {
                Ok(value) => self.assess_request(&value, include_report),
                Err(e) => Err(rejected(e)),
            })
            .collect()
    }
}

fn rejected(e: ComputeError) -> ComputeError {
    warn!(code = e.code(), error = %e, "rejected request");
    e
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::{duration_model_json, ConstantPredictor};
    use crate::schema::RequestAdapter;
    use crate::types::{BmiCategory, RiskLevel};
    use serde_json::json;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture_warnings(f: impl FnOnce()) -> String {
        let capture = LogCapture::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, f);

        let bytes = capture.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    fn sample_request() -> Value {
        json!({
            "age": 30,
            "gender": "Female",
            "occupation": "Teacher",
            "sleepDuration": 4.5,
            "activityLevel": 3,
            "stressLevel": 8,
            "steps": 4000,
            "weight": 65,
            "height": 165,
            "systolic": 125,
            "diastolic": 80,
            "heartRate": 75
        })
    }

    fn constant_pipeline(score: f64) -> SleepPipeline {
        SleepPipeline::new(Arc::new(ConstantPredictor(score)))
    }

    #[test]
    fn test_end_to_end_high_risk_regardless_of_score() {
        for score in [2.0, 5.0, 9.5] {
            let response = constant_pipeline(score)
                .assess_request(&sample_request(), false)
                .unwrap();

            assert_eq!(response.bmi, 23.88);
            assert_eq!(response.bmi_category, BmiCategory::Normal);
            assert_eq!(response.disorder_risk, RiskLevel::High.message());
            assert!(response.report.is_none());
        }
    }

    #[test]
    fn test_assess_with_model_artifact() {
        let pipeline = SleepPipeline::from_model_json(&duration_model_json()).unwrap();
        let mut request = sample_request();
        request["sleepDuration"] = json!(8.0);
        request["stressLevel"] = json!(3);

        let response = pipeline.assess_request(&request, false).unwrap();
        // 2 + 0.5 * 8
        assert_eq!(response.sleep_score, 6.0);
        assert_eq!(response.disorder_risk, RiskLevel::Low.message());
    }

    #[test]
    fn test_score_rounding_and_pass_through() {
        let response = constant_pipeline(11.2749)
            .assess_request(&sample_request(), false)
            .unwrap();
        assert_eq!(response.sleep_score, 11.3);

        let response = constant_pipeline(-0.04)
            .assess_request(&sample_request(), false)
            .unwrap();
        assert_eq!(response.sleep_score, -0.0);
    }

    #[test]
    fn test_report_variant() {
        let pipeline = constant_pipeline(5.2);
        let assessment = pipeline
            .assess(&parse_metrics(&sample_request()).unwrap(), true)
            .unwrap();

        let report = assessment.report.unwrap();
        assert!(report.text.contains("Predicted Quality of Sleep: 5.2/10"));
        assert!(report.fired_rules.contains(&"earlier_bedtime".to_string()));
        assert!(report.fired_rules.contains(&"stress_relief".to_string()));
        assert!(report.fired_rules.contains(&"move_more".to_string()));
        assert!(!report.fired_rules.contains(&"power_nap".to_string()));
    }

    #[test]
    fn test_report_uses_unrounded_score() {
        // 5.96 displays as 6.0 but stays below the "good" band
        let assessment = constant_pipeline(5.96)
            .assess(&parse_metrics(&sample_request()).unwrap(), true)
            .unwrap();
        let text = assessment.report.unwrap().text;

        assert!(text.contains("6.0/10"));
        assert!(text.contains("Needs improvement"));
    }

    #[test]
    fn test_unknown_category_aborts_request() {
        let mut request = sample_request();
        request["occupation"] = json!("Pilot");

        let err = constant_pipeline(7.0)
            .assess_request(&request, true)
            .unwrap_err();
        assert!(matches!(err, ComputeError::UnknownCategory { .. }));
    }

    #[test]
    fn test_nan_prediction_fails_fast() {
        let err = constant_pipeline(f64::NAN)
            .assess_request(&sample_request(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            ComputeError::InvalidNumericInput { field: "sleepScore", .. }
        ));
    }

    #[test]
    fn test_assess_json() {
        let pipeline = constant_pipeline(7.04);
        let json = pipeline
            .assess_json(&sample_request().to_string(), true)
            .unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["sleepScore"], 7.0);
        assert_eq!(parsed["bmiCategory"], "Normal");
        assert!(parsed["report"].as_str().unwrap().contains("Morning Boosters"));

        assert!(matches!(
            pipeline.assess_json("not json", false),
            Err(ComputeError::JsonError(_))
        ));
    }

    #[test]
    fn test_batch_keeps_failures_in_place() {
        let mut bad = sample_request();
        bad.as_object_mut().unwrap().remove("heartRate");
        let ndjson = format!("{}\n{}\n{{oops\n", sample_request(), bad);

        let results =
            constant_pipeline(7.0).assess_batch(RequestAdapter::parse_ndjson(&ndjson), false);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(ComputeError::MissingField(ref f)) if f == "heartRate"));
        assert!(matches!(results[2], Err(ComputeError::ParseError(_))));
    }

    #[test]
    fn test_pipeline_is_shareable_across_threads() {
        let pipeline = constant_pipeline(6.5);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = pipeline.clone();
                std::thread::spawn(move || {
                    pipeline
                        .assess_request(&sample_request(), true)
                        .map(|r| r.report)
                })
            })
            .collect();

        let reports: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect();
        assert!(reports.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_rejections_are_logged_once() {
        let pipeline = constant_pipeline(7.0);
        let mut metrics = parse_metrics(&sample_request()).unwrap();
        metrics.occupation = "Pilot".to_string();

        let logs = capture_warnings(|| {
            assert!(pipeline.assess(&metrics, true).is_err());
        });
        assert!(logs.contains("rejected request"));
        assert!(logs.contains("UNKNOWN_CATEGORY"));

        let mut request = sample_request();
        request["occupation"] = json!("Pilot");
        let logs = capture_warnings(|| {
            assert!(pipeline.assess_request(&request, false).is_err());
        });
        assert_eq!(logs.matches("rejected request").count(), 1);
    }

    #[test]
    fn test_batch_parse_failures_are_logged() {
        let records = RequestAdapter::parse_ndjson(&format!("{}\n{{oops\n", sample_request()));

        let logs = capture_warnings(|| {
            let results = constant_pipeline(7.0).assess_batch(records, false);
            assert!(results[0].is_ok());
            assert!(results[1].is_err());
        });
        assert_eq!(logs.matches("rejected request").count(), 1);
        assert!(logs.contains("PARSE_ERROR"));
    }

    #[test]
    fn test_huge_score_survives_rounding() {
        let response = constant_pipeline(1e308)
            .assess_request(&sample_request(), false)
            .unwrap();
        assert_eq!(response.sleep_score, 1e308);

        let json = constant_pipeline(1e308)
            .assess_json(&sample_request().to_string(), false)
            .unwrap();
        let parsed: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["sleepScore"].as_f64(), Some(1e308));
    }

    #[test]
    fn test_tiny_height_is_rejected() {
        let mut request = sample_request();
        request["weight"] = json!(70);
        request["height"] = json!(1e-200);

        let err = constant_pipeline(7.0)
            .assess_json(&request.to_string(), false)
            .unwrap_err();
        assert!(matches!(
            err,
            ComputeError::InvalidNumericInput { field: "bmi", .. }
        ));
    }
}
