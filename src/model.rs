//! Sleep-score prediction
//!
//! The pipeline only depends on the [`Predictor`] trait. The concrete
//! [`ScaledModel`] pairs a standard scaler with a regressor, both loaded from a
//! JSON model artifact produced at training time:
//!
//! ```json
//! {
//!   "feature_names": ["Gender", "Age", "..."],
//!   "scaler": { "mean": [..10], "scale": [..10] },
//!   "regressor": { "kind": "linear", "intercept": 7.1, "coefficients": [..10] }
//! }
//! ```
//!
//! A tree ensemble uses `{"kind": "forest", "trees": [{"nodes": [...]}]}`,
//! where each node is either `{"type": "split", "feature", "threshold",
//! "left", "right"}` or `{"type": "leaf", "value"}`.

use crate::error::ComputeError;
use crate::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Capability for turning a feature vector into a sleep-quality score.
///
/// Implementations must be deterministic and must not clamp the score.
pub trait Predictor {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ComputeError>;
}

/// Mean/variance normalization fitted during training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Columns without a fitted mean/scale stay at zero; `validate` rejects
    /// such scalers before they reach a model.
    pub(crate) fn transform(&self, features: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let mut scaled = [0.0; FEATURE_COUNT];
        let params = self.mean.iter().zip(self.scale.iter());
        for ((slot, value), (mean, scale)) in scaled.iter_mut().zip(features.as_slice()).zip(params) {
            *slot = (value - mean) / scale;
        }
        scaled
    }

    fn validate(&self) -> Result<(), ComputeError> {
        check_len("scaler.mean", self.mean.len())?;
        check_len("scaler.scale", self.scale.len())?;

        if let Some(idx) = self
            .scale
            .iter()
            .position(|s| !s.is_finite() || *s == 0.0)
        {
            return Err(ComputeError::ModelError(format!(
                "scaler.scale[{idx}] must be finite and non-zero"
            )));
        }
        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(ComputeError::ModelError(
                "scaler.mean must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

/// Node of a regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// Regression tree stored as a flat node array; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    fn evaluate(&self, scaled: &[f64; FEATURE_COUNT]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if scaled[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Children must point forward, which rules out cycles.
    fn validate(&self, tree_idx: usize) -> Result<(), ComputeError> {
        if self.nodes.is_empty() {
            return Err(ComputeError::ModelError(format!("tree {tree_idx} is empty")));
        }

        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                let in_range = |child: usize| child > idx && child < self.nodes.len();
                if *feature >= FEATURE_COUNT || !in_range(*left) || !in_range(*right) {
                    return Err(ComputeError::ModelError(format!(
                        "tree {tree_idx} node {idx} has an invalid feature or child index"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Regressor applied to scaled features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Regressor {
    Linear {
        intercept: f64,
        coefficients: Vec<f64>,
    },
    Forest {
        trees: Vec<RegressionTree>,
    },
}

impl Regressor {
    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::Linear { .. } => "linear",
            Regressor::Forest { .. } => "forest",
        }
    }

    fn predict_scaled(&self, scaled: &[f64; FEATURE_COUNT]) -> f64 {
        match self {
            Regressor::Linear {
                intercept,
                coefficients,
            } => {
                intercept
                    + coefficients
                        .iter()
                        .zip(scaled.iter())
                        .map(|(c, z)| c * z)
                        .sum::<f64>()
            }
            Regressor::Forest { trees } => {
                let total: f64 = trees.iter().map(|t| t.evaluate(scaled)).sum();
                total / trees.len() as f64
            }
        }
    }

    fn validate(&self) -> Result<(), ComputeError> {
        match self {
            Regressor::Linear { coefficients, .. } => check_len("coefficients", coefficients.len()),
            Regressor::Forest { trees } => {
                if trees.is_empty() {
                    return Err(ComputeError::ModelError(
                        "forest has no trees".to_string(),
                    ));
                }
                trees
                    .iter()
                    .enumerate()
                    .try_for_each(|(idx, tree)| tree.validate(idx))
            }
        }
    }
}

/// Serialized model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub scaler: StandardScaler,
    pub regressor: Regressor,
}

/// Scaler + regressor pair, validated and immutable after load
#[derive(Debug, Clone)]
pub struct ScaledModel {
    scaler: StandardScaler,
    regressor: Regressor,
}

impl ScaledModel {
    /// Build a model from an artifact, checking it matches the encoder layout
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, ComputeError> {
        if artifact.feature_names.iter().map(String::as_str).ne(FEATURE_NAMES) {
            return Err(ComputeError::ModelError(format!(
                "feature_names {:?} do not match expected column order {:?}",
                artifact.feature_names, FEATURE_NAMES
            )));
        }
        artifact.scaler.validate()?;
        artifact.regressor.validate()?;

        Ok(Self {
            scaler: artifact.scaler,
            regressor: artifact.regressor,
        })
    }

    /// Parse and validate an artifact from JSON
    pub fn from_json(json: &str) -> Result<Self, ComputeError> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .map_err(|e| ComputeError::ModelError(format!("invalid model artifact: {e}")))?;
        Self::from_artifact(artifact)
    }

    /// Load an artifact from disk
    pub fn load(path: &Path) -> Result<Self, ComputeError> {
        let json = fs::read_to_string(path).map_err(|e| {
            ComputeError::ModelError(format!("cannot read {}: {e}", path.display()))
        })?;
        let model = Self::from_json(&json)?;
        info!(path = %path.display(), kind = model.kind(), "loaded model artifact");
        Ok(model)
    }

    pub fn kind(&self) -> &'static str {
        self.regressor.kind()
    }
}

impl Predictor for ScaledModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64, ComputeError> {
        let scaled = self.scaler.transform(features);
        let score = self.regressor.predict_scaled(&scaled);
        if score.is_nan() {
            return Err(ComputeError::ModelError(
                "model produced a NaN score".to_string(),
            ));
        }
        Ok(score)
    }
}

fn check_len(name: &str, len: usize) -> Result<(), ComputeError> {
    if len == FEATURE_COUNT {
        Ok(())
    } else {
        Err(ComputeError::ModelError(format!(
            "{name} has {len} entries, expected {FEATURE_COUNT}"
        )))
    }
}
