//! Classifier adapter over an opaque squeeze model.
//!
//! The model itself is a small linear scorer loaded from a JSON spec
//! (weights per label, bias, softmax on top). The agent treats it as a
//! black box behind [`GestureModel::predict`]; a load failure makes the
//! model permanently unavailable and `predict` returns an empty result
//! rather than erroring.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// On-disk model description.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelSpec {
    /// Window length the model was trained on
    input_size: usize,
    /// Class labels, in score order
    labels: Vec<String>,
    /// One weight row per label
    weights: Vec<Vec<f32>>,
    /// One bias per label
    bias: Vec<f32>,
    /// Index of the "squeeze detected" class
    detect_index: usize,
}

impl ModelSpec {
    fn validate(&self) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::ShapeError("no labels".to_string()));
        }
        if self.weights.len() != self.labels.len() || self.bias.len() != self.labels.len() {
            return Err(ModelError::ShapeError(format!(
                "expected {} weight rows and biases",
                self.labels.len()
            )));
        }
        if let Some(row) = self.weights.iter().find(|row| row.len() != self.input_size) {
            return Err(ModelError::ShapeError(format!(
                "weight row of length {} does not match input size {}",
                row.len(),
                self.input_size
            )));
        }
        if self.detect_index >= self.labels.len() {
            return Err(ModelError::ShapeError(format!(
                "detect index {} out of range",
                self.detect_index
            )));
        }
        Ok(())
    }
}

/// Loaded (or permanently unavailable) squeeze classifier.
pub struct GestureModel {
    spec: Option<ModelSpec>,
}

impl GestureModel {
    /// Load a model from a JSON spec file.
    ///
    /// Never fails: an unreadable or malformed spec is logged once and the
    /// model behaves as permanently unavailable.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(model) => model,
            Err(e) => {
                tracing::warn!("classifier model unavailable ({e}); gestures will not detect");
                Self { spec: None }
            }
        }
    }

    fn try_load(path: &Path) -> Result<Self, ModelError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ModelError::IoError(e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse a model from its JSON spec.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let spec: ModelSpec =
            serde_json::from_str(json).map_err(|e| ModelError::ParseError(e.to_string()))?;
        spec.validate()?;
        Ok(Self { spec: Some(spec) })
    }

    /// Compiled-in default squeeze model.
    ///
    /// Scores rise with total window magnitude, which matches the bursty
    /// waveform the squeeze sensor produces.
    pub fn builtin() -> Self {
        let spec = ModelSpec {
            input_size: 16,
            labels: vec!["idle".to_string(), "squeeze".to_string()],
            weights: vec![vec![-0.4; 16], vec![0.9; 16]],
            bias: vec![1.2, -1.0],
            detect_index: 1,
        };
        Self { spec: Some(spec) }
    }

    /// A model that failed to load and never detects.
    pub fn unavailable() -> Self {
        Self { spec: None }
    }

    /// Whether a model is loaded.
    pub fn is_available(&self) -> bool {
        self.spec.is_some()
    }

    /// Window length the model expects, when available.
    pub fn input_size(&self) -> Option<usize> {
        self.spec.as_ref().map(|s| s.input_size)
    }

    /// Number of output classes, when available.
    pub fn output_size(&self) -> Option<usize> {
        self.spec.as_ref().map(|s| s.labels.len())
    }

    /// Index of the detection class, when available.
    pub fn detect_index(&self) -> Option<usize> {
        self.spec.as_ref().map(|s| s.detect_index)
    }

    /// Class probabilities for a window.
    ///
    /// Returns an empty vector when the model is unavailable or the window
    /// and output shapes do not match what it was trained on.
    pub fn predict(&self, window: &[f32], output_size: usize) -> Vec<f32> {
        let Some(ref spec) = self.spec else {
            return Vec::new();
        };
        if window.len() != spec.input_size || output_size != spec.labels.len() {
            return Vec::new();
        }

        let mut scores: Vec<f32> = spec
            .weights
            .iter()
            .zip(&spec.bias)
            .map(|(row, b)| row.iter().zip(window).map(|(w, x)| w * x).sum::<f32>() + b)
            .collect();
        softmax_in_place(&mut scores);
        scores
    }
}

fn softmax_in_place(scores: &mut [f32]) {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut total = 0.0;
    for s in scores.iter_mut() {
        *s = (*s - max).exp();
        total += *s;
    }
    if total > 0.0 {
        for s in scores.iter_mut() {
            *s /= total;
        }
    }
}

/// Model loading errors.
#[derive(Debug)]
pub enum ModelError {
    IoError(String),
    ParseError(String),
    ShapeError(String),
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::IoError(e) => write!(f, "IO error: {e}"),
            ModelError::ParseError(e) => write!(f, "Parse error: {e}"),
            ModelError::ShapeError(e) => write!(f, "Shape error: {e}"),
        }
    }
}

impl std::error::Error for ModelError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_detects_burst_window() {
        let model = GestureModel::builtin();
        let mut window = vec![0.02; 16];
        for v in window.iter_mut().skip(8) {
            *v = 1.5;
        }

        let scores = model.predict(&window, 2);
        assert_eq!(scores.len(), 2);
        assert!(scores[1] > 0.9);
        assert!((scores[0] + scores[1] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_builtin_rejects_quiet_window() {
        let model = GestureModel::builtin();
        let scores = model.predict(&vec![0.02; 16], 2);
        assert!(scores[1] < 0.5);
    }

    #[test]
    fn test_unavailable_model_predicts_empty() {
        let model = GestureModel::load(Path::new("/nonexistent/squeeze.json"));
        assert!(!model.is_available());
        assert!(model.predict(&vec![1.0; 16], 2).is_empty());
    }

    #[test]
    fn test_shape_mismatch_predicts_empty() {
        let model = GestureModel::builtin();
        assert!(model.predict(&vec![1.0; 8], 2).is_empty());
        assert!(model.predict(&vec![1.0; 16], 3).is_empty());
    }

    #[test]
    fn test_spec_validation() {
        let bad = r#"{
            "input_size": 4,
            "labels": ["idle", "squeeze"],
            "weights": [[0.1, 0.1, 0.1]],
            "bias": [0.0, 0.0],
            "detect_index": 1
        }"#;
        assert!(GestureModel::from_json(bad).is_err());

        let good = r#"{
            "input_size": 2,
            "labels": ["idle", "squeeze"],
            "weights": [[0.0, 0.0], [1.0, 1.0]],
            "bias": [0.5, 0.0],
            "detect_index": 1
        }"#;
        let model = GestureModel::from_json(good).unwrap();
        assert_eq!(model.input_size(), Some(2));
        assert_eq!(model.detect_index(), Some(1));
    }
}
