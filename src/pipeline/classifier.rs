//! Classifier adapter.
//!
//! The trained classifier itself is an opaque capability supplied by the
//! training side; this module only re-applies the standardizing transform
//! fitted at training time and enforces, at construction, that the model
//! was trained on exactly the feature schema this deployment produces.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::pipeline::error::SockError;
use crate::pipeline::features::FeatureSchema;

/// Reserved label reported when no confident classification exists.
pub const UNKNOWN_LABEL: &str = "unknown";

/// One classified window.
#[derive(Clone, Debug)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
    /// Per-class probabilities, in the model's class order.
    pub distribution: Vec<(String, f64)>,
}

impl Prediction {
    pub fn unknown() -> Self {
        Self {
            label: UNKNOWN_LABEL.to_string(),
            confidence: 0.0,
            distribution: Vec::new(),
        }
    }
}

/// Externally trained classifier capability.
///
/// `predict` and `predict_probabilities` receive rows that have already
/// been standardized by the adapter.
pub trait Classifier {
    /// Feature names the model was trained on, in row order.
    fn feature_names(&self) -> &[String];
    /// Class labels, in the order `predict_probabilities` reports them.
    fn classes(&self) -> &[String];
    fn predict(&self, row: &[f64]) -> String;
    fn predict_probabilities(&self, row: &[f64]) -> Vec<f64>;
}

/// Per-feature standardization fitted at training time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl FeatureScaler {
    /// Pass-through scaler, used when a model was trained on raw features.
    pub fn identity(len: usize) -> Self {
        Self {
            mean: vec![0.0; len],
            scale: vec![1.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Standardize a row. Zero-variance features use a unit divisor, the
    /// convention the fitted scaler on the training side follows.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(&x, (&m, &s))| {
                let divisor = if s == 0.0 { 1.0 } else { s };
                (x - m) / divisor
            })
            .collect()
    }
}

/// Wraps an opaque trained classifier behind the schema contract.
pub struct ClassifierAdapter<C: Classifier> {
    model: C,
    scaler: FeatureScaler,
    confidence_threshold: Option<f64>,
}

impl<C: Classifier> ClassifierAdapter<C> {
    /// Fails fast when the model's feature list diverges from the schema;
    /// classifying with silently misaligned columns is never recoverable.
    pub fn new(model: C, scaler: FeatureScaler, schema: &FeatureSchema) -> Result<Self, SockError> {
        if model.feature_names() != schema.names() {
            let detail = model
                .feature_names()
                .iter()
                .zip(schema.names())
                .find(|(a, b)| a != b)
                .map(|(a, b)| format!("model has '{a}' where the schema has '{b}'"))
                .unwrap_or_else(|| {
                    format!(
                        "model expects {} features, schema produces {}",
                        model.feature_names().len(),
                        schema.len()
                    )
                });
            return Err(SockError::FeatureMismatch(detail));
        }
        if scaler.len() != schema.len() || scaler.scale.len() != schema.len() {
            return Err(SockError::ScalerMismatch {
                expected: schema.len(),
                actual: scaler.len(),
            });
        }
        Ok(Self {
            model,
            scaler,
            confidence_threshold: None,
        })
    }

    /// Report `unknown` instead of any prediction below this confidence.
    pub fn with_confidence_threshold(mut self, threshold: Option<f64>) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn feature_names(&self) -> &[String] {
        self.model.feature_names()
    }

    pub fn classify(&self, row: &[f64]) -> Prediction {
        let scaled = self.scaler.transform(row);
        let probabilities = self.model.predict_probabilities(&scaled);
        let label = self.model.predict(&scaled);
        let confidence = probabilities.iter().copied().fold(0.0, f64::max);
        let distribution = self
            .model
            .classes()
            .iter()
            .cloned()
            .zip(probabilities)
            .collect();

        let label = match self.confidence_threshold {
            Some(threshold) if confidence < threshold => UNKNOWN_LABEL.to_string(),
            _ => label,
        };
        Prediction {
            label,
            confidence,
            distribution,
        }
    }
}

/// Serialized model artifact: metadata plus a nearest-centroid predictor
/// over standardized features. Richer model families stay on the training
/// side; this is the shape the serving path consumes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub feature_names: Vec<String>,
    pub classes: Vec<String>,
    pub scaler: FeatureScaler,
    /// One centroid per class, in standardized feature space.
    pub centroids: Vec<Vec<f64>>,
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self, SockError> {
        let file = File::open(path)?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<(), SockError> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SockError> {
        if self.classes.len() != self.centroids.len() {
            return Err(SockError::InvalidConfig(format!(
                "artifact has {} classes but {} centroids",
                self.classes.len(),
                self.centroids.len()
            )));
        }
        let width = self.feature_names.len();
        if self.scaler.len() != width || self.scaler.scale.len() != width {
            return Err(SockError::ScalerMismatch {
                expected: width,
                actual: self.scaler.len(),
            });
        }
        if let Some(bad) = self.centroids.iter().find(|c| c.len() != width) {
            return Err(SockError::InvalidConfig(format!(
                "centroid width {} does not match {} features",
                bad.len(),
                width
            )));
        }
        Ok(())
    }

    /// Split into the predictor and the transform the adapter applies.
    pub fn into_parts(self) -> (CentroidModel, FeatureScaler) {
        (
            CentroidModel {
                feature_names: self.feature_names,
                classes: self.classes,
                centroids: self.centroids,
            },
            self.scaler,
        )
    }
}

/// Nearest-centroid classifier over standardized features.
#[derive(Clone, Debug)]
pub struct CentroidModel {
    feature_names: Vec<String>,
    classes: Vec<String>,
    centroids: Vec<Vec<f64>>,
}

impl CentroidModel {
    fn distances(&self, row: &[f64]) -> Vec<f64> {
        self.centroids
            .iter()
            .map(|c| {
                c.iter()
                    .zip(row)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum::<f64>()
                    .sqrt()
            })
            .collect()
    }
}

impl Classifier for CentroidModel {
    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict(&self, row: &[f64]) -> String {
        let distances = self.distances(row);
        let mut best = 0usize;
        for (i, d) in distances.iter().enumerate() {
            if *d < distances[best] {
                best = i;
            }
        }
        self.classes[best].clone()
    }

    fn predict_probabilities(&self, row: &[f64]) -> Vec<f64> {
        // Softmax over negative distances: nearer centroids get more mass.
        let distances = self.distances(row);
        let min = distances.iter().copied().fold(f64::INFINITY, f64::min);
        let weights: Vec<f64> = distances.iter().map(|d| (-(d - min)).exp()).collect();
        let total: f64 = weights.iter().sum();
        weights.into_iter().map(|w| w / total).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SensorLayout;
    use crate::pipeline::features::FeatureSchema;

    fn schema() -> FeatureSchema {
        FeatureSchema::for_layout(&SensorLayout::default())
    }

    fn artifact_for(schema: &FeatureSchema) -> ModelArtifact {
        let width = schema.len();
        ModelArtifact {
            feature_names: schema.names().to_vec(),
            classes: vec!["walking_forward".into(), "standing_upright".into()],
            scaler: FeatureScaler::identity(width),
            centroids: vec![vec![1.0; width], vec![-1.0; width]],
        }
    }

    #[test]
    fn adapter_rejects_mismatched_feature_names() {
        let schema = schema();
        let mut artifact = artifact_for(&schema);
        artifact.feature_names[0] = "not_a_real_feature".into();
        let (model, scaler) = artifact.into_parts();
        assert!(matches!(
            ClassifierAdapter::new(model, scaler, &schema),
            Err(SockError::FeatureMismatch(_))
        ));
    }

    #[test]
    fn adapter_rejects_short_scaler() {
        let schema = schema();
        let mut artifact = artifact_for(&schema);
        artifact.scaler = FeatureScaler::identity(3);
        let model = CentroidModel {
            feature_names: artifact.feature_names.clone(),
            classes: artifact.classes.clone(),
            centroids: artifact.centroids.clone(),
        };
        assert!(matches!(
            ClassifierAdapter::new(model, artifact.scaler, &schema),
            Err(SockError::ScalerMismatch { .. })
        ));
    }

    #[test]
    fn centroid_model_picks_the_nearest_class() {
        let schema = schema();
        let (model, scaler) = artifact_for(&schema).into_parts();
        let adapter = ClassifierAdapter::new(model, scaler, &schema).unwrap();
        let row = vec![0.9; schema.len()];
        let prediction = adapter.classify(&row);
        assert_eq!(prediction.label, "walking_forward");
        assert!(prediction.confidence > 0.5);
        let total: f64 = prediction.distribution.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn confidence_threshold_rejects_uncertain_windows() {
        let schema = schema();
        let (model, scaler) = artifact_for(&schema).into_parts();
        let adapter = ClassifierAdapter::new(model, scaler, &schema)
            .unwrap()
            .with_confidence_threshold(Some(0.99));
        // Equidistant from both centroids: a 50/50 split.
        let prediction = adapter.classify(&vec![0.0; schema.len()]);
        assert_eq!(prediction.label, UNKNOWN_LABEL);
        assert!(prediction.confidence < 0.99);
    }

    #[test]
    fn unknown_prediction_carries_zero_confidence() {
        let fallback = Prediction::unknown();
        assert_eq!(fallback.label, UNKNOWN_LABEL);
        assert_eq!(fallback.confidence, 0.0);
        assert!(fallback.distribution.is_empty());
    }

    #[test]
    fn scaler_standardizes_and_guards_zero_variance() {
        let scaler = FeatureScaler {
            mean: vec![10.0, 5.0],
            scale: vec![2.0, 0.0],
        };
        let out = scaler.transform(&[14.0, 8.0]);
        assert_eq!(out, vec![2.0, 3.0]);
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let schema = schema();
        let artifact = artifact_for(&schema);
        let dir = std::env::temp_dir().join("socksense_artifact_test.json");
        artifact.save(&dir).unwrap();
        let loaded = ModelArtifact::load(&dir).unwrap();
        assert_eq!(loaded.feature_names, artifact.feature_names);
        assert_eq!(loaded.classes, artifact.classes);
        std::fs::remove_file(&dir).ok();
    }
}
