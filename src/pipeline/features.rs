//! Feature schema and the combined extractor.
//!
//! The schema is enumerated statically from the channel layout, a
//! property of configuration rather than of a runtime extraction pass,
//! and sorted lexicographically. The offline table builder and the online
//! engine both assemble rows through this module, which is what keeps the
//! two paths bit-for-bit identical.

use std::collections::BTreeMap;

use crate::config::SensorLayout;
use crate::pipeline::buffer::Window;
use crate::pipeline::error::SockError;
use crate::pipeline::{cross, spectral, stats};

/// Ordered mapping from feature name to value. BTreeMap iteration order is
/// the canonical (sorted) feature order.
pub type FeatureVector = BTreeMap<String, f64>;

/// The canonical, sorted feature-name list for one channel layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureSchema {
    names: Vec<String>,
}

impl FeatureSchema {
    /// Enumerate every feature name the extractors will produce for this
    /// layout, sorted lexicographically.
    pub fn for_layout(layout: &SensorLayout) -> Self {
        let mut names = Vec::new();
        for channel in layout.channel_names() {
            for suffix in stats::SUFFIXES {
                names.push(format!("{channel}_{suffix}"));
            }
            for suffix in spectral::SUFFIXES {
                names.push(format!("{channel}_{suffix}"));
            }
        }
        for name in cross::NAMES {
            names.push(name.to_string());
        }
        names.sort();
        Self { names }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Flatten a feature vector into schema order, rejecting any key-set
    /// drift between extractors and schema.
    pub fn to_row(&self, features: &FeatureVector) -> Result<Vec<f64>, SockError> {
        if features.len() != self.names.len() {
            return Err(SockError::FeatureMismatch(format!(
                "expected {} features, extractors produced {}",
                self.names.len(),
                features.len()
            )));
        }
        // Both sides are sorted, so a single zip exposes the first drift.
        let mut row = Vec::with_capacity(self.names.len());
        for (name, (key, value)) in self.names.iter().zip(features.iter()) {
            if name != key {
                return Err(SockError::FeatureMismatch(format!(
                    "schema has '{name}' where extractors produced '{key}'"
                )));
            }
            row.push(*value);
        }
        Ok(row)
    }
}

/// Runs all three extractors over one window with a fixed parameterization.
pub struct FeatureExtractor {
    layout: SensorLayout,
    channel_names: Vec<String>,
    sample_rate_hz: f64,
    schema: FeatureSchema,
}

impl FeatureExtractor {
    pub fn new(layout: SensorLayout, sample_rate_hz: f64) -> Self {
        let schema = FeatureSchema::for_layout(&layout);
        let channel_names = layout.channel_names();
        Self {
            layout,
            channel_names,
            sample_rate_hz,
            schema,
        }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn layout(&self) -> &SensorLayout {
        &self.layout
    }

    /// Pure function of the window contents: statistical, cross-sensor and
    /// frequency-domain features merged into one ordered mapping.
    ///
    /// Callers are expected to apply the fill-ratio floor before asking;
    /// an empty window still gets the documented all-zero fallback rather
    /// than NaN-laden statistics.
    pub fn extract(&self, window: &Window) -> FeatureVector {
        if window.is_empty() {
            return self
                .schema
                .names()
                .iter()
                .map(|name| (name.clone(), 0.0))
                .collect();
        }
        let matrix = window.to_matrix(SensorLayout::CHANNEL_COUNT);
        let view = matrix.view();
        let mut features = stats::extract(&view, &self.channel_names);
        features.append(&mut cross::extract(&view));
        features.append(&mut spectral::extract(
            &view,
            &self.channel_names,
            self.sample_rate_hz,
        ));
        features
    }

    /// Extract and assemble into schema order in one step.
    pub fn extract_row(&self, window: &Window) -> Result<Vec<f64>, SockError> {
        self.schema.to_row(&self.extract(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::source::SensorSample;

    fn test_window(len: usize) -> Window {
        let samples = (0..len)
            .map(|i| {
                let t = i as u64 * 20;
                let v = |base: u16| base + (i as u16 % 7) * 100;
                SensorSample::new(t, vec![v(100), v(200), v(300), v(400), v(500), v(600)])
            })
            .collect();
        Window::new(samples)
    }

    #[test]
    fn schema_counts_every_feature_once() {
        let schema = FeatureSchema::for_layout(&SensorLayout::default());
        // 6 channels x (14 statistical + 4 spectral) + 18 cross-sensor.
        assert_eq!(schema.len(), 126);
        let mut sorted = schema.names().to_vec();
        sorted.sort();
        assert_eq!(sorted, schema.names());
    }

    #[test]
    fn schema_matches_extractor_output_exactly() {
        let extractor = FeatureExtractor::new(SensorLayout::default(), 50.0);
        let features = extractor.extract(&test_window(50));
        let keys: Vec<&String> = features.keys().collect();
        let names: Vec<&String> = extractor.schema().names().iter().collect();
        assert_eq!(keys, names);
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = FeatureExtractor::new(SensorLayout::default(), 50.0);
        let window = test_window(50);
        let first = extractor.extract_row(&window).unwrap();
        let second = extractor.extract_row(&window).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_window_falls_back_to_zeros_not_nan() {
        let extractor = FeatureExtractor::new(SensorLayout::default(), 50.0);
        let row = extractor.extract_row(&Window::new(Vec::new())).unwrap();
        assert_eq!(row.len(), 126);
        assert!(row.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn row_rejects_missing_keys() {
        let extractor = FeatureExtractor::new(SensorLayout::default(), 50.0);
        let mut features = extractor.extract(&test_window(50));
        features.remove("left_total_mean");
        assert!(extractor.schema().to_row(&features).is_err());
    }

    #[test]
    fn row_rejects_foreign_keys() {
        let extractor = FeatureExtractor::new(SensorLayout::default(), 50.0);
        let mut features = extractor.extract(&test_window(50));
        features.remove("left_total_mean");
        features.insert("left_total_median".to_string(), 0.0);
        assert!(extractor.schema().to_row(&features).is_err());
    }
}
