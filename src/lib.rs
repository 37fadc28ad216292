//! Activity recognition engine for pressure/stretch sensor socks.
//!
//! Turns a stream of multi-channel ADC samples into activity labels and a
//! step count. The same windowing and feature extraction code serves both
//! the offline training-table builder and the live classification loop, so
//! a window of samples always featurizes identically on both paths.

pub mod config;
pub mod pipeline;
pub mod quality;
pub mod recording;
pub mod sim;
pub mod table;

pub use config::{PipelineConfig, SensorLayout, StepConfig, WindowConfig};
pub use pipeline::buffer::{Window, WindowBuffer};
pub use pipeline::classifier::{
    Classifier, ClassifierAdapter, FeatureScaler, ModelArtifact, Prediction, UNKNOWN_LABEL,
};
pub use pipeline::engine::{ActivityEngine, ActivityUpdate, SessionSummary};
pub use pipeline::error::SockError;
pub use pipeline::features::{FeatureExtractor, FeatureSchema, FeatureVector};
pub use pipeline::smoother::TemporalSmoother;
pub use pipeline::source::{ManualSource, SampleSource, SensorSample};
pub use pipeline::steps::StepCounter;
