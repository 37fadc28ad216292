pub mod buffer;
pub mod classifier;
pub mod cross;
pub mod engine;
pub mod error;
pub mod features;
pub mod smoother;
pub mod source;
pub mod spectral;
pub mod stats;
pub mod steps;

pub use buffer::{Window, WindowBuffer};
pub use classifier::{Classifier, ClassifierAdapter, FeatureScaler, Prediction};
pub use engine::{ActivityEngine, ActivityUpdate, SessionSummary};
pub use error::SockError;
pub use features::{FeatureExtractor, FeatureSchema, FeatureVector};
pub use smoother::TemporalSmoother;
pub use source::{ManualSource, SampleSource, SensorSample};
pub use steps::StepCounter;
