use thiserror::Error;

#[derive(Debug, Error)]
pub enum SockError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("channel count mismatch: expected {expected}, got {actual}")]
    ChannelMismatch { expected: usize, actual: usize },
    #[error("feature set mismatch: {0}")]
    FeatureMismatch(String),
    #[error("scaler covers {actual} features but the schema has {expected}")]
    ScalerMismatch { expected: usize, actual: usize },
    #[error("malformed recording {path}: {reason}")]
    MalformedRecording { path: String, reason: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model artifact error: {0}")]
    Artifact(#[from] serde_json::Error),
}
