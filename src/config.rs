//! Explicit pipeline configuration.
//!
//! Every parameter is threaded through constructors; nothing reads ambient
//! global state. The defaults describe the canonical deployment: six
//! channels (two legs, heel/ball pressure plus a knee stretch sensor),
//! 12-bit ADC, 50 Hz, one-second windows with 50% overlap.

use serde::{Deserialize, Serialize};

use crate::pipeline::error::SockError;

/// Highest value the 12-bit ADC can report.
pub const ADC_MAX: u16 = 4095;

// Canonical channel positions within a sample's value vector.
pub(crate) const LEFT_HEEL: usize = 0;
pub(crate) const LEFT_BALL: usize = 1;
pub(crate) const LEFT_KNEE: usize = 2;
pub(crate) const RIGHT_HEEL: usize = 3;
pub(crate) const RIGHT_BALL: usize = 4;
pub(crate) const RIGHT_KNEE: usize = 5;

/// Sensor names for one leg: two pressure zones and one stretch sensor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegZones {
    pub heel: String,
    pub ball: String,
    pub knee: String,
}

/// Fixed two-leg channel topology. Names are configurable, the shape is not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorLayout {
    pub left: LegZones,
    pub right: LegZones,
}

impl SensorLayout {
    pub const CHANNEL_COUNT: usize = 6;

    /// Channel names in canonical order: left heel/ball/knee, then right.
    /// Sample value vectors and window matrix columns follow this order.
    pub fn channel_names(&self) -> Vec<String> {
        vec![
            self.left.heel.clone(),
            self.left.ball.clone(),
            self.left.knee.clone(),
            self.right.heel.clone(),
            self.right.ball.clone(),
            self.right.knee.clone(),
        ]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.channel_names().iter().position(|n| n == name)
    }

    /// Column indices of the heel pressure pair (left, right).
    pub fn heel_indices(&self) -> (usize, usize) {
        (LEFT_HEEL, RIGHT_HEEL)
    }
}

impl Default for SensorLayout {
    fn default() -> Self {
        Self {
            left: LegZones {
                heel: "L_P_Heel".into(),
                ball: "L_P_Ball".into(),
                knee: "L_S_Knee".into(),
            },
            right: LegZones {
                heel: "R_P_Heel".into(),
                ball: "R_P_Ball".into(),
                knee: "R_S_Knee".into(),
            },
        }
    }
}

/// Sliding-window parameters shared by the batch and streaming paths.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct WindowConfig {
    pub window_ms: u64,
    pub stride_ms: u64,
    pub sample_rate_hz: f64,
    /// A window below this fraction of its nominal sample count is skipped.
    pub min_fill_ratio: f64,
}

impl WindowConfig {
    pub fn samples_per_window(&self) -> usize {
        ((self.window_ms as f64 / 1000.0) * self.sample_rate_hz).round() as usize
    }

    pub fn stride_samples(&self) -> usize {
        ((self.stride_ms as f64 / 1000.0) * self.sample_rate_hz).round() as usize
    }

    pub fn min_samples(&self) -> usize {
        (self.samples_per_window() as f64 * self.min_fill_ratio).ceil() as usize
    }

    pub fn validate(&self) -> Result<(), SockError> {
        if self.sample_rate_hz <= 0.0 {
            return Err(SockError::InvalidConfig(
                "sample rate must be greater than zero".into(),
            ));
        }
        if self.samples_per_window() == 0 {
            return Err(SockError::InvalidConfig("window holds no samples".into()));
        }
        if self.stride_samples() == 0 || self.stride_samples() >= self.samples_per_window() {
            return Err(SockError::InvalidConfig(
                "stride must be shorter than the window".into(),
            ));
        }
        if !(self.min_fill_ratio > 0.0 && self.min_fill_ratio <= 1.0) {
            return Err(SockError::InvalidConfig(
                "min fill ratio must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            window_ms: 1000,
            stride_ms: 500,
            sample_rate_hz: 50.0,
            min_fill_ratio: 0.8,
        }
    }
}

/// Step detector thresholds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct StepConfig {
    /// Heel-pair ADC sum that counts as ground contact.
    pub threshold: f64,
    /// Minimum time between counted steps.
    pub refractory_ms: u64,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            threshold: 2000.0,
            refractory_ms: 300,
        }
    }
}

/// Everything the streaming engine needs, in one place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub layout: SensorLayout,
    pub window: WindowConfig,
    pub steps: StepConfig,
    /// Number of recent predictions the temporal smoother keeps.
    pub smoothing_history: usize,
    /// Predictions below this confidence are reported as `unknown`.
    pub confidence_threshold: Option<f64>,
    /// Per-window processing beyond this budget logs a warning.
    pub max_latency_ms: u64,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), SockError> {
        self.window.validate()?;
        if self.smoothing_history == 0 {
            return Err(SockError::InvalidConfig(
                "smoothing history must hold at least one prediction".into(),
            ));
        }
        if self.steps.threshold < 0.0 || !self.steps.threshold.is_finite() {
            return Err(SockError::InvalidConfig(
                "step threshold must be a non-negative number".into(),
            ));
        }
        if let Some(t) = self.confidence_threshold {
            if !(0.0..=1.0).contains(&t) {
                return Err(SockError::InvalidConfig(
                    "confidence threshold must be in [0, 1]".into(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            layout: SensorLayout::default(),
            window: WindowConfig::default(),
            steps: StepConfig::default(),
            smoothing_history: 5,
            confidence_threshold: Some(0.6),
            max_latency_ms: 100,
        }
    }
}

/// Activity labels the canonical deployment records and classifies.
pub fn default_activities() -> Vec<String> {
    [
        "walking_forward",
        "walking_backward",
        "stairs_up",
        "stairs_down",
        "sitting_floor",
        "sitting_crossed",
        "sit_to_stand",
        "stand_to_sit",
        "standing_upright",
        "standing_lean_left",
        "standing_lean_right",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_covers_one_second_at_50hz() {
        let w = WindowConfig::default();
        assert_eq!(w.samples_per_window(), 50);
        assert_eq!(w.stride_samples(), 25);
        assert_eq!(w.min_samples(), 40);
        w.validate().unwrap();
    }

    #[test]
    fn stride_must_stay_inside_window() {
        let w = WindowConfig {
            stride_ms: 1000,
            ..WindowConfig::default()
        };
        assert!(w.validate().is_err());
    }

    #[test]
    fn layout_orders_left_before_right() {
        let layout = SensorLayout::default();
        let names = layout.channel_names();
        assert_eq!(names[0], "L_P_Heel");
        assert_eq!(names[5], "R_S_Knee");
        assert_eq!(layout.index_of("R_P_Heel"), Some(3));
        assert_eq!(layout.index_of("bogus"), None);
    }

    #[test]
    fn default_pipeline_config_is_valid() {
        PipelineConfig::default().validate().unwrap();
    }
}
