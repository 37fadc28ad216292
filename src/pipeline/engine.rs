//! Streaming classification engine.
//!
//! Single-consumer pull loop: every sample drives the step counter and the
//! window buffer; a full buffer triggers feature extraction, classification
//! and smoothing, then the buffer slides by one stride. Extraction and
//! classification are synchronous CPU-bound calls with no suspension
//! points, so they run on the ingesting thread; the per-window cost is
//! tracked against the configured latency budget and logged when exceeded.

use std::time::Instant;

use log::{debug, info, warn};

use crate::config::{PipelineConfig, SensorLayout};
use crate::pipeline::buffer::WindowBuffer;
use crate::pipeline::classifier::{Classifier, ClassifierAdapter, FeatureScaler, UNKNOWN_LABEL};
use crate::pipeline::error::SockError;
use crate::pipeline::features::FeatureExtractor;
use crate::pipeline::smoother::TemporalSmoother;
use crate::pipeline::source::{SampleSource, SensorSample};
use crate::pipeline::steps::StepCounter;

/// One externally visible classification, emitted once per stride.
#[derive(Clone, Debug)]
pub struct ActivityUpdate {
    /// Smoothed activity label.
    pub label: String,
    /// Confidence of the underlying (unsmoothed) prediction.
    pub confidence: f64,
    pub distribution: Vec<(String, f64)>,
    pub step_count: u64,
    pub latency_ms: f64,
}

/// Aggregate session statistics, reported when a source runs dry.
#[derive(Clone, Debug, Default)]
pub struct SessionSummary {
    pub samples: u64,
    pub windows: u64,
    pub steps: u64,
    pub mean_latency_ms: f64,
    pub max_latency_ms: f64,
    pub final_activity: Option<String>,
}

pub struct ActivityEngine<C: Classifier> {
    config: PipelineConfig,
    extractor: FeatureExtractor,
    adapter: ClassifierAdapter<C>,
    buffer: WindowBuffer,
    smoother: TemporalSmoother,
    steps: StepCounter,
    samples_seen: u64,
    windows_classified: u64,
    latency_sum_ms: f64,
    latency_max_ms: f64,
    current_activity: Option<String>,
}

impl<C: Classifier> ActivityEngine<C> {
    /// Build the full serving pipeline. The adapter is constructed here,
    /// against this engine's own schema, so a model trained on a different
    /// feature set refuses to start instead of misclassifying quietly.
    pub fn new(config: PipelineConfig, model: C, scaler: FeatureScaler) -> Result<Self, SockError> {
        config.validate()?;
        let extractor =
            FeatureExtractor::new(config.layout.clone(), config.window.sample_rate_hz);
        let adapter = ClassifierAdapter::new(model, scaler, extractor.schema())?
            .with_confidence_threshold(config.confidence_threshold);
        let buffer = WindowBuffer::new(config.window.samples_per_window());
        let smoother = TemporalSmoother::new(config.smoothing_history);
        let steps = StepCounter::new(config.steps, &config.layout);
        Ok(Self {
            config,
            extractor,
            adapter,
            buffer,
            smoother,
            steps,
            samples_seen: 0,
            windows_classified: 0,
            latency_sum_ms: 0.0,
            latency_max_ms: 0.0,
            current_activity: None,
        })
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    pub fn step_count(&self) -> u64 {
        self.steps.count()
    }

    pub fn current_activity(&self) -> Option<&str> {
        self.current_activity.as_deref()
    }

    /// Externally visible label: `unknown` until classification has
    /// produced something, never an error or a panic.
    pub fn activity(&self) -> &str {
        self.current_activity.as_deref().unwrap_or(UNKNOWN_LABEL)
    }

    /// Feed one sample. Returns a classification when this sample completed
    /// a window; `Ok(None)` while the buffer is still filling.
    pub fn ingest(&mut self, sample: SensorSample) -> Result<Option<ActivityUpdate>, SockError> {
        if sample.channel_count() != SensorLayout::CHANNEL_COUNT {
            return Err(SockError::ChannelMismatch {
                expected: SensorLayout::CHANNEL_COUNT,
                actual: sample.channel_count(),
            });
        }
        self.samples_seen += 1;
        self.steps.update(&sample);
        self.buffer.push(sample);

        if !self.buffer.is_full() {
            return Ok(None);
        }

        let started = Instant::now();
        // A full buffer always holds exactly one nominal window, so the
        // 0.8 fill floor is trivially satisfied on the streaming path; the
        // time-based offline segmenter is where partial windows get skipped.
        let window = self.buffer.materialize();
        let row = self.extractor.extract_row(&window)?;
        let prediction = self.adapter.classify(&row);
        let label = self.smoother.smooth(&prediction);
        self.buffer.slide(self.config.window.stride_samples());

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.windows_classified += 1;
        self.latency_sum_ms += latency_ms;
        self.latency_max_ms = self.latency_max_ms.max(latency_ms);
        if latency_ms > self.config.max_latency_ms as f64 {
            warn!(
                "classification took {latency_ms:.1} ms, over the {} ms budget; \
                 late samples will be dropped by the ring buffer",
                self.config.max_latency_ms
            );
        }
        self.current_activity = Some(label.clone());

        Ok(Some(ActivityUpdate {
            label,
            confidence: prediction.confidence,
            distribution: prediction.distribution,
            step_count: self.steps.count(),
            latency_ms,
        }))
    }

    /// Drain a source to exhaustion. Outstanding partial windows are
    /// discarded, not flushed.
    pub fn run<S: SampleSource>(&mut self, source: &mut S) -> Result<SessionSummary, SockError> {
        info!("classification session started");
        while let Some(sample) = source.next_sample()? {
            if let Some(update) = self.ingest(sample)? {
                debug!(
                    "activity={} confidence={:.2} steps={}",
                    update.label, update.confidence, update.step_count
                );
            }
        }
        let summary = self.summary();
        info!(
            "session finished: {} samples, {} windows, {} steps",
            summary.samples, summary.windows, summary.steps
        );
        Ok(summary)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            samples: self.samples_seen,
            windows: self.windows_classified,
            steps: self.steps.count(),
            mean_latency_ms: if self.windows_classified > 0 {
                self.latency_sum_ms / self.windows_classified as f64
            } else {
                0.0
            },
            max_latency_ms: self.latency_max_ms,
            final_activity: self.current_activity.clone(),
        }
    }

    /// Clear all per-session state: buffer, smoothing history, step count
    /// and statistics. Used when a recording session restarts.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.smoother.reset();
        self.steps.reset();
        self.samples_seen = 0;
        self.windows_classified = 0;
        self.latency_sum_ms = 0.0;
        self.latency_max_ms = 0.0;
        self.current_activity = None;
    }
}
