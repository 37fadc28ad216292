//! Confidence-weighted temporal smoothing.
//!
//! A plain majority vote ignores how sure each prediction was; summing
//! confidences instead damps a single low-confidence flicker without
//! lengthening the history (which would add latency).

use std::collections::VecDeque;

use crate::pipeline::classifier::Prediction;

/// Below this many entries the raw prediction passes through unsmoothed.
const MIN_HISTORY: usize = 3;

/// Bounded history of recent (label, confidence) pairs. Owned by exactly
/// one session; reset whenever the session restarts.
pub struct TemporalSmoother {
    history: VecDeque<(String, f64)>,
    capacity: usize,
}

impl TemporalSmoother {
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Fold one prediction into the history and return the stabilized
    /// label: the label whose confidences sum highest, ties broken by the
    /// most recent occurrence.
    pub fn smooth(&mut self, prediction: &Prediction) -> String {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history
            .push_back((prediction.label.clone(), prediction.confidence));

        if self.history.len() < MIN_HISTORY {
            return prediction.label.clone();
        }

        let mut best: Option<(&str, f64, usize)> = None;
        for (idx, (label, _)) in self.history.iter().enumerate() {
            let total: f64 = self
                .history
                .iter()
                .filter(|(l, _)| l == label)
                .map(|(_, c)| c)
                .sum();
            let wins = match best {
                None => true,
                Some((_, best_total, best_idx)) => {
                    total > best_total || (total == best_total && idx > best_idx)
                }
            };
            if wins {
                best = Some((label, total, idx));
            }
        }
        best.map(|(label, _, _)| label.to_string())
            .unwrap_or_else(|| prediction.label.clone())
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
