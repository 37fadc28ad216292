use std::collections::VecDeque;

use ndarray::Array2;

use crate::pipeline::source::SensorSample;

/// A contiguous run of samples, the unit of feature computation.
///
/// The matrix form (samples x channels) is the one canonical numeric
/// representation; every extractor works on it, whether the window came
/// from a file or a live buffer.
#[derive(Clone, Debug)]
pub struct Window {
    samples: Vec<SensorSample>,
}

impl Window {
    pub fn new(samples: Vec<SensorSample>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[SensorSample] {
        &self.samples
    }

    /// Raw ADC values cast to f64, rows in arrival order.
    pub fn to_matrix(&self, channel_count: usize) -> Array2<f64> {
        Array2::from_shape_fn((self.samples.len(), channel_count), |(row, col)| {
            self.samples[row]
                .values
                .get(col)
                .copied()
                .unwrap_or(0) as f64
        })
    }
}

/// Sliding buffer that accumulates samples into overlapping windows.
///
/// Holds at most one window's worth of samples; once full, the oldest
/// sample is evicted on every push. `slide` drops a stride's worth from
/// the front so consecutive windows overlap by `capacity - stride`.
pub struct WindowBuffer {
    data: VecDeque<SensorSample>,
    capacity: usize,
}

impl WindowBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Always succeeds; evicts the oldest sample once at capacity.
    pub fn push(&mut self, sample: SensorSample) {
        if self.data.len() == self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(sample);
    }

    pub fn is_full(&self) -> bool {
        self.data.len() >= self.capacity
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Snapshot the current contents in arrival order. Does not mutate.
    pub fn materialize(&self) -> Window {
        Window::new(self.data.iter().cloned().collect())
    }

    /// Drop the oldest `stride` samples to advance to the next window.
    pub fn slide(&mut self, stride: usize) {
        for _ in 0..stride {
            if self.data.pop_front().is_none() {
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: u64, v: u16) -> SensorSample {
        SensorSample::new(t, vec![v; 6])
    }

    #[test]
    fn buffer_fills_then_evicts_oldest() {
        let mut buffer = WindowBuffer::new(3);
        for i in 0..3 {
            assert!(!buffer.is_full());
            buffer.push(sample(i, i as u16));
        }
        assert!(buffer.is_full());

        buffer.push(sample(3, 3));
        assert_eq!(buffer.len(), 3);
        let window = buffer.materialize();
        assert_eq!(window.samples()[0].timestamp_ms, 1);
        assert_eq!(window.samples()[2].timestamp_ms, 3);
    }

    #[test]
    fn materialize_does_not_consume() {
        let mut buffer = WindowBuffer::new(2);
        buffer.push(sample(0, 10));
        buffer.push(sample(20, 11));
        let first = buffer.materialize();
        let second = buffer.materialize();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        assert!(buffer.is_full());
    }

    #[test]
    fn slide_conserves_overlap_across_consecutive_windows() {
        // Exactly W pushes, slide by W/2, then W/2 more pushes: the two
        // windows together must cover every sample exactly once outside the
        // shared overlap region.
        let w = 4;
        let mut buffer = WindowBuffer::new(w);
        for i in 0..w as u64 {
            buffer.push(sample(i, i as u16));
        }
        let first = buffer.materialize();
        buffer.slide(w / 2);
        assert_eq!(buffer.len(), w / 2);
        for i in w as u64..(w + w / 2) as u64 {
            buffer.push(sample(i, i as u16));
        }
        let second = buffer.materialize();

        let firsts: Vec<u64> = first.samples().iter().map(|s| s.timestamp_ms).collect();
        let seconds: Vec<u64> = second.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(firsts, vec![0, 1, 2, 3]);
        assert_eq!(seconds, vec![2, 3, 4, 5]);
    }

    #[test]
    fn slide_past_contents_empties_buffer() {
        let mut buffer = WindowBuffer::new(2);
        buffer.push(sample(0, 0));
        buffer.slide(5);
        assert!(buffer.is_empty());
    }

    #[test]
    fn matrix_casts_values_in_channel_order() {
        let window = Window::new(vec![
            SensorSample::new(0, vec![1, 2, 3, 4, 5, 6]),
            SensorSample::new(20, vec![7, 8, 9, 10, 11, 12]),
        ]);
        let m = window.to_matrix(6);
        assert_eq!(m.shape(), &[2, 6]);
        assert_eq!(m[[0, 0]], 1.0);
        assert_eq!(m[[1, 5]], 12.0);
    }
}
