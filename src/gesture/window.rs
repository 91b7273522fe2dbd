//! Sliding sample window feeding the classifier.
//!
//! The window holds exactly `size` samples (the model input length). After
//! each classification it slides forward by a quarter of its size so
//! consecutive windows overlap; after a raised detection it is cleared
//! outright so one physical squeeze cannot re-trigger from its own tail.

use crate::sensor::SensorSample;
use chrono::{DateTime, Utc};

/// Fixed-size sliding buffer of sensor samples.
pub struct SampleWindow {
    size: usize,
    hop: usize,
    samples: Vec<SensorSample>,
}

impl SampleWindow {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            hop: (size / 4).max(1),
            samples: Vec::with_capacity(size),
        }
    }

    /// Append a sample, evicting the oldest when already full.
    pub fn push(&mut self, sample: SensorSample) {
        if self.samples.len() == self.size {
            self.samples.remove(0);
        }
        self.samples.push(sample);
    }

    /// Whether the window holds a full classifier input.
    pub fn is_full(&self) -> bool {
        self.samples.len() == self.size
    }

    /// Magnitudes in arrival order.
    pub fn values(&self) -> Vec<f32> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Timestamp of the newest sample.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.samples.last().map(|s| s.timestamp)
    }

    /// Slide forward by one hop after a classification.
    pub fn advance(&mut self) {
        let n = self.hop.min(self.samples.len());
        self.samples.drain(0..n);
    }

    /// Discard all buffered samples.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Change the window size, discarding any partial content.
    pub fn resize(&mut self, size: usize) {
        let size = size.max(1);
        self.size = size;
        self.hop = (size / 4).max(1);
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(value: f32) -> SensorSample {
        SensorSample::new(value)
    }

    #[test]
    fn test_fills_to_size() {
        let mut window = SampleWindow::new(4);
        assert!(!window.is_full());

        for i in 0..4 {
            window.push(sample(i as f32));
        }
        assert!(window.is_full());
        assert_eq!(window.values(), vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_push_when_full_evicts_oldest() {
        let mut window = SampleWindow::new(3);
        for i in 0..4 {
            window.push(sample(i as f32));
        }
        assert_eq!(window.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_advance_slides_by_quarter() {
        let mut window = SampleWindow::new(8);
        for i in 0..8 {
            window.push(sample(i as f32));
        }

        window.advance();
        assert_eq!(window.len(), 6);
        assert_eq!(window.values()[0], 2.0);
    }

    #[test]
    fn test_resize_discards_partial_content() {
        let mut window = SampleWindow::new(8);
        for i in 0..5 {
            window.push(sample(i as f32));
        }

        window.resize(4);
        assert!(window.is_empty());
        assert_eq!(window.size(), 4);
    }

    #[test]
    fn test_minimum_size_is_one() {
        let mut window = SampleWindow::new(0);
        assert_eq!(window.size(), 1);
        window.push(sample(0.5));
        assert!(window.is_full());
        window.advance();
        assert!(window.is_empty());
    }
}
