//! Squeeze gesture controller.
//!
//! A small state machine between the sensor source and the orchestration
//! layer. While listening it buffers samples into a sliding window, runs
//! the classifier on each full window, and debounces the scores into at
//! most one gesture event per physical squeeze. The decision rule is a
//! confidence threshold plus a minimum separation in time between
//! successive detections; both are tunable.

use crate::gesture::model::GestureModel;
use crate::gesture::window::SampleWindow;
use crate::sensor::{SensorSample, SensorSource};
use chrono::{DateTime, Duration, Utc};
use crossbeam_channel::Receiver;
use statrs::statistics::Statistics;

/// Default detection confidence threshold.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.75;

/// Default minimum separation between successive detections.
pub const DEFAULT_MIN_GAP_MS: i64 = 1500;

/// Window variance below which the classifier is not consulted.
const ENERGY_FLOOR: f64 = 1e-4;

/// Window size used when the model cannot report one.
const FALLBACK_WINDOW_SIZE: usize = 16;

/// A confirmed squeeze.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureEvent {
    /// Timestamp of the sample that completed the detection
    pub timestamp: DateTime<Utc>,
    /// Classifier confidence for the squeeze class
    pub confidence: f32,
}

/// Controller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Listening,
}

/// Fire-and-forget recipient of raised gesture events.
pub type GestureListener = Box<dyn Fn(&GestureEvent) + Send>;

/// Buffers samples, classifies windows, debounces detections.
pub struct GestureController {
    source: Box<dyn SensorSource>,
    model: GestureModel,
    window: SampleWindow,
    state: ControllerState,
    listener: Option<GestureListener>,
    confidence_threshold: f32,
    min_gap: Duration,
    last_detection: Option<DateTime<Utc>>,
}

impl GestureController {
    pub fn new(source: Box<dyn SensorSource>, model: GestureModel) -> Self {
        let window_size = model.input_size().unwrap_or(FALLBACK_WINDOW_SIZE);
        Self {
            source,
            model,
            window: SampleWindow::new(window_size),
            state: ControllerState::Idle,
            listener: None,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_gap: Duration::milliseconds(DEFAULT_MIN_GAP_MS),
            last_detection: None,
        }
    }

    /// Tune the detection decision rule.
    pub fn with_decision_rule(mut self, confidence_threshold: f32, min_gap: Duration) -> Self {
        self.confidence_threshold = confidence_threshold;
        self.min_gap = min_gap;
        self
    }

    /// Begin listening. A second call while already listening is a no-op.
    pub fn start_listening(&mut self) {
        if self.state == ControllerState::Listening {
            return;
        }
        self.window.clear();
        if let Err(e) = self.source.start_listening() {
            // Fail-soft: stay in Listening with an empty sample stream.
            tracing::warn!("sensor source failed to start: {e}");
        }
        self.state = ControllerState::Listening;
        tracing::debug!("gesture controller listening");
    }

    /// Stop listening and discard any partial window. Always safe to call,
    /// including from Idle.
    pub fn stop_listening(&mut self) {
        self.source.stop_listening();
        self.window.clear();
        if self.state != ControllerState::Idle {
            self.state = ControllerState::Idle;
            tracing::debug!("gesture controller idle");
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == ControllerState::Listening
    }

    /// Register the single event listener, replacing any previous one.
    pub fn set_listener(&mut self, listener: GestureListener) {
        self.listener = Some(listener);
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    /// Propagate a new sensitivity to the source. The partial window is
    /// discarded rather than reinterpreted under the new sensitivity.
    pub fn update_sensitivity(&mut self, sensitivity: f32) {
        self.source.update_sensitivity(sensitivity);
        self.window.clear();
    }

    /// Channel the owned source delivers samples on. The caller pumps this
    /// into [`handle_sample`] from a single consumer.
    ///
    /// [`handle_sample`]: GestureController::handle_sample
    pub fn sample_receiver(&self) -> &Receiver<SensorSample> {
        self.source.sample_receiver()
    }

    /// Number of samples currently buffered.
    pub fn buffered_samples(&self) -> usize {
        self.window.len()
    }

    /// Process one sample. Must be called from a single consumer; samples
    /// arriving while Idle are discarded.
    pub fn handle_sample(&mut self, sample: SensorSample) {
        if self.state != ControllerState::Listening {
            return;
        }

        self.window.push(sample);
        if !self.window.is_full() {
            return;
        }

        let values = self.window.values();

        // A flat window cannot contain a squeeze; skip the classifier.
        let variance = values.iter().map(|v| *v as f64).variance();
        if variance.is_finite() && variance < ENERGY_FLOOR {
            self.window.advance();
            return;
        }

        let output_size = self.model.output_size().unwrap_or(0);
        let scores = self.model.predict(&values, output_size);
        let confidence = self
            .model
            .detect_index()
            .and_then(|i| scores.get(i).copied());
        self.window.advance();

        // An unavailable model reads as "no detection".
        let Some(confidence) = confidence else {
            return;
        };

        if confidence < self.confidence_threshold {
            return;
        }
        if let Some(last) = self.last_detection {
            if sample.timestamp - last < self.min_gap {
                return;
            }
        }

        self.last_detection = Some(sample.timestamp);
        // Drop the tail of this squeeze so it cannot re-trigger.
        self.window.clear();

        let event = GestureEvent {
            timestamp: sample.timestamp,
            confidence,
        };
        tracing::debug!("squeeze detected (confidence {:.3})", confidence);
        if let Some(ref listener) = self.listener {
            listener(&event);
        }
        // With no listener registered the event is dropped, not queued.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{DisconnectedDevice, PollingSource};
    use std::sync::{Arc, Mutex};

    fn silent_source() -> Box<dyn SensorSource> {
        Box::new(PollingSource::new(Box::new(DisconnectedDevice)))
    }

    fn controller_with_capture() -> (GestureController, Arc<Mutex<Vec<GestureEvent>>>) {
        let mut controller = GestureController::new(silent_source(), GestureModel::builtin());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        controller.set_listener(Box::new(move |event| {
            sink.lock().unwrap().push(*event);
        }));
        (controller, events)
    }

    /// Quiet grip noise with one squeeze burst in the middle.
    fn squeeze_values() -> Vec<f32> {
        let mut values = vec![0.02; 12];
        values.extend([1.4, 1.6, 1.8, 1.7, 1.6, 1.5, 1.3, 1.2]);
        values.extend(vec![0.02; 12]);
        values
    }

    fn feed(
        controller: &mut GestureController,
        values: &[f32],
        start: DateTime<Utc>,
        step_ms: i64,
    ) -> DateTime<Utc> {
        let mut ts = start;
        for v in values {
            controller.handle_sample(SensorSample::at(ts, *v));
            ts += Duration::milliseconds(step_ms);
        }
        ts
    }

    #[test]
    fn test_idle_discards_samples() {
        let (mut controller, events) = controller_with_capture();
        feed(&mut controller, &squeeze_values(), Utc::now(), 20);

        assert!(events.lock().unwrap().is_empty());
        assert_eq!(controller.buffered_samples(), 0);
    }

    #[test]
    fn test_one_event_per_squeeze() {
        let (mut controller, events) = controller_with_capture();
        controller.start_listening();
        feed(&mut controller, &squeeze_values(), Utc::now(), 20);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].confidence >= DEFAULT_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn test_rapid_repeat_is_debounced() {
        let (mut controller, events) = controller_with_capture();
        controller.start_listening();

        // Two squeezes back to back, well inside the minimum gap.
        let end = feed(&mut controller, &squeeze_values(), Utc::now(), 20);
        feed(&mut controller, &squeeze_values(), end, 20);

        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_second_squeeze_after_gap() {
        let (mut controller, events) = controller_with_capture();
        controller.start_listening();

        let end = feed(&mut controller, &squeeze_values(), Utc::now(), 20);
        feed(
            &mut controller,
            &squeeze_values(),
            end + Duration::milliseconds(3000),
            20,
        );

        assert_eq!(events.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_stop_discards_partial_window() {
        let (mut controller, events) = controller_with_capture();
        controller.start_listening();
        feed(&mut controller, &vec![0.02; 10], Utc::now(), 20);
        assert_eq!(controller.buffered_samples(), 10);

        controller.stop_listening();
        assert_eq!(controller.buffered_samples(), 0);
        assert!(!controller.is_listening());
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stop_from_idle_is_safe() {
        let (mut controller, _) = controller_with_capture();
        controller.stop_listening();
        controller.stop_listening();
        assert_eq!(controller.state(), ControllerState::Idle);
    }

    #[test]
    fn test_sensitivity_change_discards_partial_window() {
        let (mut controller, _) = controller_with_capture();
        controller.start_listening();
        feed(&mut controller, &vec![0.02; 10], Utc::now(), 20);

        controller.update_sensitivity(0.5);
        assert_eq!(controller.buffered_samples(), 0);
        assert!(controller.is_listening());
    }

    #[test]
    fn test_unavailable_model_never_detects() {
        let mut controller =
            GestureController::new(silent_source(), GestureModel::unavailable());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        controller.set_listener(Box::new(move |event: &GestureEvent| {
            sink.lock().unwrap().push(*event);
        }));

        controller.start_listening();
        feed(&mut controller, &squeeze_values(), Utc::now(), 20);
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_without_listener_event_is_dropped_not_queued() {
        let mut controller = GestureController::new(silent_source(), GestureModel::builtin());
        controller.start_listening();

        // First squeeze raised with no listener: dropped.
        let end = feed(&mut controller, &squeeze_values(), Utc::now(), 20);

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        controller.set_listener(Box::new(move |event: &GestureEvent| {
            sink.lock().unwrap().push(*event);
        }));

        // Only the squeeze after registration is delivered.
        feed(
            &mut controller,
            &squeeze_values(),
            end + Duration::milliseconds(5000),
            20,
        );
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_quiet_stream_never_detects() {
        let (mut controller, events) = controller_with_capture();
        controller.start_listening();
        feed(&mut controller, &vec![0.02; 200], Utc::now(), 20);
        assert!(events.lock().unwrap().is_empty());
    }
}
