//! Sensor device backends.
//!
//! A [`SensorDevice`] is the hardware-facing half of acquisition: it hands
//! out one reading at a time at a fixed cadence. The acquisition strategies
//! in [`lowpower`] and [`polling`] own a device on their sampling thread
//! and turn it into an asynchronous sample stream.
//!
//! [`lowpower`]: crate::sensor::lowpower
//! [`polling`]: crate::sensor::polling

use crate::sensor::types::{SensorError, SensorSample};
use std::path::Path;
use std::time::Duration;

/// A squeeze sensor endpoint.
pub trait SensorDevice: Send {
    /// Whether the device keeps acquiring while the application processor
    /// sleeps (coprocessor-backed).
    fn supports_low_power(&self) -> bool;

    /// Apply a new sensitivity. Affects the next reading.
    fn set_sensitivity(&mut self, sensitivity: f32);

    /// Produce the next reading, or `None` when the device has nothing.
    fn next_sample(&mut self) -> Option<SensorSample>;

    /// Interval between readings.
    fn cadence(&self) -> Duration;
}

/// Default sampling interval for the synthetic device.
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(20);

/// Scripted waveform device for demos and tests.
///
/// Replays a cyclic pattern of magnitudes, scaled by a sensitivity gain so
/// hot sensitivity updates are observable in the emitted values.
pub struct SyntheticDevice {
    pattern: Vec<f32>,
    index: usize,
    sensitivity: f32,
    cadence: Duration,
    low_power: bool,
}

impl SyntheticDevice {
    pub fn new(pattern: Vec<f32>, cadence: Duration) -> Self {
        Self {
            pattern,
            index: 0,
            sensitivity: 0.0,
            cadence,
            low_power: false,
        }
    }

    /// Waveform of quiet grip noise with one squeeze burst per cycle.
    pub fn squeeze_pattern() -> Self {
        let mut pattern = vec![0.02; 32];
        pattern.extend([1.2, 1.5, 1.8, 1.7, 1.6, 1.5, 1.3, 1.1]);
        Self::new(pattern, DEFAULT_CADENCE)
    }

    /// Load a waveform script: a JSON array of magnitudes.
    pub fn from_script(path: &Path, cadence: Duration) -> Result<Self, SensorError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| SensorError::IoError(e.to_string()))?;
        let pattern: Vec<f32> =
            serde_json::from_str(&content).map_err(|e| SensorError::ParseError(e.to_string()))?;
        if pattern.is_empty() {
            return Err(SensorError::ParseError("empty waveform script".to_string()));
        }
        Ok(Self::new(pattern, cadence))
    }

    /// Mark the device as coprocessor-backed so the low-power acquisition
    /// strategy is selected for it.
    pub fn with_low_power(mut self) -> Self {
        self.low_power = true;
        self
    }
}

impl SensorDevice for SyntheticDevice {
    fn supports_low_power(&self) -> bool {
        self.low_power
    }

    fn set_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity = sensitivity;
    }

    fn next_sample(&mut self) -> Option<SensorSample> {
        if self.pattern.is_empty() {
            return None;
        }
        let raw = self.pattern[self.index % self.pattern.len()];
        self.index = self.index.wrapping_add(1);
        Some(SensorSample::new(raw * (1.0 + self.sensitivity)))
    }

    fn cadence(&self) -> Duration {
        self.cadence
    }
}

/// Stand-in for an absent sensor: accepts every call, emits nothing.
pub struct DisconnectedDevice;

impl SensorDevice for DisconnectedDevice {
    fn supports_low_power(&self) -> bool {
        false
    }

    fn set_sensitivity(&mut self, _sensitivity: f32) {}

    fn next_sample(&mut self) -> Option<SensorSample> {
        None
    }

    fn cadence(&self) -> Duration {
        Duration::from_millis(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_device_cycles_pattern() {
        let mut device = SyntheticDevice::new(vec![0.1, 0.2], DEFAULT_CADENCE);
        assert_eq!(device.next_sample().unwrap().value, 0.1);
        assert_eq!(device.next_sample().unwrap().value, 0.2);
        assert_eq!(device.next_sample().unwrap().value, 0.1);
    }

    #[test]
    fn test_sensitivity_scales_next_reading() {
        let mut device = SyntheticDevice::new(vec![1.0], DEFAULT_CADENCE);
        assert_eq!(device.next_sample().unwrap().value, 1.0);

        device.set_sensitivity(0.5);
        assert!((device.next_sample().unwrap().value - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_squeeze_pattern_has_burst() {
        let mut device = SyntheticDevice::squeeze_pattern();
        let values: Vec<f32> = (0..40).filter_map(|_| device.next_sample()).map(|s| s.value).collect();
        let peak = values.iter().cloned().fold(0.0f32, f32::max);
        assert!(peak > 1.0);
        assert!(values[0] < 0.1);
    }

    #[test]
    fn test_disconnected_device_emits_nothing() {
        let mut device = DisconnectedDevice;
        assert!(!device.supports_low_power());
        device.set_sensitivity(0.3);
        assert!(device.next_sample().is_none());
    }

    #[test]
    fn test_script_rejects_empty_waveform() {
        let path = std::env::temp_dir().join(format!("gripsense-wave-{}.json", std::process::id()));
        std::fs::write(&path, "[]").unwrap();
        assert!(SyntheticDevice::from_script(&path, DEFAULT_CADENCE).is_err());

        std::fs::write(&path, "[0.1, 0.9]").unwrap();
        let device = SyntheticDevice::from_script(&path, DEFAULT_CADENCE).unwrap();
        assert_eq!(device.pattern, vec![0.1, 0.9]);

        let _ = std::fs::remove_file(&path);
    }
}
