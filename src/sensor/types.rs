//! Sample and capability types for squeeze sensor acquisition.

use chrono::{DateTime, Utc};
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

/// One reading from the squeeze sensor.
///
/// Ephemeral: samples flow straight into the gesture controller's window
/// and are never persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SensorSample {
    /// Timestamp when the reading was taken
    pub timestamp: DateTime<Utc>,
    /// Scalar magnitude of the reading
    pub value: f32,
}

impl SensorSample {
    pub fn new(value: f32) -> Self {
        Self {
            timestamp: Utc::now(),
            value,
        }
    }

    pub fn at(timestamp: DateTime<Utc>, value: f32) -> Self {
        Self { timestamp, value }
    }
}

/// Acquisition capability the gesture controller depends on.
///
/// Two interchangeable strategies implement this: the always-on
/// low-power path and the application-processor polling fallback. Which
/// one backs a given device is decided by [`source_for_device`], not by
/// the controller.
///
/// `start_listening` is idempotent: starting an already-listening source
/// is an `Ok` no-op. A source whose underlying device is unavailable
/// still accepts start/stop and simply emits no samples.
///
/// [`source_for_device`]: crate::sensor::source_for_device
pub trait SensorSource: Send {
    /// Begin acquisition. Samples arrive on [`sample_receiver`].
    ///
    /// [`sample_receiver`]: SensorSource::sample_receiver
    fn start_listening(&mut self) -> Result<(), SensorError>;

    /// Stop acquisition and discard any samples still in flight.
    fn stop_listening(&mut self);

    /// Apply a new sensitivity. Takes effect on the next sampling cycle
    /// without a stop/start.
    fn update_sensitivity(&mut self, sensitivity: f32);

    /// Channel the acquisition thread delivers samples on.
    fn sample_receiver(&self) -> &Receiver<SensorSample>;

    /// Whether the source is currently acquiring.
    fn is_listening(&self) -> bool;
}

/// Errors from sensor acquisition setup.
#[derive(Debug)]
pub enum SensorError {
    IoError(String),
    ParseError(String),
}

impl std::fmt::Display for SensorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorError::IoError(e) => write!(f, "IO error: {e}"),
            SensorError::ParseError(e) => write!(f, "Parse error: {e}"),
        }
    }
}

impl std::error::Error for SensorError {}
