//! Squeeze sensor acquisition for the gripsense agent.
//!
//! Two interchangeable acquisition strategies sit behind the
//! [`SensorSource`] capability: the always-on low-power path for
//! coprocessor-backed devices and an application-processor polling
//! fallback. [`source_for_device`] is the selection policy; the rest of
//! the agent never looks past the capability interface.

pub mod device;
pub mod lowpower;
pub mod polling;
pub mod types;

// Re-export commonly used types
pub use device::{DisconnectedDevice, SensorDevice, SyntheticDevice, DEFAULT_CADENCE};
pub use lowpower::LowPowerSource;
pub use polling::PollingSource;
pub use types::{SensorError, SensorSample, SensorSource};

/// Pick the acquisition strategy for a device.
///
/// Coprocessor-backed devices get the batched low-power path; everything
/// else falls back to polling.
pub fn source_for_device(device: Box<dyn SensorDevice>) -> Box<dyn SensorSource> {
    if device.supports_low_power() {
        Box::new(LowPowerSource::new(device))
    } else {
        Box::new(PollingSource::new(device))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_policy_prefers_low_power() {
        let coproc =
            SyntheticDevice::new(vec![0.1], Duration::from_millis(1)).with_low_power();
        let mut source = source_for_device(Box::new(coproc));
        assert!(source.start_listening().is_ok());
        source.stop_listening();

        let plain = SyntheticDevice::new(vec![0.1], Duration::from_millis(1));
        let mut source = source_for_device(Box::new(plain));
        assert!(source.start_listening().is_ok());
        source.stop_listening();
    }
}
