//! Application-processor polling acquisition.
//!
//! Fallback strategy for devices without coprocessor support: a dedicated
//! thread polls the device once per cadence interval. Keeps the host awake
//! while listening, so the orchestration layer pairs it with the screen-off
//! power policy.

use crate::sensor::device::SensorDevice;
use crate::sensor::types::{SensorError, SensorSample, SensorSource};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Polling acquisition source.
pub struct PollingSource {
    device: Option<Box<dyn SensorDevice>>,
    sender: Sender<SensorSample>,
    receiver: Receiver<SensorSample>,
    running: Arc<AtomicBool>,
    sensitivity_bits: Arc<AtomicU32>,
    thread_handle: Option<JoinHandle<Box<dyn SensorDevice>>>,
}

impl PollingSource {
    /// Create a polling source around a device.
    pub fn new(device: Box<dyn SensorDevice>) -> Self {
        // Bounded channel so a stalled consumer cannot grow memory
        let (sender, receiver) = bounded(10_000);

        Self {
            device: Some(device),
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            sensitivity_bits: Arc::new(AtomicU32::new(0f32.to_bits())),
            thread_handle: None,
        }
    }
}

impl SensorSource for PollingSource {
    fn start_listening(&mut self) -> Result<(), SensorError> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let Some(mut device) = self.device.take() else {
            // Device was lost to a failed sampling thread; keep the
            // contract alive with an empty stream.
            tracing::warn!("sensor device unavailable, listening without samples");
            self.running.store(true, Ordering::SeqCst);
            return Ok(());
        };

        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let sensitivity_bits = self.sensitivity_bits.clone();

        let handle = thread::spawn(move || {
            let mut applied = f32::from_bits(sensitivity_bits.load(Ordering::SeqCst));
            device.set_sensitivity(applied);

            while running.load(Ordering::SeqCst) {
                let wanted = f32::from_bits(sensitivity_bits.load(Ordering::SeqCst));
                if wanted != applied {
                    device.set_sensitivity(wanted);
                    applied = wanted;
                }

                if let Some(sample) = device.next_sample() {
                    // Drop on a full channel rather than block the poll loop
                    let _ = sender.try_send(sample);
                }

                thread::sleep(device.cadence());
            }

            device
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop_listening(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            if let Ok(device) = handle.join() {
                self.device = Some(device);
            }
        }
        // Samples still in flight after a stop are discarded
        while self.receiver.try_recv().is_ok() {}
    }

    fn update_sensitivity(&mut self, sensitivity: f32) {
        self.sensitivity_bits
            .store(sensitivity.to_bits(), Ordering::SeqCst);
        if let Some(ref mut device) = self.device {
            device.set_sensitivity(sensitivity);
        }
    }

    fn sample_receiver(&self) -> &Receiver<SensorSample> {
        &self.receiver
    }

    fn is_listening(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for PollingSource {
    fn drop(&mut self) {
        self.stop_listening();
    }
}
