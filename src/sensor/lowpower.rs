//! Always-on low-power acquisition.
//!
//! Emulates a coprocessor-backed sensor hub: readings accumulate in the
//! device FIFO while the host sleeps, and the host wakes once per batch to
//! flush them. The wake cadence is therefore a multiple of the sample
//! cadence, which is what makes this path suitable for screen-off
//! operation.

use crate::sensor::device::SensorDevice;
use crate::sensor::types::{SensorError, SensorSample, SensorSource};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Readings flushed per host wake.
const BATCH_SIZE: usize = 4;

/// Low-power batched acquisition source.
pub struct LowPowerSource {
    device: Option<Box<dyn SensorDevice>>,
    sender: Sender<SensorSample>,
    receiver: Receiver<SensorSample>,
    running: Arc<AtomicBool>,
    sensitivity_bits: Arc<AtomicU32>,
    thread_handle: Option<JoinHandle<Box<dyn SensorDevice>>>,
}

impl LowPowerSource {
    /// Create a low-power source around a coprocessor-backed device.
    pub fn new(device: Box<dyn SensorDevice>) -> Self {
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

impl SensorSource for LowPowerSource {
    fn start_listening(&mut self) -> Result<(), SensorError> {
        if self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let Some(mut device) = self.device.take() else {
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

                // Sleep through one FIFO fill, then flush it.
                thread::sleep(device.cadence() * BATCH_SIZE as u32);
                for _ in 0..BATCH_SIZE {
                    if let Some(sample) = device.next_sample() {
                        let _ = sender.try_send(sample);
                    }
                }
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

impl Drop for LowPowerSource {
    fn drop(&mut self) {
        self.stop_listening();
    }
}
