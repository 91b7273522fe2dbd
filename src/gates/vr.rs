//! VR-mode gate.

use crate::gates::{Gate, GateCore, GateKind, GateListener};
use crate::platform::{SharedMonitor, SubscriberId};
use std::sync::Arc;

/// Blocks squeezes while the device is in a VR headset, where grip
/// pressure is constant and meaningless.
pub struct VrGate {
    core: Arc<GateCore>,
    monitor: SharedMonitor<bool>,
    tap: SubscriberId,
}

impl VrGate {
    pub fn new(monitor: SharedMonitor<bool>) -> Self {
        Self {
            core: GateCore::new(GateKind::Vr),
            monitor,
            tap: SubscriberId::next(),
        }
    }
}

impl Gate for VrGate {
    fn kind(&self) -> GateKind {
        GateKind::Vr
    }

    fn is_blocking(&self) -> bool {
        self.monitor.get()
    }

    fn register_listener(&self, id: SubscriberId, listener: GateListener) {
        self.core.register(id, listener);
        let core = self.core.clone();
        self.monitor.subscribe(self.tap, Arc::new(move |_| core.notify_all()));
    }

    fn unregister_listener(&self, id: SubscriberId) {
        self.core.unregister(id);
        if !self.core.has_listeners() {
            self.monitor.unsubscribe(self.tap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::StateMonitor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_blocks_in_vr_mode() {
        let monitor = StateMonitor::shared(false);
        let gate = VrGate::new(monitor.clone());
        assert!(!gate.is_blocking());

        monitor.set(true);
        assert!(gate.is_blocking());
    }

    #[test]
    fn test_listener_sees_transitions() {
        let monitor = StateMonitor::shared(false);
        let gate = VrGate::new(monitor.clone());

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        gate.register_listener(
            SubscriberId::next(),
            Arc::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        monitor.set(true);
        monitor.set(false);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
