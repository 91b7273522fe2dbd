//! Phone-call gate.

use crate::gates::{Gate, GateCore, GateKind, GateListener};
use crate::platform::{SharedMonitor, SubscriberId};
use std::sync::Arc;

/// Telephony state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Ringing,
    OffHook,
}

/// Blocks squeezes while a call is ringing or in progress, where a grip
/// change is far more likely to be the user answering than a gesture.
pub struct CallGate {
    core: Arc<GateCore>,
    monitor: SharedMonitor<CallState>,
    tap: SubscriberId,
}

impl CallGate {
    pub fn new(monitor: SharedMonitor<CallState>) -> Self {
        Self {
            core: GateCore::new(GateKind::Call),
            monitor,
            tap: SubscriberId::next(),
        }
    }
}

impl Gate for CallGate {
    fn kind(&self) -> GateKind {
        GateKind::Call
    }

    fn is_blocking(&self) -> bool {
        self.monitor.get() != CallState::Idle
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
    fn test_blocks_during_call() {
        let monitor = StateMonitor::shared(CallState::Idle);
        let gate = CallGate::new(monitor.clone());
        assert!(!gate.is_blocking());

        monitor.set(CallState::Ringing);
        assert!(gate.is_blocking());

        monitor.set(CallState::OffHook);
        assert!(gate.is_blocking());

        monitor.set(CallState::Idle);
        assert!(!gate.is_blocking());
    }

    #[test]
    fn test_notifies_once_per_transition() {
        let monitor = StateMonitor::shared(CallState::Idle);
        let gate = CallGate::new(monitor.clone());

        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        gate.register_listener(
            SubscriberId::next(),
            Arc::new(move |kind| {
                assert_eq!(kind, GateKind::Call);
                c.fetch_add(1, Ordering::SeqCst);
            }),
        );

        monitor.set(CallState::Ringing);
        monitor.set(CallState::Ringing); // no transition
        monitor.set(CallState::OffHook);
        monitor.set(CallState::Idle);

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_deactivation_releases_condition_source() {
        let monitor = StateMonitor::shared(CallState::Idle);
        let gate = CallGate::new(monitor.clone());

        let id = SubscriberId::next();
        gate.register_listener(id, Arc::new(|_| {}));
        assert_eq!(monitor.subscriber_count(), 1);

        gate.unregister_listener(id);
        assert_eq!(monitor.subscriber_count(), 0);

        // Second removal is a defensive no-op.
        gate.unregister_listener(id);
    }
}
