//! Tabletop/dock gate.

use crate::gates::{Gate, GateCore, GateKind, GateListener};
use crate::platform::{SharedMonitor, SubscriberId};
use std::sync::Arc;

/// Dock state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockState {
    Undocked,
    DeskDock,
    CarDock,
}

/// Blocks squeezes while the device sits in a dock; pressure against a
/// cradle is not a gesture.
pub struct TabletopGate {
    core: Arc<GateCore>,
    monitor: SharedMonitor<DockState>,
    tap: SubscriberId,
}

impl TabletopGate {
    pub fn new(monitor: SharedMonitor<DockState>) -> Self {
        Self {
            core: GateCore::new(GateKind::Tabletop),
            monitor,
            tap: SubscriberId::next(),
        }
    }
}

impl Gate for TabletopGate {
    fn kind(&self) -> GateKind {
        GateKind::Tabletop
    }

    fn is_blocking(&self) -> bool {
        self.monitor.get() != DockState::Undocked
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
