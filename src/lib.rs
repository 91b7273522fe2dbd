//! Gripsense Agent - Squeeze-gesture detection and dispatch for handheld devices.
//!
//! This library turns a stream of grip-pressure readings into one-shot
//! system actions (screenshot, assistant, camera), with suppression gates
//! for the situations where a squeeze is meaningless or accidental.
//!
//! # Behavior Guarantees
//!
//! - **Fail-soft**: a missing sensor or classifier model degrades to silence,
//!   never to a crash
//! - **At most one action per squeeze**: detections are debounced and each
//!   event is dispatched to exactly one action instance
//! - **No stray wake locks**: the dispatch wake lock is scoped to a single
//!   gesture and released on every exit path
//! - **Context aware**: detection pauses during calls, in VR, in a pocket,
//!   on a dock, and while the screen is off for screen-bound actions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Gripsense Agent                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Sensor    │──▶│  Controller │──▶│   Service   │       │
//! │  │  (source)   │   │ (classify)  │   │ (arbitrate) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                 │                  │              │
//! │         ▼                 ▼                  ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Device    │   │    Model    │   │Gates/Action │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gripsense_agent::gesture::{GestureController, GestureModel};
//! use gripsense_agent::sensor::{source_for_device, SyntheticDevice};
//!
//! // Build a controller over a scripted device
//! let device = Box::new(SyntheticDevice::squeeze_pattern());
//! let mut controller =
//!     GestureController::new(source_for_device(device), GestureModel::builtin());
//!
//! // Confirmed squeezes reach the listener
//! controller.set_listener(Box::new(|event| {
//!     println!("squeeze at {} ({:.2})", event.timestamp, event.confidence);
//! }));
//! controller.start_listening();
//!
//! // Samples arrive on controller.sample_receiver()
//! ```

pub mod action;
pub mod config;
pub mod diagnostics;
pub mod gates;
pub mod gesture;
pub mod platform;
pub mod sensor;
pub mod service;

// Re-export key types at crate root for convenience
pub use action::{Action, ActionError, ActionRegistry};
pub use config::{
    sensitivity_from_raw, HapticIntensity, SettingKey, Settings, SettingsStore,
    SharedSettingsStore,
};
pub use diagnostics::{DiagnosticsLog, DiagnosticsStats, SharedDiagnostics};
pub use gates::{Gate, GateKind, GateSet};
pub use gesture::{ControllerState, GestureController, GestureEvent, GestureModel};
pub use platform::{ScreenState, StateMonitor, VibrationEffect, WakeLock};
pub use sensor::{source_for_device, SensorDevice, SensorSample, SensorSource, SyntheticDevice};
pub use service::{GestureService, ServiceEvent};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Behavior declaration that can be displayed to users.
pub const AGENT_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║             GRIPSENSE AGENT - BEHAVIOR DECLARATION               ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This agent reads grip-pressure magnitudes to detect squeezes.   ║
║                                                                  ║
║  ✓ WHAT IT DOES:                                                 ║
║    • Reads pressure magnitudes from the grip sensor              ║
║    • Runs the action you selected, once per squeeze              ║
║    • Pauses itself during calls, in VR, in a pocket, on a dock   ║
║                                                                  ║
║  ✗ WHAT IT NEVER DOES:                                           ║
║    • Record audio, location, or screen content                   ║
║    • Keep raw sensor readings beyond the detection window        ║
║    • Act while disabled or while a suppression gate is active    ║
║                                                                  ║
║  Detection runs entirely on this device. Sensor windows are      ║
║  discarded as soon as they are classified.                       ║
║                                                                  ║
║  You can view dispatch statistics anytime with:                  ║
║    gripsense status                                              ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_declaration_contents() {
        assert!(AGENT_DECLARATION.contains("BEHAVIOR"));
        assert!(AGENT_DECLARATION.contains("NEVER DOES"));
        assert!(AGENT_DECLARATION.contains("once per squeeze"));
    }
}
