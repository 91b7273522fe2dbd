//! Host platform collaborators for the gripsense agent.
//!
//! Narrow wrappers around the device facilities the agent depends on:
//! observable state monitors (screen, telephony, dock), the wake lock used
//! during gesture handling, and the haptic output device.

pub mod haptics;
pub mod monitor;
pub mod wake;

// Re-export commonly used types
pub use haptics::{AudioUsage, HapticDevice, LogHaptics, NullHaptics, VibrationEffect};
pub use monitor::{ScreenState, SharedMonitor, StateCallback, StateMonitor, SubscriberId};
pub use wake::{WakeLock, WakeLockGuard};
