//! Squeeze detection: classifier adapter, sample window, controller.

pub mod controller;
pub mod model;
pub mod window;

// Re-export commonly used types
pub use controller::{
    ControllerState, GestureController, GestureEvent, GestureListener,
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MIN_GAP_MS,
};
pub use model::{GestureModel, ModelError};
pub use window::SampleWindow;
