//! One-shot system actions dispatched on a confirmed squeeze.
//!
//! Actions are selected by string key from settings and resolved through
//! the [`ActionRegistry`]. Unknown keys resolve to the no-op action; a
//! misconfigured agent stays inert instead of failing. The bundled actions
//! are host-side stand-ins that log their effect; the dispatch contract
//! (runnability, screen-off capability, swallowed run errors) is what the
//! rest of the agent depends on.

use std::collections::HashMap;
use std::sync::Arc;

/// Well-known action keys.
pub mod keys {
    pub const SCREENSHOT: &str = "screenshot";
    pub const ASSISTANT: &str = "assistant";
    pub const CAMERA: &str = "camera";
    pub const FLASHLIGHT: &str = "flashlight";
    pub const NOOP: &str = "noop";
}

/// A pluggable one-shot system effect.
pub trait Action: Send + Sync {
    /// Whether the action can currently run at all.
    fn can_run(&self) -> bool;

    /// Whether the action is meaningful while the screen is off.
    fn can_run_when_screen_off(&self) -> bool;

    /// Perform the effect.
    fn run(&self) -> Result<(), ActionError>;

    /// Human-readable key/name.
    fn label(&self) -> &str;
}

/// Fail-soft default: reports itself not runnable and does nothing.
pub struct NoopAction;

impl Action for NoopAction {
    fn can_run(&self) -> bool {
        false
    }

    fn can_run_when_screen_off(&self) -> bool {
        true
    }

    fn run(&self) -> Result<(), ActionError> {
        Ok(())
    }

    fn label(&self) -> &str {
        keys::NOOP
    }
}

/// Capture the current screen contents. Needs a lit screen.
pub struct ScreenshotAction;

impl Action for ScreenshotAction {
    fn can_run(&self) -> bool {
        true
    }

    fn can_run_when_screen_off(&self) -> bool {
        false
    }

    fn run(&self) -> Result<(), ActionError> {
        tracing::info!("action: screenshot captured");
        Ok(())
    }

    fn label(&self) -> &str {
        keys::SCREENSHOT
    }
}

/// Summon the voice assistant; wakes the device if needed.
pub struct AssistantAction;

impl Action for AssistantAction {
    fn can_run(&self) -> bool {
        true
    }

    fn can_run_when_screen_off(&self) -> bool {
        true
    }

    fn run(&self) -> Result<(), ActionError> {
        tracing::info!("action: assistant invoked");
        Ok(())
    }

    fn label(&self) -> &str {
        keys::ASSISTANT
    }
}

/// Launch the camera; wakes the device if needed.
pub struct CameraAction;

impl Action for CameraAction {
    fn can_run(&self) -> bool {
        true
    }

    fn can_run_when_screen_off(&self) -> bool {
        true
    }

    fn run(&self) -> Result<(), ActionError> {
        tracing::info!("action: camera launched");
        Ok(())
    }

    fn label(&self) -> &str {
        keys::CAMERA
    }
}

/// Toggle the torch.
pub struct FlashlightAction;

impl Action for FlashlightAction {
    fn can_run(&self) -> bool {
        true
    }

    fn can_run_when_screen_off(&self) -> bool {
        true
    }

    fn run(&self) -> Result<(), ActionError> {
        tracing::info!("action: flashlight toggled");
        Ok(())
    }

    fn label(&self) -> &str {
        keys::FLASHLIGHT
    }
}

/// Maps settings keys to action capabilities.
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
    noop: Arc<dyn Action>,
}

impl ActionRegistry {
    /// Empty registry; every key resolves to noop.
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
            noop: Arc::new(NoopAction),
        }
    }

    /// Registry with the bundled actions.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(keys::SCREENSHOT, Arc::new(ScreenshotAction));
        registry.register(keys::ASSISTANT, Arc::new(AssistantAction));
        registry.register(keys::CAMERA, Arc::new(CameraAction));
        registry.register(keys::FLASHLIGHT, Arc::new(FlashlightAction));
        registry
    }

    /// Register or replace the action for a key.
    pub fn register(&mut self, key: &str, action: Arc<dyn Action>) {
        self.actions.insert(key.to_string(), action);
    }

    /// Resolve a key, falling back to the no-op action for unknown keys.
    pub fn resolve(&self, key: &str) -> Arc<dyn Action> {
        match self.actions.get(key) {
            Some(action) => action.clone(),
            None => {
                tracing::warn!("unknown action key '{key}', using noop");
                self.noop.clone()
            }
        }
    }

    /// Registered keys, for `status` output.
    pub fn known_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.actions.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

/// Action dispatch errors.
#[derive(Debug)]
pub enum ActionError {
    Unavailable(String),
    Failed(String),
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::Unavailable(e) => write!(f, "Action unavailable: {e}"),
            ActionError::Failed(e) => write!(f, "Action failed: {e}"),
        }
    }
}

impl std::error::Error for ActionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolves_builtin_keys() {
        let registry = ActionRegistry::with_builtin();
        let action = registry.resolve(keys::SCREENSHOT);
        assert_eq!(action.label(), keys::SCREENSHOT);
        assert!(action.can_run());
        assert!(!action.can_run_when_screen_off());
    }

    #[test]
    fn test_unknown_key_resolves_to_noop() {
        let registry = ActionRegistry::with_builtin();
        let action = registry.resolve("open-portal");
        assert_eq!(action.label(), keys::NOOP);
        assert!(!action.can_run());
        assert!(action.run().is_ok());
    }

    #[test]
    fn test_register_replaces_existing_key() {
        struct Grounded;
        impl Action for Grounded {
            fn can_run(&self) -> bool {
                false
            }
            fn can_run_when_screen_off(&self) -> bool {
                false
            }
            fn run(&self) -> Result<(), ActionError> {
                Ok(())
            }
            fn label(&self) -> &str {
                "grounded"
            }
        }

        let mut registry = ActionRegistry::with_builtin();
        registry.register(keys::CAMERA, Arc::new(Grounded));
        assert_eq!(registry.resolve(keys::CAMERA).label(), "grounded");
    }

    #[test]
    fn test_known_keys_sorted() {
        let registry = ActionRegistry::with_builtin();
        let keys = registry.known_keys();
        assert_eq!(keys.len(), 4);
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
