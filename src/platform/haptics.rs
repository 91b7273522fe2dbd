//! Haptic feedback device abstraction.

use crate::config::HapticIntensity;
use std::time::Duration;

/// Audio attribute the platform routes the vibration under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioUsage {
    Touch,
    Sonification,
}

/// Pre-built vibration descriptor handed to the device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VibrationEffect {
    /// Vibration amplitude, 1-255
    pub amplitude: u8,
    /// Pulse duration
    pub duration: Duration,
    /// Audio attribute metadata
    pub usage: AudioUsage,
}

impl VibrationEffect {
    const LIGHT_AMPLITUDE: u8 = 120;
    const STRONG_AMPLITUDE: u8 = 255;

    /// Short confirmation pulse.
    pub fn click(amplitude: u8) -> Self {
        Self {
            amplitude,
            duration: Duration::from_millis(20),
            usage: AudioUsage::Sonification,
        }
    }

    /// Effect for a configured intensity; `None` means haptics are off.
    pub fn for_intensity(intensity: HapticIntensity) -> Option<Self> {
        match intensity {
            HapticIntensity::Off => None,
            HapticIntensity::Light => Some(Self::click(Self::LIGHT_AMPLITUDE)),
            HapticIntensity::Strong => Some(Self::click(Self::STRONG_AMPLITUDE)),
        }
    }
}

/// Fire-and-forget haptic output.
pub trait HapticDevice: Send + Sync {
    fn vibrate(&self, effect: &VibrationEffect);
}

/// Device that swallows all effects (headless or haptics-less hosts).
pub struct NullHaptics;

impl HapticDevice for NullHaptics {
    fn vibrate(&self, _effect: &VibrationEffect) {}
}

/// Device that logs each effect, for demos and diagnosis.
pub struct LogHaptics;

impl HapticDevice for LogHaptics {
    fn vibrate(&self, effect: &VibrationEffect) {
        tracing::debug!(
            "haptic pulse: amplitude {} for {:?}",
            effect.amplitude,
            effect.duration
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_for_intensity() {
        assert!(VibrationEffect::for_intensity(HapticIntensity::Off).is_none());

        let light = VibrationEffect::for_intensity(HapticIntensity::Light).unwrap();
        let strong = VibrationEffect::for_intensity(HapticIntensity::Strong).unwrap();
        assert!(light.amplitude < strong.amplitude);
        assert_eq!(light.usage, AudioUsage::Sonification);
    }

    #[test]
    fn test_null_device_accepts_effects() {
        let device = NullHaptics;
        device.vibrate(&VibrationEffect::click(200));
    }
}
