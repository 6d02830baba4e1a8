use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PKError, PKResult};
use crate::simulation::{SampleWindow, ViewPreset, DEFAULT_RESOLUTION_H};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampling: SamplingConfig,
    pub window: WindowConfig,
    pub calibration: CalibrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub resolution_h: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            resolution_h: DEFAULT_RESOLUTION_H,
        }
    }
}

/// Viewport relative to "now". Explicit offsets override the preset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub preset: ViewPreset,
    pub before_h: Option<f64>,
    pub after_h: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub enabled: bool,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> PKResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PKResult<()> {
        let resolution = self.sampling.resolution_h;
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(PKError::Validation(format!(
                "Sampling resolution must be positive, got {}",
                resolution
            )));
        }

        let offsets = [("before_h", self.window.before_h), ("after_h", self.window.after_h)];
        for (name, offset) in offsets {
            if let Some(value) = offset {
                if !(value.is_finite() && value >= 0.0) {
                    return Err(PKError::Validation(format!(
                        "Window offset {} must be non-negative, got {}",
                        name, value
                    )));
                }
            }
        }

        Ok(())
    }

    /// Sampling window around `now_h` per this configuration.
    pub fn window_around(&self, now_h: f64) -> PKResult<SampleWindow> {
        let (preset_before, preset_after) = self.window.preset.offsets_h();
        let before = self.window.before_h.unwrap_or(preset_before);
        let after = self.window.after_h.unwrap_or(preset_after);
        SampleWindow::new(now_h - before, now_h + after, self.sampling.resolution_h)
    }
}
