//! Morph configuration: resolution, timing and easing weights. Loadable from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::ease::DEFAULT_BACK_OVERSHOOT;
use crate::error::{MorphError, MorphResult};
use crate::sampling::{MAX_RESOLUTION, MIN_RESOLUTION};

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MorphConfig {
    /// Grid resolution; the point buffer holds `resolution²` points. Clamped to [10, 1000].
    pub resolution: u32,
    /// Seconds for one eased 0→1 progress ramp.
    pub transition_duration: f32,
    /// Seconds to hold a finished shape before the next transition.
    pub hold_duration: f32,
    /// Seconds between start() and the first transition.
    pub initial_delay: f32,
    /// Draw weights for InCubic, InExpo, InBack, InSine.
    pub ease_weights: [f32; 4],
    /// Overshoot used when InBack is drawn.
    pub back_overshoot: f32,
    /// Fixed RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            resolution: 200,
            transition_duration: 3.0,
            hold_duration: 1.5,
            initial_delay: 1.0,
            ease_weights: [0.25; 4],
            back_overshoot: DEFAULT_BACK_OVERSHOOT,
            seed: None,
        }
    }
}

impl MorphConfig {
    pub fn from_toml_str(source: &str) -> MorphResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| MorphError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> MorphResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| MorphError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&source)
    }

    /// Resolution actually used, clamped to the supported range.
    pub fn effective_resolution(&self) -> u32 {
        self.resolution.clamp(MIN_RESOLUTION, MAX_RESOLUTION)
    }

    pub fn validate(&self) -> MorphResult<()> {
        if !(self.transition_duration.is_finite() && self.transition_duration > 0.0) {
            return Err(MorphError::Config(format!(
                "transition_duration must be positive, got {}",
                self.transition_duration
            )));
        }
        for (name, value) in [("hold_duration", self.hold_duration), ("initial_delay", self.initial_delay)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(MorphError::Config(format!("{} must be >= 0, got {}", name, value)));
            }
        }
        if !self.back_overshoot.is_finite() {
            return Err(MorphError::Config("back_overshoot must be finite".to_string()));
        }
        Ok(())
    }
}
