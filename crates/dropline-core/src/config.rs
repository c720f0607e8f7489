#![forbid(unsafe_code)]

//! Tunable parameters for the drag engine.
//!
//! Every tunable lives in a single [`DragConfig`] that can be built in code or
//! loaded from TOML/JSON (with the `config-file` feature):
//!
//! ```toml
//! # dropline.toml
//! [auto_scroll]
//! start_from_percentage = 0.25
//! max_pixel_scroll = 28.0
//!
//! [movement]
//! combine_inner_fraction = 0.5
//! ```
//!
//! ```rust,ignore
//! let config = DragConfig::from_toml_file("dropline.toml")?;
//! ```
//!
//! # Defaults
//!
//! `DragConfig::default()` reproduces the built-in behaviour. The auto-scroll
//! curve and the combine band are tunables, not laws: only their monotonic
//! shape is relied upon.

use std::fmt;
#[cfg(feature = "config-file")]
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    pub auto_scroll: AutoScrollConfig,
    pub drop_animation: DropAnimationConfig,
    pub movement: MovementConfig,
    pub sensors: SensorConfig,
}

/// Edge-proximity scrolling while dragging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoScrollConfig {
    /// Disable auto scrolling entirely.
    pub disabled: bool,
    /// Distance from an edge (fraction of the container size) where scrolling starts.
    pub start_from_percentage: f32,
    /// Distance from an edge (fraction of the container size) where speed peaks.
    pub max_speed_at_percentage: f32,
    /// Peak speed in pixels per frame.
    pub max_pixel_scroll: f32,
    /// Exponent applied to the proximity percentage. Values above 1 ease in.
    pub ease_exponent: f32,
    /// Until this long after the drag starts, scroll at minimum speed.
    pub accelerate_at_ms: u64,
    /// From this long after the drag starts, no time dampening applies.
    pub stop_dampening_at_ms: u64,
}

impl Default for AutoScrollConfig {
    fn default() -> Self {
        Self {
            disabled: false,
            start_from_percentage: 0.25,
            max_speed_at_percentage: 0.05,
            max_pixel_scroll: 28.0,
            ease_exponent: 2.0,
            accelerate_at_ms: 360,
            stop_dampening_at_ms: 1200,
        }
    }
}

impl AutoScrollConfig {
    pub fn accelerate_at(&self) -> Duration {
        Duration::from_millis(self.accelerate_at_ms)
    }

    pub fn stop_dampening_at(&self) -> Duration {
        Duration::from_millis(self.stop_dampening_at_ms)
    }
}

/// Timing of the settle animation after a drop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropAnimationConfig {
    pub min_drop_ms: u64,
    pub max_drop_ms: u64,
    /// Travel distance (px) at which the maximum duration is reached.
    pub max_drop_at_distance: f32,
    /// Multiplier applied to cancel animations.
    pub cancel_modifier: f32,
}

impl Default for DropAnimationConfig {
    fn default() -> Self {
        Self {
            min_drop_ms: 330,
            max_drop_ms: 550,
            max_drop_at_distance: 1500.0,
            cancel_modifier: 0.6,
        }
    }
}

/// Reorder/combine geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Central fraction of a sibling's main-axis extent that triggers a combine.
    pub combine_inner_fraction: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            combine_inner_fraction: 0.5,
        }
    }
}

/// Built-in sensor thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Pointer travel (px) before a press becomes a drag.
    pub sloppy_click_threshold: f32,
    /// Touch hold time before a drag starts.
    pub long_press_ms: u64,
    /// Touch force at or above which a force press is recognised.
    pub force_press_threshold: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            sloppy_click_threshold: 5.0,
            long_press_ms: 120,
            force_press_threshold: 0.15,
        }
    }
}

impl SensorConfig {
    pub fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

impl DragConfig {
    /// Load from a TOML string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.into_validated()
    }

    /// Load from a TOML file on disk and validate.
    #[cfg(feature = "config-file")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string and validate.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(ConfigError::Json)?;
        config.into_validated()
    }

    /// Return `self` when valid, otherwise every violation.
    pub fn into_validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let scroll = &self.auto_scroll;

        if !(0.0..=0.5).contains(&scroll.start_from_percentage) {
            errors.push(format!(
                "auto_scroll.start_from_percentage must be in [0, 0.5], got {}",
                scroll.start_from_percentage
            ));
        }
        if scroll.max_speed_at_percentage < 0.0
            || scroll.max_speed_at_percentage >= scroll.start_from_percentage
        {
            errors.push(format!(
                "auto_scroll.max_speed_at_percentage must be in [0, start_from_percentage), got {}",
                scroll.max_speed_at_percentage
            ));
        }
        if scroll.max_pixel_scroll < 1.0 {
            errors.push(format!(
                "auto_scroll.max_pixel_scroll must be >= 1, got {}",
                scroll.max_pixel_scroll
            ));
        }
        if scroll.ease_exponent <= 0.0 {
            errors.push(format!(
                "auto_scroll.ease_exponent must be > 0, got {}",
                scroll.ease_exponent
            ));
        }
        if scroll.accelerate_at_ms > scroll.stop_dampening_at_ms {
            errors.push("auto_scroll.accelerate_at_ms must be <= stop_dampening_at_ms".into());
        }

        let drop = &self.drop_animation;
        if drop.min_drop_ms > drop.max_drop_ms {
            errors.push("drop_animation.min_drop_ms must be <= max_drop_ms".into());
        }
        if drop.max_drop_at_distance <= 0.0 {
            errors.push(format!(
                "drop_animation.max_drop_at_distance must be > 0, got {}",
                drop.max_drop_at_distance
            ));
        }
        if !(0.0..=1.0).contains(&drop.cancel_modifier) {
            errors.push(format!(
                "drop_animation.cancel_modifier must be in [0, 1], got {}",
                drop.cancel_modifier
            ));
        }

        let fraction = self.movement.combine_inner_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            errors.push(format!(
                "movement.combine_inner_fraction must be in (0, 1], got {fraction}"
            ));
        }

        if self.sensors.sloppy_click_threshold < 0.0 {
            errors.push("sensors.sloppy_click_threshold must be >= 0".into());
        }
        if !(0.0..=1.0).contains(&self.sensors.force_press_threshold) {
            errors.push("sensors.force_press_threshold must be in [0, 1]".into());
        }

        errors
    }
}

/// Errors from loading a [`DragConfig`].
#[derive(Debug)]
pub enum ConfigError {
    #[cfg(feature = "config-file")]
    Io(std::io::Error),
    #[cfg(feature = "config-file")]
    Toml(toml::de::Error),
    #[cfg(feature = "config-file")]
    Json(serde_json::Error),
    Invalid(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "config-file")]
            Self::Io(err) => write!(f, "config I/O error: {err}"),
            #[cfg(feature = "config-file")]
            Self::Toml(err) => write!(f, "config TOML parse error: {err}"),
            #[cfg(feature = "config-file")]
            Self::Json(err) => write!(f, "config JSON parse error: {err}"),
            Self::Invalid(errors) => write!(f, "invalid config: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {}
