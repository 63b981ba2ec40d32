use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gameplay::hit_window::HitWindow;
use crate::gameplay::rating::{HealthConfig, ScoreCurve};
use crate::gameplay::scheduler::{ScrollConfig, StrumLayout};
use crate::input::strategy::InputStrategy;
use crate::time::conductor::BeatFill;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be a positive number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },
    #[error("health.start ({start}) must lie within 0..=health.max ({max})")]
    HealthOutOfRange { start: f64, max: f64 },
}

/// Tuning of one playback. Every field has a default, so a config file only
/// names what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub hit_window: HitWindow,
    pub score_curve: ScoreCurve,
    pub health: HealthConfig,
    pub scroll: ScrollConfig,
    pub layout: StrumLayout,
    /// Presses with nothing in range are free when true.
    pub ghost_tapping: bool,
    pub beat_fill: BeatFill,
    pub input: InputStrategy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hit_window: HitWindow::default(),
            score_curve: ScoreCurve::default(),
            health: HealthConfig::default(),
            scroll: ScrollConfig::default(),
            layout: StrumLayout::default(),
            ghost_tapping: true,
            beat_fill: BeatFill::default(),
            input: InputStrategy::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(src: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(src).context("invalid engine config json")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let src = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&src).with_context(|| format!("in config {}", path.display()))
    }

    /// Hit window tiers validate themselves on deserialize; this covers the rest.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("scroll.scroll_multiplier", self.scroll.scroll_multiplier),
            ("scroll.reference_bpm", self.scroll.reference_bpm),
            ("scroll.base_lead_ms", self.scroll.base_lead_ms),
            ("scroll.hold_segment_px", self.scroll.hold_segment_px),
            ("health.max", self.health.max),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if self.scroll.max_hold_segments == 0 {
            return Err(ConfigError::NotPositive {
                field: "scroll.max_hold_segments",
                value: 0.0,
            });
        }
        if !(self.scroll.late_purge_ms.is_finite() && self.scroll.late_purge_ms >= 0.0) {
            return Err(ConfigError::Negative {
                field: "scroll.late_purge_ms",
                value: self.scroll.late_purge_ms,
            });
        }
        if !(0.0..=self.health.max).contains(&self.health.start) {
            return Err(ConfigError::HealthOutOfRange {
                start: self.health.start,
                max: self.health.max,
            });
        }
        if self.health.miss_damage < 0.0 {
            return Err(ConfigError::Negative {
                field: "health.miss_damage",
                value: self.health.miss_damage,
            });
        }
        Ok(())
    }
}
