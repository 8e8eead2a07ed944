//! User-facing settings
//!
//! Simulation knobs plus presentation toggles. Kept in memory only; the
//! host may load a JSON copy at startup but nothing is written back.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::sim::SimConfig;

/// Slider ranges exposed to the keyboard controls
pub const ITEMS_PER_TYPE_RANGE: (u32, u32) = (1, 50);
pub const SPEED_RANGE: (f32, f32) = (0.1, 5.0);
pub const SIZE_RANGE: (f32, f32) = (10.0, 60.0);

/// Settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Simulation ===
    /// Items seeded per type at round start
    pub items_per_type: u32,
    pub speed_multiplier: f32,
    /// Item radius in pixels
    pub item_size: f32,
    /// Variation key to start with
    pub variation: String,
    /// Pick a different variation at every round start
    pub random_variation: bool,

    // === Visual Effects ===
    /// Collision glows
    pub glow_enabled: bool,
    /// Translucent clear instead of a full clear each frame
    pub motion_blur: bool,
    /// Seconds between distribution chart samples
    pub chart_refresh_secs: f64,

    // === Audio ===
    pub muted: bool,
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,

    // === Accessibility ===
    /// Reduced motion (no blur trails)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            items_per_type: DEFAULT_ITEMS_PER_TYPE,
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
            item_size: DEFAULT_ITEM_SIZE,
            variation: "classic".to_string(),
            random_variation: false,

            // Effects off by default
            glow_enabled: false,
            motion_blur: false,
            chart_refresh_secs: 1.0,

            muted: false,
            master_volume: 0.8,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Parse settings, filling any missing field with its default
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.sim_config()?;
        Ok(settings)
    }

    /// Validated simulation knobs
    pub fn sim_config(&self) -> Result<SimConfig, ConfigError> {
        SimConfig::new(self.items_per_type, self.speed_multiplier, self.item_size)
    }

    /// Volume after mute
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume.clamp(0.0, 1.0)
        }
    }

    /// Effective motion blur (respects reduced_motion)
    pub fn effective_motion_blur(&self) -> bool {
        self.motion_blur && !self.reduced_motion
    }

    pub fn step_items(&mut self, delta: i32) {
        let (lo, hi) = ITEMS_PER_TYPE_RANGE;
        self.items_per_type = self.items_per_type.saturating_add_signed(delta).clamp(lo, hi);
    }

    pub fn step_speed(&mut self, delta: f32) {
        let (lo, hi) = SPEED_RANGE;
        self.speed_multiplier = round_tenths(self.speed_multiplier + delta).clamp(lo, hi);
    }

    pub fn step_size(&mut self, delta: f32) {
        let (lo, hi) = SIZE_RANGE;
        self.item_size = (self.item_size + delta).clamp(lo, hi);
    }

    pub fn step_volume(&mut self, delta: f32) {
        self.master_volume = (self.master_volume + delta).clamp(0.0, 1.0);
    }
}

/// Keeps repeated 0.1 steps from drifting
fn round_tenths(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}
