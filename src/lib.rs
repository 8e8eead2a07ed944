//! RPS Arena - an extended rock-paper-scissors toy
//!
//! Core modules:
//! - `sim`: Headless simulation (motion, collisions, type conversion, rounds)
//! - `history`: Bounded in-memory record of finished rounds
//! - `variations`: Ruleset documents (types, labels, beats-edges, sound)
//! - `settings`: User-facing knobs validated into a `SimConfig`
//! - `audio`: Web Audio listener (wasm32 only)

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod error;
pub mod history;
pub mod settings;
pub mod sim;
pub mod variations;

pub use error::{ConfigError, TransientStateError};
pub use history::{RoundHistory, RoundRecord};
pub use settings::Settings;
pub use variations::VariationCatalog;

/// Simulation configuration constants
pub mod consts {
    /// Host frame interval used by the headless runner (seconds)
    pub const FRAME_DT: f64 = 1.0 / 60.0;

    /// Config defaults
    pub const DEFAULT_ITEMS_PER_TYPE: u32 = 5;
    pub const DEFAULT_SPEED_MULTIPLIER: f32 = 1.0;
    pub const DEFAULT_ITEM_SIZE: f32 = 30.0;

    /// Mass = size² / MASS_NORMALIZER, so a default-sized item weighs 1.0
    pub const MASS_NORMALIZER: f32 = 900.0;

    /// Collision response
    pub const RESTITUTION: f32 = 0.8;
    /// Fraction of penetration corrected per contact
    pub const PENETRATION_CORRECTION: f32 = 0.8;
    pub const COLLISION_DAMPING: f32 = 0.99;

    /// Velocity band:
    /// max = MAX_SPEED_FACTOR * multiplier * (REFERENCE_SIZE / max(size, MIN_SPEED_SIZE))
    pub const MAX_SPEED_FACTOR: f32 = 5.0;
    pub const REFERENCE_SIZE: f32 = 30.0;
    pub const MIN_SPEED_SIZE: f32 = 10.0;
    /// min = MIN_SPEED_FACTOR * multiplier
    pub const MIN_SPEED_FACTOR: f32 = 0.5;

    /// Spawn velocity per axis is uniform in ±SPAWN_SPEED * multiplier
    pub const SPAWN_SPEED: f32 = 1.0;
    /// Spawn spin is uniform in ±SPAWN_SPIN * multiplier (radians/tick)
    pub const SPAWN_SPIN: f32 = 0.05;

    /// Real time between a round's conclusion and the next round (seconds)
    pub const ROUND_RESTART_DELAY_SECS: f64 = 3.0;
    /// Finished rounds kept in memory
    pub const MAX_ROUND_HISTORY: usize = 50;

    /// Overlap separation passes after a live size change
    pub const OVERLAP_PASSES: usize = 3;
    /// Extra gap added per side when separating overlaps
    pub const OVERLAP_BUFFER: f32 = 1.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}
