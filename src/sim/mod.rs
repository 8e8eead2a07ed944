//! Deterministic simulation module
//!
//! All round logic lives here. This module must stay headless and deterministic:
//! - Tick-based motion (one step per host frame)
//! - Seeded RNG only
//! - Stable iteration order (by item index)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod events;
pub mod motion;
pub mod round;
pub mod rules;
pub mod session;
pub mod state;
pub mod stats;
pub mod tick;

pub use collision::{bounce, overlaps, resolve};
pub use events::{LogListener, SimEvent, SimListener, dispatch};
pub use motion::{advance, clamp_velocity, separate_overlaps, speed_band};
pub use round::{Distribution, RoundPhase, RoundSupervisor};
pub use rules::{Matchup, Ruleset, RulesGraph, SoundProfile, TypeDef, TypeId, TypeSet, Waveform};
pub use session::Simulation;
pub use state::{Arena, Glow, Item, ItemView, SimConfig, SimState};
pub use stats::{DistributionSample, DistributionSampler, population_glow, type_counts};
pub use tick::tick;
