//! Simulation state and core entity types
//!
//! `SimState` is the Entity Store: it exclusively owns the items of the
//! active round, plus the seeded RNG, transient glows and the round
//! supervisor.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::events::SimEvent;
use super::round::{Distribution, RoundSupervisor};
use super::rules::{Ruleset, TypeId};
use super::stats::{self, DistributionSampler};
use crate::consts::*;
use crate::error::{ConfigError, require_positive};

/// A moving, typed entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub kind: TypeId,
    pub pos: Vec2,
    /// Displacement per tick
    pub vel: Vec2,
    /// Velocity at speed multiplier 1.0 (restored when the speed knob moves)
    pub base_vel: Vec2,
    /// Collision radius
    pub size: f32,
    pub mass: f32,
    pub rotation: f32,
    pub rotation_speed: f32,
}

impl Item {
    pub fn new(kind: TypeId, pos: Vec2, size: f32) -> Self {
        Self {
            kind,
            pos,
            vel: Vec2::ZERO,
            base_vel: Vec2::ZERO,
            size,
            mass: Self::mass_for(size),
            rotation: 0.0,
            rotation_speed: 0.0,
        }
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self.base_vel = vel;
        self
    }

    /// Mass grows with area; a default-sized item weighs 1.0
    #[inline]
    pub fn mass_for(size: f32) -> f32 {
        size * size / MASS_NORMALIZER
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        1.0 / self.mass
    }
}

/// Canvas extent; items live in `[size, width - size] × [size, height - size]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawArena")]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

#[derive(Deserialize)]
struct RawArena {
    width: f32,
    height: f32,
}

impl TryFrom<RawArena> for Arena {
    type Error = ConfigError;

    fn try_from(raw: RawArena) -> Result<Self, Self::Error> {
        Arena::new(raw.width, raw.height)
    }
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Result<Self, ConfigError> {
        Ok(Self {
            width: require_positive("arena width", width)?,
            height: require_positive("arena height", height)?,
        })
    }

    /// Re-check an arena that may have been built field by field
    pub fn validate(self) -> Result<Self, ConfigError> {
        Self::new(self.width, self.height)
    }

    /// Clamp a center into the bounds for an item of `size`.
    ///
    /// An axis narrower than the item pins it to the middle of that axis.
    pub fn clamp_position(&self, pos: Vec2, size: f32) -> Vec2 {
        Vec2::new(
            clamp_axis(pos.x, size, self.width),
            clamp_axis(pos.y, size, self.height),
        )
    }

    pub fn contains(&self, pos: Vec2, size: f32) -> bool {
        pos.x >= size && pos.x <= self.width - size && pos.y >= size && pos.y <= self.height - size
    }
}

#[inline]
fn clamp_axis(v: f32, size: f32, extent: f32) -> f32 {
    if extent < 2.0 * size {
        extent / 2.0
    } else {
        v.max(size).min(extent - size)
    }
}

/// Externally tunable knobs, read every tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSimConfig")]
pub struct SimConfig {
    /// Applied at the next round start
    pub items_per_type: u32,
    /// Applied to live items immediately
    pub speed_multiplier: f32,
    /// Applied to live items immediately
    pub item_size: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            items_per_type: DEFAULT_ITEMS_PER_TYPE,
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
            item_size: DEFAULT_ITEM_SIZE,
        }
    }
}

#[derive(Deserialize)]
struct RawSimConfig {
    items_per_type: u32,
    speed_multiplier: f32,
    item_size: f32,
}

impl TryFrom<RawSimConfig> for SimConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSimConfig) -> Result<Self, Self::Error> {
        SimConfig::new(raw.items_per_type, raw.speed_multiplier, raw.item_size)
    }
}

impl SimConfig {
    pub fn new(
        items_per_type: u32,
        speed_multiplier: f32,
        item_size: f32,
    ) -> Result<Self, ConfigError> {
        if items_per_type == 0 {
            return Err(ConfigError::NoItems);
        }
        Ok(Self {
            items_per_type,
            speed_multiplier: require_positive("speed_multiplier", speed_multiplier)?,
            item_size: require_positive("item_size", item_size)?,
        })
    }

    /// Re-check a config that may have been built field by field
    pub fn validate(self) -> Result<Self, ConfigError> {
        Self::new(self.items_per_type, self.speed_multiplier, self.item_size)
    }
}

/// Fading flash left at a collision point (visual only)
#[derive(Debug, Clone, PartialEq)]
pub struct Glow {
    pub pos: Vec2,
    pub from: TypeId,
    pub to: TypeId,
    pub radius: f32,
    pub alpha: f32,
    pub lifetime: u32,
}

/// Glow tuning
pub const GLOW_START_RADIUS: f32 = 20.0;
pub const GLOW_MAX_RADIUS: f32 = 40.0;
pub const GLOW_GROWTH: f32 = 0.5;
pub const GLOW_START_ALPHA: f32 = 0.4;
pub const GLOW_FADE: f32 = 0.03;
/// Ticks before the fade starts
pub const GLOW_HOLD_TICKS: u32 = 5;
pub const GLOW_MAX_LIFETIME: u32 = 45;
/// Maximum live glows
pub const MAX_GLOWS: usize = 256;

impl Glow {
    pub fn new(pos: Vec2, from: TypeId, to: TypeId) -> Self {
        Self {
            pos,
            from,
            to,
            radius: GLOW_START_RADIUS,
            alpha: GLOW_START_ALPHA,
            lifetime: 0,
        }
    }

    /// Advance one tick; returns false once the glow has faded out
    pub fn update(&mut self) -> bool {
        self.lifetime += 1;
        if self.lifetime > GLOW_HOLD_TICKS {
            self.alpha -= GLOW_FADE;
        }
        if self.radius < GLOW_MAX_RADIUS {
            self.radius = (self.radius + GLOW_GROWTH).min(GLOW_MAX_RADIUS);
        }
        self.alpha > 0.0 && self.lifetime < GLOW_MAX_LIFETIME
    }
}

/// What a renderer needs to draw one item
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ItemView {
    pub kind: TypeId,
    pub pos: Vec2,
    pub size: f32,
    pub rotation: f32,
    /// 0.2..=0.8, grows with the type's population share
    pub glow_intensity: f32,
    pub glow_size: f32,
}

/// Complete simulation state for one arena
#[derive(Debug, Clone)]
pub struct SimState {
    /// Seed the RNG was created from
    pub seed: u64,
    pub rng: Pcg32,
    pub arena: Arena,
    /// Active items, in stable index order
    pub items: Vec<Item>,
    /// Visual glows (not gameplay-affecting)
    pub glows: Vec<Glow>,
    pub round: RoundSupervisor,
    pub sampler: DistributionSampler,
    /// Ticks since creation
    pub time_ticks: u64,
}

impl SimState {
    /// Empty state; call `start_round` to seed items
    pub fn new(arena: Arena, seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            arena,
            items: Vec::new(),
            glows: Vec::new(),
            round: RoundSupervisor::new(),
            sampler: DistributionSampler::default(),
            time_ticks: 0,
        }
    }

    /// Replace the whole item set with `items_per_type` fresh items of each type
    /// and reset per-round state.
    pub fn start_round(&mut self, ruleset: &Ruleset, config: &SimConfig, now: f64) -> SimEvent {
        self.items.clear();
        self.glows.clear();

        let distribution = self.seed_items(ruleset, config);
        self.round.begin(now, &ruleset.key, &distribution);
        self.sampler.reset(now);

        log::info!(
            "Round {} started: {} ({}) with {} items",
            self.round.round_number(),
            ruleset.name,
            distribution,
            self.items.len()
        );

        SimEvent::RoundStarted {
            round: self.round.round_number(),
            variation: ruleset.key.clone(),
            type_count: ruleset.type_count(),
            item_count: self.items.len(),
            sound: ruleset.sound,
        }
    }

    fn seed_items(&mut self, ruleset: &Ruleset, config: &SimConfig) -> Distribution {
        let size = config.item_size;
        let mult = config.speed_multiplier;
        let mut distribution = Distribution::default();

        for (kind, def) in ruleset.types.iter() {
            distribution.push(kind, &def.label, config.items_per_type);
            for _ in 0..config.items_per_type {
                let pos = Vec2::new(
                    random_axis(&mut self.rng, size, self.arena.width),
                    random_axis(&mut self.rng, size, self.arena.height),
                );
                let vel = Vec2::new(
                    self.rng.random_range(-SPAWN_SPEED..=SPAWN_SPEED),
                    self.rng.random_range(-SPAWN_SPEED..=SPAWN_SPEED),
                );
                let mut item = Item::new(kind, pos, size);
                item.base_vel = vel;
                item.vel = vel * mult;
                item.rotation = self
                    .rng
                    .random_range(-std::f32::consts::PI..std::f32::consts::PI);
                item.rotation_speed = self.rng.random_range(-SPAWN_SPIN..=SPAWN_SPIN) * mult;
                self.items.push(item);
            }
        }

        distribution
    }

    /// Spawn glows for the collision events of this tick
    pub fn spawn_glows(&mut self, events: &[SimEvent]) {
        for event in events {
            let glow = match *event {
                SimEvent::Transformed { from, to, at, .. } => Glow::new(at, from, to),
                SimEvent::Tied { a, b, at } => Glow::new(at, a, b),
                _ => continue,
            };
            if self.glows.len() >= MAX_GLOWS {
                self.glows.remove(0);
            }
            self.glows.push(glow);
        }
    }

    pub fn update_glows(&mut self) {
        self.glows.retain_mut(|g| g.update());
    }

    /// Number of distinct types still present
    pub fn distinct_types(&self) -> usize {
        stats::distinct_types(&self.items)
    }

    /// Render snapshot of all items
    pub fn item_views(&self, type_count: usize) -> Vec<ItemView> {
        let counts = stats::type_counts(&self.items, type_count);
        let total = self.items.len().max(1) as f32;
        self.items
            .iter()
            .map(|item| {
                let count = counts.get(item.kind.index()).copied().unwrap_or(0);
                let share = count as f32 / total;
                let (glow_intensity, glow_size) = stats::population_glow(share, item.size);
                ItemView {
                    kind: item.kind,
                    pos: item.pos,
                    size: item.size,
                    rotation: item.rotation,
                    glow_intensity,
                    glow_size,
                }
            })
            .collect()
    }
}

fn random_axis(rng: &mut Pcg32, size: f32, extent: f32) -> f32 {
    if extent < 2.0 * size {
        extent / 2.0
    } else {
        rng.random_range(size..=extent - size)
    }
}
