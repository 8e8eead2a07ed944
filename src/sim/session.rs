//! Host-facing simulation driver
//!
//! `Simulation` owns the state, the active ruleset and the config, and
//! handles everything that happens between rounds: restart scheduling,
//! queued ruleset swaps and random variation picks. Hosts call `tick`
//! once per frame and forward the returned events to their listeners.

use super::events::SimEvent;
use super::motion;
use super::round::RoundPhase;
use super::rules::Ruleset;
use super::state::{Arena, Glow, ItemView, SimConfig, SimState};
use super::stats::{self, DistributionSampler};
use super::tick;
use crate::error::ConfigError;
use crate::history::RoundHistory;
use crate::variations::VariationCatalog;

#[derive(Debug)]
pub struct Simulation {
    state: SimState,
    ruleset: Ruleset,
    /// Swapped in at the next round start
    pending_ruleset: Option<Ruleset>,
    config: SimConfig,
    catalog: Option<VariationCatalog>,
    random_variation: bool,
    /// Events produced outside `tick` (round starts), delivered with the next tick
    pending_events: Vec<SimEvent>,
}

impl Simulation {
    /// Seed the first round immediately. Config and arena are re-validated.
    pub fn new(
        ruleset: Ruleset,
        config: SimConfig,
        arena: Arena,
        seed: u64,
        now: f64,
    ) -> Result<Self, ConfigError> {
        let config = config.validate()?;
        let arena = arena.validate()?;
        let mut state = SimState::new(arena, seed);
        let started = state.start_round(&ruleset, &config, now);
        Ok(Self {
            state,
            ruleset,
            pending_ruleset: None,
            config,
            catalog: None,
            random_variation: false,
            pending_events: vec![started],
        })
    }

    /// Start on `variation` from `catalog`, keeping the catalog for later switches
    pub fn from_catalog(
        catalog: VariationCatalog,
        variation: &str,
        config: SimConfig,
        arena: Arena,
        seed: u64,
        now: f64,
    ) -> Result<Self, ConfigError> {
        let ruleset = catalog.ruleset(variation)?.clone();
        Ok(Self::new(ruleset, config, arena, seed, now)?.with_catalog(catalog))
    }

    pub fn with_catalog(mut self, catalog: VariationCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Run one frame at host time `now` (seconds)
    pub fn tick(&mut self, now: f64) -> Vec<SimEvent> {
        let mut events = std::mem::take(&mut self.pending_events);
        if self.state.round.restart_due(now) {
            events.push(self.next_round(now));
        }
        events.extend(tick::tick(&mut self.state, &self.ruleset, &self.config, now));
        events
    }

    /// Apply any queued ruleset (or a random pick) and seed a new round
    fn next_round(&mut self, now: f64) -> SimEvent {
        if let Some(ruleset) = self.pending_ruleset.take() {
            self.ruleset = ruleset;
        } else if self.random_variation {
            if let Some(catalog) = &self.catalog {
                let next = catalog.pick_other(&self.ruleset.key, &mut self.state.rng);
                log::info!("Random variation: {} -> {}", self.ruleset.key, next.key());
                self.ruleset = next.ruleset.clone();
            }
        }
        self.state.start_round(&self.ruleset, &self.config, now)
    }

    /// Abandon the current round and seed a new one now.
    ///
    /// A queued ruleset is applied; random variation is not consulted.
    pub fn restart_round(&mut self, now: f64) {
        if let Some(ruleset) = self.pending_ruleset.take() {
            self.ruleset = ruleset;
        }
        let started = self.state.start_round(&self.ruleset, &self.config, now);
        self.pending_events.push(started);
    }

    /// Update the knobs. Speed and size apply to live items right away;
    /// `items_per_type` waits for the next round. An invalid config is
    /// rejected and the current one kept.
    pub fn set_config(&mut self, config: SimConfig) -> Result<(), ConfigError> {
        let config = config.validate()?;
        let old = self.config;
        if config.speed_multiplier != old.speed_multiplier {
            motion::apply_speed_multiplier(
                &mut self.state.items,
                old.speed_multiplier,
                config.speed_multiplier,
            );
        }
        if config.item_size != old.item_size {
            motion::apply_item_size(
                &mut self.state.items,
                &self.state.arena,
                config.item_size,
                config.speed_multiplier,
            );
        }
        if config.items_per_type != old.items_per_type {
            log::debug!("items_per_type {} applies from the next round", config.items_per_type);
        }
        self.config = config;
        Ok(())
    }

    /// Queue a ruleset for the next round start
    pub fn set_ruleset(&mut self, ruleset: Ruleset) {
        log::info!("Ruleset {} queued for the next round", ruleset.key);
        self.pending_ruleset = Some(ruleset);
    }

    /// Switch to a catalog variation and restart the round with it
    pub fn select_variation(&mut self, key: &str, now: f64) -> Result<(), ConfigError> {
        let ruleset = self
            .catalog
            .as_ref()
            .ok_or_else(|| ConfigError::UnknownVariation(key.to_string()))?
            .ruleset(key)?
            .clone();
        log::info!("Variation set to: {}", ruleset.name);
        self.pending_ruleset = Some(ruleset);
        self.restart_round(now);
        Ok(())
    }

    pub fn set_random_variation(&mut self, enabled: bool) {
        self.random_variation = enabled;
    }

    /// Resize the arena; live items are clamped into the new bounds
    pub fn set_arena(&mut self, arena: Arena) -> Result<(), ConfigError> {
        let arena = arena.validate()?;
        self.state.arena = arena;
        for item in self.state.items.iter_mut() {
            item.pos = arena.clamp_position(item.pos, item.size);
        }
        log::debug!("Arena resized to {}x{}", arena.width, arena.height);
        Ok(())
    }

    pub fn set_sample_interval(&mut self, secs: f64) {
        self.state.sampler.set_interval(secs);
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn catalog(&self) -> Option<&VariationCatalog> {
        self.catalog.as_ref()
    }

    pub fn random_variation(&self) -> bool {
        self.random_variation
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.round.phase()
    }

    pub fn round_number(&self) -> u32 {
        self.state.round.round_number()
    }

    pub fn history(&self) -> &RoundHistory {
        self.state.round.history()
    }

    pub fn counts(&self) -> Vec<u32> {
        stats::type_counts(&self.state.items, self.ruleset.type_count())
    }

    pub fn item_views(&self) -> Vec<ItemView> {
        self.state.item_views(self.ruleset.type_count())
    }

    pub fn glows(&self) -> &[Glow] {
        &self.state.glows
    }

    pub fn sampler(&self) -> &DistributionSampler {
        &self.state.sampler
    }
}
