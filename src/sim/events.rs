//! Simulation events
//!
//! Each tick returns the events it produced. Presentation concerns (sound,
//! history UI, renderer flashes) subscribe through `SimListener` and never
//! reach into the simulation.

use glam::Vec2;
use serde::Serialize;

use super::rules::{SoundProfile, TypeId};
use crate::history::RoundRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    /// A new round was seeded
    RoundStarted {
        round: u32,
        variation: String,
        type_count: usize,
        item_count: usize,
        sound: SoundProfile,
    },
    /// Item `item` lost a collision and now has the winner's type
    Transformed {
        item: usize,
        from: TypeId,
        to: TypeId,
        at: Vec2,
    },
    /// Two unrelated types bounced without converting
    Tied { a: TypeId, b: TypeId, at: Vec2 },
    /// Only one type remains
    RoundEnded(RoundRecord),
}

/// Subscriber for simulation events; every hook defaults to a no-op
pub trait SimListener {
    fn on_round_start(
        &mut self,
        _round: u32,
        _variation: &str,
        _type_count: usize,
        _sound: &SoundProfile,
    ) {
    }
    fn on_transform(&mut self, _from: TypeId, _to: TypeId, _at: Vec2) {}
    fn on_tie(&mut self, _a: TypeId, _b: TypeId, _at: Vec2) {}
    fn on_round_end(&mut self, _record: &RoundRecord) {}
}

/// Forward events to a listener in emission order
pub fn dispatch(events: &[SimEvent], listener: &mut dyn SimListener) {
    for event in events {
        match event {
            SimEvent::RoundStarted {
                round,
                variation,
                type_count,
                sound,
                ..
            } => listener.on_round_start(*round, variation, *type_count, sound),
            SimEvent::Transformed { from, to, at, .. } => listener.on_transform(*from, *to, *at),
            SimEvent::Tied { a, b, at } => listener.on_tie(*a, *b, *at),
            SimEvent::RoundEnded(record) => listener.on_round_end(record),
        }
    }
}

/// Writes round results to the log
#[derive(Debug, Default)]
pub struct LogListener {
    pub transforms: u64,
    pub ties: u64,
}

impl SimListener for LogListener {
    fn on_transform(&mut self, _from: TypeId, _to: TypeId, _at: Vec2) {
        self.transforms += 1;
    }

    fn on_tie(&mut self, _a: TypeId, _b: TypeId, _at: Vec2) {
        self.ties += 1;
    }

    fn on_round_end(&mut self, record: &RoundRecord) {
        log::info!(
            "Round {} ({}): {} wins after {:.1}s [{}], {} conversions, {} ties",
            record.round_number,
            record.variation,
            record.winner_label,
            record.duration_secs,
            record.initial_distribution,
            self.transforms,
            self.ties
        );
        self.transforms = 0;
        self.ties = 0;
    }
}
