//! Frame step
//!
//! One call per animation frame, always in the same order: motion, then
//! collisions, then glows, then the round-end check. Motion is tick-based,
//! so `now` is only used for round timing and sampling.

use super::collision;
use super::events::SimEvent;
use super::motion;
use super::rules::Ruleset;
use super::state::{SimConfig, SimState};

/// Advance the simulation by one frame and return the events it produced.
///
/// `now` is host time in seconds. Items keep moving and colliding while a
/// round is concluded and waiting for its restart.
pub fn tick(
    state: &mut SimState,
    ruleset: &Ruleset,
    config: &SimConfig,
    now: f64,
) -> Vec<SimEvent> {
    state.time_ticks += 1;
    let mut events = Vec::new();

    motion::advance(&mut state.items, &state.arena, config.speed_multiplier);
    collision::resolve(&mut state.items, ruleset, &state.arena, &mut events);

    state.update_glows();
    state.spawn_glows(&events);

    if let Some(record) = state.round.check_round_end(&state.items, &ruleset.types, now) {
        events.push(SimEvent::RoundEnded(record));
    }

    state.sampler.sample(&state.items, ruleset.type_count(), now);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT;
    use crate::sim::round::RoundPhase;
    use crate::sim::rules::TypeId;
    use crate::sim::state::{Arena, Item};
    use glam::Vec2;

    fn small_round(seed: u64) -> (SimState, Ruleset, SimConfig) {
        let ruleset = Ruleset::classic();
        let config = SimConfig::new(2, 2.0, 12.0).unwrap();
        let mut state = SimState::new(Arena::new(160.0, 160.0).unwrap(), seed);
        state.start_round(&ruleset, &config, 0.0);
        (state, ruleset, config)
    }

    fn ended(events: &[SimEvent]) -> usize {
        events.iter().filter(|e| matches!(e, SimEvent::RoundEnded(_))).count()
    }

    #[test]
    fn test_small_rounds_converge() {
        for seed in [1, 2, 3, 42, 1234] {
            let (mut state, ruleset, config) = small_round(seed);
            let mut record = None;
            for t in 1..=100_000u64 {
                let now = t as f64 * FRAME_DT;
                let events = tick(&mut state, &ruleset, &config, now);
                record = events.into_iter().find_map(|e| match e {
                    SimEvent::RoundEnded(record) => Some(record),
                    _ => None,
                });
                if record.is_some() {
                    break;
                }
            }

            let record = record.unwrap_or_else(|| panic!("seed {} did not converge", seed));
            assert_eq!(state.distinct_types(), 1);
            assert_eq!(state.items.len(), 6);
            assert_eq!(state.items[0].kind, record.winner);
            assert!(matches!(state.round.phase(), RoundPhase::Concluded { .. }));
        }
    }

    #[test]
    fn test_converged_round_ends_once() {
        let ruleset = Ruleset::classic();
        let config = SimConfig::default();
        let mut state = SimState::new(Arena::new(400.0, 400.0).unwrap(), 5);
        state.start_round(&ruleset, &config, 0.0);
        for item in state.items.iter_mut() {
            item.kind = TypeId(1);
        }

        let first = tick(&mut state, &ruleset, &config, 1.0);
        let second = tick(&mut state, &ruleset, &config, 1.1);
        assert_eq!(ended(&first), 1);
        assert_eq!(ended(&second), 0);
        assert_eq!(state.round.history().len(), 1);
    }

    #[test]
    fn test_items_keep_moving_after_conclusion() {
        let ruleset = Ruleset::classic();
        let config = SimConfig::default();
        let mut state = SimState::new(Arena::new(400.0, 400.0).unwrap(), 5);
        state.start_round(&ruleset, &config, 0.0);
        state.items = vec![
            Item::new(TypeId(0), Vec2::new(200.0, 200.0), 30.0)
                .with_velocity(Vec2::new(1.0, 0.0)),
        ];

        tick(&mut state, &ruleset, &config, 1.0);
        let x = state.items[0].pos.x;
        tick(&mut state, &ruleset, &config, 1.1);
        assert!(state.items[0].pos.x > x);
    }

    #[test]
    fn test_collision_spawns_glow_and_sample() {
        let ruleset = Ruleset::classic();
        let config = SimConfig::default();
        let mut state = SimState::new(Arena::new(400.0, 400.0).unwrap(), 5);
        state.start_round(&ruleset, &config, 0.0);
        // Rock beats scissors
        state.items = vec![
            Item::new(TypeId(0), Vec2::new(100.0, 100.0), 30.0).with_velocity(Vec2::new(1.0, 0.0)),
            Item::new(TypeId(2), Vec2::new(150.0, 100.0), 30.0).with_velocity(Vec2::new(-1.0, 0.0)),
        ];

        let events = tick(&mut state, &ruleset, &config, 0.0);
        assert!(events.iter().any(|e| matches!(e, SimEvent::Transformed { to: TypeId(0), .. })));
        assert_eq!(state.glows.len(), 1);
        assert_eq!(state.sampler.len(), 1);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let (mut a, ruleset, config) = small_round(77);
        let (mut b, _, _) = small_round(77);
        for t in 0..500 {
            let now = t as f64 * FRAME_DT;
            assert_eq!(tick(&mut a, &ruleset, &config, now), tick(&mut b, &ruleset, &config, now));
        }
        assert_eq!(a.items, b.items);
    }
}
