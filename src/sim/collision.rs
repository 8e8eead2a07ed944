//! Collision detection and response between items
//!
//! Every overlapping pair bounces with a mass-weighted impulse; pairs of
//! different types then consult the beats-graph and either convert the
//! loser or report a tie.

use super::events::SimEvent;
use super::rules::{Matchup, Ruleset};
use super::state::{Arena, Item};
use crate::consts::*;
use crate::error::TransientStateError;

/// True when the two circles overlap (touching does not count)
#[inline]
pub fn overlaps(a: &Item, b: &Item) -> bool {
    let reach = a.size + b.size;
    a.pos.distance_squared(b.pos) < reach * reach
}

/// Mutable access to two distinct items, `i < j`
fn pair_mut(items: &mut [Item], i: usize, j: usize) -> (&mut Item, &mut Item) {
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// Elastic bounce between items `i < j`.
///
/// Applies the restitution impulse along the collision normal, corrects
/// penetration in proportion to inverse mass and damps both velocities.
/// Pairs already separating are left untouched.
pub fn bounce(items: &mut [Item], i: usize, j: usize) -> Result<(), TransientStateError> {
    let (a, b) = pair_mut(items, i, j);

    let delta = a.pos - b.pos;
    let dist = delta.length();
    let min_dist = a.size + b.size;
    if dist >= min_dist {
        return Ok(());
    }
    if dist <= f32::EPSILON {
        return Err(TransientStateError::CoincidentCenters { a: i, b: j });
    }

    // Normal points from b to a
    let normal = delta / dist;
    let vel_along_normal = (a.vel - b.vel).dot(normal);
    if vel_along_normal > 0.0 {
        return Ok(());
    }

    let inv_a = a.inverse_mass();
    let inv_b = b.inverse_mass();
    let inv_total = inv_a + inv_b;

    let impulse = normal * (-(1.0 + RESTITUTION) * vel_along_normal / inv_total);
    a.vel += impulse * inv_a;
    b.vel -= impulse * inv_b;

    let overlap = min_dist - dist;
    let correction = normal * (overlap * PENETRATION_CORRECTION / inv_total);
    a.pos += correction * inv_a;
    b.pos -= correction * inv_b;

    a.vel *= COLLISION_DAMPING;
    b.vel *= COLLISION_DAMPING;
    Ok(())
}

/// One O(n²) pass over all pairs in index order.
///
/// Conversions take effect immediately, so later pairs in the same pass
/// see the updated types. Transform and tie events are reported at the
/// midpoint of the two centers as they were when the overlap was found.
pub fn resolve(items: &mut [Item], ruleset: &Ruleset, arena: &Arena, events: &mut Vec<SimEvent>) {
    for i in 0..items.len() {
        for j in (i + 1)..items.len() {
            if !overlaps(&items[i], &items[j]) {
                continue;
            }
            let at = items[i].pos.midpoint(items[j].pos);

            match bounce(items, i, j) {
                Ok(()) => {
                    items[i].pos = arena.clamp_position(items[i].pos, items[i].size);
                    items[j].pos = arena.clamp_position(items[j].pos, items[j].size);
                }
                Err(err) => log::debug!("Skipping bounce: {}", err),
            }

            let (a, b) = (items[i].kind, items[j].kind);
            if a == b {
                continue;
            }
            match ruleset.matchup(a, b) {
                Matchup::Wins => {
                    items[j].kind = a;
                    events.push(SimEvent::Transformed {
                        item: j,
                        from: b,
                        to: a,
                        at,
                    });
                }
                Matchup::Loses => {
                    items[i].kind = b;
                    events.push(SimEvent::Transformed {
                        item: i,
                        from: a,
                        to: b,
                        at,
                    });
                }
                Matchup::Tie => events.push(SimEvent::Tied { a, b, at }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rules::{SoundProfile, TypeDef, TypeId};
    use glam::Vec2;
    use proptest::prelude::*;

    fn two_type_ruleset(a_beats_b: bool) -> Ruleset {
        let types = vec![TypeDef::new("a", "A", "#f00"), TypeDef::new("b", "B", "#00f")];
        let rules = if a_beats_b {
            vec![("a".to_string(), "b".to_string())]
        } else {
            Vec::new()
        };
        Ruleset::new("pair", "Pair", types, &rules, SoundProfile::default()).unwrap()
    }

    fn big_arena() -> Arena {
        Arena::new(1000.0, 1000.0).unwrap()
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Item::new(TypeId(0), Vec2::new(0.0, 0.0), 5.0);
        let touching = Item::new(TypeId(0), Vec2::new(10.0, 0.0), 5.0);
        let inside = Item::new(TypeId(0), Vec2::new(9.9, 0.0), 5.0);
        assert!(!overlaps(&a, &touching));
        assert!(overlaps(&a, &inside));
    }

    #[test]
    fn test_winner_converts_loser_at_midpoint() {
        let ruleset = two_type_ruleset(true);
        let mut items = vec![
            Item::new(TypeId(0), Vec2::new(10.0, 10.0), 5.0).with_velocity(Vec2::new(1.0, 0.0)),
            Item::new(TypeId(1), Vec2::new(14.0, 10.0), 5.0),
        ];
        let mut events = Vec::new();

        resolve(&mut items, &ruleset, &big_arena(), &mut events);

        assert_eq!(items[1].kind, TypeId(0));
        assert_eq!(
            events,
            vec![SimEvent::Transformed {
                item: 1,
                from: TypeId(1),
                to: TypeId(0),
                at: Vec2::new(12.0, 10.0),
            }]
        );
    }

    #[test]
    fn test_loser_first_in_order_is_converted() {
        let ruleset = two_type_ruleset(true);
        let mut items = vec![
            Item::new(TypeId(1), Vec2::new(100.0, 100.0), 5.0),
            Item::new(TypeId(0), Vec2::new(104.0, 100.0), 5.0),
        ];
        let mut events = Vec::new();
        resolve(&mut items, &ruleset, &big_arena(), &mut events);

        assert_eq!(items[0].kind, TypeId(0));
        assert!(matches!(
            events[0],
            SimEvent::Transformed { item: 0, from: TypeId(1), to: TypeId(0), .. }
        ));
    }

    #[test]
    fn test_unrelated_types_tie() {
        let ruleset = two_type_ruleset(false);
        let mut items = vec![
            Item::new(TypeId(0), Vec2::new(100.0, 100.0), 5.0).with_velocity(Vec2::new(1.0, 0.0)),
            Item::new(TypeId(1), Vec2::new(106.0, 100.0), 5.0).with_velocity(Vec2::new(-1.0, 0.0)),
        ];
        let mut events = Vec::new();
        resolve(&mut items, &ruleset, &big_arena(), &mut events);

        assert_eq!((items[0].kind, items[1].kind), (TypeId(0), TypeId(1)));
        assert_eq!(
            events,
            vec![SimEvent::Tied {
                a: TypeId(0),
                b: TypeId(1),
                at: Vec2::new(103.0, 100.0),
            }]
        );
        // Head-on: both reversed
        assert!(items[0].vel.x < 0.0 && items[1].vel.x > 0.0);
    }

    #[test]
    fn test_same_type_bounces_silently() {
        let ruleset = two_type_ruleset(true);
        let mut items = vec![
            Item::new(TypeId(0), Vec2::new(100.0, 100.0), 5.0).with_velocity(Vec2::new(1.0, 0.0)),
            Item::new(TypeId(0), Vec2::new(108.0, 100.0), 5.0),
        ];
        let mut events = Vec::new();
        resolve(&mut items, &ruleset, &big_arena(), &mut events);
        assert!(events.is_empty());
        assert!(items[1].vel.x > 0.0);
    }

    #[test]
    fn test_equal_mass_head_on_impulse() {
        let mut items = vec![
            Item::new(TypeId(0), Vec2::new(0.0, 0.0), 30.0).with_velocity(Vec2::new(2.0, 0.0)),
            Item::new(TypeId(0), Vec2::new(50.0, 0.0), 30.0).with_velocity(Vec2::new(-2.0, 0.0)),
        ];
        bounce(&mut items, 0, 1).unwrap();

        // Relative speed 4, restitution 0.8, equal unit masses: each gets Δv = 3.6
        assert!((items[0].vel.x - (-1.6 * 0.99)).abs() < 1e-4);
        assert!((items[1].vel.x - (1.6 * 0.99)).abs() < 1e-4);
        // Overlap 10, 80% corrected and split evenly
        assert!((items[0].pos.x - (-4.0)).abs() < 1e-4);
        assert!((items[1].pos.x - 54.0).abs() < 1e-4);
    }

    #[test]
    fn test_heavier_item_moves_less() {
        let mut items = vec![
            Item::new(TypeId(0), Vec2::new(0.0, 0.0), 40.0),
            Item::new(TypeId(0), Vec2::new(50.0, 0.0), 20.0).with_velocity(Vec2::new(-3.0, 0.0)),
        ];
        bounce(&mut items, 0, 1).unwrap();
        assert!(items[0].vel.x.abs() < items[1].vel.x.abs());
        assert!(items[0].pos.x.abs() < (items[1].pos.x - 50.0).abs());
    }

    #[test]
    fn test_separating_pair_is_untouched() {
        let mut items = vec![
            Item::new(TypeId(0), Vec2::new(0.0, 0.0), 10.0).with_velocity(Vec2::new(-1.0, 0.0)),
            Item::new(TypeId(0), Vec2::new(15.0, 0.0), 10.0).with_velocity(Vec2::new(1.0, 0.0)),
        ];
        let before = items.clone();
        bounce(&mut items, 0, 1).unwrap();
        assert_eq!(items, before);
    }

    #[test]
    fn test_coincident_centers_skip_bounce_but_still_convert() {
        let ruleset = two_type_ruleset(true);
        let mut items = vec![
            Item::new(TypeId(1), Vec2::new(50.0, 50.0), 5.0).with_velocity(Vec2::new(1.0, 0.0)),
            Item::new(TypeId(0), Vec2::new(50.0, 50.0), 5.0),
        ];
        assert_eq!(
            bounce(&mut items, 0, 1),
            Err(TransientStateError::CoincidentCenters { a: 0, b: 1 })
        );

        let mut events = Vec::new();
        resolve(&mut items, &ruleset, &big_arena(), &mut events);
        assert_eq!(items[0].vel, Vec2::new(1.0, 0.0));
        assert_eq!(items[0].pos, Vec2::new(50.0, 50.0));
        assert_eq!(items[0].kind, TypeId(0));
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_conversion_carries_through_the_pass() {
        // 0 (A) converts 1 (B); the converted 1 then meets 2 (B) as an A
        let ruleset = two_type_ruleset(true);
        let mut items = vec![
            Item::new(TypeId(0), Vec2::new(100.0, 100.0), 5.0),
            Item::new(TypeId(1), Vec2::new(108.0, 100.0), 5.0),
            Item::new(TypeId(1), Vec2::new(116.0, 100.0), 5.0),
        ];
        let mut events = Vec::new();
        resolve(&mut items, &ruleset, &big_arena(), &mut events);
        assert!(items.iter().all(|i| i.kind == TypeId(0)));
        assert_eq!(events.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_resolve_keeps_count_and_bounds(
            seeds in prop::collection::vec(
                (10.0f32..190.0, 10.0f32..190.0, -3.0f32..3.0, -3.0f32..3.0, 0u16..3),
                2..24,
            )
        ) {
            let ruleset = Ruleset::classic();
            let arena = Arena::new(200.0, 200.0).unwrap();
            let mut items: Vec<Item> = seeds
                .iter()
                .map(|&(x, y, vx, vy, k)| {
                    Item::new(TypeId(k), Vec2::new(x, y), 10.0).with_velocity(Vec2::new(vx, vy))
                })
                .collect();
            let n = items.len();
            let mut events = Vec::new();

            resolve(&mut items, &ruleset, &arena, &mut events);

            prop_assert_eq!(items.len(), n);
            for item in &items {
                prop_assert!(arena.contains(item.pos, item.size));
                prop_assert!(item.kind.index() < 3);
            }
        }
    }
}
