//! Motion integrator
//!
//! Tick-based: each tick moves an item by exactly its velocity, so motion is
//! tied to the frame rate rather than wall-clock time.

use super::state::{Arena, Item};
use crate::consts::*;
use crate::normalize_angle;

/// Allowed speed band `(min, max)` for an item of `size`.
///
/// Smaller items may move faster; both ends scale with the multiplier.
#[inline]
pub fn speed_band(size: f32, speed_multiplier: f32) -> (f32, f32) {
    let max = MAX_SPEED_FACTOR * speed_multiplier * (REFERENCE_SIZE / size.max(MIN_SPEED_SIZE));
    let min = MIN_SPEED_FACTOR * speed_multiplier;
    (min, max)
}

/// Rescale velocity into the speed band, keeping its direction.
///
/// A stopped item stays stopped: it has no direction to rescale.
pub fn clamp_velocity(item: &mut Item, speed_multiplier: f32) {
    let speed = item.vel.length();
    if speed <= 0.0 || !speed.is_finite() {
        return;
    }
    let (min, max) = speed_band(item.size, speed_multiplier);
    if speed > max {
        item.vel *= max / speed;
    } else if speed < min {
        item.vel *= min / speed;
    }
}

/// Move every item one tick and bounce it off the arena walls
pub fn advance(items: &mut [Item], arena: &Arena, speed_multiplier: f32) {
    for item in items.iter_mut() {
        clamp_velocity(item, speed_multiplier);
        item.pos += item.vel;
        item.rotation = normalize_angle(item.rotation + item.rotation_speed);
        reflect_walls(item, arena);
    }
}

/// Point velocity back inside on any wall the item crossed, then clamp it in
fn reflect_walls(item: &mut Item, arena: &Arena) {
    let size = item.size;
    if item.pos.x < size {
        item.vel.x = item.vel.x.abs();
    } else if item.pos.x > arena.width - size {
        item.vel.x = -item.vel.x.abs();
    }
    if item.pos.y < size {
        item.vel.y = item.vel.y.abs();
    } else if item.pos.y > arena.height - size {
        item.vel.y = -item.vel.y.abs();
    }
    item.pos = arena.clamp_position(item.pos, size);
}

/// Rescale live items for a new speed multiplier.
///
/// Velocity snaps back to `base_vel * new`; spin scales by `new / old`.
pub fn apply_speed_multiplier(items: &mut [Item], old: f32, new: f32) {
    if !(new.is_finite() && new > 0.0 && old > 0.0) {
        return;
    }
    let ratio = new / old;
    for item in items.iter_mut() {
        item.vel = item.base_vel * new;
        item.rotation_speed *= ratio;
    }
    log::debug!("Speed multiplier {} -> {} applied to {} items", old, new, items.len());
}

/// Resize live items without restarting the round.
///
/// Mass follows the new size and speed scales by `sqrt(old_mass / new_mass)`,
/// then items are clamped into the arena and pushed apart.
pub fn apply_item_size(items: &mut [Item], arena: &Arena, new_size: f32, speed_multiplier: f32) {
    if !(new_size.is_finite() && new_size > 0.0) {
        return;
    }
    for item in items.iter_mut() {
        let old_mass = item.mass;
        item.size = new_size;
        item.mass = Item::mass_for(new_size);

        let scale = (old_mass / item.mass).sqrt();
        item.vel *= scale;
        if speed_multiplier > 0.0 {
            item.base_vel = item.vel / speed_multiplier;
        }
        item.pos = arena.clamp_position(item.pos, new_size);
    }
    separate_overlaps(items, arena);
    log::debug!("Item size {} applied to {} items", new_size, items.len());
}

/// Push overlapping pairs apart without touching velocity.
///
/// Runs up to `OVERLAP_PASSES` passes and stops early once nothing overlaps.
/// Pairs sharing a center are left alone (no separation direction).
pub fn separate_overlaps(items: &mut [Item], arena: &Arena) {
    for _ in 0..OVERLAP_PASSES {
        let mut found = false;
        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                let delta = items[j].pos - items[i].pos;
                let dist = delta.length();
                let min_dist = items[i].size + items[j].size;
                if dist >= min_dist || dist <= f32::EPSILON {
                    continue;
                }
                found = true;
                let normal = delta / dist;
                let push = (min_dist - dist) / 2.0 + OVERLAP_BUFFER;
                items[i].pos -= normal * push;
                items[j].pos += normal * push;
            }
        }
        if !found {
            break;
        }
    }

    for item in items.iter_mut() {
        item.pos = arena.clamp_position(item.pos, item.size);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::rules::TypeId;
    use glam::Vec2;
    use proptest::prelude::*;

    fn arena() -> Arena {
        Arena::new(200.0, 100.0).unwrap()
    }

    fn item_at(x: f32, y: f32, vel: Vec2) -> Item {
        Item::new(TypeId(0), Vec2::new(x, y), 5.0).with_velocity(vel)
    }

    #[test]
    fn test_moves_by_velocity() {
        let mut items = vec![item_at(50.0, 50.0, Vec2::new(1.0, -0.5))];
        advance(&mut items, &arena(), 1.0);
        assert_eq!(items[0].pos, Vec2::new(51.0, 49.5));
    }

    #[test]
    fn test_reflects_at_left_wall_boundary() {
        // Exactly at x = size, moving left
        let mut items = vec![item_at(5.0, 50.0, Vec2::new(-1.0, 0.0))];
        advance(&mut items, &arena(), 1.0);
        assert!(items[0].vel.x > 0.0);
        assert_eq!(items[0].pos.x, 5.0);
    }

    #[test]
    fn test_reflects_at_bottom_wall() {
        let mut items = vec![item_at(50.0, 94.5, Vec2::new(0.0, 1.0))];
        advance(&mut items, &arena(), 1.0);
        assert!(items[0].vel.y < 0.0);
        assert_eq!(items[0].pos.y, 95.0);
    }

    #[test]
    fn test_speed_band_clamps() {
        let (min, max) = speed_band(30.0, 1.0);
        assert_eq!((min, max), (0.5, 5.0));

        let mut fast = item_at(50.0, 50.0, Vec2::new(30.0, 40.0));
        fast.size = 30.0;
        clamp_velocity(&mut fast, 1.0);
        assert!((fast.vel.length() - 5.0).abs() < 1e-4);
        assert!((fast.vel.x / fast.vel.y - 0.75).abs() < 1e-4);

        let mut slow = item_at(50.0, 50.0, Vec2::new(0.1, 0.0));
        clamp_velocity(&mut slow, 2.0);
        assert!((slow.vel.length() - 1.0).abs() < 1e-5);

        let mut stopped = item_at(50.0, 50.0, Vec2::ZERO);
        clamp_velocity(&mut stopped, 1.0);
        assert_eq!(stopped.vel, Vec2::ZERO);
    }

    #[test]
    fn test_small_items_move_faster() {
        let (_, small) = speed_band(10.0, 1.0);
        let (_, big) = speed_band(60.0, 1.0);
        assert!(small > big);
        // Below the floor size the cap stops growing
        assert_eq!(speed_band(2.0, 1.0), speed_band(10.0, 1.0));
    }

    #[test]
    fn test_speed_multiplier_restores_base_velocity() {
        let mut items = vec![item_at(50.0, 50.0, Vec2::new(1.0, 1.0))];
        items[0].rotation_speed = 0.02;
        items[0].vel = Vec2::new(-3.0, 0.2); // after some bounces

        apply_speed_multiplier(&mut items, 1.0, 2.0);
        assert_eq!(items[0].vel, Vec2::new(2.0, 2.0));
        assert!((items[0].rotation_speed - 0.04).abs() < 1e-6);

        // Invalid multipliers are ignored
        apply_speed_multiplier(&mut items, 2.0, 0.0);
        assert_eq!(items[0].vel, Vec2::new(2.0, 2.0));
    }

    #[test]
    fn test_item_size_rescales_mass_and_speed() {
        let mut items = vec![item_at(50.0, 50.0, Vec2::new(2.0, 0.0))];
        apply_item_size(&mut items, &arena(), 10.0, 1.0);
        assert_eq!(items[0].size, 10.0);
        assert!((items[0].mass - 100.0 / 900.0).abs() < 1e-6);
        // sqrt(m_old / m_new) = old_size / new_size = 0.5
        assert!((items[0].vel.x - 1.0).abs() < 1e-5);
        assert_eq!(items[0].base_vel, items[0].vel);
    }

    #[test]
    fn test_item_size_separates_overlaps() {
        let mut items = vec![
            item_at(50.0, 50.0, Vec2::ZERO),
            item_at(60.0, 50.0, Vec2::ZERO),
        ];
        apply_item_size(&mut items, &arena(), 8.0, 1.0);
        let gap = items[0].pos.distance(items[1].pos);
        assert!(gap >= 16.0);
        assert_eq!(items[0].vel, Vec2::ZERO);
    }

    #[test]
    fn test_item_size_pulls_items_inside() {
        let mut items = vec![item_at(195.0, 95.0, Vec2::ZERO)];
        apply_item_size(&mut items, &arena(), 20.0, 1.0);
        assert_eq!(items[0].pos, Vec2::new(180.0, 80.0));
    }

    proptest! {
        #[test]
        fn prop_positions_stay_in_bounds(
            x in 5.0f32..195.0,
            y in 5.0f32..95.0,
            vx in -50.0f32..50.0,
            vy in -50.0f32..50.0,
            mult in 0.1f32..5.0,
            ticks in 1usize..50,
        ) {
            let arena = arena();
            let mut items = vec![item_at(x, y, Vec2::new(vx, vy))];
            for _ in 0..ticks {
                advance(&mut items, &arena, mult);
                prop_assert!(arena.contains(items[0].pos, items[0].size));
            }
        }
    }
}
