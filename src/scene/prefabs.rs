use glam::Vec2;

use crate::components::{Aabb, Obstacle, ObstacleId};
use crate::world::{ObstacleWorld, Oscillator};

/// Spawn a long solid floor whose top surface sits at `top_y`, spanning
/// `[x, x + width]`. Returns the floor id.
pub fn spawn_ground(world: &mut ObstacleWorld, x: f32, top_y: f32, width: f32) -> ObstacleId {
    const THICKNESS: f32 = 32.0;
    world.spawn(Obstacle::solid_box(Aabb::new(x, top_y, width, THICKNESS)))
}

/// Spawn a static solid box (walls, ledges, ceilings).
pub fn spawn_static_box(world: &mut ObstacleWorld, bounds: Aabb) -> ObstacleId {
    world.spawn(Obstacle::solid_box(bounds))
}

/// Spawn a row of `count` upward spikes standing on `base_y`, each `width`
/// wide and `height` tall, starting at `x`.
pub fn spawn_spike_row(
    world: &mut ObstacleWorld,
    x: f32,
    base_y: f32,
    width: f32,
    height: f32,
    count: usize,
) -> Vec<ObstacleId> {
    (0..count)
        .map(|i| world.spawn(Obstacle::spike(x + i as f32 * width, base_y, width, height)))
        .collect()
}

/// Spawn a row of downward spikes hanging from `base_y`.
pub fn spawn_ceiling_spike_row(
    world: &mut ObstacleWorld,
    x: f32,
    base_y: f32,
    width: f32,
    height: f32,
    count: usize,
) -> Vec<ObstacleId> {
    (0..count)
        .map(|i| world.spawn(Obstacle::ceiling_spike(x + i as f32 * width, base_y, width, height)))
        .collect()
}

pub fn spawn_hazard_disc(world: &mut ObstacleWorld, center: Vec2, radius: f32) -> ObstacleId {
    world.spawn(Obstacle::circle(center, radius))
}

/// Spawn a platform bobbing vertically around `bounds.y`. A zero amplitude
/// or period gives a moving box that only moves through
/// [`ObstacleWorld::set_moving_y`].
pub fn spawn_moving_platform(
    world: &mut ObstacleWorld,
    bounds: Aabb,
    amplitude: f32,
    period: f32,
) -> ObstacleId {
    let obstacle = Obstacle::moving_box(bounds);
    if amplitude == 0.0 || period <= 0.0 {
        return world.spawn(obstacle);
    }
    world.spawn_oscillating(
        obstacle,
        Oscillator {
            origin_y: bounds.y,
            amplitude,
            period,
        },
    )
}
