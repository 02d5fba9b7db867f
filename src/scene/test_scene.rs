use glam::Vec2;

use crate::components::Aabb;
use crate::scene::prefabs::{
    spawn_ceiling_spike_row, spawn_ground, spawn_hazard_disc, spawn_moving_platform,
    spawn_spike_row, spawn_static_box,
};
use crate::world::ObstacleWorld;

pub const TEST_SCENE_BODY_SIZE: Vec2 = Vec2::new(24.0, 32.0);

/// Build and populate the test scene.
/// Returns the spawn point (top-left of the body).
///
/// Layout, left to right: a start ledge, a spike pit, a bobbing platform
/// over a gap, a corridor with a low ceiling lined with spikes, a hazard
/// disc, and a wall closing the level.
pub fn load_test_scene(world: &mut ObstacleWorld) -> Vec2 {
    const FLOOR_Y: f32 = 400.0;

    // Start ledge, then the floor past the pit.
    spawn_ground(world, -200.0, FLOOR_Y, 600.0);
    spawn_ground(world, 520.0, FLOOR_Y, 300.0);
    spawn_ground(world, 1000.0, FLOOR_Y, 1000.0);

    // Spike pit between the first two floors.
    spawn_static_box(world, Aabb::new(400.0, FLOOR_Y + 64.0, 120.0, 32.0));
    spawn_spike_row(world, 400.0, FLOOR_Y + 64.0, 24.0, 24.0, 5);

    // Gap bridged by a bobbing platform.
    spawn_moving_platform(world, Aabb::new(860.0, FLOOR_Y - 40.0, 100.0, 16.0), 60.0, 3.0);

    // Low ceiling with hanging spikes: flip gravity to run along it.
    spawn_static_box(world, Aabb::new(1100.0, 200.0, 500.0, 32.0));
    spawn_ceiling_spike_row(world, 1300.0, 232.0, 20.0, 16.0, 4);

    spawn_hazard_disc(world, Vec2::new(1750.0, FLOOR_Y - 60.0), 18.0);

    // Level bounds.
    spawn_static_box(world, Aabb::new(-232.0, -200.0, 32.0, 632.0));
    spawn_static_box(world, Aabb::new(2000.0, -200.0, 32.0, 632.0));

    log::info!("test scene loaded: {} obstacles", world.len());
    Vec2::new(0.0, FLOOR_Y - TEST_SCENE_BODY_SIZE.y)
}
