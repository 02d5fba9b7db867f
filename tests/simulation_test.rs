//! End-to-end ticks through `Simulation`: landing, jumping, gravity flips,
//! moving platforms, hazards and fast-body sweeps.
//!
//! Run with: cargo test --test simulation_test

use flipside::components::{Aabb, Obstacle, ObstacleId};
use flipside::engine::events::PhysicsEvent;
use flipside::engine::input::MovementInput;
use flipside::scene::prefabs::spawn_moving_platform;
use flipside::systems::PHYSICS_DT;
use flipside::{ObstacleWorld, PhysicsConfig, Simulation};
use glam::Vec2;

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

const BODY: Vec2 = Vec2::new(20.0, 20.0);
const FLOOR: Aabb = Aabb::new(0.0, 100.0, 400.0, 20.0);

/// Default tuning with the hitbox equal to the body rectangle.
fn config() -> PhysicsConfig {
    PhysicsConfig {
        hitbox_inset: 0.0,
        ..PhysicsConfig::default()
    }
}

fn sim_with(obstacles: &[Obstacle], spawn: Vec2, size: Vec2) -> (Simulation, Vec<ObstacleId>) {
    let mut world = ObstacleWorld::new();
    let ids = obstacles.iter().map(|o| world.spawn(*o)).collect();
    (Simulation::new(config(), world, spawn, size), ids)
}

fn run(sim: &mut Simulation, ticks: usize, input: MovementInput) -> Vec<PhysicsEvent> {
    let mut events = Vec::new();
    for _ in 0..ticks {
        sim.tick(input);
        events.extend(sim.drain_events());
    }
    events
}

/// Tick with `input` until `done` holds, returning the number of ticks taken.
fn run_until(
    sim: &mut Simulation,
    max_ticks: usize,
    input: MovementInput,
    mut done: impl FnMut(&Simulation) -> bool,
) -> Option<usize> {
    for i in 1..=max_ticks {
        sim.tick(input);
        if done(sim) {
            return Some(i);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Landing and resting
// ---------------------------------------------------------------------------

#[test]
fn landing_scenario_single_tick() {
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 80.0), BODY);

    sim.tick(MovementInput::empty());

    let body = sim.body();
    assert!((body.position.y - 80.0).abs() < 1e-4, "y = {}", body.position.y);
    assert_eq!(body.velocity.y, 0.0);
    assert!(body.on_ground());
    assert_eq!(sim.drain_events().collect::<Vec<_>>(), vec![PhysicsEvent::Grounded]);
}

#[test]
fn resting_body_stays_put_and_grounds_once() {
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 80.0), BODY);

    let events = run(&mut sim, 240, MovementInput::empty());

    assert!((sim.body().position.y - 80.0).abs() < 1e-3);
    assert!(sim.body().on_ground());
    assert_eq!(events, vec![PhysicsEvent::Grounded]);
}

#[test]
fn falling_body_lands_on_top_of_floor() {
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 0.0), BODY);

    let ticks = run_until(&mut sim, 120, MovementInput::empty(), |s| s.body().on_ground());

    assert!(ticks.is_some());
    assert!((sim.body().position.y - 80.0).abs() < 1e-3);
}

#[test]
fn walking_into_wall_stops_and_sets_wall_flag() {
    let wall = Aabb::new(200.0, 0.0, 20.0, 100.0);
    let (mut sim, _) = sim_with(
        &[Obstacle::solid_box(FLOOR), Obstacle::solid_box(wall)],
        Vec2::new(150.0, 80.0),
        BODY,
    );

    let hit = run_until(&mut sim, 120, MovementInput::MOVE_RIGHT, |s| s.body().on_wall());

    assert!(hit.is_some());
    assert_eq!(sim.body().velocity.x, 0.0);
    assert!(sim.body().position.x + BODY.x <= 200.0 + 1e-3);
}

#[test]
fn ceiling_bump_sets_ceiling_flag() {
    let ceiling = Aabb::new(0.0, 50.0, 400.0, 20.0);
    let (mut sim, _) = sim_with(
        &[Obstacle::solid_box(FLOOR), Obstacle::solid_box(ceiling)],
        Vec2::new(50.0, 80.0),
        BODY,
    );
    run(&mut sim, 5, MovementInput::empty());

    sim.tick(MovementInput::JUMP);
    let bumped = run_until(&mut sim, 10, MovementInput::empty(), |s| s.body().on_ceiling());

    assert!(bumped.is_some());
    assert!(sim.body().position.y >= 70.0 - 1e-3);
    assert_eq!(sim.body().velocity.y, 0.0);
}

// ---------------------------------------------------------------------------
// Jumping: coyote time and buffering
// ---------------------------------------------------------------------------

#[test]
fn jump_from_ground() {
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 80.0), BODY);
    run(&mut sim, 3, MovementInput::empty());

    let events = run(&mut sim, 1, MovementInput::JUMP);

    assert!(events.contains(&PhysicsEvent::Jumped));
    assert!(sim.body().velocity.y < 0.0);
    assert!(sim.body().position.y < 80.0);
}

/// Walk off the end of a short floor and report the simulation a few ticks
/// after leaving it.
fn walk_off_ledge(airborne_ticks: usize) -> Simulation {
    let ledge = Aabb::new(0.0, 100.0, 100.0, 20.0);
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(ledge)], Vec2::new(40.0, 80.0), BODY);
    sim.integrator_mut().set_velocity(Vec2::new(300.0, 0.0));

    let mut was_grounded = false;
    let left = run_until(&mut sim, 60, MovementInput::MOVE_RIGHT, |s| {
        let grounded = s.body().on_ground();
        let left = was_grounded && !grounded;
        was_grounded |= grounded;
        left
    });
    assert!(left.is_some(), "never walked off the ledge");
    run(&mut sim, airborne_ticks, MovementInput::MOVE_RIGHT);
    sim.drain_events().for_each(drop);
    sim
}

#[test]
fn coyote_jump_within_grace_window() {
    let mut sim = walk_off_ledge(2);

    let events = run(&mut sim, 1, MovementInput::JUMP | MovementInput::MOVE_RIGHT);

    assert!(events.contains(&PhysicsEvent::Jumped));
    assert!(sim.body().velocity.y < 0.0);
}

#[test]
fn no_coyote_jump_after_grace_window() {
    let mut sim = walk_off_ledge(8);

    let events = run(&mut sim, 1, MovementInput::JUMP | MovementInput::MOVE_RIGHT);

    assert!(!events.contains(&PhysicsEvent::Jumped));
    assert!(sim.body().velocity.y > 0.0);
    assert!(sim.integrator().has_buffered_jump());
}

#[test]
fn buffered_jump_fires_on_landing() {
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 75.0), BODY);

    let mut events = run(&mut sim, 1, MovementInput::JUMP);
    assert!(events.is_empty(), "airborne jump must buffer, got {events:?}");
    events.extend(run(&mut sim, 6, MovementInput::empty()));

    let landed = events.iter().position(|e| *e == PhysicsEvent::Grounded);
    let consumed = events.iter().position(|e| *e == PhysicsEvent::JumpBufferConsumed);
    let jumped = events.iter().position(|e| *e == PhysicsEvent::Jumped);
    assert!(landed.is_some() && consumed.is_some() && jumped.is_some(), "{events:?}");
    assert!(landed < consumed && consumed < jumped);
    assert!(!sim.integrator().has_buffered_jump());
}

#[test]
fn expired_buffer_does_not_jump() {
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 0.0), BODY);

    let mut events = run(&mut sim, 1, MovementInput::JUMP);
    events.extend(run(&mut sim, 60, MovementInput::empty()));

    assert!(events.contains(&PhysicsEvent::Grounded));
    assert!(!events.contains(&PhysicsEvent::Jumped));
    assert!(sim.body().on_ground());
}

// ---------------------------------------------------------------------------
// Gravity inversion
// ---------------------------------------------------------------------------

#[test]
fn inverted_gravity_lands_on_ceiling() {
    let ceiling = Aabb::new(0.0, -20.0, 400.0, 20.0);
    let (mut sim, _) = sim_with(
        &[Obstacle::solid_box(FLOOR), Obstacle::solid_box(ceiling)],
        Vec2::new(50.0, 80.0),
        BODY,
    );
    run(&mut sim, 5, MovementInput::empty());

    sim.invert_gravity();
    let mut events: Vec<PhysicsEvent> = sim.drain_events().collect();
    assert_eq!(events, vec![PhysicsEvent::GravityChanged { inverted: true }]);

    run_until(&mut sim, 10, MovementInput::empty(), |s| !s.body().on_ground());
    let landed = run_until(&mut sim, 120, MovementInput::empty(), |s| s.body().on_ground());
    events.extend(sim.drain_events());

    assert!(landed.is_some());
    assert!(sim.body().position.y.abs() < 1e-3, "y = {}", sim.body().position.y);
    assert!(!sim.body().on_ceiling());
    assert!(events.contains(&PhysicsEvent::Grounded));

    // Jumping while inverted pushes toward +y.
    sim.tick(MovementInput::JUMP);
    assert!(sim.body().velocity.y > 0.0);
}

#[test]
fn gravity_ramps_instead_of_snapping() {
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 80.0), BODY);
    run(&mut sim, 2, MovementInput::empty());

    sim.invert_gravity();
    sim.tick(MovementInput::empty());

    let g = sim.integrator().gravity();
    assert!(g > sim.config().gravity_inverted && g < sim.config().gravity_normal);
}

// ---------------------------------------------------------------------------
// Moving platforms and hazards
// ---------------------------------------------------------------------------

#[test]
fn raised_platform_pushes_body_up() {
    let platform = Aabb::new(0.0, 100.0, 400.0, 10.0);
    let (mut sim, ids) = sim_with(&[Obstacle::moving_box(platform)], Vec2::new(50.0, 80.0), BODY);
    run(&mut sim, 5, MovementInput::empty());

    sim.world_mut().set_moving_y(ids[0], 90.0).unwrap();
    sim.tick(MovementInput::empty());

    assert!((sim.body().position.y - 70.0).abs() < 1e-3, "y = {}", sim.body().position.y);
    assert!(sim.body().on_ground());
}

#[test]
fn body_rides_oscillating_platform() {
    let mut world = ObstacleWorld::new();
    let platform = spawn_moving_platform(&mut world, Aabb::new(0.0, 100.0, 400.0, 10.0), 30.0, 2.0);
    let mut sim = Simulation::new(config(), world, Vec2::new(50.0, 80.0), BODY);

    for tick in 0..360 {
        sim.tick(MovementInput::empty());
        let top = sim.world().get(platform).unwrap().effective_bounds().y;
        let bottom = sim.body().position.y + BODY.y;
        assert!(bottom <= top + 1e-3, "tick {tick}: sank into the platform ({bottom} > {top})");
        assert!(top - bottom < 5.0, "tick {tick}: left the platform ({bottom} vs {top})");
    }
}

#[test]
fn spike_reports_hazard_without_blocking() {
    let spike = Obstacle::spike(120.0, 100.0, 20.0, 20.0);
    let (mut sim, ids) = sim_with(
        &[Obstacle::solid_box(FLOOR), spike],
        Vec2::new(60.0, 80.0),
        BODY,
    );

    let events = run(&mut sim, 60, MovementInput::MOVE_RIGHT);

    assert!(events.contains(&PhysicsEvent::HazardContact { id: ids[1] }));
    assert!(sim.body().position.x > 140.0, "spikes must not push the body");
}

#[test]
fn hazard_disc_reports_contact() {
    let disc = Obstacle::circle(Vec2::new(60.0, 60.0), 8.0);
    let (mut sim, ids) = sim_with(&[Obstacle::solid_box(FLOOR), disc], Vec2::new(50.0, 0.0), BODY);

    let events = run(&mut sim, 30, MovementInput::empty());

    assert!(events.contains(&PhysicsEvent::HazardContact { id: ids[1] }));
    assert!(sim.body().on_ground());
}

#[test]
fn despawned_obstacle_no_longer_collides() {
    let (mut sim, ids) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 80.0), BODY);
    run(&mut sim, 3, MovementInput::empty());

    sim.world_mut().despawn(ids[0]).unwrap();
    run(&mut sim, 10, MovementInput::empty());

    assert!(sim.body().position.y > 80.0);
    assert!(!sim.body().on_ground());
}

// ---------------------------------------------------------------------------
// Fast bodies
// ---------------------------------------------------------------------------

#[test]
fn fast_small_body_lands_on_thin_ledge() {
    let ledge = Aabb::new(0.0, 100.0, 400.0, 1.0);
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(ledge)], Vec2::new(50.0, 60.0), Vec2::splat(4.0));
    sim.integrator_mut().set_velocity(Vec2::new(0.0, 900.0));

    let landed = run_until(&mut sim, 10, MovementInput::empty(), |s| s.body().on_ground());

    assert!(landed.is_some(), "tunneled to y = {}", sim.body().position.y);
    assert!((sim.body().position.y - 96.0).abs() < 1e-3);
    assert_eq!(sim.body().velocity.y, 0.0);
}

#[test]
fn fast_small_body_lands_on_thin_ledge_from_any_start_offset() {
    let ledge = Aabb::new(0.0, 100.0, 400.0, 1.0);
    // Starts chosen so a tick's end sample lands past the ledge's center.
    for start_y in [84.5, 84.75, 70.0, 69.5, 55.25] {
        let (mut sim, _) =
            sim_with(&[Obstacle::solid_box(ledge)], Vec2::new(50.0, start_y), Vec2::splat(4.0));
        sim.integrator_mut().set_velocity(Vec2::new(0.0, 900.0));

        let landed = run_until(&mut sim, 10, MovementInput::empty(), |s| s.body().on_ground());

        assert!(landed.is_some(), "start {start_y}: tunneled to y = {}", sim.body().position.y);
        assert!(
            (sim.body().position.y - 96.0).abs() < 1e-3,
            "start {start_y}: y = {}",
            sim.body().position.y
        );
        run(&mut sim, 30, MovementInput::empty());
        assert!(sim.body().position.y <= 96.0 + 1e-3, "start {start_y}: fell through");
    }
}

#[test]
fn fast_body_slides_down_wall_without_stalling() {
    let wall = Aabb::new(100.0, -1000.0, 20.0, 2000.0);
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(wall)], Vec2::new(95.0, 0.0), Vec2::splat(4.0));
    sim.integrator_mut().set_velocity(Vec2::new(0.0, 900.0));

    let start_y = sim.body().position.y;
    run(&mut sim, 10, MovementInput::MOVE_RIGHT);

    // Pressed against the wall, but still falling at full speed.
    assert!(sim.body().position.x + 4.0 <= 100.0 + 1e-3);
    assert!(sim.body().position.y - start_y > 100.0);
}

// ---------------------------------------------------------------------------
// Frame coordination
// ---------------------------------------------------------------------------

#[test]
fn render_position_interpolates_between_ticks() {
    let (mut sim, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 0.0), BODY);

    let alpha = sim.advance(PHYSICS_DT * 1.5, MovementInput::empty());
    assert_eq!(sim.ticks(), 1);

    let body = sim.body();
    let prev = body.interpolation.previous;
    let cur = body.interpolation.current;
    let drawn = sim.render_position(alpha);
    assert!(alpha > 0.0 && alpha < 1.0);
    assert!(drawn.y > prev.y && drawn.y < cur.y);
    assert_eq!(sim.render_position(0.0), prev);
    assert_eq!(sim.render_position(1.0), cur);
}

#[test]
fn advance_is_deterministic_across_frame_rates() {
    let (mut coarse, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 0.0), BODY);
    let (mut fine, _) = sim_with(&[Obstacle::solid_box(FLOOR)], Vec2::new(50.0, 0.0), BODY);

    for _ in 0..60 {
        coarse.tick(MovementInput::MOVE_RIGHT);
    }
    while fine.ticks() < 60 {
        fine.advance(PHYSICS_DT / 4.0, MovementInput::MOVE_RIGHT);
    }

    assert_eq!(fine.ticks(), 60);
    assert_eq!(coarse.body().position, fine.body().position);
}
