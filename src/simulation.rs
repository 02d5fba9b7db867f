use std::time::Duration;

use glam::Vec2;

use crate::components::{Aabb, Body, ContactFlags, Obstacle, ObstacleId};
use crate::config::PhysicsConfig;
use crate::engine::events::PhysicsEvent;
use crate::engine::input::MovementInput;
use crate::engine::time::{FixedTimestep, Timestamp};
use crate::systems::{CollisionDetector, PhysicsIntegrator, SpatialIndex, PHYSICS_DT};
use crate::world::ObstacleWorld;

/// One controlled body in a world of obstacles, advanced in fixed ticks.
///
/// Per tick: kinematics, index rebuild, jump resolution, integration, then
/// collision. Integration always runs before collision, so the contact flags
/// the caller sees after a tick are the ones the collision pass asserted.
pub struct Simulation {
    config: PhysicsConfig,
    world: ObstacleWorld,
    index: SpatialIndex,
    detector: CollisionDetector,
    integrator: PhysicsIntegrator,
    timestep: FixedTimestep,
    now: Timestamp,
    ticks: u64,
    spawn_point: Vec2,
    /// JUMP pressed on a render frame that produced no tick yet.
    pending_jump: bool,
    candidates: Vec<ObstacleId>,
}

impl Simulation {
    pub fn new(config: PhysicsConfig, world: ObstacleWorld, spawn_point: Vec2, body_size: Vec2) -> Self {
        Self::with_dt(config, world, spawn_point, body_size, PHYSICS_DT)
    }

    pub fn with_dt(
        config: PhysicsConfig,
        world: ObstacleWorld,
        spawn_point: Vec2,
        body_size: Vec2,
        dt: f32,
    ) -> Self {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            log::warn!("tick length {dt} is unusable, falling back to {PHYSICS_DT}");
            PHYSICS_DT
        };
        let index = SpatialIndex::new(config.grid_cell_size, config.max_grid_cells);
        let detector = CollisionDetector::new(&config);
        let timestep = FixedTimestep::new(dt, config.max_steps_per_frame);
        let integrator = PhysicsIntegrator::new(config.clone(), Body::new(spawn_point, body_size));
        Self {
            config,
            world,
            index,
            detector,
            integrator,
            timestep,
            now: Timestamp::ZERO,
            ticks: 0,
            spawn_point,
            pending_jump: false,
            candidates: Vec::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn body(&self) -> &Body {
        self.integrator.body()
    }

    pub fn integrator(&self) -> &PhysicsIntegrator {
        &self.integrator
    }

    /// Direct access for forces, velocity overrides and gravity flips.
    pub fn integrator_mut(&mut self) -> &mut PhysicsIntegrator {
        &mut self.integrator
    }

    pub fn detector(&self) -> &CollisionDetector {
        &self.detector
    }

    pub fn world(&self) -> &ObstacleWorld {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut ObstacleWorld {
        &mut self.world
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn dt(&self) -> f32 {
        self.timestep.dt()
    }

    pub fn invert_gravity(&mut self) {
        self.integrator.invert_gravity();
    }

    /// Put the body back at its spawn point with fresh state. Obstacles and
    /// the clock are untouched.
    pub fn respawn(&mut self) {
        self.integrator.respawn(self.spawn_point);
        self.pending_jump = false;
        log::debug!("respawned at {}", self.spawn_point);
    }

    pub fn set_spawn_point(&mut self, spawn_point: Vec2) {
        self.spawn_point = spawn_point;
    }

    // -----------------------------------------------------------------------
    // Frame coordination
    // -----------------------------------------------------------------------

    /// Feed one render frame's elapsed time and run however many fixed ticks
    /// it pays for. Returns the interpolation alpha for [`render_position`].
    ///
    /// `JUMP` is edge-triggered: it reaches the first tick run after the
    /// press and no other.
    ///
    /// [`render_position`]: Self::render_position
    pub fn advance(&mut self, frame_dt: f32, input: MovementInput) -> f32 {
        self.pending_jump |= input.jump_pressed();
        let held = input - MovementInput::JUMP;

        self.timestep.accumulate(frame_dt);
        while self.timestep.consume() {
            let mut tick_input = held;
            if std::mem::take(&mut self.pending_jump) {
                tick_input |= MovementInput::JUMP;
            }
            self.tick(tick_input);
        }
        self.timestep.alpha()
    }

    pub fn render_position(&self, alpha: f32) -> Vec2 {
        self.integrator.render_position(alpha)
    }

    // -----------------------------------------------------------------------
    // Fixed tick
    // -----------------------------------------------------------------------

    /// Run exactly one fixed tick.
    pub fn tick(&mut self, input: MovementInput) {
        let dt = self.timestep.dt();
        self.now += Duration::from_secs_f32(dt);
        self.ticks += 1;

        self.world.update_kinematics(self.now);
        self.rebuild_index();

        if input.jump_pressed() {
            if self.integrator.can_jump(self.now) {
                self.integrator.jump();
            } else {
                self.integrator.buffer_jump_request();
            }
        }
        let was_grounded = self.integrator.body().on_ground();

        self.integrator.fixed_step(dt, input);
        self.resolve_collisions(dt);

        if self.integrator.body().on_ground() {
            self.integrator.mark_grounded(self.now);
            if !was_grounded {
                log::debug!("grounded at tick {}", self.ticks);
                self.integrator.push_event(PhysicsEvent::Grounded);
            }
            if self.integrator.has_buffered_jump() {
                self.integrator.consume_buffered_jump();
                self.integrator.jump();
            }
        }
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (id, obstacle) in self.world.iter() {
            self.index.insert(&obstacle.effective_bounds(), id);
        }
    }

    fn resolve_collisions(&mut self, dt: f32) {
        let start = self.integrator.previous_hitbox();
        let end = self.integrator.hitbox();
        let probe = start.union(&end).expand(self.detector.margin());

        let mut candidates = std::mem::take(&mut self.candidates);
        self.index.query_neighbors_into(&probe, &mut candidates);

        let displacement = self.integrator.body().velocity.length() * dt;
        let continuous = displacement > end.width.min(end.height) * 0.5;
        let motion = if continuous {
            Vec2::new(end.x - start.x, end.y - start.y)
        } else {
            Vec2::ZERO
        };

        for &id in &candidates {
            let Some(obstacle) = self.world.get(id) else {
                continue;
            };
            let hitbox = self.integrator.hitbox();

            let contact = if continuous {
                let thinnest = hitbox.width.min(hitbox.height) + min_extent(&obstacle);
                let steps = self.detector.continuous_steps_for(displacement, thinnest);
                self.detector.first_contact(&start, &hitbox, &obstacle, steps)
            } else if self.detector.check_obstacle_collision(&hitbox, &obstacle) {
                Some(hitbox)
            } else {
                None
            };
            let Some(contact) = contact else {
                continue;
            };

            if !obstacle.solid {
                self.integrator.push_event(PhysicsEvent::HazardContact { id });
                continue;
            }

            let correction = self
                .detector
                .calculate_collision_correction_from(&contact, &obstacle, motion);
            let correction = if contact == hitbox || correction == Vec2::ZERO {
                correction
            } else if correction.x != 0.0 {
                // Swept hit: settle against the first touching sample on the
                // blocked axis, keep the full step on the free one.
                Vec2::new(contact.x + correction.x - hitbox.x, 0.0)
            } else {
                Vec2::new(0.0, contact.y + correction.y - hitbox.y)
            };
            self.apply_correction(correction);
        }

        self.candidates = candidates;
    }

    fn apply_correction(&mut self, correction: Vec2) {
        if correction == Vec2::ZERO {
            return;
        }
        self.integrator.apply_correction(correction);

        let gravity = self.integrator.gravity_direction();
        if correction.y != 0.0 {
            if correction.y * gravity.y < 0.0 {
                self.integrator.set_contact(ContactFlags::ON_GROUND);
            } else {
                self.integrator.set_contact(ContactFlags::ON_CEILING);
            }
        }
        if correction.x != 0.0 {
            self.integrator.set_contact(ContactFlags::ON_WALL);
        }
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = PhysicsEvent> + '_ {
        self.integrator.drain_events()
    }

    /// Obstacles whose exact shape currently overlaps the body's hitbox.
    pub fn touching(&self) -> Vec<(ObstacleId, Obstacle)> {
        let hitbox = self.integrator.hitbox();
        self.index
            .query_neighbors(&hitbox.expand(self.detector.margin()))
            .filter_map(|id| self.world.get(id).map(|o| (id, o)))
            .filter(|(_, o)| self.detector.check_obstacle_collision(&hitbox, o))
            .collect()
    }
}

fn min_extent(obstacle: &Obstacle) -> f32 {
    let bounds: Aabb = obstacle.effective_bounds();
    bounds.width.min(bounds.height)
}
