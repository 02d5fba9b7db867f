use std::time::Duration;

use glam::Vec2;

use crate::components::{Aabb, Axis, Body, ContactFlags, Forces};
use crate::config::PhysicsConfig;
use crate::engine::events::PhysicsEvent;
use crate::engine::input::MovementInput;
use crate::engine::time::Timestamp;

pub const PHYSICS_DT: f32 = 1.0 / 60.0;

/// Owns the controlled body and advances it one fixed step at a time.
///
/// Contact flags are transient: `fixed_step` clears them at the end of every
/// tick and the collision pass that follows reasserts them, so a flag is only
/// ever as old as the last collision pass.
pub struct PhysicsIntegrator {
    config: PhysicsConfig,
    body: Body,
    /// Blended gravity acceleration (y component), ramps toward the target.
    gravity: f32,
    /// External forces queued since the last tick.
    pending_external: Vec2,
    events: Vec<PhysicsEvent>,
}

impl PhysicsIntegrator {
    pub fn new(config: PhysicsConfig, body: Body) -> Self {
        let gravity = if body.gravity_inverted {
            config.gravity_inverted
        } else {
            config.gravity_normal
        };
        Self {
            config,
            body,
            gravity,
            pending_external: Vec2::ZERO,
            events: Vec::new(),
        }
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Current (blended) gravity acceleration along y.
    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    /// Gravity the blend is converging on.
    pub fn gravity_target(&self) -> f32 {
        if self.body.gravity_inverted {
            self.config.gravity_inverted
        } else {
            self.config.gravity_normal
        }
    }

    /// Unit vector along the gravity target: `(0, 1)` normally, `(0, -1)` inverted.
    pub fn gravity_direction(&self) -> Vec2 {
        if self.gravity_target() < 0.0 {
            Vec2::NEG_Y
        } else {
            Vec2::Y
        }
    }

    pub fn hitbox(&self) -> Aabb {
        self.body.hitbox(self.config.hitbox_inset)
    }

    /// Hitbox at the position snapshotted at the start of the last step.
    pub fn previous_hitbox(&self) -> Aabb {
        Body {
            position: self.body.interpolation.previous,
            ..self.body.clone()
        }
        .hitbox(self.config.hitbox_inset)
    }

    /// Advance the body by one fixed step of `dt` seconds.
    pub fn fixed_step(&mut self, dt: f32, input: MovementInput) {
        self.body.interpolation.previous = self.body.position;

        self.body.forces = Forces {
            external: std::mem::take(&mut self.pending_external),
            ..Forces::default()
        };

        // Gravity ramps toward its target instead of flipping instantly.
        let target = self.gravity_target();
        self.gravity += (target - self.gravity) * self.blend_factor(dt);
        self.body.forces.gravity = Vec2::new(0.0, self.gravity);

        let direction = input.horizontal_axis();
        let grounded = self.body.on_ground();
        if direction != 0.0 {
            let vx = self.body.velocity.x;
            let reversing = vx != 0.0 && vx.signum() != direction;
            let accel = if reversing {
                self.config.move_deceleration
            } else {
                self.config.move_acceleration
            };
            let control = if grounded { 1.0 } else { self.config.air_control_factor };
            self.body.forces.movement = Vec2::new(direction * accel * control, 0.0);
        } else {
            self.body.forces.friction = Vec2::new(self.friction_force(dt), 0.0);
        }

        // Semi-implicit Euler: velocity first, then position with the new velocity.
        self.body.acceleration = self.body.forces.total();
        self.body.velocity += self.body.acceleration * dt;
        self.clamp_velocity();
        self.body.position += self.body.velocity * dt;
        self.body.interpolation.current = self.body.position;

        let elapsed = Duration::from_secs_f32(dt.max(0.0));
        self.body.timers.jump_buffer_remaining =
            self.body.timers.jump_buffer_remaining.saturating_sub(elapsed);

        self.body.flags.remove(ContactFlags::ON_GROUND | ContactFlags::ON_CEILING | ContactFlags::ON_WALL);
    }

    /// Per-step blend factor. `gravity_transition_rate` is defined per
    /// `reference_dt`; other step lengths get the equivalent exponential decay.
    fn blend_factor(&self, dt: f32) -> f32 {
        let rate = self.config.gravity_transition_rate.clamp(0.0, 1.0);
        if rate >= 1.0 || dt <= 0.0 {
            return if dt > 0.0 { 1.0 } else { 0.0 };
        }
        let ticks = dt / self.config.reference_dt;
        (1.0 - (1.0 - rate).powf(ticks)).clamp(0.0, 1.0)
    }

    /// Force opposing horizontal velocity, never strong enough to reverse it
    /// within one step.
    fn friction_force(&self, dt: f32) -> f32 {
        let vx = self.body.velocity.x;
        if vx == 0.0 || dt <= 0.0 {
            return 0.0;
        }
        let coefficient = if self.body.on_ground() {
            self.config.ground_friction
        } else if self.body.on_wall() {
            self.config.wall_friction
        } else {
            self.config.air_friction
        };
        let max_force = vx.abs() / dt;
        -vx.signum() * (vx.abs() * coefficient).min(max_force)
    }

    fn clamp_velocity(&mut self) {
        let v = &mut self.body.velocity;
        v.x = v.x.clamp(-self.config.max_speed, self.config.max_speed);
        v.y = v.y.clamp(self.config.max_rise_speed, self.config.max_fall_speed);
    }

    /// Flip the gravity target. Velocity is untouched; the blend in
    /// `fixed_step` ramps the actual acceleration.
    pub fn invert_gravity(&mut self) {
        self.body.gravity_inverted = !self.body.gravity_inverted;
        self.events.push(PhysicsEvent::GravityChanged {
            inverted: self.body.gravity_inverted,
        });
    }

    /// Queue a force for the next fixed step only.
    pub fn add_external_force(&mut self, force: Vec2) {
        self.pending_external += force;
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.body.velocity = velocity;
    }

    pub fn set_velocity_axis(&mut self, axis: Axis, value: f32) {
        match axis {
            Axis::X => self.body.velocity.x = value,
            Axis::Y => self.body.velocity.y = value,
        }
    }

    pub fn add_velocity(&mut self, delta: Vec2) {
        self.body.velocity += delta;
    }

    pub fn mark_grounded(&mut self, now: Timestamp) {
        self.body.flags.insert(ContactFlags::ON_GROUND);
        self.body.timers.last_grounded_at = Some(now);
    }

    pub fn set_contact(&mut self, flag: ContactFlags) {
        self.body.flags.insert(flag);
    }

    /// Coyote time: a jump is still allowed shortly after leaving the ground.
    pub fn can_use_grace_period(&self, now: Timestamp) -> bool {
        if self.body.on_ground() {
            return false;
        }
        match self.body.timers.last_grounded_at {
            Some(at) => now.saturating_since(at) <= self.config.grace_window(),
            None => false,
        }
    }

    pub fn can_jump(&self, now: Timestamp) -> bool {
        self.body.on_ground() || self.can_use_grace_period(now)
    }

    /// Remember a jump press so it can fire on landing within the buffer window.
    pub fn buffer_jump_request(&mut self) {
        self.body.timers.jump_buffer_remaining = self.config.jump_buffer_window();
    }

    pub fn has_buffered_jump(&self) -> bool {
        !self.body.timers.jump_buffer_remaining.is_zero()
    }

    pub fn consume_buffered_jump(&mut self) {
        self.body.timers.jump_buffer_remaining = Duration::ZERO;
        self.events.push(PhysicsEvent::JumpBufferConsumed);
    }

    /// Launch against gravity. Clears the grace window so coyote time cannot
    /// grant a second jump.
    pub fn jump(&mut self) {
        let up = -self.gravity_direction();
        self.body.velocity.y = up.y * self.config.jump_velocity;
        self.clamp_velocity();
        self.body.flags.remove(ContactFlags::ON_GROUND);
        self.body.timers.last_grounded_at = None;
        self.body.timers.jump_buffer_remaining = Duration::ZERO;
        self.events.push(PhysicsEvent::Jumped);
    }

    /// Move the body by a collision correction and cancel its velocity along
    /// the correction axis.
    pub fn apply_correction(&mut self, correction: Vec2) {
        self.body.position += correction;
        if correction.x != 0.0 {
            self.body.velocity.x = 0.0;
        }
        if correction.y != 0.0 {
            self.body.velocity.y = 0.0;
        }
        self.body.interpolation.current = self.body.position;
    }

    /// Position to draw at, `alpha` of the way from the previous fixed step
    /// to the current one. Never mutates simulation state.
    pub fn render_position(&self, alpha: f32) -> Vec2 {
        let interp = &self.body.interpolation;
        interp.previous.lerp(interp.current, alpha.clamp(0.0, 1.0))
    }

    /// Reset the body in place for a respawn.
    pub fn respawn(&mut self, position: Vec2) {
        self.body = Body::new(position, self.body.size);
        self.gravity = self.config.gravity_normal;
        self.pending_external = Vec2::ZERO;
    }

    pub fn push_event(&mut self, event: PhysicsEvent) {
        self.events.push(event);
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = PhysicsEvent> + '_ {
        self.events.drain(..)
    }
}
