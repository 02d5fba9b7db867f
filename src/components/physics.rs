use std::time::Duration;

use bitflags::bitflags;
use glam::Vec2;

use crate::engine::time::Timestamp;

/// Axis-aligned rectangle in world space. `(x, y)` is the top-left corner;
/// +y points down.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Aabb {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    pub fn min(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn max(&self) -> Vec2 {
        Vec2::new(self.right(), self.bottom())
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Vec2; 4] {
        [
            Vec2::new(self.x, self.y),
            Vec2::new(self.right(), self.y),
            Vec2::new(self.right(), self.bottom()),
            Vec2::new(self.x, self.bottom()),
        ]
    }

    /// Grow by `margin` on every side. Non-positive margins return `self`.
    pub fn expand(&self, margin: f32) -> Self {
        if margin <= 0.0 {
            return *self;
        }
        Self::new(
            self.x - margin,
            self.y - margin,
            self.width + margin * 2.0,
            self.height + margin * 2.0,
        )
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Self {
        Self::from_min_max(self.min().min(other.min()), self.max().max(other.max()))
    }

    pub fn translate(&self, delta: Vec2) -> Self {
        Self::new(self.x + delta.x, self.y + delta.y, self.width, self.height)
    }

    pub fn with_y(&self, y: f32) -> Self {
        Self::new(self.x, y, self.width, self.height)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.width.is_finite() && self.height.is_finite()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

/// Per-tick force accumulators. Unit mass: the sum is the acceleration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Forces {
    pub gravity: Vec2,
    pub movement: Vec2,
    pub friction: Vec2,
    pub external: Vec2,
}

impl Forces {
    pub fn total(&self) -> Vec2 {
        self.gravity + self.movement + self.friction + self.external
    }
}

bitflags! {
    /// Transient contact state. Reset at the end of every fixed step and
    /// reasserted by the collision pass that follows.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct ContactFlags: u8 {
        const ON_GROUND  = 1 << 0;
        const ON_CEILING = 1 << 1;
        const ON_WALL    = 1 << 2;
    }
}

/// Coyote-time and jump-buffer bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct JumpTimers {
    /// `None` until the body first touches ground, and again right after a jump.
    pub last_grounded_at: Option<Timestamp>,
    pub jump_buffer_remaining: Duration,
}

/// Previous fixed-step position, stored for render interpolation.
/// `previous` is snapshotted at the start of each fixed step, `current` after
/// the collision pass has corrected it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Interpolation {
    pub previous: Vec2,
    pub current: Vec2,
}

/// Kinematic state of the single controlled body.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    /// Top-left corner of the body rectangle.
    pub position: Vec2,
    pub size: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub forces: Forces,
    pub flags: ContactFlags,
    pub gravity_inverted: bool,
    pub timers: JumpTimers,
    pub interpolation: Interpolation,
}

impl Body {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self {
            position,
            size,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            forces: Forces::default(),
            flags: ContactFlags::empty(),
            gravity_inverted: false,
            timers: JumpTimers::default(),
            interpolation: Interpolation {
                previous: position,
                current: position,
            },
        }
    }

    pub fn on_ground(&self) -> bool {
        self.flags.contains(ContactFlags::ON_GROUND)
    }

    pub fn on_ceiling(&self) -> bool {
        self.flags.contains(ContactFlags::ON_CEILING)
    }

    pub fn on_wall(&self) -> bool {
        self.flags.contains(ContactFlags::ON_WALL)
    }

    /// Collision rectangle: the body rectangle shrunk by `inset` on every side.
    pub fn hitbox(&self, inset: f32) -> Aabb {
        let inset = inset.max(0.0).min(self.size.x * 0.5).min(self.size.y * 0.5);
        Aabb::new(
            self.position.x + inset,
            self.position.y + inset,
            self.size.x - inset * 2.0,
            self.size.y - inset * 2.0,
        )
    }
}
