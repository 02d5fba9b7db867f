use glam::Vec2;
use hecs::Entity;

use super::physics::Aabb;

/// Stable handle to an obstacle in the [`ObstacleWorld`](crate::world::ObstacleWorld).
/// Generation-checked: a handle to a despawned obstacle never resolves to the
/// obstacle that later reuses its slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObstacleId(pub(crate) Entity);

impl ObstacleId {
    /// Packed `(generation, slot)` representation, stable for the obstacle's lifetime.
    pub fn to_bits(self) -> u64 {
        self.0.to_bits().get()
    }

    pub fn from_bits(bits: u64) -> Option<Self> {
        Entity::from_bits(bits).map(Self)
    }
}

/// Exact collision shape of an obstacle. `bounds` on [`Obstacle`] always
/// encloses it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Solid rectangle equal to `bounds`.
    Box,
    /// Triangle with the given apex. The base is the edge of `bounds` opposite
    /// the apex: bottom edge when the apex sits in the upper half, top edge otherwise.
    Spike { apex: Vec2 },
    /// Disc hazard.
    Circle { center: Vec2, radius: f32 },
    /// Rectangle whose vertical position is driven by the world each tick.
    MovingBox { current_y: f32 },
}

/// Static or kinematic world geometry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Obstacle {
    pub shape: Shape,
    pub bounds: Aabb,
    /// Solid obstacles push the body out; non-solid ones only report contact.
    pub solid: bool,
}

impl Obstacle {
    pub fn solid_box(bounds: Aabb) -> Self {
        Self {
            shape: Shape::Box,
            bounds,
            solid: true,
        }
    }

    /// Upward-pointing spike sitting on `base_y`, spanning `[x, x + width]`.
    pub fn spike(x: f32, base_y: f32, width: f32, height: f32) -> Self {
        let bounds = Aabb::new(x, base_y - height, width, height);
        Self {
            shape: Shape::Spike {
                apex: Vec2::new(x + width * 0.5, base_y - height),
            },
            bounds,
            solid: false,
        }
    }

    /// Downward-pointing spike hanging from `base_y`.
    pub fn ceiling_spike(x: f32, base_y: f32, width: f32, height: f32) -> Self {
        let bounds = Aabb::new(x, base_y, width, height);
        Self {
            shape: Shape::Spike {
                apex: Vec2::new(x + width * 0.5, base_y + height),
            },
            bounds,
            solid: false,
        }
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        let r = radius.max(0.0);
        Self {
            shape: Shape::Circle { center, radius },
            bounds: Aabb::new(center.x - r, center.y - r, r * 2.0, r * 2.0),
            solid: false,
        }
    }

    pub fn moving_box(bounds: Aabb) -> Self {
        Self {
            shape: Shape::MovingBox {
                current_y: bounds.y,
            },
            bounds,
            solid: true,
        }
    }

    /// Bounds used by both phases. A `MovingBox` substitutes its live `current_y`.
    pub fn effective_bounds(&self) -> Aabb {
        match self.shape {
            Shape::MovingBox { current_y } => self.bounds.with_y(current_y),
            Shape::Box | Shape::Spike { .. } | Shape::Circle { .. } => self.bounds,
        }
    }

    /// Spike triangle as `(apex, base_a, base_b)`, or `None` for other shapes.
    pub fn triangle(&self) -> Option<[Vec2; 3]> {
        let Shape::Spike { apex } = self.shape else {
            return None;
        };
        let b = self.bounds;
        let base_y = if apex.y <= b.center().y { b.bottom() } else { b.y };
        Some([apex, Vec2::new(b.x, base_y), Vec2::new(b.right(), base_y)])
    }
}
