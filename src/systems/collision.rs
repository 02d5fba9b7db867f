use std::cell::Cell;

use bitflags::bitflags;
use glam::Vec2;

use crate::components::{Aabb, Obstacle, Shape};
use crate::config::{PhysicsConfig, SpikeTest};

use super::shape_test::{
    aabb_intersects_triangle, aabb_overlap, lerp_aabb, point_in_circle, point_in_triangle,
};

bitflags! {
    /// Set of degeneracy categories already reported by a detector.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    struct Degeneracy: u8 {
        const ZERO_AREA_TRIANGLE = 1 << 0;
        const ZERO_RADIUS_CIRCLE = 1 << 1;
        const NON_FINITE         = 1 << 2;
    }
}

/// Malformed geometry met during a query, warned about once per detector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Degenerate {
    ZeroAreaTriangle,
    ZeroRadiusCircle,
    NonFinite,
}

impl Degenerate {
    fn flag(self) -> Degeneracy {
        match self {
            Degenerate::ZeroAreaTriangle => Degeneracy::ZERO_AREA_TRIANGLE,
            Degenerate::ZeroRadiusCircle => Degeneracy::ZERO_RADIUS_CIRCLE,
            Degenerate::NonFinite => Degeneracy::NON_FINITE,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Degenerate::ZeroAreaTriangle => "zero-area spike triangle",
            Degenerate::ZeroRadiusCircle => "circle with non-positive radius",
            Degenerate::NonFinite => "non-finite coordinates",
        }
    }
}

/// Which face of the obstacle the body was pushed out through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
}

/// Contact description for one hitbox/obstacle pair. Produced per query,
/// never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResult {
    /// Per-axis overlap of the hitbox and the obstacle bounds.
    pub overlap: Vec2,
    pub direction: Direction,
    /// Unit vector pointing from the obstacle toward the body.
    pub normal: Vec2,
    pub penetration_depth: f32,
}

/// Broad phase (margin-expanded bounds) followed by a shape-specific narrow
/// phase, plus minimum-translation resolution.
///
/// All queries take `&self`; malformed geometry is reported through `log`
/// once per category and treated as "no collision".
pub struct CollisionDetector {
    margin: f32,
    max_steps: u32,
    spike_test: SpikeTest,
    warned: Cell<Degeneracy>,
}

impl CollisionDetector {
    pub fn new(config: &PhysicsConfig) -> Self {
        Self {
            margin: config.obstacle_margin,
            max_steps: config.continuous_collision_steps.max(1),
            spike_test: config.spike_test,
            warned: Cell::new(Degeneracy::empty()),
        }
    }

    pub fn margin(&self) -> f32 {
        self.margin
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    pub fn check_obstacle_collision(&self, hitbox: &Aabb, obstacle: &Obstacle) -> bool {
        let bounds = obstacle.effective_bounds();
        if !hitbox.is_finite() || !bounds.is_finite() {
            self.note(Degenerate::NonFinite);
            return false;
        }

        // Broad phase: cheap reject against the expanded bounds.
        if !aabb_overlap(hitbox, &bounds.expand(self.margin)) {
            return false;
        }

        match obstacle.shape {
            // The broad phase used a margin; re-test exactly.
            Shape::Box | Shape::MovingBox { .. } => aabb_overlap(hitbox, &bounds),
            Shape::Spike { .. } => self.spike_hit(hitbox, obstacle),
            Shape::Circle { center, radius } => self.circle_hit(hitbox, center, radius),
        }
    }

    fn spike_hit(&self, hitbox: &Aabb, obstacle: &Obstacle) -> bool {
        let Some(tri) = obstacle.triangle() else {
            return false;
        };
        if tri.iter().any(|v| !v.is_finite()) {
            self.note(Degenerate::NonFinite);
            return false;
        }

        match self.spike_test {
            SpikeTest::Corners => {
                for corner in hitbox.corners() {
                    match point_in_triangle(corner, tri) {
                        Some(true) => return true,
                        Some(false) => {}
                        None => {
                            self.note(Degenerate::ZeroAreaTriangle);
                            return false;
                        }
                    }
                }
                false
            }
            SpikeTest::Separating => {
                let [a, b, c] = tri;
                if (b - a).perp_dot(c - a) == 0.0 {
                    self.note(Degenerate::ZeroAreaTriangle);
                    return false;
                }
                aabb_intersects_triangle(hitbox, tri)
            }
        }
    }

    fn circle_hit(&self, hitbox: &Aabb, center: Vec2, radius: f32) -> bool {
        if !center.is_finite() || !radius.is_finite() {
            self.note(Degenerate::NonFinite);
            return false;
        }
        if radius <= 0.0 {
            self.note(Degenerate::ZeroRadiusCircle);
            return false;
        }
        hitbox
            .corners()
            .into_iter()
            .chain(std::iter::once(hitbox.center()))
            .any(|p| point_in_circle(p, center, radius))
    }

    /// Sample the hitbox at `steps + 1` evenly spaced positions between
    /// `start` and `end` (both inclusive) and report whether any sample hits.
    ///
    /// Tunneling is still possible when the per-sample displacement
    /// `|end - start| / steps` exceeds the obstacle's thickness plus the
    /// hitbox's extent along the motion.
    pub fn check_continuous_collision(
        &self,
        start: &Aabb,
        end: &Aabb,
        obstacle: &Obstacle,
        steps: u32,
    ) -> bool {
        self.first_contact(start, end, obstacle, steps).is_some()
    }

    /// Earliest colliding sample of a swept hitbox, if any.
    pub fn first_contact(
        &self,
        start: &Aabb,
        end: &Aabb,
        obstacle: &Obstacle,
        steps: u32,
    ) -> Option<Aabb> {
        let steps = steps.max(1);
        (0..=steps)
            .map(|i| lerp_aabb(start, end, i as f32 / steps as f32))
            .find(|sample| self.check_obstacle_collision(sample, obstacle))
    }

    /// Sub-steps needed so each sample advances less than `thinnest`, capped
    /// at the configured maximum.
    pub fn continuous_steps_for(&self, displacement: f32, thinnest: f32) -> u32 {
        if !displacement.is_finite() || !thinnest.is_finite() || thinnest <= 0.0 {
            return self.max_steps;
        }
        let needed = (displacement.abs() / thinnest).floor() as u32 + 1;
        needed.clamp(1, self.max_steps)
    }

    /// Minimum-translation push-out: on each axis, the distance that moves
    /// the hitbox clear of the obstacle on the side of its center; the
    /// smaller of the two wins. Zero when the boxes do not overlap.
    /// On equal distances the vertical axis wins so corner landings settle on
    /// top instead of snagging sideways.
    ///
    /// For partial overlaps the distance equals the overlap. When the hitbox
    /// spans the obstacle it is the full distance to the obstacle's far edge.
    pub fn calculate_collision_correction(&self, hitbox: &Aabb, obstacle: &Obstacle) -> Vec2 {
        self.calculate_collision_correction_from(hitbox, obstacle, Vec2::ZERO)
    }

    /// Push-out for a hitbox that arrived by moving `motion`. On an axis with
    /// motion the body goes back out the side it entered through, so a swept
    /// sample whose center is already past a thin obstacle is not pushed out
    /// the far side. Axes without motion fall back to the center comparison.
    pub fn calculate_collision_correction_from(
        &self,
        hitbox: &Aabb,
        obstacle: &Obstacle,
        motion: Vec2,
    ) -> Vec2 {
        let bounds = obstacle.effective_bounds();
        let overlap = overlap(hitbox, &bounds);
        if overlap.x <= 0.0 || overlap.y <= 0.0 {
            return Vec2::ZERO;
        }

        let hc = hitbox.center();
        let bc = bounds.center();
        let push_x = if entered_from_low_side(motion.x, hc.x, bc.x) {
            -(hitbox.right() - bounds.x)
        } else {
            bounds.right() - hitbox.x
        };
        let push_y = if entered_from_low_side(motion.y, hc.y, bc.y) {
            -(hitbox.bottom() - bounds.y)
        } else {
            bounds.bottom() - hitbox.y
        };

        if push_x.abs() < push_y.abs() {
            Vec2::new(push_x, 0.0)
        } else {
            Vec2::new(0.0, push_y)
        }
    }

    /// Unit vector from the obstacle's center to the hitbox's center, or
    /// `(0, -1)` (up) when the centers coincide.
    pub fn collision_normal(&self, hitbox: &Aabb, obstacle: &Obstacle) -> Vec2 {
        (hitbox.center() - obstacle.effective_bounds().center())
            .try_normalize()
            .unwrap_or(Vec2::NEG_Y)
    }

    /// Full contact description, or `None` when the pair does not collide.
    /// The normal follows the correction axis when there is one, otherwise
    /// the center-to-center direction.
    pub fn collision_result(&self, hitbox: &Aabb, obstacle: &Obstacle) -> Option<CollisionResult> {
        if !self.check_obstacle_collision(hitbox, obstacle) {
            return None;
        }
        let overlap = overlap(hitbox, &obstacle.effective_bounds()).max(Vec2::ZERO);
        let correction = self.calculate_collision_correction(hitbox, obstacle);
        let normal = correction
            .try_normalize()
            .unwrap_or_else(|| self.collision_normal(hitbox, obstacle));

        let direction = if normal.x.abs() > normal.y.abs() {
            if normal.x < 0.0 { Direction::Left } else { Direction::Right }
        } else if normal.y < 0.0 {
            Direction::Top
        } else {
            Direction::Bottom
        };

        Some(CollisionResult {
            overlap,
            direction,
            normal,
            penetration_depth: correction.length(),
        })
    }

    fn note(&self, kind: Degenerate) {
        let seen = self.warned.get();
        if seen.contains(kind.flag()) {
            return;
        }
        log::warn!(
            "ignoring collision against {}; further occurrences are not logged",
            kind.describe()
        );
        self.warned.set(seen | kind.flag());
    }
}

/// Whether the hitbox should leave through the obstacle's low (left or top)
/// edge on one axis.
fn entered_from_low_side(motion: f32, hitbox_center: f32, obstacle_center: f32) -> bool {
    if motion > 0.0 {
        true
    } else if motion < 0.0 {
        false
    } else {
        hitbox_center < obstacle_center
    }
}

/// Per-axis overlap of two boxes; negative on an axis where they are apart.
fn overlap(a: &Aabb, b: &Aabb) -> Vec2 {
    Vec2::new(
        a.right().min(b.right()) - a.x.max(b.x),
        a.bottom().min(b.bottom()) - a.y.max(b.y),
    )
}
