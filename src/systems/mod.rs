mod collision;
mod physics;
mod spatial;

pub use collision::{CollisionDetector, CollisionResult, Direction};
pub use physics::{PhysicsIntegrator, PHYSICS_DT};
pub use shape_test::{
    aabb_intersects_triangle, aabb_overlap, lerp_aabb, point_in_circle, point_in_triangle,
};
pub use spatial::SpatialIndex;
