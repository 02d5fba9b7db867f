pub mod obstacle;
pub mod physics;

pub use obstacle::{Obstacle, ObstacleId, Shape};
pub use physics::{Aabb, Axis, Body, ContactFlags, Forces, Interpolation, JumpTimers};
