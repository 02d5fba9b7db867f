use std::f32::consts::TAU;

use hecs::World;
use thiserror::Error;

use crate::components::{Obstacle, ObstacleId, Shape};
use crate::engine::time::Timestamp;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorldError {
    #[error("no obstacle with id {0:?}")]
    NoSuchObstacle(ObstacleId),
    #[error("obstacle {0:?} is not a moving box")]
    NotKinematic(ObstacleId),
}

/// Vertical sine motion for a `MovingBox`: `origin_y + amplitude * sin(2π t / period)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Oscillator {
    pub origin_y: f32,
    pub amplitude: f32,
    /// Seconds per full cycle. Non-positive periods hold the platform at `origin_y`.
    pub period: f32,
}

impl Oscillator {
    pub fn y_at(&self, now: Timestamp) -> f32 {
        if !(self.period > 0.0) {
            return self.origin_y;
        }
        let t = now.as_duration().as_secs_f32();
        self.origin_y + self.amplitude * (TAU * t / self.period).sin()
    }
}

/// Arena of obstacles. Handles are generation-checked `hecs` entities, so a
/// despawned slot can be reused without stale ids aliasing the new occupant.
pub struct ObstacleWorld {
    world: World,
}

impl Default for ObstacleWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ObstacleWorld {
    pub fn new() -> Self {
        Self { world: World::new() }
    }

    pub fn spawn(&mut self, obstacle: Obstacle) -> ObstacleId {
        ObstacleId(self.world.spawn((obstacle,)))
    }

    /// Spawn a moving box driven by `oscillator`. Its `current_y` is set for
    /// time zero immediately.
    pub fn spawn_oscillating(&mut self, mut obstacle: Obstacle, oscillator: Oscillator) -> ObstacleId {
        if let Shape::MovingBox { current_y } = &mut obstacle.shape {
            *current_y = oscillator.y_at(Timestamp::ZERO);
        }
        ObstacleId(self.world.spawn((obstacle, oscillator)))
    }

    pub fn despawn(&mut self, id: ObstacleId) -> Result<(), WorldError> {
        self.world
            .despawn(id.0)
            .map_err(|_| WorldError::NoSuchObstacle(id))
    }

    pub fn get(&self, id: ObstacleId) -> Option<Obstacle> {
        self.world.get::<&Obstacle>(id.0).ok().map(|o| *o)
    }

    pub fn contains(&self, id: ObstacleId) -> bool {
        self.world.contains(id.0)
    }

    /// Drive a moving box directly. Fails for unknown ids and for any other shape.
    pub fn set_moving_y(&mut self, id: ObstacleId, y: f32) -> Result<(), WorldError> {
        let mut obstacle = self
            .world
            .get::<&mut Obstacle>(id.0)
            .map_err(|_| WorldError::NoSuchObstacle(id))?;
        match &mut obstacle.shape {
            Shape::MovingBox { current_y } => {
                *current_y = y;
                Ok(())
            }
            _ => Err(WorldError::NotKinematic(id)),
        }
    }

    /// Advance every oscillating platform to its position at `now`.
    pub fn update_kinematics(&mut self, now: Timestamp) {
        for (_entity, (obstacle, oscillator)) in
            self.world.query_mut::<(&mut Obstacle, &Oscillator)>()
        {
            if let Shape::MovingBox { current_y } = &mut obstacle.shape {
                *current_y = oscillator.y_at(now);
            }
        }
    }

    /// Snapshot of every obstacle with its id.
    pub fn iter(&self) -> impl Iterator<Item = (ObstacleId, Obstacle)> + '_ {
        self.world
            .iter()
            .filter_map(|entity| entity.get::<&Obstacle>().map(|o| (ObstacleId(entity.entity()), *o)))
    }

    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.world.len() == 0
    }

    pub fn clear(&mut self) {
        self.world.clear();
    }
}
