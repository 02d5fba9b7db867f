//! TOML level files.
//!
//! ```toml
//! name = "pit"
//! spawn = [0.0, 368.0]
//! body_size = [24.0, 32.0]
//!
//! [[obstacle]]
//! shape = "box"
//! bounds = [-200.0, 400.0, 600.0, 32.0]
//!
//! [[obstacle]]
//! shape = "moving_box"
//! bounds = [860.0, 360.0, 100.0, 16.0]
//! amplitude = 60.0
//! period = 3.0
//! ```
//!
//! Shapes: `box`, `spike`, `ceiling_spike`, `circle`, `moving_box`. Spikes
//! fill their bounds with the base on the bottom (`spike`) or top
//! (`ceiling_spike`) edge; circles are inscribed in their bounds. Any other
//! shape name loads as a solid box over `bounds`.

use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

use crate::components::{Aabb, Obstacle, ObstacleId};
use crate::scene::prefabs::{spawn_hazard_disc, spawn_moving_platform, spawn_static_box};
use crate::world::ObstacleWorld;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse level {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("obstacle #{index}: {reason}")]
    Invalid { index: usize, reason: String },
}

fn default_body_size() -> [f32; 2] {
    [24.0, 32.0]
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ObstacleDef {
    pub shape: String,
    pub bounds: [f32; 4],
    #[serde(default)]
    pub amplitude: f32,
    #[serde(default)]
    pub period: f32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Level {
    #[serde(default)]
    pub name: Option<String>,
    pub spawn: [f32; 2],
    #[serde(default = "default_body_size")]
    pub body_size: [f32; 2],
    #[serde(default, rename = "obstacle")]
    pub obstacles: Vec<ObstacleDef>,
}

impl Level {
    pub fn from_file(path: &Path) -> Result<Self, LevelError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| LevelError::Io(path.to_path_buf(), e))?;
        let level: Self =
            toml::from_str(&content).map_err(|e| LevelError::Parse(path.to_path_buf(), e))?;
        level.validate()?;
        Ok(level)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, LevelError> {
        let level: Self =
            toml::from_str(content).map_err(|e| LevelError::Parse(PathBuf::from("<inline>"), e))?;
        level.validate()?;
        Ok(level)
    }

    pub fn spawn_point(&self) -> Vec2 {
        Vec2::from(self.spawn)
    }

    pub fn body_size(&self) -> Vec2 {
        Vec2::from(self.body_size)
    }

    fn validate(&self) -> Result<(), LevelError> {
        for (index, def) in self.obstacles.iter().enumerate() {
            let [_, _, w, h] = def.bounds;
            if def.bounds.iter().any(|v| !v.is_finite()) {
                return Err(LevelError::Invalid {
                    index,
                    reason: "bounds must be finite".into(),
                });
            }
            if w < 0.0 || h < 0.0 {
                return Err(LevelError::Invalid {
                    index,
                    reason: format!("negative size {w}x{h}"),
                });
            }
        }
        Ok(())
    }

    /// Spawn every obstacle into `world`, in file order.
    pub fn populate(&self, world: &mut ObstacleWorld) -> Vec<ObstacleId> {
        let ids: Vec<ObstacleId> = self
            .obstacles
            .iter()
            .enumerate()
            .map(|(index, def)| spawn_def(world, index, def))
            .collect();
        log::info!(
            "level {} loaded: {} obstacles",
            self.name.as_deref().unwrap_or("<unnamed>"),
            ids.len()
        );
        ids
    }
}

fn spawn_def(world: &mut ObstacleWorld, index: usize, def: &ObstacleDef) -> ObstacleId {
    let [x, y, w, h] = def.bounds;
    let bounds = Aabb::new(x, y, w, h);
    match def.shape.as_str() {
        "box" => spawn_static_box(world, bounds),
        "spike" => world.spawn(Obstacle::spike(x, y + h, w, h)),
        "ceiling_spike" => world.spawn(Obstacle::ceiling_spike(x, y, w, h)),
        "circle" => spawn_hazard_disc(world, bounds.center(), w.min(h) * 0.5),
        "moving_box" => spawn_moving_platform(world, bounds, def.amplitude, def.period),
        other => {
            log::warn!("obstacle #{index}: unknown shape `{other}`, loading as a box");
            spawn_static_box(world, bounds)
        }
    }
}
