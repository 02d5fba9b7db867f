//! Tuning parameters for the physics core, loadable from a TOML file.
//!
//! Units are pixels and seconds, +y down. Every field has a default, so a
//! config file only needs to name what it overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Narrow-phase strategy for spike triangles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpikeTest {
    /// Hit when any hitbox corner lies inside the triangle. Forgiving: a
    /// triangle edge slicing through the box without containing a corner is
    /// a miss.
    #[default]
    Corners,
    /// Exact box-vs-triangle separating axis test.
    Separating,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity while not inverted (px/s², positive = down).
    pub gravity_normal: f32,
    /// Gravity while inverted (px/s², usually negative).
    pub gravity_inverted: f32,
    /// Fraction of the remaining gap to the gravity target closed per
    /// `reference_dt`. 1.0 flips instantly.
    pub gravity_transition_rate: f32,
    /// Largest downward (+y) speed.
    pub max_fall_speed: f32,
    /// Largest upward speed, as a signed velocity (≤ `max_fall_speed`, usually negative).
    pub max_rise_speed: f32,
    pub move_acceleration: f32,
    /// Acceleration used while input opposes the current horizontal velocity.
    pub move_deceleration: f32,
    /// Horizontal speed limit.
    pub max_speed: f32,
    /// Movement force multiplier while airborne.
    pub air_control_factor: f32,
    /// Friction rates (1/s) applied to horizontal velocity when no direction is held.
    pub ground_friction: f32,
    pub air_friction: f32,
    pub wall_friction: f32,
    pub grace_window_ms: u64,
    pub jump_buffer_window_ms: u64,
    pub jump_velocity: f32,
    /// Shrinks the body rectangle on every side to get the hitbox.
    pub hitbox_inset: f32,
    /// Broad-phase expansion of obstacle bounds.
    pub obstacle_margin: f32,
    /// Upper bound on sub-steps for swept tests.
    pub continuous_collision_steps: u32,
    /// Spatial index cell size. ≤ 0 collapses the index into a single bucket.
    pub grid_cell_size: f32,
    /// Cell-count ceiling before the spatial index collapses into one bucket.
    pub max_grid_cells: usize,
    pub spike_test: SpikeTest,
    /// Fixed tick length (seconds) the per-tick rates above are tuned for.
    pub reference_dt: f32,
    /// Fixed steps allowed per render frame before backlog is dropped.
    pub max_steps_per_frame: u32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity_normal: 1800.0,
            gravity_inverted: -1800.0,
            gravity_transition_rate: 0.15,
            max_fall_speed: 900.0,
            max_rise_speed: -900.0,
            move_acceleration: 2400.0,
            move_deceleration: 3600.0,
            max_speed: 300.0,
            air_control_factor: 0.6,
            ground_friction: 12.0,
            air_friction: 1.5,
            wall_friction: 6.0,
            grace_window_ms: 100,
            jump_buffer_window_ms: 120,
            jump_velocity: 620.0,
            hitbox_inset: 2.0,
            obstacle_margin: 2.0,
            continuous_collision_steps: 8,
            grid_cell_size: 64.0,
            max_grid_cells: 16_384,
            spike_test: SpikeTest::Corners,
            reference_dt: 1.0 / 60.0,
            max_steps_per_frame: 5,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl PhysicsConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn grace_window(&self) -> Duration {
        Duration::from_millis(self.grace_window_ms)
    }

    pub fn jump_buffer_window(&self) -> Duration {
        Duration::from_millis(self.jump_buffer_window_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let finite = [
            ("gravity_normal", self.gravity_normal),
            ("gravity_inverted", self.gravity_inverted),
            ("gravity_transition_rate", self.gravity_transition_rate),
            ("max_fall_speed", self.max_fall_speed),
            ("max_rise_speed", self.max_rise_speed),
            ("move_acceleration", self.move_acceleration),
            ("move_deceleration", self.move_deceleration),
            ("max_speed", self.max_speed),
            ("air_control_factor", self.air_control_factor),
            ("ground_friction", self.ground_friction),
            ("air_friction", self.air_friction),
            ("wall_friction", self.wall_friction),
            ("jump_velocity", self.jump_velocity),
            ("hitbox_inset", self.hitbox_inset),
            ("obstacle_margin", self.obstacle_margin),
            ("grid_cell_size", self.grid_cell_size),
            ("reference_dt", self.reference_dt),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(invalid(field, format!("{value} is not finite")));
            }
        }

        let non_negative = [
            ("move_acceleration", self.move_acceleration),
            ("move_deceleration", self.move_deceleration),
            ("max_speed", self.max_speed),
            ("air_control_factor", self.air_control_factor),
            ("ground_friction", self.ground_friction),
            ("air_friction", self.air_friction),
            ("wall_friction", self.wall_friction),
            ("jump_velocity", self.jump_velocity),
            ("hitbox_inset", self.hitbox_inset),
            ("obstacle_margin", self.obstacle_margin),
        ];
        for (field, value) in non_negative {
            if value < 0.0 {
                return Err(invalid(field, format!("{value} must not be negative")));
            }
        }

        if !(0.0..=1.0).contains(&self.gravity_transition_rate) {
            return Err(invalid(
                "gravity_transition_rate",
                format!("{} is outside [0, 1]", self.gravity_transition_rate),
            ));
        }
        if self.max_rise_speed > self.max_fall_speed {
            return Err(invalid(
                "max_rise_speed",
                format!(
                    "{} exceeds max_fall_speed {}",
                    self.max_rise_speed, self.max_fall_speed
                ),
            ));
        }
        if self.reference_dt <= 0.0 {
            return Err(invalid("reference_dt", "must be positive"));
        }
        if self.continuous_collision_steps == 0 {
            return Err(invalid("continuous_collision_steps", "must be at least 1"));
        }
        if self.grid_cell_size <= 0.0 {
            log::warn!(
                "grid_cell_size {} is not positive; spatial index will use a single bucket",
                self.grid_cell_size
            );
        }
        Ok(())
    }
}
