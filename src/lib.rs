pub mod components;
pub mod config;
pub mod engine;
pub mod scene;
pub mod simulation;
pub mod systems;
pub mod world;

pub use config::{ConfigError, PhysicsConfig, SpikeTest};
pub use simulation::Simulation;
pub use world::{ObstacleWorld, Oscillator, WorldError};
