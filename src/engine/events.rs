use crate::components::ObstacleId;

/// Outbound notifications produced by the core during a tick. The caller
/// drains them and forwards them to whatever subscribers it has (audio,
/// particles, UI); the core never waits on a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicsEvent {
    GravityChanged { inverted: bool },
    /// The body landed this tick after being airborne.
    Grounded,
    JumpBufferConsumed,
    Jumped,
    /// The body touched a non-solid obstacle (spike, hazard disc).
    HazardContact { id: ObstacleId },
}
