//! Rigid body state read and written by the motion controller.
//!
//! The [`RigidBody`] component stores linear and angular velocity for an
//! entity together with the gravity it experiences. The
//! [`movement`](crate::systems::movement::movement) system integrates it into
//! [`MapPosition`](super::mapposition::MapPosition).
//!
//! The `kinematic` flag hands control of the entity's position to game code:
//! the integrator skips kinematic bodies entirely. The player motion
//! controller sets it while following a spline surface and while paused.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Body storing velocity, angular velocity, and gravity settings.
///
/// # Fields
/// - `velocity` - Current velocity in world units per second
/// - `angular_velocity` - Rotation speed in degrees per second
/// - `gravity` - World gravity acceleration applied to this body
/// - `gravity_scale` - Multiplier on `gravity` (0.0 disables it)
/// - `kinematic` - When true, the integrator leaves this body alone
///
/// # Example
/// ```ignore
/// let mut rb = RigidBody::with_gravity(Vec2::new(0.0, -9.81));
/// rb.velocity = Vec2::new(3.0, 0.0);
///
/// // Take over positioning (e.g., following a spline)
/// rb.kinematic = true;
/// ```
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct RigidBody {
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Angular velocity in degrees per second.
    pub angular_velocity: f32,
    /// Gravity acceleration in world units per second squared.
    pub gravity: Vec2,
    /// Multiplier applied to `gravity`.
    pub gravity_scale: f32,
    /// When true, the movement system skips all physics for this entity.
    /// Position can still be modified directly.
    pub kinematic: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self::new()
    }
}

impl RigidBody {
    /// Create a RigidBody at rest with no gravity.
    pub fn new() -> Self {
        Self {
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            gravity: Vec2::ZERO,
            gravity_scale: 1.0,
            kinematic: false,
        }
    }

    /// Create a RigidBody at rest affected by `gravity`.
    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..Self::new()
        }
    }

    /// Effective acceleration from gravity.
    pub fn acceleration(&self) -> Vec2 {
        self.gravity * self.gravity_scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-6;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_rigidbody_new() {
        let rb = RigidBody::new();
        assert_eq!(rb.velocity, Vec2::ZERO);
        assert_eq!(rb.angular_velocity, 0.0);
        assert_eq!(rb.acceleration(), Vec2::ZERO);
        assert!(!rb.kinematic);
    }

    #[test]
    fn test_acceleration_uses_gravity_scale() {
        let mut rb = RigidBody::with_gravity(Vec2::new(0.0, -10.0));
        assert!(approx_eq(rb.acceleration().y, -10.0));
        rb.gravity_scale = 0.0;
        assert_eq!(rb.acceleration(), Vec2::ZERO);
        rb.gravity_scale = 2.0;
        assert!(approx_eq(rb.acceleration().y, -20.0));
    }
}
