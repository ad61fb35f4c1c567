//! Grounding notifications.
//!
//! The motion system triggers these when the player's grounded state flips
//! during a tick. They carry no payload beyond the player entity; read
//! [`PlayerMotion`](crate::components::motion::PlayerMotion) for details.
use bevy_ecs::prelude::*;

/// The player touched ground or locked to a spline after being airborne.
#[derive(Event, Debug, Clone, Copy)]
pub struct LandEvent {
    pub player: Entity,
}

/// The player lost ground contact.
#[derive(Event, Debug, Clone, Copy)]
pub struct LeaveGroundEvent {
    pub player: Entity,
}
