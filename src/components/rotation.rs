use bevy_ecs::prelude::Component;

/// Visual rotation in degrees, counter-clockwise.
#[derive(Component, Clone, Debug, Copy, Default)]
pub struct Rotation {
    pub degrees: f32,
}
