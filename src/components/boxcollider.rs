use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Layer bit for solid ground (platforms and spline surfaces).
pub const LAYER_GROUND: u32 = 1 << 0;
/// Layer bit for players.
pub const LAYER_PLAYER: u32 = 1 << 1;
/// Layer bit for cell detection regions.
pub const LAYER_CELL: u32 = 1 << 2;

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct BoxCollider {
    pub size: Vec2,
    pub offset: Vec2,
    /// Layer bits this collider belongs to.
    pub layers: u32,
    /// Triggers report overlap but are never stood on.
    pub trigger: bool,
}

impl BoxCollider {
    /// Create a solid BoxCollider with given size on the ground layer.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            offset: Vec2::ZERO,
            layers: LAYER_GROUND,
            trigger: false,
        }
    }

    /// Offset that puts the collider center on the entity position.
    pub fn centered(mut self) -> Self {
        self.offset = self.size * -0.5;
        self
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn as_trigger(mut self) -> Self {
        self.trigger = true;
        self
    }

    pub fn in_mask(&self, mask: u32) -> bool {
        self.layers & mask != 0
    }

    /// Returns (min, max) of the collider AABB for a given entity position.
    /// Handles negative size by normalizing to proper min/max.
    pub fn aabb(&self, position: Vec2) -> (Vec2, Vec2) {
        let p0 = position + self.offset;
        let p1 = p0 + self.size;
        (p0.min(p1), p0.max(p1))
    }

    /// AABB vs AABB overlap test against another BoxCollider at a different entity position.
    pub fn overlaps(&self, position: Vec2, other: &Self, other_position: Vec2) -> bool {
        let (min_a, max_a) = self.aabb(position);
        let (min_b, max_b) = other.aabb(other_position);
        min_a.x < max_b.x && max_a.x > min_b.x && min_a.y < max_b.y && max_a.y > min_b.y
    }

    /// Cast a ray straight down from `origin` for at most `distance`.
    ///
    /// Returns the distance to the top face, or 0.0 when `origin` already lies
    /// inside the box. Edges count as hits.
    pub fn cast_down(&self, position: Vec2, origin: Vec2, distance: f32) -> Option<f32> {
        let (min, max) = self.aabb(position);
        if origin.x < min.x || origin.x > max.x {
            return None;
        }
        if origin.y < min.y {
            return None;
        }
        if origin.y <= max.y {
            return Some(0.0);
        }
        let d = origin.y - max.y;
        (d <= distance).then_some(d)
    }
}
