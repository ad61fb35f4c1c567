//! Rigid body integrator.
//!
//! Applies gravity, integrates velocity into [`MapPosition`] and angular
//! velocity into [`Rotation`]. Kinematic bodies are left alone.
//!
//! Solid player colliders that cross the top of a ground box or a spline
//! surface from above during the step are set down on it and lose their
//! downward velocity. There is no other collision response.
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::boxcollider::{BoxCollider, LAYER_GROUND, LAYER_PLAYER};
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::components::rotation::Rotation;
use crate::components::spline::SplinePath;
use crate::resources::worldtime::WorldTime;

/// Tolerance when deciding whether a body started above a surface.
const LANDING_EPSILON: f32 = 1e-3;

pub fn movement(
    time: Res<WorldTime>,
    mut bodies: Query<(
        &mut MapPosition,
        &mut RigidBody,
        Option<&mut Rotation>,
        Option<&BoxCollider>,
    )>,
    ground: Query<(&MapPosition, &BoxCollider), Without<RigidBody>>,
    surfaces: Query<&SplinePath>,
) {
    let dt = time.delta;
    if dt <= 0.0 {
        return;
    }
    for (mut position, mut body, rotation, collider) in bodies.iter_mut() {
        if body.kinematic {
            continue;
        }
        let acceleration = body.acceleration();
        body.velocity += acceleration * dt;
        let previous = position.pos;
        position.pos += body.velocity * dt;
        if let Some(mut rotation) = rotation {
            rotation.degrees += body.angular_velocity * dt;
        }

        let Some(collider) = collider else {
            continue;
        };
        if collider.trigger || !collider.in_mask(LAYER_PLAYER) || body.velocity.y > 0.0 {
            continue;
        }
        let landing = landing_height(
            collider,
            previous,
            position.pos,
            ground.iter().map(|(p, c)| (p.pos, c)),
            surfaces.iter(),
        );
        if let Some(top) = landing {
            let (min, _) = collider.aabb(position.pos);
            position.pos.y += top - min.y;
            body.velocity.y = 0.0;
        }
    }
}

/// Highest ground surface the collider's bottom edge passed through while
/// moving from `from` to `to`.
fn landing_height<'a>(
    collider: &BoxCollider,
    from: Vec2,
    to: Vec2,
    boxes: impl Iterator<Item = (Vec2, &'a BoxCollider)>,
    splines: impl Iterator<Item = &'a SplinePath>,
) -> Option<f32> {
    let (old_min, _) = collider.aabb(from);
    let (new_min, new_max) = collider.aabb(to);
    let crossed = |top: f32| old_min.y >= top - LANDING_EPSILON && new_min.y < top;

    let box_tops = boxes
        .filter(|(_, c)| !c.trigger && c.in_mask(LAYER_GROUND))
        .filter_map(|(pos, c)| {
            let (gmin, gmax) = c.aabb(pos);
            let spans = new_min.x < gmax.x && new_max.x > gmin.x;
            (spans && crossed(gmax.y)).then_some(gmax.y)
        });
    let center_x = (new_min.x + new_max.x) * 0.5;
    let spline_tops = splines
        .filter(|s| s.in_mask(LAYER_GROUND))
        .filter_map(|s| s.surface_height_at(center_x))
        .filter(|&h| crossed(h));

    box_tops.chain(spline_tops).reduce(f32::max)
}
