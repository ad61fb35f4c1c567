//! Downward ground probe.
//!
//! Casts a vertical ray against solid box colliders and spline surfaces and
//! returns the closest hit. Boxes always report an upward normal; splines
//! report the normal of the edge that was hit.
use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::boxcollider::BoxCollider;
use crate::components::motion::GroundHit;
use crate::components::spline::SplinePath;

/// Cast a ray from `origin` straight down for at most `distance`.
///
/// Triggers and anything outside `mask` are ignored. A ray starting inside a
/// box hits it at distance 0.
pub fn cast_ground<'a>(
    origin: Vec2,
    distance: f32,
    mask: u32,
    boxes: impl IntoIterator<Item = (Entity, Vec2, &'a BoxCollider)>,
    splines: impl IntoIterator<Item = (Entity, &'a SplinePath)>,
) -> Option<GroundHit> {
    let box_hits = boxes
        .into_iter()
        .filter(|(_, _, collider)| !collider.trigger && collider.in_mask(mask))
        .filter_map(|(entity, position, collider)| {
            collider
                .cast_down(position, origin, distance)
                .map(|d| GroundHit {
                    entity,
                    point: origin - Vec2::new(0.0, d),
                    normal: Vec2::Y,
                    distance: d,
                })
        });
    let spline_hits = splines
        .into_iter()
        .filter(|(_, spline)| spline.in_mask(mask))
        .filter_map(|(entity, spline)| {
            spline
                .cast_down(origin, distance)
                .map(|(point, normal, d)| GroundHit {
                    entity,
                    point,
                    normal,
                    distance: d,
                })
        });

    box_hits
        .chain(spline_hits)
        .fold(None, |best: Option<GroundHit>, hit| match best {
            Some(b) if b.distance <= hit.distance => Some(b),
            _ => Some(hit),
        })
}
