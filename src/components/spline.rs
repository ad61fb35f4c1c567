//! Curved ground surface the player can lock onto.
//!
//! A [`SplinePath`] is a Catmull-Rom curve through a list of world-space
//! control points. The curve is resampled into a dense polyline on
//! construction so that it can be parameterised by arc length: `t = 0.0` is
//! the first control point, `t = 1.0` the last, and equal steps in `t` cover
//! equal distances along the surface.
//!
//! Collision against the surface uses a coarser set of edge points spaced
//! `edge_spacing` apart, the same way an edge collider would be built from the
//! curve.

use bevy_ecs::prelude::Component;
use glam::Vec2;

/// Polyline samples generated per control-point segment.
const SAMPLES_PER_SEGMENT: usize = 16;

#[derive(Component, Clone, Debug)]
pub struct SplinePath {
    samples: Vec<Vec2>,
    cumulative: Vec<f32>,
    edges: Vec<Vec2>,
    /// Distance between collision edge points.
    pub edge_spacing: f32,
    /// Layer bits the surface belongs to.
    pub layers: u32,
}

impl SplinePath {
    /// Build a path through `points`.
    ///
    /// Fails for fewer than two points, for a zero-length curve, or for a
    /// non-positive `edge_spacing`.
    pub fn new(points: Vec<Vec2>, edge_spacing: f32, layers: u32) -> Result<Self, String> {
        if points.len() < 2 {
            return Err(format!(
                "spline needs at least 2 control points, got {}",
                points.len()
            ));
        }
        if edge_spacing <= 0.0 {
            return Err(format!("spline edge spacing must be positive, got {}", edge_spacing));
        }

        let samples = sample_catmull_rom(&points);
        let mut cumulative = Vec::with_capacity(samples.len());
        let mut total = 0.0;
        cumulative.push(0.0);
        for pair in samples.windows(2) {
            total += pair[0].distance(pair[1]);
            cumulative.push(total);
        }
        if total <= f32::EPSILON {
            return Err("spline has zero length".to_string());
        }

        let mut path = Self {
            samples,
            cumulative,
            edges: Vec::new(),
            edge_spacing,
            layers,
        };
        path.edges = path.edge_points(edge_spacing);
        Ok(path)
    }

    /// Total arc length.
    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    pub fn in_mask(&self, mask: u32) -> bool {
        self.layers & mask != 0
    }

    /// Polyline segment index containing arc-length fraction `t` and the local
    /// fraction within that segment. `t` is clamped to [0, 1].
    fn locate(&self, t: f32) -> (usize, f32) {
        let target = t.clamp(0.0, 1.0) * self.length();
        let upper = self.cumulative.partition_point(|&d| d < target);
        let seg = upper.saturating_sub(1).min(self.samples.len() - 2);
        let start = self.cumulative[seg];
        let span = self.cumulative[seg + 1] - start;
        let local = if span > 0.0 { (target - start) / span } else { 0.0 };
        (seg, local.clamp(0.0, 1.0))
    }

    /// Position at arc-length fraction `t`.
    pub fn evaluate(&self, t: f32) -> Vec2 {
        let (seg, local) = self.locate(t);
        self.samples[seg].lerp(self.samples[seg + 1], local)
    }

    /// Unit direction of travel at `t`.
    pub fn tangent(&self, t: f32) -> Vec2 {
        let (seg, _) = self.locate(t);
        (self.samples[seg + 1] - self.samples[seg]).normalize_or(Vec2::X)
    }

    /// Unit surface normal at `t`, always pointing to the upper side.
    pub fn normal(&self, t: f32) -> Vec2 {
        let n = self.tangent(t).perp();
        if n.y < 0.0 { -n } else { n }
    }

    /// Coarse nearest-point search.
    ///
    /// Samples `resolution` evenly spaced parameters, then narrows the window
    /// around the best one `iterations` times. Returns the point and its `t`.
    pub fn nearest_point(&self, target: Vec2, resolution: usize, iterations: usize) -> (Vec2, f32) {
        let n = resolution.max(2);
        let mut lo = 0.0_f32;
        let mut hi = 1.0_f32;
        let mut best_t = 0.0;
        let mut best_d = f32::INFINITY;
        for _ in 0..iterations.max(1) {
            for i in 0..=n {
                let t = lo + (hi - lo) * i as f32 / n as f32;
                let d = self.evaluate(t).distance_squared(target);
                if d < best_d {
                    best_d = d;
                    best_t = t;
                }
            }
            let span = (hi - lo) / n as f32;
            lo = (best_t - span).max(0.0);
            hi = (best_t + span).min(1.0);
        }
        (self.evaluate(best_t), best_t)
    }

    /// Walk `t` toward the parameter closest to `contact`.
    ///
    /// Each step tries moving `t` forward and backward by a distance-scaled
    /// amount and keeps whichever lands closer. The step shrinks by
    /// `falloff_mult` every time the chosen direction flips. Stops after
    /// `iterations` steps or once within `good_enough` of `contact`.
    pub fn refine_parameter(
        &self,
        contact: Vec2,
        nearest: Vec2,
        t: f32,
        iterations: usize,
        add_mult: f32,
        falloff_mult: f32,
        good_enough: f32,
    ) -> f32 {
        let length = self.length();
        let mut t = t;
        let mut nearest = nearest;
        let mut falloff = 1.0;
        let mut previous_move = 0;
        for _ in 0..iterations {
            let dist = contact.distance(nearest);
            if dist <= good_enough {
                break;
            }
            let step = (dist / length) * add_mult * falloff;
            let forward = self.evaluate(t + step);
            let backward = self.evaluate(t - step);
            let moved = if forward.distance(contact) < backward.distance(contact) {
                t += step;
                nearest = forward;
                1
            } else {
                t -= step;
                nearest = backward;
                -1
            };
            if previous_move != 0 && moved != previous_move {
                falloff *= falloff_mult;
            }
            previous_move = moved;
        }
        t.clamp(0.0, 1.0)
    }

    /// Points spaced roughly `dx` apart along the curve, both ends included.
    pub fn edge_points(&self, dx: f32) -> Vec<Vec2> {
        let n = ((self.length() / dx).round() as usize).max(1);
        (0..=n)
            .map(|i| self.evaluate(i as f32 / n as f32))
            .collect()
    }

    /// Cast a ray straight down from `origin` against the collision edges.
    ///
    /// Returns the contact point, its surface normal, and the distance travelled.
    pub fn cast_down(&self, origin: Vec2, distance: f32) -> Option<(Vec2, Vec2, f32)> {
        let mut best: Option<(Vec2, Vec2, f32)> = None;
        for pair in self.edges.windows(2) {
            let Some(y) = height_on_segment(pair[0], pair[1], origin.x) else {
                continue;
            };
            let d = origin.y - y;
            if !(0.0..=distance).contains(&d) {
                continue;
            }
            if best.is_none_or(|(_, _, bd)| d < bd) {
                let n = (pair[1] - pair[0]).perp().normalize_or(Vec2::Y);
                let n = if n.y < 0.0 { -n } else { n };
                best = Some((Vec2::new(origin.x, y), n, d));
            }
        }
        best
    }

    /// Highest surface height at world `x`, if the curve spans it.
    pub fn surface_height_at(&self, x: f32) -> Option<f32> {
        self.edges
            .windows(2)
            .filter_map(|pair| height_on_segment(pair[0], pair[1], x))
            .reduce(f32::max)
    }
}

fn height_on_segment(a: Vec2, b: Vec2, x: f32) -> Option<f32> {
    let (lo, hi) = if a.x <= b.x { (a, b) } else { (b, a) };
    if x < lo.x || x > hi.x {
        return None;
    }
    let span = hi.x - lo.x;
    if span <= f32::EPSILON {
        return Some(lo.y.max(hi.y));
    }
    Some(lo.y + (hi.y - lo.y) * (x - lo.x) / span)
}

fn sample_catmull_rom(points: &[Vec2]) -> Vec<Vec2> {
    let last = points.len() - 1;
    let mut out = Vec::with_capacity(last * SAMPLES_PER_SEGMENT + 1);
    for i in 0..last {
        let p0 = points[i.saturating_sub(1)];
        let p1 = points[i];
        let p2 = points[i + 1];
        let p3 = points[(i + 2).min(last)];
        for s in 0..SAMPLES_PER_SEGMENT {
            let u = s as f32 / SAMPLES_PER_SEGMENT as f32;
            out.push(catmull_rom(p0, p1, p2, p3, u));
        }
    }
    out.push(points[last]);
    out
}

fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, u: f32) -> Vec2 {
    let u2 = u * u;
    let u3 = u2 * u;
    0.5 * ((2.0 * p1)
        + (p2 - p0) * u
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * u2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * u3)
}
