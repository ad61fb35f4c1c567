//! Player motion controller.
//!
//! [`PlayerMotion`] owns the momentum model of the player: grounding, jump
//! charges, braking and snapping acceleration, boost cooldown, plummeting, and
//! the spline-locked locomotion mode. It never integrates positions itself
//! (except when teleporting along a spline); it decides velocities on the
//! entity's [`RigidBody`] and leaves integration to
//! [`movement`](crate::systems::movement::movement).
//!
//! One fixed tick of [`PlayerMotion::update_motion`] runs four phases:
//!
//! 1. **assert grounded** - consume the downward ground probe, attach to or
//!    detach from spline ground, report land / leave-ground transitions
//! 2. **horizontal** - accelerate toward the input direction, brake when
//!    reversing, snap low speeds up, apply drag with no input, then either
//!    follow the locked spline or move freely along the ground normal
//! 3. **vertical** - apply the custom gravity and plummet acceleration
//! 4. **rotation** - align visuals to the ground normal, or reset when airborne
//!
//! Actions (`jump`, `boost`, `reverse_motion`, `plummet`) are guarded by their
//! `can_*` predicates and return `false` without side effects when rejected.

use bevy_ecs::prelude::*;
use bevy_ecs::query::QueryFilter;
use glam::Vec2;
use log::warn;
use rustc_hash::FxHashMap;

use crate::components::boxcollider::LAYER_GROUND;
use crate::components::mapposition::MapPosition;
use crate::components::rigidbody::RigidBody;
use crate::components::rotation::Rotation;
use crate::components::spline::SplinePath;
use crate::geometry::{is_zero, move_towards, rotate_from_normal, rotate_to_normal, sign, slope_angle};

/// Result of the downward ground probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub entity: Entity,
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

/// Grounding change detected during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTransition {
    Landed,
    LeftGround,
}

/// Resolves ground entities to spline surfaces.
pub trait SplineLookup {
    fn spline(&self, entity: Entity) -> Option<&SplinePath>;
}

impl<F: QueryFilter> SplineLookup for Query<'_, '_, &SplinePath, F> {
    fn spline(&self, entity: Entity) -> Option<&SplinePath> {
        self.get(entity).ok()
    }
}

impl SplineLookup for FxHashMap<Entity, SplinePath> {
    fn spline(&self, entity: Entity) -> Option<&SplinePath> {
        self.get(&entity)
    }
}

/// No spline surfaces at all.
impl SplineLookup for () {
    fn spline(&self, _entity: Entity) -> Option<&SplinePath> {
        None
    }
}

/// Tunable constants of the motion model.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionParams {
    pub max_jumps: u32,
    /// Vertical speed set by a jump.
    pub jump_speed: f32,
    /// Control weight multiplier while airborne (< 1).
    pub aerial_control: f32,
    /// Extra downward speed subtracted every tick while plummeting.
    pub plummet_acceleration: f32,
    /// Seconds after a jump during which spline ground cannot be attached.
    pub magnetless_buffer: f32,
    pub ground_check_distance: f32,
    /// Ground probe origin relative to the entity position.
    pub ground_check_offset: Vec2,
    /// Feet position relative to the entity position.
    pub bottom_offset: Vec2,
    /// Layers the ground probe hits.
    pub ground_mask: u32,
    pub horizontal_acceleration: f32,
    /// Below this speed, accelerating input is multiplied by `snap_multiplier`.
    pub snap_speed_threshold: f32,
    pub snap_multiplier: f32,
    pub brake_multiplier: f32,
    /// Fraction of `horizontal_acceleration` used as drag with no input.
    pub flat_drag_percent: f32,
    pub boost_speed: f32,
    pub boost_cooldown: f32,
    /// Custom gravity subtracted from velocity every second.
    pub gravity: Vec2,
    pub velocity_zero_threshold: f32,
    pub spline_search_resolution: usize,
    pub spline_search_iterations: usize,
    pub spline_refine_iterations: usize,
    pub spline_refine_step: f32,
    pub spline_refine_falloff: f32,
    pub spline_refine_good_enough: f32,
    /// Height kept between the feet and a followed spline surface.
    pub spline_surface_offset: f32,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            max_jumps: 4,
            jump_speed: 2.0,
            aerial_control: 0.5,
            plummet_acceleration: 0.25,
            magnetless_buffer: 0.2,
            ground_check_distance: 0.1,
            ground_check_offset: Vec2::new(0.0, -1.0),
            bottom_offset: Vec2::new(0.0, -1.0),
            ground_mask: LAYER_GROUND,
            horizontal_acceleration: 2.0,
            snap_speed_threshold: 10.0,
            snap_multiplier: 40.0,
            brake_multiplier: 20.0,
            flat_drag_percent: 0.5,
            boost_speed: 20.0,
            boost_cooldown: 5.0,
            gravity: Vec2::new(0.0, 1.0),
            velocity_zero_threshold: 0.01,
            spline_search_resolution: 100,
            spline_search_iterations: 4,
            spline_refine_iterations: 100,
            spline_refine_step: 0.2,
            spline_refine_falloff: 0.9,
            spline_refine_good_enough: 0.02,
            spline_surface_offset: 0.01,
        }
    }
}

/// Body state captured on pause.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PauseSnapshot {
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub kinematic: bool,
}

#[derive(Component, Debug, Clone)]
pub struct PlayerMotion {
    pub params: MotionParams,
    /// Signed horizontal input, only its sign is used.
    pub input_speed: f32,
    contact: bool,
    ground_hit: Option<GroundHit>,
    ground_normal: Vec2,
    spline_ground: Option<Entity>,
    spline_t: Option<f32>,
    jumps_left: u32,
    plummeting: bool,
    breaking: bool,
    pause_snapshot: Option<PauseSnapshot>,
    previous_boost_time: f32,
    previous_jump_time: f32,
    initial_gravity_scale: f32,
}

impl Default for PlayerMotion {
    fn default() -> Self {
        Self::new(MotionParams::default())
    }
}

impl PlayerMotion {
    /// Starts airborne with full jump charges and the boost ready.
    pub fn new(params: MotionParams) -> Self {
        let jumps_left = params.max_jumps;
        let previous_boost_time = -params.boost_cooldown;
        Self {
            params,
            input_speed: 0.0,
            contact: false,
            ground_hit: None,
            ground_normal: Vec2::Y,
            spline_ground: None,
            spline_t: None,
            jumps_left,
            plummeting: false,
            breaking: false,
            pause_snapshot: None,
            previous_boost_time,
            previous_jump_time: f32::NEG_INFINITY,
            initial_gravity_scale: 1.0,
        }
    }

    /// Remember the body's gravity scale so it can be restored after spline
    /// locomotion releases control.
    pub fn capture_gravity_scale(mut self, body: &RigidBody) -> Self {
        self.initial_gravity_scale = body.gravity_scale;
        self
    }

    // ==================== STATE ====================

    /// Touching ground or locked to a spline surface.
    pub fn grounded(&self) -> bool {
        self.contact || self.spline_ground.is_some()
    }

    pub fn jumps_left(&self) -> u32 {
        self.jumps_left
    }

    pub fn plummeting(&self) -> bool {
        self.plummeting
    }

    /// Grounded and pushing against the current velocity.
    pub fn breaking(&self) -> bool {
        self.breaking
    }

    pub fn spline_ground(&self) -> Option<Entity> {
        self.spline_ground
    }

    /// Arc-length fraction along the locked spline.
    pub fn spline_t(&self) -> Option<f32> {
        self.spline_t
    }

    pub fn ground_normal(&self) -> Vec2 {
        self.ground_normal
    }

    pub fn is_paused(&self) -> bool {
        self.pause_snapshot.is_some()
    }

    /// Spline ground may attach once the post-jump buffer has run out.
    fn can_magnet(&self, now: f32) -> bool {
        now - self.previous_jump_time >= self.params.magnetless_buffer
    }

    fn detach_spline(&mut self) {
        self.spline_ground = None;
        self.spline_t = None;
    }

    fn claim_control(&self, body: &mut RigidBody, controlling: bool) {
        if controlling {
            body.kinematic = true;
            body.gravity_scale = 0.0;
        } else {
            body.kinematic = false;
            body.gravity_scale = self.initial_gravity_scale;
        }
    }

    // ==================== TICK ====================

    /// Run one fixed tick. `hit` is the result of the downward ground probe.
    ///
    /// Does nothing while paused.
    pub fn update_motion(
        &mut self,
        now: f32,
        dt: f32,
        body: &mut RigidBody,
        position: &mut MapPosition,
        rotation: &mut Rotation,
        hit: Option<GroundHit>,
        splines: &impl SplineLookup,
    ) -> Option<GroundTransition> {
        if self.is_paused() {
            return None;
        }
        let transition = self.assert_grounded(now, hit, splines);
        self.update_horizontal(dt, body, position, splines);
        self.update_vertical(dt, body);
        self.update_rotation(rotation);
        transition
    }

    /// Apply a ground probe result and adjust jump charges on transitions.
    pub fn assert_grounded(
        &mut self,
        now: f32,
        hit: Option<GroundHit>,
        splines: &impl SplineLookup,
    ) -> Option<GroundTransition> {
        let was_grounded = self.grounded();
        self.contact = hit.is_some();
        self.ground_hit = hit;

        if !self.can_magnet(now) {
            self.detach_spline();
        } else if let Some(h) = hit {
            if splines.spline(h.entity).is_some() {
                if self.spline_ground != Some(h.entity) {
                    self.spline_ground = Some(h.entity);
                    self.spline_t = None;
                }
            } else {
                self.detach_spline();
            }
        }

        if let Some(h) = hit {
            self.ground_normal = h.normal;
        } else if self.spline_ground.is_none() {
            self.ground_normal = Vec2::Y;
        }

        let grounded = self.grounded();
        if grounded && !was_grounded {
            self.jumps_left = self.params.max_jumps;
            Some(GroundTransition::Landed)
        } else if !grounded && was_grounded {
            if self.jumps_left == self.params.max_jumps {
                self.jumps_left -= 1;
            }
            Some(GroundTransition::LeftGround)
        } else {
            None
        }
    }

    /// Horizontal acceleration, drag, and the choice between spline and free motion.
    pub fn update_horizontal(
        &mut self,
        dt: f32,
        body: &mut RigidBody,
        position: &mut MapPosition,
        splines: &impl SplineLookup,
    ) {
        let p = &self.params;
        let grounded = self.grounded();
        let normal = if grounded { self.ground_normal } else { Vec2::Y };
        let h = sign(self.input_speed);
        let mut weight = if grounded {
            h as f32
        } else {
            h as f32 * p.aerial_control
        };

        let mut velocity = rotate_from_normal(body.velocity, normal);
        let velocity_sign = sign(velocity.x);

        if h == 0 && is_zero(velocity.x, p.velocity_zero_threshold) {
            velocity.x = 0.0;
            if self.spline_ground.is_none() {
                self.claim_control(body, false);
            }
            body.velocity = rotate_to_normal(velocity, normal);
            self.breaking = false;
            return;
        }

        let reversing = h != 0 && h == -velocity_sign;
        if reversing {
            weight *= if grounded {
                p.brake_multiplier
            } else {
                p.brake_multiplier * p.aerial_control * p.aerial_control
            };
        } else if velocity.x.abs() < p.snap_speed_threshold {
            weight *= if grounded {
                p.snap_multiplier
            } else {
                p.snap_multiplier * p.aerial_control
            };
        }

        velocity.x += p.horizontal_acceleration * weight * dt;

        if grounded && h == 0 && !is_zero(velocity.x, p.velocity_zero_threshold) {
            let slow_by = p.horizontal_acceleration * p.flat_drag_percent * dt;
            velocity.x = move_towards(velocity.x, 0.0, slow_by);
        }
        self.breaking = grounded && reversing;

        match self.spline_ground {
            Some(spline) => self.move_along_spline(spline, velocity, dt, body, position, splines),
            None => self.move_in_world(velocity, normal, body),
        }
    }

    fn move_in_world(&self, flat_velocity: Vec2, normal: Vec2, body: &mut RigidBody) {
        self.claim_control(body, false);
        body.velocity = rotate_to_normal(flat_velocity, normal);
    }

    fn move_along_spline(
        &mut self,
        entity: Entity,
        flat_velocity: Vec2,
        dt: f32,
        body: &mut RigidBody,
        position: &mut MapPosition,
        splines: &impl SplineLookup,
    ) {
        let normal = self.ground_normal;
        let Some(spline) = splines.spline(entity) else {
            warn!("Spline ground {:?} is gone, detaching", entity);
            self.detach_spline();
            self.move_in_world(flat_velocity, normal, body);
            return;
        };

        let p = &self.params;
        let t = match self.spline_t {
            Some(t) => t,
            None => {
                let contact = self
                    .ground_hit
                    .map(|h| h.point)
                    .unwrap_or(position.pos + p.bottom_offset);
                let (nearest, t) = spline.nearest_point(
                    contact,
                    p.spline_search_resolution,
                    p.spline_search_iterations,
                );
                spline.refine_parameter(
                    contact,
                    nearest,
                    t,
                    p.spline_refine_iterations,
                    p.spline_refine_step,
                    p.spline_refine_falloff,
                    p.spline_refine_good_enough,
                )
            }
        };

        let target_t = t + flat_velocity.x * dt / spline.length();
        if !(0.0..=1.0).contains(&target_t) {
            self.detach_spline();
            self.move_in_world(flat_velocity, normal, body);
            return;
        }

        let surface = spline.evaluate(target_t);
        let surface_normal = spline.normal(target_t);
        let bottom = position.pos + p.bottom_offset;
        position.pos += surface - bottom;
        position.pos.y += p.spline_surface_offset;

        self.spline_t = Some(target_t);
        self.ground_normal = surface_normal;
        self.claim_control(body, true);
        body.velocity = rotate_to_normal(Vec2::new(flat_velocity.x, 0.0), surface_normal);
    }

    /// Custom gravity and plummet. Skipped while kinematic.
    pub fn update_vertical(&mut self, dt: f32, body: &mut RigidBody) {
        if body.kinematic {
            return;
        }
        body.velocity -= self.params.gravity * dt;
        if self.plummeting {
            body.velocity.y -= self.params.plummet_acceleration;
        }
    }

    pub fn update_rotation(&self, rotation: &mut Rotation) {
        rotation.degrees = if self.grounded() {
            slope_angle(self.ground_normal).to_degrees()
        } else {
            0.0
        };
    }

    // ==================== ACTIONS ====================

    pub fn can_jump(&self) -> bool {
        self.grounded() || self.jumps_left > 0
    }

    pub fn jump(&mut self, now: f32, body: &mut RigidBody) -> bool {
        if !self.can_jump() {
            return false;
        }
        self.jumps_left = self.jumps_left.saturating_sub(1);
        self.previous_jump_time = now;
        self.detach_spline();
        self.claim_control(body, false);
        body.velocity.y = self.params.jump_speed;
        true
    }

    pub fn can_boost(&self, now: f32) -> bool {
        now - self.previous_boost_time >= self.params.boost_cooldown
    }

    /// Cooldown progress in [0, 1].
    pub fn boost_percent_ready(&self, now: f32) -> f32 {
        if self.params.boost_cooldown <= 0.0 {
            return 1.0;
        }
        ((now - self.previous_boost_time) / self.params.boost_cooldown).clamp(0.0, 1.0)
    }

    /// Add `boost_speed` along the current direction of travel.
    pub fn boost(&mut self, now: f32, body: &mut RigidBody) -> bool {
        if !self.can_boost(now) {
            return false;
        }
        self.previous_boost_time = now;
        let angle = body.velocity.y.atan2(body.velocity.x);
        body.velocity += Vec2::from_angle(angle) * self.params.boost_speed;
        true
    }

    pub fn can_reverse_motion(&self) -> bool {
        self.grounded() || self.jumps_left > 0
    }

    /// Negate horizontal velocity. Costs a charge when airborne.
    pub fn reverse_motion(&mut self, body: &mut RigidBody) -> bool {
        if !self.can_reverse_motion() {
            return false;
        }
        if !self.grounded() {
            self.jumps_left = self.jumps_left.saturating_sub(1);
        }
        body.velocity.x = -body.velocity.x;
        true
    }

    /// Plummeting is always allowed, grounded or not. The predicate exists so
    /// every action has the same `can_*` guard shape.
    pub fn can_plummet(&self) -> bool {
        true
    }

    pub fn plummet(&mut self, body: &mut RigidBody) -> bool {
        if !self.can_plummet() {
            return false;
        }
        if body.velocity.y > 0.0 {
            body.velocity.y = -self.params.plummet_acceleration;
        }
        self.plummeting = true;
        true
    }

    pub fn stop_plummet(&mut self) {
        self.plummeting = false;
    }

    // ==================== PAUSE ====================

    /// Freeze the body on pause and restore it exactly on resume.
    ///
    /// Repeated calls with the same state are ignored.
    pub fn on_pause(&mut self, paused: bool, body: &mut RigidBody) {
        if paused {
            if self.pause_snapshot.is_some() {
                return;
            }
            self.pause_snapshot = Some(PauseSnapshot {
                velocity: body.velocity,
                angular_velocity: body.angular_velocity,
                kinematic: body.kinematic,
            });
            body.velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
            body.kinematic = true;
        } else if let Some(snapshot) = self.pause_snapshot.take() {
            body.kinematic = snapshot.kinematic;
            body.velocity = snapshot.velocity;
            body.angular_velocity = snapshot.angular_velocity;
        }
    }
}
