//! Player orchestration state.
//!
//! [`PlayerController`] sits on the player entity next to
//! [`PlayerMotion`](super::motion::PlayerMotion). It turns discrete input
//! intents into motion actions and keeps the score-facing state: combo
//! multiplier, score, health, facing, and the attack window.
//!
//! Jump and boost presses are buffered: a press is remembered for
//! `jump_request_buffer` / `boost_request_buffer` seconds and performed on the
//! first tick where the motion controller allows it.

use bevy_ecs::prelude::Component;

use crate::components::motion::PlayerMotion;
use crate::components::rigidbody::RigidBody;
use crate::geometry::sign;

/// Tunable constants of the player controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerParams {
    pub jump_request_buffer: f32,
    pub boost_request_buffer: f32,
    /// Horizontal speed above which the combo grows.
    pub combo_speed_threshold: f32,
    pub combo_per_second: f32,
    /// Combo at or above which every combo step also heals one point.
    pub combo_heal_threshold: f32,
    pub max_health: i32,
    pub attack_duration: f32,
    pub attack_cooldown: f32,
}

impl Default for PlayerParams {
    fn default() -> Self {
        Self {
            jump_request_buffer: 0.5,
            boost_request_buffer: 0.2,
            combo_speed_threshold: 50.0,
            combo_per_second: 0.5,
            combo_heal_threshold: 10.0,
            max_health: 20,
            attack_duration: 0.25,
            attack_cooldown: 0.5,
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct PlayerController {
    pub params: PlayerParams,
    pub jump_request: f32,
    pub boost_request: f32,
    pub facing_right: bool,
    pub combo: f32,
    pub score: u32,
    pub health: i32,
    last_combo_step: f32,
    attack_started: Option<f32>,
    last_attack: f32,
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new(PlayerParams::default())
    }
}

impl PlayerController {
    pub fn new(params: PlayerParams) -> Self {
        let health = params.max_health;
        Self {
            params,
            jump_request: -5.0,
            boost_request: -5.0,
            facing_right: true,
            combo: 1.0,
            score: 0,
            health,
            last_combo_step: 0.0,
            attack_started: None,
            last_attack: f32::NEG_INFINITY,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn request_jump(&mut self, now: f32) {
        self.jump_request = now;
    }

    pub fn request_boost(&mut self, now: f32) {
        self.boost_request = now;
    }

    /// Perform a buffered jump if one is pending and allowed.
    pub fn check_jump(&mut self, now: f32, motion: &mut PlayerMotion, body: &mut RigidBody) -> bool {
        if now - self.jump_request < self.params.jump_request_buffer && motion.jump(now, body) {
            // Consume the request so one press yields one jump.
            self.jump_request = now - self.params.jump_request_buffer;
            return true;
        }
        false
    }

    /// Perform a buffered boost if one is pending and the cooldown allows it.
    pub fn check_boost(&mut self, now: f32, motion: &mut PlayerMotion, body: &mut RigidBody) -> bool {
        now - self.boost_request < self.params.boost_request_buffer && motion.boost(now, body)
    }

    /// Face the direction of travel. Returns true when facing changed.
    pub fn check_flip(&mut self, velocity_x: f32) -> bool {
        match sign(velocity_x) {
            1 if !self.facing_right => {
                self.flip();
                true
            }
            -1 if self.facing_right => {
                self.flip();
                true
            }
            _ => false,
        }
    }

    pub fn flip(&mut self) {
        self.facing_right = !self.facing_right;
    }

    /// Reverse motion and turn around.
    pub fn dodge(&mut self, motion: &mut PlayerMotion, body: &mut RigidBody) -> bool {
        if self.is_dead() || !motion.reverse_motion(body) {
            return false;
        }
        self.flip();
        true
    }

    /// Start or stop plummeting.
    pub fn duck(&mut self, active: bool, motion: &mut PlayerMotion, body: &mut RigidBody) -> bool {
        if self.is_dead() {
            return false;
        }
        if active {
            motion.plummet(body)
        } else {
            motion.stop_plummet();
            true
        }
    }

    /// Open the attack window unless cooling down.
    pub fn start_attack(&mut self, now: f32) -> bool {
        if self.is_dead() || now - self.last_attack < self.params.attack_cooldown {
            return false;
        }
        self.attack_started = Some(now);
        self.last_attack = now;
        true
    }

    pub fn attack_active(&self) -> bool {
        self.attack_started.is_some()
    }

    /// Close the attack window once its duration has elapsed.
    pub fn update_attack(&mut self, now: f32) {
        if let Some(started) = self.attack_started {
            if now - started >= self.params.attack_duration {
                self.attack_started = None;
            }
        }
    }

    /// Grow the combo while fast, decay it otherwise.
    ///
    /// Returns true when the combo step also healed the player.
    pub fn update_combo(&mut self, now: f32, dt: f32, velocity_x: f32) -> bool {
        let p = &self.params;
        if velocity_x.abs() > p.combo_speed_threshold {
            if now - self.last_combo_step >= 1.0 {
                self.last_combo_step += 1.0;
                self.combo += p.combo_per_second;
                if self.combo >= p.combo_heal_threshold && self.health < p.max_health {
                    self.health += 1;
                    return true;
                }
            }
        } else {
            self.last_combo_step = now;
            self.combo = (self.combo - p.combo_per_second * dt).max(1.0);
        }
        false
    }

    /// Add `base` points scaled by the combo. Returns the points awarded.
    pub fn award_points(&mut self, base: u32) -> u32 {
        let points = (base as f32 * self.combo) as u32;
        self.score += points;
        points
    }

    /// Lose health and some combo.
    pub fn take_damage(&mut self, amount: i32) {
        self.combo = (self.combo - self.params.combo_per_second * 2.0).max(1.0);
        self.health -= amount;
    }
}
