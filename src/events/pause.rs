//! Pause notifications.
//!
//! [`set_paused`](crate::systems::time::set_paused) triggers
//! [`PauseChangedEvent`] whenever the clock actually switches state.
//! [`observe_pause_for_motion`] freezes every player body on pause and
//! restores it exactly on resume.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::debug;

use crate::components::motion::PlayerMotion;
use crate::components::rigidbody::RigidBody;

#[derive(Event, Debug, Clone, Copy)]
pub struct PauseChangedEvent {
    pub paused: bool,
}

pub fn observe_pause_for_motion(
    trigger: On<PauseChangedEvent>,
    mut players: Query<(Entity, &mut PlayerMotion, &mut RigidBody)>,
) {
    let paused = trigger.event().paused;
    for (entity, mut motion, mut body) in players.iter_mut() {
        motion.on_pause(paused, &mut body);
        debug!("Player {:?} paused: {}", entity, paused);
    }
}
