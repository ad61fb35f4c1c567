//! Player input events and their observer.
//!
//! Input arrives as discrete [`PlayerInputEvent`]s, one per logical action.
//! [`observe_player_input`] applies each event to the addressed player
//! synchronously: axis values go straight to
//! [`PlayerMotion::input_speed`](crate::components::motion::PlayerMotion),
//! jump and boost presses are recorded as buffered requests, and the
//! remaining actions call into
//! [`PlayerController`](crate::components::player::PlayerController).
//!
//! Dodge, duck and attack are ignored while the simulation is paused.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::motion::PlayerMotion;
use crate::components::player::PlayerController;
use crate::components::rigidbody::RigidBody;
use crate::resources::worldtime::WorldTime;
use crate::systems::time::set_paused;

/// Logical player actions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerInput {
    /// Horizontal axis value. Only its sign matters.
    Directional(f32),
    JumpStarted,
    BoostStarted,
    BoostPerformed,
    DodgeStarted,
    DuckStarted,
    DuckPerformed,
    DuckCanceled,
    AttackPerformed,
    /// Toggles pause, or restarts the run once the player is dead.
    EscapeStarted,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerInputEvent {
    pub player: Entity,
    pub input: PlayerInput,
}

/// Emitted when a dead player asks to start over.
#[derive(Event, Debug, Clone, Copy)]
pub struct RestartRequestedEvent {
    pub player: Entity,
}

/// Observer that routes a [`PlayerInputEvent`] to the player's components.
pub fn observe_player_input(
    trigger: On<PlayerInputEvent>,
    mut commands: Commands,
    time: Res<WorldTime>,
    mut players: Query<(&mut PlayerController, &mut PlayerMotion, &mut RigidBody)>,
) {
    let PlayerInputEvent { player, input } = *trigger.event();
    let Ok((mut controller, mut motion, mut body)) = players.get_mut(player) else {
        warn!("Input {:?} for {:?} which is not a player", input, player);
        return;
    };
    let now = time.elapsed;
    let paused = time.paused();

    match input {
        PlayerInput::Directional(value) => motion.input_speed = value,
        PlayerInput::JumpStarted => controller.request_jump(now),
        PlayerInput::BoostStarted | PlayerInput::BoostPerformed => controller.request_boost(now),
        PlayerInput::DodgeStarted if !paused => {
            controller.dodge(&mut motion, &mut body);
        }
        PlayerInput::DuckStarted | PlayerInput::DuckPerformed if !paused => {
            controller.duck(true, &mut motion, &mut body);
        }
        PlayerInput::DuckCanceled => {
            controller.duck(false, &mut motion, &mut body);
        }
        PlayerInput::AttackPerformed if !paused => {
            controller.start_attack(now);
        }
        PlayerInput::EscapeStarted => {
            if controller.is_dead() {
                debug!("Dead player {:?} requested a restart", player);
                commands.trigger(RestartRequestedEvent { player });
            } else {
                commands.queue(move |world: &mut World| {
                    let paused = world.resource::<WorldTime>().paused();
                    set_paused(world, !paused);
                });
            }
        }
        _ => debug!("Ignoring {:?} while paused", input),
    }
}
