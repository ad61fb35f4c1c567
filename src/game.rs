//! World assembly and the fixed-tick loop.
//!
//! [`setup_world`] builds a ready-to-run [`World`]: resources, observers,
//! start cells and the player. [`build_schedule`] orders the per-tick
//! systems and [`step`] advances the simulation by one fixed tick.
use bevy_ecs::observer::{Observer, On};
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use glam::Vec2;
use log::{info, warn};

use crate::components::boxcollider::{BoxCollider, LAYER_PLAYER};
use crate::components::mapcell::MapCell;
use crate::components::mapposition::MapPosition;
use crate::components::motion::PlayerMotion;
use crate::components::player::PlayerController;
use crate::components::rigidbody::RigidBody;
use crate::components::rotation::Rotation;
use crate::events::input::{
    PlayerInput, PlayerInputEvent, RestartRequestedEvent, observe_player_input,
};
use crate::events::pause::observe_pause_for_motion;
use crate::resources::cellcatalog::CellCatalog;
use crate::resources::cellmaster::CellMaster;
use crate::resources::gameconfig::GameConfig;
use crate::resources::worldtime::WorldTime;
use crate::systems::cellgen::{
    degeneration_system, observe_cell_entered, observe_cell_exited, place_cell,
};
use crate::systems::celltrigger::cell_trigger_system;
use crate::systems::motion::player_motion_system;
use crate::systems::movement::movement;
use crate::systems::player::{player_actions_system, player_combo_system};
use crate::systems::time::{time_is_running, update_world_time};

/// Player collider extent. The feet sit one unit below the position.
pub const PLAYER_SIZE: Vec2 = Vec2::new(1.0, 2.0);
/// Gap between the feet and the start floor when the player spawns.
const SPAWN_DROP: f32 = 0.5;

/// Build a world from configuration and a cell catalog.
///
/// Returns the world and the player entity.
pub fn setup_world(config: &GameConfig, catalog: CellCatalog) -> (World, Entity) {
    let mut world = World::new();
    world.insert_resource(config.clone());
    world.insert_resource(fresh_clock(config));
    world.insert_resource(CellMaster::new(
        catalog,
        config.cell_size,
        config.degeneration_grace,
        config.seed,
    ));

    world.spawn(Observer::new(observe_player_input));
    world.spawn(Observer::new(observe_pause_for_motion));
    world.spawn(Observer::new(observe_cell_entered));
    world.spawn(Observer::new(observe_cell_exited));
    world.spawn(Observer::new(observe_restart_request));
    // Observers must exist before any system triggers events.
    world.flush();

    place_start_cells(&mut world);
    let start = start_center(&world);
    let player = world.spawn(player_bundle(config, start)).id();
    info!(
        "World ready: {} start cells, player {:?}",
        world.resource::<CellMaster>().len(),
        player
    );
    (world, player)
}

/// Per-tick systems in their fixed order. Nothing runs while paused.
pub fn build_schedule() -> Schedule {
    let mut update = Schedule::default();
    update.set_executor_kind(ExecutorKind::SingleThreaded);
    update.add_systems(
        (
            player_actions_system,
            player_motion_system,
            player_combo_system,
            movement,
            cell_trigger_system,
            degeneration_system,
        )
            .chain()
            .run_if(time_is_running),
    );
    update
}

/// Advance one fixed tick.
pub fn step(world: &mut World, schedule: &mut Schedule) {
    let dt = world.resource::<WorldTime>().fixed_delta;
    update_world_time(world, dt);
    schedule.run(world);
    world.clear_trackers();
}

/// Deliver one input action to `player`.
pub fn send_input(world: &mut World, player: Entity, input: PlayerInput) {
    world.trigger(PlayerInputEvent { player, input });
    world.flush();
}

/// Throw away every cell and start over from the start cells with a fresh
/// clock and fresh player state.
pub fn restart_run(world: &mut World) {
    let config = world.resource::<GameConfig>().clone();
    let cells: Vec<Entity> = world
        .query_filtered::<Entity, With<MapCell>>()
        .iter(world)
        .collect();
    for cell in cells {
        world.despawn(cell);
    }
    let catalog = world.resource::<CellMaster>().catalog().clone();
    world.insert_resource(CellMaster::new(
        catalog,
        config.cell_size,
        config.degeneration_grace,
        config.seed,
    ));
    world.insert_resource(fresh_clock(&config));
    place_start_cells(world);

    let players: Vec<Entity> = world
        .query_filtered::<Entity, With<PlayerController>>()
        .iter(world)
        .collect();
    let start = start_center(world);
    for player in players {
        world.entity_mut(player).insert(player_bundle(&config, start));
    }
    info!("Run restarted");
}

pub fn observe_restart_request(trigger: On<RestartRequestedEvent>, mut commands: Commands) {
    info!("Restart requested by {:?}", trigger.event().player);
    commands.queue(restart_run);
}

fn fresh_clock(config: &GameConfig) -> WorldTime {
    WorldTime::default()
        .with_fixed_delta(config.fixed_delta)
        .with_time_scale(config.time_scale)
}

fn place_start_cells(world: &mut World) {
    let start = world.resource::<CellMaster>().catalog().start.clone();
    if start.is_empty() {
        warn!("Cell catalog has no start cells");
    }
    for cell in &start {
        place_cell(world, &cell.prototype, cell.coord());
    }
}

/// Center of the first start cell.
fn start_center(world: &World) -> Option<Vec2> {
    let master = world.resource::<CellMaster>();
    master
        .catalog()
        .start
        .first()
        .map(|cell| master.world_position(cell.coord()))
}

/// Just above the built-in floor of the first start cell, or of the origin
/// cell without one.
fn spawn_point(config: &GameConfig, start: Option<Vec2>) -> Vec2 {
    let floor_top = config.cell_size.y * -0.5 + config.cell_size.y * 0.1;
    start.unwrap_or(Vec2::ZERO) + Vec2::new(0.0, floor_top + PLAYER_SIZE.y * 0.5 + SPAWN_DROP)
}

fn player_bundle(
    config: &GameConfig,
    start: Option<Vec2>,
) -> (
    MapPosition,
    Rotation,
    RigidBody,
    BoxCollider,
    PlayerMotion,
    PlayerController,
) {
    let mut body = RigidBody::with_gravity(config.world_gravity);
    body.gravity_scale = config.body_gravity_scale;
    let motion = PlayerMotion::new(config.motion.clone()).capture_gravity_scale(&body);
    (
        MapPosition::from_vec(spawn_point(config, start)),
        Rotation::default(),
        body,
        BoxCollider::new(PLAYER_SIZE.x, PLAYER_SIZE.y)
            .centered()
            .with_layers(LAYER_PLAYER),
        motion,
        PlayerController::new(config.player.clone()),
    )
}
