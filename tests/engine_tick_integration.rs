//! Full-tick integration tests: the player on the start floor, pause,
//! death and restart, and cell streaming driven by the player position.

use bevy_ecs::prelude::*;
use glam::Vec2;

use cellrunner::components::mapcell::MapCell;
use cellrunner::components::mapposition::MapPosition;
use cellrunner::components::motion::PlayerMotion;
use cellrunner::components::player::PlayerController;
use cellrunner::components::rigidbody::RigidBody;
use cellrunner::events::input::PlayerInput;
use cellrunner::game::{build_schedule, send_input, setup_world, step};
use cellrunner::geometry::{Direction, GridCoord};
use cellrunner::resources::cellcatalog::CellCatalog;
use cellrunner::resources::cellmaster::CellMaster;
use cellrunner::resources::gameconfig::GameConfig;
use cellrunner::resources::worldtime::WorldTime;
use cellrunner::systems::time::set_paused;

const EPSILON: f32 = 1e-3;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn make_world() -> (World, Schedule, Entity) {
    let config = GameConfig::new();
    let catalog = CellCatalog::builtin(config.cell_size);
    let (world, player) = setup_world(&config, catalog);
    (world, build_schedule(), player)
}

fn run(world: &mut World, schedule: &mut Schedule, ticks: usize) {
    for _ in 0..ticks {
        step(world, schedule);
    }
}

fn position(world: &World, player: Entity) -> Vec2 {
    world.get::<MapPosition>(player).unwrap().pos
}

fn velocity(world: &World, player: Entity) -> Vec2 {
    world.get::<RigidBody>(player).unwrap().velocity
}

/// Let the player drop the half unit onto the start floor.
fn settled() -> (World, Schedule, Entity) {
    let (mut world, mut schedule, player) = make_world();
    run(&mut world, &mut schedule, 100);
    (world, schedule, player)
}

// ==================== GROUNDING ====================

#[test]
fn player_settles_on_start_floor() {
    let (world, _, player) = settled();
    let motion = world.get::<PlayerMotion>(player).unwrap();
    assert!(motion.grounded());
    assert_eq!(motion.jumps_left(), motion.params.max_jumps);
    let pos = position(&world, player);
    assert!(approx_eq(pos.y, -79.0), "y = {}", pos.y);
    assert_eq!(pos.x, 0.0);
}

#[test]
fn holding_right_accelerates_monotonically() {
    let (mut world, mut schedule, player) = settled();
    send_input(&mut world, player, PlayerInput::Directional(1.0));
    let mut last = velocity(&world, player).x;
    for _ in 0..40 {
        step(&mut world, &mut schedule);
        let vx = velocity(&world, player).x;
        assert!(vx > last, "vx {} did not grow past {}", vx, last);
        last = vx;
    }
    assert!(position(&world, player).x > 0.0);
    assert!(world.get::<PlayerController>(player).unwrap().facing_right);
}

#[test]
fn buffered_jump_leaves_the_ground() {
    let (mut world, mut schedule, player) = settled();
    send_input(&mut world, player, PlayerInput::JumpStarted);
    run(&mut world, &mut schedule, 10);
    let motion = world.get::<PlayerMotion>(player).unwrap();
    assert!(!motion.grounded());
    assert_eq!(motion.jumps_left(), motion.params.max_jumps - 1);
    assert!(position(&world, player).y > -79.0 + 0.1);
}

// ==================== PAUSE ====================

#[test]
fn pause_round_trip_is_bit_exact() {
    let (mut world, mut schedule, player) = settled();
    send_input(&mut world, player, PlayerInput::Directional(1.0));
    run(&mut world, &mut schedule, 20);

    let before = *world.get::<RigidBody>(player).unwrap();
    let pos_before = position(&world, player);
    let elapsed_before = world.resource::<WorldTime>().elapsed;

    assert!(set_paused(&mut world, true));
    let frozen = world.get::<RigidBody>(player).unwrap();
    assert_eq!(frozen.velocity, Vec2::ZERO);
    assert!(frozen.kinematic);

    run(&mut world, &mut schedule, 10);
    assert_eq!(position(&world, player), pos_before);
    assert_eq!(world.resource::<WorldTime>().elapsed, elapsed_before);

    assert!(set_paused(&mut world, false));
    let after = world.get::<RigidBody>(player).unwrap();
    assert_eq!(after.velocity.x.to_bits(), before.velocity.x.to_bits());
    assert_eq!(after.velocity.y.to_bits(), before.velocity.y.to_bits());
    assert_eq!(after.angular_velocity.to_bits(), before.angular_velocity.to_bits());
    assert_eq!(after.kinematic, before.kinematic);

    step(&mut world, &mut schedule);
    assert!(position(&world, player).x > pos_before.x);
}

#[test]
fn escape_toggles_pause() {
    let (mut world, _, player) = make_world();
    send_input(&mut world, player, PlayerInput::EscapeStarted);
    assert!(world.resource::<WorldTime>().paused());
    assert!(world.get::<PlayerMotion>(player).unwrap().is_paused());
    send_input(&mut world, player, PlayerInput::EscapeStarted);
    assert!(!world.resource::<WorldTime>().paused());
    assert!(!world.get::<PlayerMotion>(player).unwrap().is_paused());
}

#[test]
fn death_pauses_and_escape_restarts() {
    let (mut world, mut schedule, player) = settled();
    world.get_mut::<PlayerController>(player).unwrap().health = 0;
    step(&mut world, &mut schedule);
    assert!(world.resource::<WorldTime>().paused());

    send_input(&mut world, player, PlayerInput::EscapeStarted);
    let time = world.resource::<WorldTime>();
    assert!(!time.paused());
    assert_eq!(time.elapsed, 0.0);
    let controller = world.get::<PlayerController>(player).unwrap();
    assert_eq!(controller.health, controller.params.max_health);
    assert_eq!(world.resource::<CellMaster>().len(), 1);
    assert!(approx_eq(position(&world, player).y, -78.5));
}

// ==================== CELL STREAMING ====================

#[test]
fn first_tick_generates_around_the_start_cell() {
    let (mut world, mut schedule, player) = make_world();
    assert_eq!(world.resource::<CellMaster>().len(), 1);
    step(&mut world, &mut schedule);

    let master = world.resource::<CellMaster>();
    assert_eq!(master.len(), 5);
    let origin = master.entity_at(GridCoord::new(0, 0)).unwrap();
    let cell = world.get::<MapCell>(origin).unwrap();
    assert_eq!(cell.occupant, Some(player));
    for dir in Direction::CARDINALS {
        let neighbor = master.entity_at(GridCoord::new(0, 0).neighbor(dir));
        assert!(neighbor.is_some());
        assert_eq!(cell.neighbor(dir), neighbor);
    }
}

#[test]
fn leaving_a_cell_releases_its_other_neighbors_after_grace() {
    let (mut world, mut schedule, player) = make_world();
    step(&mut world, &mut schedule);
    let (origin, right) = {
        let master = world.resource::<CellMaster>();
        (
            master.entity_at(GridCoord::new(0, 0)).unwrap(),
            master.entity_at(GridCoord::new(1, 0)).unwrap(),
        )
    };

    world.get_mut::<MapPosition>(player).unwrap().pos = Vec2::new(200.0, -78.5);
    step(&mut world, &mut schedule);
    assert_eq!(world.get::<MapCell>(right).unwrap().occupant, Some(player));
    let origin_cell = world.get::<MapCell>(origin).unwrap();
    assert!(origin_cell.occupant.is_none());
    assert!(origin_cell.will_degenerate);
    // Still inside the grace period.
    assert!(world.resource::<CellMaster>().contains(GridCoord::new(-1, 0)));

    run(&mut world, &mut schedule, 5);
    let master = world.resource::<CellMaster>();
    assert!(!master.contains(GridCoord::new(-1, 0)));
    assert!(!master.contains(GridCoord::new(0, 1)));
    assert!(!master.contains(GridCoord::new(0, -1)));
    assert_eq!(master.entity_at(GridCoord::new(0, 0)), Some(origin));
    assert_eq!(master.entity_at(GridCoord::new(1, 0)), Some(right));

    // Every slot still points at a registered cell.
    for (_, registered) in master.iter() {
        let cell = world.get::<MapCell>(registered.entity).unwrap();
        for neighbor in cell.adjacent.iter().flatten() {
            assert!(master.coord_of(*neighbor).is_some());
        }
    }
}
