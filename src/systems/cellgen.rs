//! Cell generation and degeneration.
//!
//! These functions spawn and despawn cell entities and keep the
//! [`CellMaster`] registry and every cell's adjacency slots consistent. They
//! take `&mut World` and are run as queued commands from the cell observers
//! or directly by the exclusive [`degeneration_system`].
//!
//! A cell instance is a [`MapCell`] entity at the cell center with its
//! prototype's ground geometry as children: one [`BoxCollider`] entity per
//! platform and one [`SplinePath`] entity per spline. Despawning the cell
//! takes the geometry with it.
use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::boxcollider::{BoxCollider, LAYER_GROUND};
use crate::components::mapcell::MapCell;
use crate::components::mapposition::MapPosition;
use crate::components::spline::SplinePath;
use crate::events::cell::{CellEnteredEvent, CellExitedEvent};
use crate::geometry::{Direction, GridCoord};
use crate::resources::cellmaster::CellMaster;
use crate::resources::worldtime::WorldTime;

/// Spawn the prototype at `index` centered on `coord`. Does not register it.
pub fn spawn_cell_instance(world: &mut World, index: usize, coord: GridCoord) -> Option<Entity> {
    let (prototype, center, size, grace) = {
        let master = world.resource::<CellMaster>();
        let Some(prototype) = master.prototype(index) else {
            warn!("No cell prototype at catalog index {}", index);
            return None;
        };
        (
            prototype.clone(),
            master.world_position(coord),
            master.cell_size(),
            master.degeneration_grace(),
        )
    };

    let cell = world
        .spawn((
            MapCell::new(prototype.name.clone(), prototype.directions, coord)
                .with_size(size)
                .with_grace(grace),
            MapPosition::from_vec(center),
        ))
        .id();

    for platform in &prototype.platforms {
        world.spawn((
            MapPosition::from_vec(center + platform.offset),
            BoxCollider::new(platform.size.x, platform.size.y),
            ChildOf(cell),
        ));
    }
    for spline in &prototype.splines {
        let points = spline.points.iter().map(|p| *p + center).collect();
        match SplinePath::new(points, spline.edge_spacing, LAYER_GROUND) {
            Ok(path) => {
                world.spawn((path, ChildOf(cell)));
            }
            Err(err) => warn!("Skipping spline of cell '{}': {}", prototype.name, err),
        }
    }
    Some(cell)
}

/// Place a named prototype at `coord` and register it, without any origin.
///
/// Used for the start cells.
pub fn place_cell(world: &mut World, name: &str, coord: GridCoord) -> Option<Entity> {
    let (index, directions) = {
        let master = world.resource::<CellMaster>();
        if !master.has_valid_cell_size() {
            return None;
        }
        if master.contains(coord) {
            warn!("Cannot place '{}' at {}: slot taken", name, coord);
            return None;
        }
        let found = master
            .catalog()
            .prototypes
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
            .map(|(i, p)| (i, p.directions));
        match found {
            Some(found) => found,
            None => {
                warn!("Unknown cell prototype '{}'", name);
                return None;
            }
        }
    };
    let cell = spawn_cell_instance(world, index, coord)?;
    world
        .resource_mut::<CellMaster>()
        .register(coord, cell, directions);
    debug!("Placed '{}' at {} as {:?}", name, coord, cell);
    Some(cell)
}

/// Generate a random fitting cell at `coord`, reached from `origin` by
/// moving in `from`.
///
/// Links `origin` into the new cell's `from.mirror()` slot and the new cell
/// into the origin's `from` slot. Returns `None` when the slot is taken, the
/// cell size is degenerate, or no prototype fits.
pub fn generate_cell(
    world: &mut World,
    coord: GridCoord,
    from: Direction,
    origin: Entity,
) -> Option<Entity> {
    {
        let master = world.resource::<CellMaster>();
        if !master.has_valid_cell_size() {
            return None;
        }
        if let Some(existing) = master.entity_at(coord) {
            warn!("Cannot generate at {}: slot holds {:?}", coord, existing);
            return None;
        }
    }
    let Some(index) = world.resource_mut::<CellMaster>().pick(coord) else {
        debug!("No prototype fits {}, leaving a gap", coord);
        return None;
    };
    let cell = spawn_cell_instance(world, index, coord)?;
    let directions = world.get::<MapCell>(cell).map(|c| c.directions)?;
    if !world
        .resource_mut::<CellMaster>()
        .register(coord, cell, directions)
    {
        world.despawn(cell);
        return None;
    }

    if let Some(mut new_cell) = world.get_mut::<MapCell>(cell) {
        new_cell.link_neighbor(from.mirror(), origin);
    }
    if let Some(mut origin_cell) = world.get_mut::<MapCell>(origin) {
        origin_cell.link_neighbor(from, cell);
    }
    debug!("Generated {:?} at {} with {:?}", cell, coord, directions);
    Some(cell)
}

/// Fill every open side of `cell` that has no registered neighbor yet.
///
/// Returns the number of cells generated.
pub fn generate_cell_neighbors(world: &mut World, cell: Entity) -> usize {
    let Some((coord, directions)) = world.get::<MapCell>(cell).map(|c| (c.coord, c.directions))
    else {
        warn!("Cannot generate around {:?}: not a cell", cell);
        return 0;
    };
    let mut generated = 0;
    for dir in directions.split() {
        let target = coord.neighbor(dir);
        if world.resource::<CellMaster>().contains(target) {
            continue;
        }
        if generate_cell(world, target, dir, cell).is_some() {
            generated += 1;
        }
    }
    generated
}

/// Release every unoccupied registered neighbor of `cell`.
///
/// Does nothing while `cell` itself is occupied. Each released neighbor is
/// unregistered, unlinked from every registered cell around it and despawned.
/// Returns the number of cells released.
pub fn degenerate_cell_neighbors(world: &mut World, cell: Entity) -> usize {
    let Some((coord, occupied)) = world.get::<MapCell>(cell).map(|c| (c.coord, c.is_occupied()))
    else {
        warn!("Cannot degenerate around {:?}: not a cell", cell);
        return 0;
    };
    if occupied {
        return 0;
    }

    let mut released = 0;
    for dir in Direction::CARDINALS {
        let target_coord = coord.neighbor(dir);
        let Some(target) = world.resource::<CellMaster>().entity_at(target_coord) else {
            continue;
        };
        if world.get::<MapCell>(target).is_some_and(|t| t.is_occupied()) {
            continue;
        }

        world.resource_mut::<CellMaster>().unregister(target_coord);
        if let Some(mut map_cell) = world.get_mut::<MapCell>(cell) {
            map_cell.clear_neighbor(dir);
        }
        for side in Direction::CARDINALS {
            let Some(other) = world
                .resource::<CellMaster>()
                .entity_at(target_coord.neighbor(side))
            else {
                continue;
            };
            if let Some(mut other_cell) = world.get_mut::<MapCell>(other) {
                other_cell.forget_neighbor(target);
            }
        }
        world.despawn(target);
        debug!("Released {:?} at {}", target, target_coord);
        released += 1;
    }
    released
}

/// Run the neighbor release for every cell whose grace period has elapsed.
pub fn degeneration_system(world: &mut World) {
    let now = world.resource::<WorldTime>().elapsed;
    let due: Vec<Entity> = world
        .query::<(Entity, &MapCell)>()
        .iter(world)
        .filter(|(_, c)| c.degeneration_due(now))
        .map(|(e, _)| e)
        .collect();

    for cell in due {
        let Some(mut map_cell) = world.get_mut::<MapCell>(cell) else {
            // Released earlier in this sweep.
            continue;
        };
        map_cell.will_degenerate = false;
        degenerate_cell_neighbors(world, cell);
    }
}

/// A player entered a cell: occupy it and grow the world around it.
pub fn observe_cell_entered(
    trigger: On<CellEnteredEvent>,
    mut commands: Commands,
    mut cells: Query<&mut MapCell>,
) {
    let CellEnteredEvent { cell, player } = *trigger.event();
    let Ok(mut map_cell) = cells.get_mut(cell) else {
        warn!("Entered {:?} which is not a cell", cell);
        return;
    };
    map_cell.occupy(player);
    debug!("Player {:?} entered cell {}", player, map_cell.coord);
    commands.queue(move |world: &mut World| {
        generate_cell_neighbors(world, cell);
    });
}

/// A player left a cell: queue the release of its neighbors.
pub fn observe_cell_exited(
    trigger: On<CellExitedEvent>,
    time: Res<WorldTime>,
    mut cells: Query<&mut MapCell>,
) {
    let CellExitedEvent { cell, player } = *trigger.event();
    let Ok(mut map_cell) = cells.get_mut(cell) else {
        return;
    };
    map_cell.vacate(time.elapsed);
    debug!("Player {:?} left cell {}", player, map_cell.coord);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::cellcatalog::{CellCatalog, CellPrototype};
    use glam::Vec2;

    fn world_with(catalog: CellCatalog) -> World {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(CellMaster::new(catalog, Vec2::new(200.0, 200.0), 0.05, 7));
        world
    }

    fn corridor_catalog() -> CellCatalog {
        CellCatalog::new(vec![
            CellPrototype::new("corridor", Direction::LEFT | Direction::RIGHT)
                .with_platform(Vec2::new(-100.0, -100.0), Vec2::new(200.0, 20.0)),
        ])
    }

    #[test]
    fn spawned_cell_carries_geometry_children() {
        let mut catalog = corridor_catalog();
        catalog.prototypes.push(
            CellPrototype::new("hill", Direction::LEFT | Direction::RIGHT)
                .with_platform(Vec2::new(-100.0, -100.0), Vec2::new(200.0, 20.0))
                .with_spline(vec![Vec2::new(-100.0, -80.0), Vec2::new(100.0, -60.0)], 5.0),
        );
        let mut world = world_with(catalog);
        let cell = spawn_cell_instance(&mut world, 1, GridCoord::new(2, 0)).unwrap();
        assert_eq!(world.get::<MapPosition>(cell).unwrap().pos, Vec2::new(400.0, 0.0));
        assert_eq!(world.get::<Children>(cell).map(|c| c.len()), Some(2));

        world.despawn(cell);
        assert_eq!(world.query::<&BoxCollider>().iter(&world).count(), 0);
        assert_eq!(world.query::<&SplinePath>().iter(&world).count(), 0);
    }

    #[test]
    fn generation_links_both_ways() {
        let mut world = world_with(corridor_catalog());
        let origin = place_cell(&mut world, "corridor", GridCoord::new(0, 0)).unwrap();
        assert_eq!(generate_cell_neighbors(&mut world, origin), 2);

        let master = world.resource::<CellMaster>();
        let right = master.entity_at(GridCoord::new(1, 0)).unwrap();
        assert!(master.entity_at(GridCoord::new(-1, 0)).is_some());
        assert!(!master.contains(GridCoord::new(0, 1)));

        assert_eq!(world.get::<MapCell>(origin).unwrap().neighbor(Direction::RIGHT), Some(right));
        assert_eq!(world.get::<MapCell>(right).unwrap().neighbor(Direction::LEFT), Some(origin));
        // Already filled.
        assert_eq!(generate_cell_neighbors(&mut world, origin), 0);
    }

    #[test]
    fn unsatisfiable_slot_stays_empty() {
        let mut world = world_with(CellCatalog::new(vec![
            CellPrototype::new("start", Direction::UP),
            CellPrototype::new("flat", Direction::LEFT | Direction::RIGHT),
        ]));
        let origin = place_cell(&mut world, "start", GridCoord::new(0, 0)).unwrap();
        assert!(generate_cell(&mut world, GridCoord::new(0, 1), Direction::UP, origin).is_none());
        assert_eq!(world.resource::<CellMaster>().len(), 1);
        assert_eq!(world.get::<MapCell>(origin).unwrap().neighbor(Direction::UP), None);
    }

    #[test]
    fn degeneration_releases_free_neighbors_only() {
        let mut world = world_with(corridor_catalog());
        let origin = place_cell(&mut world, "corridor", GridCoord::new(0, 0)).unwrap();
        generate_cell_neighbors(&mut world, origin);
        let right = world.resource::<CellMaster>().entity_at(GridCoord::new(1, 0)).unwrap();
        let player = world.spawn_empty().id();
        world.get_mut::<MapCell>(right).unwrap().occupy(player);

        world.get_mut::<MapCell>(origin).unwrap().occupy(player);
        assert_eq!(degenerate_cell_neighbors(&mut world, origin), 0);

        world.get_mut::<MapCell>(origin).unwrap().vacate(0.0);
        assert_eq!(degenerate_cell_neighbors(&mut world, origin), 1);
        let master = world.resource::<CellMaster>();
        assert_eq!(master.len(), 2);
        assert!(!master.contains(GridCoord::new(-1, 0)));
        assert_eq!(world.get::<MapCell>(origin).unwrap().neighbor(Direction::LEFT), None);
        assert_eq!(world.get::<MapCell>(origin).unwrap().neighbor(Direction::RIGHT), Some(right));
    }

    #[test]
    fn generation_on_taken_slot_is_refused() {
        let mut world = world_with(corridor_catalog());
        let origin = place_cell(&mut world, "corridor", GridCoord::new(0, 0)).unwrap();
        let existing = place_cell(&mut world, "corridor", GridCoord::new(1, 0)).unwrap();

        assert!(generate_cell(&mut world, GridCoord::new(1, 0), Direction::RIGHT, origin).is_none());
        assert_eq!(world.query::<&MapCell>().iter(&world).count(), 2);
        let master = world.resource::<CellMaster>();
        assert_eq!(master.len(), 2);
        assert_eq!(master.entity_at(GridCoord::new(1, 0)), Some(existing));
        assert_eq!(world.get::<MapCell>(origin).unwrap().neighbor(Direction::RIGHT), None);
    }

    #[test]
    fn zero_cell_size_places_nothing() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        world.insert_resource(CellMaster::new(corridor_catalog(), Vec2::new(0.0, 200.0), 0.05, 7));
        assert!(place_cell(&mut world, "corridor", GridCoord::new(0, 0)).is_none());

        let origin = world.spawn_empty().id();
        assert!(generate_cell(&mut world, GridCoord::new(1, 0), Direction::RIGHT, origin).is_none());
        assert!(world.resource::<CellMaster>().is_empty());
        assert_eq!(world.query::<&MapCell>().iter(&world).count(), 0);
    }

    #[test]
    fn sweep_waits_for_grace() {
        let mut world = world_with(corridor_catalog());
        let origin = place_cell(&mut world, "corridor", GridCoord::new(0, 0)).unwrap();
        generate_cell_neighbors(&mut world, origin);
        world.get_mut::<MapCell>(origin).unwrap().vacate(0.0);

        world.resource_mut::<WorldTime>().elapsed = 0.05;
        degeneration_system(&mut world);
        assert_eq!(world.resource::<CellMaster>().len(), 3);

        world.resource_mut::<WorldTime>().elapsed = 0.06;
        degeneration_system(&mut world);
        assert_eq!(world.resource::<CellMaster>().len(), 1);
        assert!(!world.get::<MapCell>(origin).unwrap().will_degenerate);
    }
}
