//! Cell detection region overlap.
//!
//! Every tick, each player collider is tested against each cell's detection
//! square. Overlap starting emits [`CellEnteredEvent`], overlap ending emits
//! [`CellExitedEvent`]. The cell's `occupant` field is the only memory of
//! the previous state, so the observers must keep it current.
use bevy_ecs::prelude::*;

use crate::components::boxcollider::BoxCollider;
use crate::components::mapcell::MapCell;
use crate::components::mapposition::MapPosition;
use crate::components::motion::PlayerMotion;
use crate::events::cell::{CellEnteredEvent, CellExitedEvent};

pub fn cell_trigger_system(
    mut commands: Commands,
    cells: Query<(Entity, &MapCell, &MapPosition)>,
    players: Query<(Entity, &MapPosition, &BoxCollider), With<PlayerMotion>>,
) {
    for (cell, map_cell, cell_position) in cells.iter() {
        let region = map_cell.detection_region();
        for (player, player_position, collider) in players.iter() {
            let inside = collider.overlaps(player_position.pos, &region, cell_position.pos);
            let occupied_by_player = map_cell.occupant == Some(player);
            if inside && !occupied_by_player {
                commands.trigger(CellEnteredEvent { cell, player });
            } else if !inside && occupied_by_player {
                commands.trigger(CellExitedEvent { cell, player });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::boxcollider::LAYER_PLAYER;
    use crate::geometry::{Direction, GridCoord};
    use bevy_ecs::observer::On;
    use glam::Vec2;

    #[derive(Resource, Default)]
    struct Seen {
        entered: u32,
        exited: u32,
    }

    fn on_enter(trigger: On<CellEnteredEvent>, mut seen: ResMut<Seen>, mut cells: Query<&mut MapCell>) {
        seen.entered += 1;
        let ev = trigger.event();
        if let Ok(mut c) = cells.get_mut(ev.cell) {
            c.occupy(ev.player);
        }
    }

    fn on_exit(trigger: On<CellExitedEvent>, mut seen: ResMut<Seen>, mut cells: Query<&mut MapCell>) {
        seen.exited += 1;
        if let Ok(mut c) = cells.get_mut(trigger.event().cell) {
            c.vacate(0.0);
        }
    }

    #[test]
    fn enter_and_exit_fire_once() {
        let mut world = World::new();
        world.init_resource::<Seen>();
        world.add_observer(on_enter);
        world.add_observer(on_exit);
        world.spawn((
            MapCell::new("cross", Direction::all(), GridCoord::new(0, 0)),
            MapPosition::new(0.0, 0.0),
        ));
        let player = world
            .spawn((
                MapPosition::new(0.0, 0.0),
                BoxCollider::new(1.0, 2.0).centered().with_layers(LAYER_PLAYER),
                PlayerMotion::default(),
            ))
            .id();

        let mut schedule = Schedule::default();
        schedule.add_systems(cell_trigger_system);
        schedule.run(&mut world);
        schedule.run(&mut world);
        assert_eq!(world.resource::<Seen>().entered, 1);

        world.get_mut::<MapPosition>(player).unwrap().pos = Vec2::new(150.0, 0.0);
        schedule.run(&mut world);
        schedule.run(&mut world);
        let seen = world.resource::<Seen>();
        assert_eq!((seen.entered, seen.exited), (1, 1));
    }
}
