//! Cell occupancy events.
//!
//! [`cell_trigger_system`](crate::systems::celltrigger::cell_trigger_system)
//! emits these when a player's collider starts or stops overlapping a cell's
//! detection region. The observers that react to them live in
//! [`crate::systems::cellgen`].
use bevy_ecs::prelude::*;

#[derive(Event, Debug, Clone, Copy)]
pub struct CellEnteredEvent {
    pub cell: Entity,
    pub player: Entity,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct CellExitedEvent {
    pub cell: Entity,
    pub player: Entity,
}
