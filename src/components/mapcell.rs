//! A placed world tile.
//!
//! Every [`MapCell`] occupies one slot of the cell grid. Its `directions`
//! describe which sides are open toward neighbors and never change after
//! placement. Adjacent cells are tracked in `adjacent`, indexed by
//! [`Direction::index`]; the references are non-owning, lifetime is managed
//! exclusively by the [`CellMaster`](crate::resources::cellmaster::CellMaster)
//! registry.
//!
//! Occupancy drives streaming: when a player enters a cell its neighbors are
//! generated, and when the player leaves a degeneration request is queued and
//! honored once `degeneration_grace` seconds have passed.

use bevy_ecs::prelude::*;
use glam::Vec2;

use crate::components::boxcollider::{BoxCollider, LAYER_CELL};
use crate::geometry::{Direction, GridCoord};

/// Default world-space extent of a cell.
pub const DEFAULT_CELL_SIZE: Vec2 = Vec2::new(200.0, 200.0);
/// Default delay between leaving a cell and releasing its neighbors.
pub const DEFAULT_DEGENERATION_GRACE: f32 = 0.05;

#[derive(Component, Clone, Debug)]
pub struct MapCell {
    /// Catalog prototype this cell was placed from.
    pub name: String,
    /// Open sides.
    pub directions: Direction,
    pub coord: GridCoord,
    pub size: Vec2,
    /// Neighbor entity per cardinal slot.
    pub adjacent: [Option<Entity>; 4],
    /// Player currently inside the detection region.
    pub occupant: Option<Entity>,
    pub will_degenerate: bool,
    pub degeneration_grace: f32,
    /// Time at which the last degeneration request was made.
    pub degeneration_request: f32,
}

impl MapCell {
    pub fn new(name: impl Into<String>, directions: Direction, coord: GridCoord) -> Self {
        Self {
            name: name.into(),
            directions,
            coord,
            size: DEFAULT_CELL_SIZE,
            adjacent: [None; 4],
            occupant: None,
            will_degenerate: false,
            degeneration_grace: DEFAULT_DEGENERATION_GRACE,
            degeneration_request: 0.0,
        }
    }

    pub fn with_size(mut self, size: Vec2) -> Self {
        self.size = size;
        self
    }

    pub fn with_grace(mut self, grace: f32) -> Self {
        self.degeneration_grace = grace;
        self
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    pub fn has_connector(&self, dir: Direction) -> bool {
        self.directions.has_all(dir)
    }

    /// Neighbor in the single-bit direction `dir`.
    pub fn neighbor(&self, dir: Direction) -> Option<Entity> {
        self.adjacent[dir.index()]
    }

    pub fn link_neighbor(&mut self, dir: Direction, cell: Entity) {
        self.adjacent[dir.index()] = Some(cell);
    }

    pub fn clear_neighbor(&mut self, dir: Direction) {
        self.adjacent[dir.index()] = None;
    }

    /// Drop every slot that points at `cell`. Returns how many were cleared.
    pub fn forget_neighbor(&mut self, cell: Entity) -> usize {
        let mut cleared = 0;
        for slot in self.adjacent.iter_mut() {
            if *slot == Some(cell) {
                *slot = None;
                cleared += 1;
            }
        }
        cleared
    }

    /// Player entered: cancel any pending degeneration.
    pub fn occupy(&mut self, player: Entity) {
        self.occupant = Some(player);
        self.will_degenerate = false;
    }

    /// Player left at time `now`: queue degeneration.
    pub fn vacate(&mut self, now: f32) {
        self.occupant = None;
        self.will_degenerate = true;
        self.degeneration_request = now;
    }

    /// Pending degeneration whose grace period has elapsed.
    pub fn degeneration_due(&self, now: f32) -> bool {
        self.will_degenerate && now - self.degeneration_request > self.degeneration_grace
    }

    /// Detection region collider, centered on the cell position.
    pub fn detection_region(&self) -> BoxCollider {
        BoxCollider::new(self.size.x, self.size.y)
            .centered()
            .with_layers(LAYER_CELL)
            .as_trigger()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell() -> MapCell {
        MapCell::new("cross", Direction::all(), GridCoord::new(0, 0))
    }

    #[test]
    fn defaults() {
        let c = cell();
        assert_eq!(c.size, Vec2::new(200.0, 200.0));
        assert_eq!(c.adjacent, [None; 4]);
        assert!(!c.is_occupied());
        assert!(!c.will_degenerate);
    }

    #[test]
    fn links_use_direction_slots() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut c = cell();
        c.link_neighbor(Direction::LEFT, a);
        c.link_neighbor(Direction::UP, b);
        assert_eq!(c.adjacent[3], Some(a));
        assert_eq!(c.neighbor(Direction::UP), Some(b));

        c.link_neighbor(Direction::DOWN, a);
        assert_eq!(c.forget_neighbor(a), 2);
        assert_eq!(c.neighbor(Direction::LEFT), None);
        c.clear_neighbor(Direction::UP);
        assert_eq!(c.adjacent, [None; 4]);
    }

    #[test]
    #[should_panic]
    fn multi_bit_neighbor_lookup_panics() {
        let c = cell();
        let _ = c.neighbor(Direction::UP | Direction::DOWN);
    }

    #[test]
    fn degeneration_waits_for_grace() {
        let mut world = World::new();
        let player = world.spawn_empty().id();
        let mut c = cell().with_grace(0.05);

        c.occupy(player);
        assert!(c.is_occupied());
        c.vacate(1.0);
        assert!(!c.is_occupied());
        assert!(!c.degeneration_due(1.0));
        assert!(!c.degeneration_due(1.05));
        assert!(c.degeneration_due(1.06));

        // Re-entering cancels the pending request.
        c.occupy(player);
        assert!(!c.degeneration_due(5.0));
    }

    #[test]
    fn detection_region_is_centered_trigger() {
        let c = cell();
        let region = c.detection_region();
        assert!(region.trigger);
        let (min, max) = region.aabb(Vec2::ZERO);
        assert_eq!(min, Vec2::new(-100.0, -100.0));
        assert_eq!(max, Vec2::new(100.0, 100.0));
    }
}
