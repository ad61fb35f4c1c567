//! World cell registry and neighbor selection.
//!
//! [`CellMaster`] is the single source of truth for which grid slots hold a
//! placed cell. Spawning and despawning the cell entities is done by the
//! [`cellgen`](crate::systems::cellgen) functions; this resource only owns the
//! registry entries and decides which prototype may go where.
//!
//! # Neighbor constraints
//!
//! For a free slot, every cardinal side falls into one of three cases:
//!
//! - a registered neighbor exposes a connector back toward the slot: the side
//!   is **required**
//! - a registered neighbor has no connector back: the side is neither required
//!   nor optional
//! - no neighbor is registered: the side is **optional**
//!
//! A prototype qualifies when it has every required side and at least one
//! optional side (any prototype passes the second test when no side is
//! optional).

use bevy_ecs::prelude::*;
use glam::Vec2;
use log::{error, warn};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::geometry::{Direction, GridCoord};
use crate::resources::cellcatalog::{CellCatalog, CellPrototype};

/// Registry entry for a placed cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredCell {
    pub entity: Entity,
    pub directions: Direction,
}

/// Indices into the catalog of prototypes that fit a slot.
pub type CellOptions = SmallVec<[usize; 8]>;

#[derive(Resource, Debug)]
pub struct CellMaster {
    cells: FxHashMap<GridCoord, RegisteredCell>,
    catalog: CellCatalog,
    cell_size: Vec2,
    degeneration_grace: f32,
    rng: fastrand::Rng,
}

impl CellMaster {
    pub fn new(catalog: CellCatalog, cell_size: Vec2, degeneration_grace: f32, seed: u64) -> Self {
        Self {
            cells: FxHashMap::default(),
            catalog,
            cell_size,
            degeneration_grace,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    pub fn catalog(&self) -> &CellCatalog {
        &self.catalog
    }

    pub fn prototype(&self, index: usize) -> Option<&CellPrototype> {
        self.catalog.get(index)
    }

    pub fn cell_size(&self) -> Vec2 {
        self.cell_size
    }

    /// Cells can only be placed when neither side of the cell size is zero.
    /// Logs an error otherwise.
    pub fn has_valid_cell_size(&self) -> bool {
        if self.cell_size.x == 0.0 || self.cell_size.y == 0.0 {
            error!("Cell size {:?} is degenerate, refusing to place cells", self.cell_size);
            return false;
        }
        true
    }

    pub fn degeneration_grace(&self) -> f32 {
        self.degeneration_grace
    }

    /// Grid slot of a world position. Logs and returns `None` for a zero cell size.
    pub fn coordinate(&self, pos: Vec2) -> Option<GridCoord> {
        let coord = GridCoord::from_world(pos, self.cell_size);
        if coord.is_none() {
            error!("Cell size {:?} is degenerate, cannot compute grid coordinate", self.cell_size);
        }
        coord
    }

    pub fn world_position(&self, coord: GridCoord) -> Vec2 {
        coord.to_world(self.cell_size)
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        self.cells.contains_key(&coord)
    }

    pub fn get(&self, coord: GridCoord) -> Option<RegisteredCell> {
        self.cells.get(&coord).copied()
    }

    pub fn entity_at(&self, coord: GridCoord) -> Option<Entity> {
        self.cells.get(&coord).map(|c| c.entity)
    }

    /// Registered slot holding `entity`.
    pub fn coord_of(&self, entity: Entity) -> Option<GridCoord> {
        self.cells
            .iter()
            .find(|(_, c)| c.entity == entity)
            .map(|(coord, _)| *coord)
    }

    /// Add a cell. Refuses and warns if the slot is taken.
    pub fn register(&mut self, coord: GridCoord, entity: Entity, directions: Direction) -> bool {
        if let Some(existing) = self.cells.get(&coord) {
            warn!(
                "Cell slot {} already holds {:?}, refusing {:?}",
                coord, existing.entity, entity
            );
            return false;
        }
        self.cells.insert(coord, RegisteredCell { entity, directions });
        true
    }

    pub fn unregister(&mut self, coord: GridCoord) -> Option<RegisteredCell> {
        self.cells.remove(&coord)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, RegisteredCell)> + '_ {
        self.cells.iter().map(|(k, v)| (*k, *v))
    }

    /// Required and optional sides for a slot, from its registered neighbors.
    pub fn constraints(&self, coord: GridCoord) -> (Direction, Direction) {
        let mut required = Direction::NONE;
        let mut optional = Direction::NONE;
        for dir in Direction::CARDINALS {
            match self.cells.get(&coord.neighbor(dir)) {
                Some(neighbor) if neighbor.directions.has_all(dir.mirror()) => required |= dir,
                Some(_) => {}
                None => optional |= dir,
            }
        }
        (required, optional)
    }

    /// Catalog indices of every prototype that fits `coord`, or `None` if none does.
    pub fn cell_options(&self, coord: GridCoord) -> Option<CellOptions> {
        let (required, optional) = self.constraints(coord);
        let options: CellOptions = self
            .catalog
            .prototypes
            .iter()
            .enumerate()
            .filter(|(_, p)| p.directions.has_all(required) && p.directions.has_any(optional))
            .map(|(i, _)| i)
            .collect();
        if options.is_empty() { None } else { Some(options) }
    }

    /// Pick a fitting prototype uniformly at random.
    pub fn pick(&mut self, coord: GridCoord) -> Option<usize> {
        let options = self.cell_options(coord)?;
        Some(options[self.rng.usize(..options.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs(list: &[Direction]) -> Direction {
        list.iter().fold(Direction::NONE, |acc, d| acc | *d)
    }

    fn literal_catalog() -> CellCatalog {
        use Direction as D;
        CellCatalog::new(vec![
            CellPrototype::new("up", D::UP),
            CellPrototype::new("right", D::RIGHT),
            CellPrototype::new("up_down", D::UP | D::DOWN),
            CellPrototype::new("left_right", D::LEFT | D::RIGHT),
            CellPrototype::new("up_right", D::UP | D::RIGHT),
            CellPrototype::new("cross", D::all()),
        ])
    }

    fn master() -> (World, CellMaster) {
        (
            World::new(),
            CellMaster::new(literal_catalog(), Vec2::new(200.0, 200.0), 0.05, 3),
        )
    }

    fn names(m: &CellMaster, coord: GridCoord) -> Vec<String> {
        m.cell_options(coord)
            .map(|o| o.iter().map(|i| m.catalog.prototypes[*i].name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn empty_surroundings_make_every_side_optional() {
        let (_, m) = master();
        let (required, optional) = m.constraints(GridCoord::new(0, 0));
        assert_eq!(required, Direction::NONE);
        assert_eq!(optional, Direction::all());
        assert_eq!(names(&m, GridCoord::new(0, 0)).len(), 6);
    }

    #[test]
    fn neighbor_with_connector_back_is_required() {
        let (mut world, mut m) = master();
        // Neighbor below exposes UP toward the slot at (0, 0).
        let below = world.spawn_empty().id();
        m.register(GridCoord::new(0, -1), below, Direction::UP);

        let (required, optional) = m.constraints(GridCoord::new(0, 0));
        assert_eq!(required, Direction::DOWN);
        assert_eq!(optional, dirs(&[Direction::UP, Direction::RIGHT, Direction::LEFT]));
        // Every candidate must connect down and lead somewhere else.
        assert_eq!(names(&m, GridCoord::new(0, 0)), vec!["up_down", "cross"]);
    }

    #[test]
    fn neighbor_without_connector_back_is_neither() {
        let (mut world, mut m) = master();
        let right = world.spawn_empty().id();
        m.register(GridCoord::new(1, 0), right, Direction::UP);

        let (required, optional) = m.constraints(GridCoord::new(0, 0));
        assert_eq!(required, Direction::NONE);
        assert_eq!(optional, dirs(&[Direction::UP, Direction::DOWN, Direction::LEFT]));
        // "right" only opens toward the closed neighbor, so it is excluded.
        assert_eq!(
            names(&m, GridCoord::new(0, 0)),
            vec!["up", "up_down", "left_right", "up_right", "cross"]
        );
    }

    #[test]
    fn single_up_candidate_excluded_when_right_required() {
        let (mut world, mut m) = master();
        let right = world.spawn_empty().id();
        m.register(GridCoord::new(1, 0), right, Direction::LEFT);
        let options = names(&m, GridCoord::new(0, 0));
        assert!(!options.contains(&"up".to_string()));
        // "right" is excluded too: it opens toward no free side.
        assert_eq!(options, vec!["left_right", "up_right", "cross"]);
    }

    #[test]
    fn fully_enclosed_slot_accepts_any_required_match() {
        let (mut world, mut m) = master();
        for (dir, flags) in [
            (Direction::UP, Direction::DOWN),
            (Direction::DOWN, Direction::UP),
            (Direction::LEFT, Direction::NONE),
            (Direction::RIGHT, Direction::NONE),
        ] {
            let e = world.spawn_empty().id();
            m.register(GridCoord::new(0, 0).neighbor(dir), e, flags);
        }
        let (required, optional) = m.constraints(GridCoord::new(0, 0));
        assert_eq!(required, Direction::UP | Direction::DOWN);
        assert_eq!(optional, Direction::NONE);
        assert_eq!(names(&m, GridCoord::new(0, 0)), vec!["up_down", "cross"]);
    }

    #[test]
    fn no_options_reports_none() {
        let (mut world, _) = master();
        let mut m = CellMaster::new(
            CellCatalog::new(vec![CellPrototype::new("up", Direction::UP)]),
            Vec2::new(200.0, 200.0),
            0.05,
            1,
        );
        let left = world.spawn_empty().id();
        m.register(GridCoord::new(-1, 0), left, Direction::RIGHT);
        assert!(m.cell_options(GridCoord::new(0, 0)).is_none());
        assert!(m.pick(GridCoord::new(0, 0)).is_none());
    }

    #[test]
    fn candidates_match_filter_definition() {
        let (mut world, mut m) = master();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        m.register(GridCoord::new(0, 1), a, Direction::DOWN | Direction::LEFT);
        m.register(GridCoord::new(-1, 0), b, Direction::UP);
        let coord = GridCoord::new(0, 0);
        let (required, optional) = m.constraints(coord);
        let options = m.cell_options(coord).unwrap();
        for (i, p) in m.catalog.prototypes.iter().enumerate() {
            let fits = p.directions.has_all(required) && p.directions.has_any(optional);
            assert_eq!(options.contains(&i), fits, "prototype {}", p.name);
        }
    }

    #[test]
    fn pick_is_deterministic_per_seed() {
        let (_, mut a) = master();
        let (_, mut b) = master();
        let coord = GridCoord::new(4, 4);
        let picks_a: Vec<_> = (0..10).map(|_| a.pick(coord)).collect();
        let picks_b: Vec<_> = (0..10).map(|_| b.pick(coord)).collect();
        assert_eq!(picks_a, picks_b);
        assert!(picks_a.iter().all(|p| p.is_some()));
    }

    #[test]
    fn register_refuses_duplicates() {
        let (mut world, mut m) = master();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        assert!(m.register(GridCoord::new(2, 2), a, Direction::UP));
        assert!(!m.register(GridCoord::new(2, 2), b, Direction::UP));
        assert_eq!(m.entity_at(GridCoord::new(2, 2)), Some(a));
        assert_eq!(m.coord_of(a), Some(GridCoord::new(2, 2)));
        assert_eq!(m.unregister(GridCoord::new(2, 2)).map(|c| c.entity), Some(a));
        assert!(m.is_empty());
    }

    #[test]
    fn coordinate_guards_zero_size() {
        let m = CellMaster::new(CellCatalog::default(), Vec2::new(0.0, 200.0), 0.05, 1);
        assert_eq!(m.coordinate(Vec2::new(10.0, 10.0)), None);
        assert!(!m.has_valid_cell_size());
        let (_, m) = master();
        assert!(m.has_valid_cell_size());
        assert_eq!(m.coordinate(Vec2::new(210.0, -390.0)), Some(GridCoord::new(1, -2)));
    }
}
