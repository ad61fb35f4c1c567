//! Cell prototype catalog.
//!
//! The catalog lists every piece the generator may place. Each prototype has
//! fixed connector flags and the ground geometry spawned with it. Geometry
//! offsets are relative to the cell center.
//!
//! # JSON Format
//!
//! ```json
//! {
//!   "start": [ { "prototype": "cross", "col": 0, "row": 0 } ],
//!   "prototypes": [
//!     {
//!       "name": "cross",
//!       "directions": "UP | RIGHT | DOWN | LEFT",
//!       "platforms": [ { "offset": [-100.0, -100.0], "size": [200.0, 20.0] } ],
//!       "splines": [ { "points": [[-100.0, -80.0], [0.0, -60.0]], "edge_spacing": 5.0 } ]
//!     }
//!   ]
//! }
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::geometry::{Direction, GridCoord};

/// Solid rectangle, `offset` is its lower-left corner relative to the cell center.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlatformSpec {
    pub offset: Vec2,
    pub size: Vec2,
}

/// Curved surface through `points`, relative to the cell center.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SplineSpec {
    pub points: Vec<Vec2>,
    #[serde(default = "default_edge_spacing")]
    pub edge_spacing: f32,
}

fn default_edge_spacing() -> f32 {
    5.0
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CellPrototype {
    pub name: String,
    pub directions: Direction,
    #[serde(default)]
    pub platforms: Vec<PlatformSpec>,
    #[serde(default)]
    pub splines: Vec<SplineSpec>,
}

impl CellPrototype {
    pub fn new(name: impl Into<String>, directions: Direction) -> Self {
        Self {
            name: name.into(),
            directions,
            platforms: Vec::new(),
            splines: Vec::new(),
        }
    }

    pub fn with_platform(mut self, offset: Vec2, size: Vec2) -> Self {
        self.platforms.push(PlatformSpec { offset, size });
        self
    }

    pub fn with_spline(mut self, points: Vec<Vec2>, edge_spacing: f32) -> Self {
        self.splines.push(SplineSpec {
            points,
            edge_spacing,
        });
        self
    }
}

/// Cell placed before the simulation starts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StartCell {
    pub prototype: String,
    pub col: i32,
    pub row: i32,
}

impl StartCell {
    pub fn coord(&self) -> GridCoord {
        GridCoord::new(self.col, self.row)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct CellCatalog {
    #[serde(default)]
    pub start: Vec<StartCell>,
    pub prototypes: Vec<CellPrototype>,
}

impl CellCatalog {
    pub fn new(prototypes: Vec<CellPrototype>) -> Self {
        Self {
            start: Vec::new(),
            prototypes,
        }
    }

    pub fn with_start(mut self, prototype: impl Into<String>, coord: GridCoord) -> Self {
        self.start.push(StartCell {
            prototype: prototype.into(),
            col: coord.col,
            row: coord.row,
        });
        self
    }

    /// Load the catalog data from a JSON file.
    pub fn load_from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let file_content = std::fs::read_to_string(path)?;
        let catalog: CellCatalog = serde_json::from_str(&file_content)?;
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CellPrototype> {
        self.prototypes.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&CellPrototype> {
        self.prototypes.iter().find(|p| p.name == name)
    }

    /// Every connector combination with at least one open side, each with a
    /// floor along the bottom edge. Starts with a four-way cross at the origin.
    pub fn builtin(cell_size: Vec2) -> Self {
        let half = cell_size * 0.5;
        let floor_offset = Vec2::new(-half.x, -half.y);
        let floor_size = Vec2::new(cell_size.x, cell_size.y * 0.1);
        let named = [
            ("cross", Direction::all()),
            ("corridor_h", Direction::LEFT | Direction::RIGHT),
            ("corridor_v", Direction::UP | Direction::DOWN),
            ("corner_ur", Direction::UP | Direction::RIGHT),
            ("corner_rd", Direction::RIGHT | Direction::DOWN),
            ("corner_dl", Direction::DOWN | Direction::LEFT),
            ("corner_lu", Direction::LEFT | Direction::UP),
            ("tee_no_up", Direction::RIGHT | Direction::DOWN | Direction::LEFT),
            ("tee_no_right", Direction::UP | Direction::DOWN | Direction::LEFT),
            ("tee_no_down", Direction::UP | Direction::RIGHT | Direction::LEFT),
            ("tee_no_left", Direction::UP | Direction::RIGHT | Direction::DOWN),
            ("end_up", Direction::UP),
            ("end_right", Direction::RIGHT),
            ("end_down", Direction::DOWN),
            ("end_left", Direction::LEFT),
        ];
        let mut prototypes: Vec<CellPrototype> = named
            .iter()
            .map(|(name, dirs)| CellPrototype::new(*name, *dirs).with_platform(floor_offset, floor_size))
            .collect();

        // A rolling hill for spline locomotion.
        let floor_top = -half.y + floor_size.y;
        prototypes.push(
            CellPrototype::new("hill_h", Direction::LEFT | Direction::RIGHT).with_spline(
                vec![
                    Vec2::new(-half.x, floor_top),
                    Vec2::new(-half.x * 0.5, floor_top + cell_size.y * 0.05),
                    Vec2::new(0.0, floor_top + cell_size.y * 0.1),
                    Vec2::new(half.x * 0.5, floor_top + cell_size.y * 0.05),
                    Vec2::new(half.x, floor_top),
                ],
                cell_size.x * 0.025,
            ),
        );

        CellCatalog::new(prototypes).with_start("cross", GridCoord::new(0, 0))
    }
}
