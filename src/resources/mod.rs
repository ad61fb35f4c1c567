//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution. Each submodule documents the
//! semantics and intended usage of its resource(s).
//!
//! Overview
//! - `cellcatalog` – placeable cell prototypes, loaded from JSON or built in
//! - `cellmaster` – grid registry of placed cells and neighbor selection
//! - `gameconfig` – tunables loaded from an INI file
//! - `worldtime` – scaled simulation time, delta, and pause state
pub mod cellcatalog;
pub mod cellmaster;
pub mod gameconfig;
pub mod worldtime;
