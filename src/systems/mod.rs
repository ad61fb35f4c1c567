//! Simulation systems.
//!
//! This module groups the ECS systems and world functions that advance the
//! simulation one fixed tick at a time.
//!
//! Submodules overview
//! - [`cellgen`] – spawn, link, release cells; degeneration sweep and cell observers
//! - [`celltrigger`] – detect players entering and leaving cell regions
//! - [`grounding`] – downward ground probe against boxes and splines
//! - [`motion`] – run the player motion controller and emit land/leave events
//! - [`movement`] – integrate rigid bodies and set falling players down on ground
//! - [`player`] – buffered actions, facing, health and combo
//! - [`time`] – advance the clock and switch pause

pub mod cellgen;
pub mod celltrigger;
pub mod grounding;
pub mod motion;
pub mod movement;
pub mod player;
pub mod time;
