//! ECS components for entities.
//!
//! This module groups all component types that can be attached to entities in
//! the simulation world. Components define data and behaviors such as
//! position, collision, ground surfaces, world cells, and player motion.
//!
//! Submodules overview:
//! - [`boxcollider`] – axis-aligned rectangular collider with layer bits
//! - [`mapcell`] – a placed world tile with connectors, adjacency and occupancy
//! - [`mapposition`] – world-space position (pivot) for an entity
//! - [`motion`] – the player motion controller and its tunables
//! - [`player`] – player orchestration: buffered actions, combo, health, score
//! - [`rigidbody`] – velocity, angular velocity and gravity of a body
//! - [`rotation`] – rotation angle in degrees
//! - [`spline`] – curved ground surface parameterised by arc length

pub mod boxcollider;
pub mod mapcell;
pub mod mapposition;
pub mod motion;
pub mod player;
pub mod rigidbody;
pub mod rotation;
pub mod spline;
