//! Event types and observers.
//!
//! Events decouple the systems that detect something from the code that
//! reacts to it. All of them are delivered synchronously through bevy
//! observers.
//!
//! Submodules:
//! - [`cell`] – a player entered or left a cell's detection region
//! - [`input`] – discrete player input actions and their observer
//! - [`motion`] – landing and leaving ground
//! - [`pause`] – pause state changes and the motion freeze observer
pub mod cell;
pub mod input;
pub mod motion;
pub mod pause;
