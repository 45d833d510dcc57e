//! `hz-agent` — Structure-of-Arrays agent storage for the `hazard_field`
//! framework.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`store`]   | `AgentStore` (SoA kinematics, profile, formation links)    |
//! | [`builder`] | `AgentStoreBuilder` (fluent construction), `AgentSpawn`    |
//!
//! Agents are the controllable ships/units the avoidance pipeline steers.
//! Their kinematic state is written by the engine's movement systems between
//! ticks; the pipeline reads it and writes back only the formation links
//! (offset magnitude, leader reference).

pub mod builder;
pub mod store;


pub use builder::{AgentSpawn, AgentStoreBuilder};
pub use store::AgentStore;
