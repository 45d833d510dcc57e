//! `hz-sim` — tick pipeline orchestrator for the hazard_field framework.
//!
//! # Tick pipeline
//!
//! ```text
//! for tick in 0..config.total_ticks:
//!   (paused → advance the clock, nothing else)
//!   ① Slices    — SliceBuilder rebuilds the collection from threats + damage
//!                 over the largest lookahead among profiles in use.
//!   ② Grid      — pending re-layout, clear, accumulate at `tick`.
//!   ③ Agents    — sensor → reaction delay → homing notch → formation
//!                 → raycast probe (parallel with the `parallel` feature).
//!   ④ Apply     — in ascending AgentId order: Break detaches from the
//!                 leader, Hold re-attaches, spacing resizes the offset.
//!   ⑤ Threats   — fly and age the feed by one tick (`fly_threats`).
//! ```
//!
//! Every stage joins before the next starts, so the sensor only ever reads a
//! fully accumulated grid.
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                  |
//! |------------|---------------------------------------------------------|
//! | `parallel` | Grid slabs and per-agent stages on Rayon's thread pool. |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use hz_agent::AgentStoreBuilder;
//! use hz_avoid::NoPhysics;
//! use hz_core::{AvoidanceProfile, ProfileTable, SimConfig};
//! use hz_sim::{NoopObserver, SimBuilder};
//!
//! let agents = AgentStoreBuilder::new(16).build();
//! let profiles = ProfileTable::single(AvoidanceProfile::default())?;
//! let mut sim = SimBuilder::new(SimConfig::default(), agents, profiles, NoPhysics)
//!     .threats(threats)
//!     .build()?;
//! sim.run(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod sim;

#[cfg(test)]
mod tests;

pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver, SimSnapshot, TickReport};
pub use sim::Sim;
