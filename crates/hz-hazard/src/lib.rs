//! `hz-hazard` — threat feed types and hazard slices.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`threat`]  | `ThreatSource`, `ThreatKind`, `Payload` (the threat feed)    |
//! | [`damage`]  | `DamageSource`, `ModuleKind` (ambient fires / radiation)     |
//! | [`slice`]   | `HazardSlice`, `SliceKind`, `SliceSample`, `SliceCollection` |
//! | [`builder`] | `SliceBuilder`, `SliceBuilderConfig`, `SliceBuildStats`      |
//!
//! # Slices
//!
//! A slice is a time-windowed danger envelope: a sphere that may move and
//! grow, valid over `[start, end)` ticks.  The collection is rebuilt from
//! scratch every tick; slices are never mutated or carried over.
//!
//! ```text
//!   threat ──▶ flight segment  [now, now + flight)      moving, fixed radius
//!         └──▶ impact          [now + flight, + blast)  stationary, radius r → 2r
//!   damage ──▶ fire / radiation leak [now, now + horizon) stationary
//! ```

pub mod builder;
pub mod damage;
pub mod slice;
pub mod threat;

#[cfg(test)]
mod tests;

pub use builder::{AmbientHazardConfig, SliceBuildStats, SliceBuilder, SliceBuilderConfig};
pub use damage::{AmbientHazard, DamageSource, ModuleKind};
pub use slice::{HazardSlice, SliceCollection, SliceKind, SliceSample};
pub use threat::{Payload, ThreatKind, ThreatSource, retain_live};
