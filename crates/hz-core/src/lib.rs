//! `hz-core` — foundational types for the `hazard_field` avoidance framework.
//!
//! This crate is a dependency of every other `hz-*` crate.  It intentionally
//! has no `hz-*` dependencies and minimal external ones (`glam`, `rand`,
//! `csv` and `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `AgentId`, `EntityId`, `ProfileId`                    |
//! | [`time`]        | `Tick`, `SimClock`, `SimConfig`                       |
//! | [`rng`]         | `SimRng`, `mix_seed`                                  |
//! | [`math`]        | `saturate`, `lateral_axis`, `exp_approach`, …         |
//! | [`profile`]     | `AvoidanceProfile`, `ProfileTable`, CSV loader        |
//! | [`error`]       | `HzError`, `HzResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod math;
pub mod profile;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{HzError, HzResult};
pub use ids::{AgentId, EntityId, ProfileId};
pub use profile::{AvoidanceProfile, ProfileTable, load_profiles_csv, load_profiles_reader};
pub use rng::{SimRng, mix_seed};
pub use time::{SimClock, SimConfig, Tick};

/// The vector type used throughout the framework.
pub use glam::Vec3;
