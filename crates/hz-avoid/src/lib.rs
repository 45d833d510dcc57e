//! `hz-avoid` — per-agent avoidance stages.
//!
//! # Stages
//!
//! ```text
//!   HazardGrid ──▶ AvoidanceSensor ──▶ ReactionRingBuffer ──▶ HomingNotchBlender
//!        │                                                         │
//!        └──────▶ FormationElasticityController           AgentAvoidanceState
//!                                                                  ▲
//!   PhysicsQuery ──▶ RaycastAvoidanceProbe ────(override)──────────┘
//! ```
//!
//! Every stage works on one agent at a time and touches only that agent's
//! state, so the orchestrator can run any of them over agents in parallel.
//! None of them fail: missing inputs degrade to a neutral state (zero
//! adjustment, zero urgency, `Hold`).
//!
//! | Module        | Contents                                                 |
//! |---------------|----------------------------------------------------------|
//! | [`state`]     | `AgentAvoidanceState`                                    |
//! | [`ring`]      | `ReactionRingBuffer`, `RingEntry`                        |
//! | [`sensor`]    | `AvoidanceSensor`, `SensorReading`                       |
//! | [`notch`]     | `HomingNotchBlender`                                     |
//! | [`formation`] | `FormationElasticityController`, `FormationDecision`     |
//! | [`probe`]     | `RaycastAvoidanceProbe`, `RaycastProbeState`, telemetry  |
//! | [`physics`]   | `PhysicsQuery`, `RayHit`, `CollisionFilter`, `SphereWorld` |

pub mod formation;
pub mod notch;
pub mod physics;
pub mod probe;
pub mod ring;
pub mod sensor;
pub mod state;


pub use formation::{FormationDecision, FormationElasticityController, FormationMode, FormationTransition};
pub use notch::HomingNotchBlender;
pub use physics::{CollisionFilter, NoPhysics, PhysicsQuery, RayHit, SphereObstacle, SphereWorld};
pub use probe::{ProbeConfig, ProbeTelemetry, RaycastAvoidanceProbe, RaycastProbeState};
pub use ring::{ReactionRingBuffer, RingEntry};
pub use sensor::{AvoidanceSensor, SensorReading};
pub use state::AgentAvoidanceState;
