//! Fluent builder for constructing an `AgentStore` in one step.
//!
//! # Usage
//!
//! ```rust
//! use hz_agent::AgentStoreBuilder;
//! use hz_core::{ProfileId, Vec3};
//!
//! let mut store = AgentStoreBuilder::new(4)
//!     .profile(ProfileId(1))
//!     .forward(Vec3::Z)
//!     .build();
//!
//! assert_eq!(store.count, 4);
//! // Fill in real positions from the engine after building.
//! store.position[2] = Vec3::new(10.0, 0.0, 0.0);
//! ```

use hz_core::{AgentId, EntityId, ProfileId, Vec3};

use crate::AgentStore;

/// Initial values for one agent.  Also used as the template every agent
/// starts from in [`AgentStoreBuilder`].
#[derive(Clone, Debug)]
pub struct AgentSpawn {
    pub entity:           EntityId,
    pub profile:          ProfileId,
    pub homing:           bool,
    pub position:         Vec3,
    pub velocity:         Vec3,
    pub forward:          Vec3,
    pub formation_offset: Vec3,
    /// Squad leader; also the initial formation leader.
    pub leader:           AgentId,
}

impl Default for AgentSpawn {
    fn default() -> Self {
        Self {
            entity:           EntityId::INVALID,
            profile:          ProfileId(0),
            homing:           false,
            position:         Vec3::ZERO,
            velocity:         Vec3::ZERO,
            forward:          Vec3::Z,
            formation_offset: Vec3::ZERO,
            leader:           AgentId::INVALID,
        }
    }
}

/// Fluent builder for [`AgentStore`].
///
/// All arrays are pre-allocated at construction time so later field writes
/// are simple indexed assignments, not pushes.  Entity ids default to the
/// agent index.
pub struct AgentStoreBuilder {
    count:    usize,
    template: AgentSpawn,
}

impl AgentStoreBuilder {
    /// Create a builder for `count` agents.
    pub fn new(count: usize) -> Self {
        Self { count, template: AgentSpawn::default() }
    }

    /// Profile every agent starts with.  Default: `ProfileId(0)`.
    pub fn profile(mut self, profile: ProfileId) -> Self {
        self.template.profile = profile;
        self
    }

    /// Forward axis every agent starts with.  Default: `+Z`.
    pub fn forward(mut self, forward: Vec3) -> Self {
        self.template.forward = forward;
        self
    }

    /// Construct the `AgentStore`.
    pub fn build(self) -> AgentStore {
        AgentStore::with_defaults(self.count, &self.template)
    }
}
