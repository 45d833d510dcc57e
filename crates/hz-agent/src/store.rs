//! Core agent storage: `AgentStore` (SoA data).
//!
//! Every stage of the avoidance pipeline iterates agents by index, reading a
//! handful of fields each.  Keeping each field in its own `Vec` means the
//! per-stage scans touch only the arrays they need, and the parallel stages
//! can borrow read-only kinematics alongside mutable per-agent outputs held
//! elsewhere (see `hz-sim`).

use hz_core::{AgentId, EntityId, ProfileId, Vec3};

use crate::AgentSpawn;

/// Structure-of-Arrays storage for all agent state.
///
/// Every `Vec` field has exactly `count` elements; the `AgentId` value is the
/// index into all of them:
///
/// ```ignore
/// let pos = store.position[agent.index()];
/// ```
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentStore {
    /// Number of agents.  Equals the length of every SoA `Vec`.
    pub count: usize,

    // ── Identity ──────────────────────────────────────────────────────────
    /// Engine entity backing each agent.
    pub entity: Vec<EntityId>,

    /// Avoidance profile (agent class).
    pub profile: Vec<ProfileId>,

    /// `true` for agents that are themselves homing projectiles; these get
    /// the lateral notch component.
    pub homing: Vec<bool>,

    // ── Kinematics ────────────────────────────────────────────────────────
    pub position: Vec<Vec3>,
    pub velocity: Vec<Vec3>,

    /// Unit forward axis.  The raycast probe fans out around it.
    pub forward: Vec<Vec3>,

    // ── Formation links ───────────────────────────────────────────────────
    /// Offset from the formation leader.  Direction is authored; magnitude
    /// is driven by the formation controller's spacing.
    pub formation_offset: Vec<Vec3>,

    /// Current leader reference.  `AgentId::INVALID` when detached.
    pub formation_leader: Vec<AgentId>,

    /// The squad's designated leader, restored on returning to `Hold`.
    pub squad_leader: Vec<AgentId>,
}

impl AgentStore {
    /// `true` if there are no agents.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterator over all `AgentId`s in ascending index order.
    pub fn agent_ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.count as u32).map(AgentId)
    }

    /// Distinct profiles referenced by at least one agent, ascending.
    pub fn profiles_in_use(&self) -> Vec<ProfileId> {
        let mut ids = self.profile.clone();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    // ── Formation helpers ─────────────────────────────────────────────────

    /// `true` if the agent is currently attached to a formation leader.
    #[inline]
    pub fn in_formation(&self, agent: AgentId) -> bool {
        self.formation_leader[agent.index()].is_valid()
    }

    /// Clear the leader reference, structurally detaching the agent.
    #[inline]
    pub fn detach_from_formation(&mut self, agent: AgentId) {
        self.formation_leader[agent.index()] = AgentId::INVALID;
    }

    /// Restore the leader reference from the squad leader.  No-op for
    /// agents without a squad leader (including the leader itself).
    #[inline]
    pub fn reattach_to_formation(&mut self, agent: AgentId) {
        let i = agent.index();
        self.formation_leader[i] = self.squad_leader[i];
    }

    // ── Growth ────────────────────────────────────────────────────────────

    /// Append one agent and return its id.
    pub fn push_agent(&mut self, spawn: AgentSpawn) -> AgentId {
        let id = AgentId(self.count as u32);
        self.entity.push(spawn.entity);
        self.profile.push(spawn.profile);
        self.homing.push(spawn.homing);
        self.position.push(spawn.position);
        self.velocity.push(spawn.velocity);
        self.forward.push(spawn.forward);
        self.formation_offset.push(spawn.formation_offset);
        self.formation_leader.push(spawn.leader);
        self.squad_leader.push(spawn.leader);
        self.count += 1;
        id
    }

    // ── Package-private constructor used by AgentStoreBuilder ─────────────

    pub(crate) fn with_defaults(count: usize, template: &AgentSpawn) -> Self {
        Self {
            count,
            entity:           (0..count as u32).map(EntityId).collect(),
            profile:          vec![template.profile; count],
            homing:           vec![template.homing; count],
            position:         vec![template.position; count],
            velocity:         vec![template.velocity; count],
            forward:          vec![template.forward; count],
            formation_offset: vec![template.formation_offset; count],
            formation_leader: vec![template.leader; count],
            squad_leader:     vec![template.leader; count],
        }
    }
}
