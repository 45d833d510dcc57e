//! Fluent builder for constructing a [`Sim`].

use hz_agent::AgentStore;
use hz_avoid::{
    AgentAvoidanceState, FormationDecision, HomingNotchBlender, PhysicsQuery, ProbeConfig,
    RaycastProbeState, ReactionRingBuffer,
};
use hz_core::{AgentId, ProfileTable, SimConfig};
use hz_grid::{GridAccumulator, GridLayout, HazardGrid};
use hz_hazard::{DamageSource, SliceBuilder, SliceBuilderConfig, SliceCollection, ThreatSource};

use crate::{Sim, SimError, SimResult};

/// Fluent builder for [`Sim<P>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — tick rate, total ticks, seed, …
/// - [`AgentStore`] — from [`hz_agent::AgentStoreBuilder`]
/// - [`ProfileTable`] — every `ProfileId` an agent uses must resolve
/// - `P: PhysicsQuery` — the probe's physics world (e.g.
///   [`hz_avoid::SphereWorld`] or [`hz_avoid::NoPhysics`])
///
/// # Optional inputs (have defaults)
///
/// | Method                 | Default                              |
/// |------------------------|--------------------------------------|
/// | `.grid_layout(l)`      | `GridLayout::default()`              |
/// | `.without_grid()`      | grid enabled                         |
/// | `.slice_config(c)`     | `SliceBuilderConfig::default()`      |
/// | `.probe_config(c)`     | `ProbeConfig::default()` for all     |
/// | `.probe_configs(v)`    | (per agent, length `agent_count`)    |
/// | `.team_filter(mask)`   | no filter                            |
/// | `.threats(v)`          | empty                                |
/// | `.damage(v)`           | empty                                |
/// | `.fly_threats(b)`      | `true`                               |
///
/// # Example
///
/// ```rust,ignore
/// let agents = AgentStoreBuilder::new(n).build();
/// let mut sim = SimBuilder::new(config, agents, profiles, SphereWorld::default())
///     .grid_layout(GridLayout::planar([128, 128], 2.0, [0.0, 0.0]))
///     .threats(salvo)
///     .build()?;
/// sim.run(&mut NoopObserver)?;
/// ```
pub struct SimBuilder<P: PhysicsQuery> {
    config:        SimConfig,
    agents:        AgentStore,
    profiles:      ProfileTable,
    physics:       P,
    layout:        Option<GridLayout>,
    grid_enabled:  bool,
    slice_config:  SliceBuilderConfig,
    probe_default: ProbeConfig,
    probe_configs: Option<Vec<ProbeConfig>>,
    team_filter:   Option<u32>,
    threats:       Vec<ThreatSource>,
    damage:        Vec<DamageSource>,
    fly_threats:   bool,
}

impl<P: PhysicsQuery> SimBuilder<P> {
    /// Create a builder with all required inputs.
    pub fn new(config: SimConfig, agents: AgentStore, profiles: ProfileTable, physics: P) -> Self {
        Self {
            config,
            agents,
            profiles,
            physics,
            layout:        None,
            grid_enabled:  true,
            slice_config:  SliceBuilderConfig::default(),
            probe_default: ProbeConfig::default(),
            probe_configs: None,
            team_filter:   None,
            threats:       Vec::new(),
            damage:        Vec::new(),
            fly_threats:   true,
        }
    }

    pub fn grid_layout(mut self, layout: GridLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Run without a risk grid.  Only the raycast probe produces avoidance.
    pub fn without_grid(mut self) -> Self {
        self.grid_enabled = false;
        self
    }

    pub fn slice_config(mut self, config: SliceBuilderConfig) -> Self {
        self.slice_config = config;
        self
    }

    /// Probe configuration shared by every agent.
    pub fn probe_config(mut self, config: ProbeConfig) -> Self {
        self.probe_default = config;
        self
    }

    /// Per-agent probe configurations (must be length `agent_count`).
    pub fn probe_configs(mut self, configs: Vec<ProbeConfig>) -> Self {
        self.probe_configs = Some(configs);
        self
    }

    /// Skip slices whose team mask intersects `mask` when rasterizing.
    pub fn team_filter(mut self, mask: u32) -> Self {
        self.team_filter = Some(mask);
        self
    }

    pub fn threats(mut self, threats: Vec<ThreatSource>) -> Self {
        self.threats = threats;
        self
    }

    pub fn damage(mut self, damage: Vec<DamageSource>) -> Self {
        self.damage = damage;
        self
    }

    pub fn fly_threats(mut self, fly: bool) -> Self {
        self.fly_threats = fly;
        self
    }

    /// Validate inputs, size every per-agent vector, and return a
    /// ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<P>> {
        let agents = self.agents;
        let n = agents.count;

        // ── Validate agent storage ────────────────────────────────────────
        let columns: [(&'static str, usize); 9] = [
            ("entity", agents.entity.len()),
            ("profile", agents.profile.len()),
            ("homing", agents.homing.len()),
            ("position", agents.position.len()),
            ("velocity", agents.velocity.len()),
            ("forward", agents.forward.len()),
            ("formation offset", agents.formation_offset.len()),
            ("formation leader", agents.formation_leader.len()),
            ("squad leader", agents.squad_leader.len()),
        ];
        if let Some(&(what, got)) = columns.iter().find(|(_, len)| *len != n) {
            return Err(SimError::AgentCountMismatch { expected: n, got, what });
        }

        if self.config.tick_rate_hz == 0 {
            return Err(SimError::Config("tick_rate_hz must be at least 1".into()));
        }

        // ── Resolve profiles ──────────────────────────────────────────────
        let clock = self.config.make_clock();
        let mut delay_ticks = Vec::with_capacity(n);
        let mut formation = Vec::with_capacity(n);
        for (i, &id) in agents.profile.iter().enumerate() {
            let profile = self.profiles.get(id).ok_or(SimError::UnknownProfile {
                agent:   AgentId(i as u32),
                profile: id,
            })?;
            delay_ticks.push(clock.nearest_ticks(profile.reaction_delay_secs));
            formation.push(FormationDecision::for_profile(profile, &clock));
        }
        let rings = delay_ticks.iter().map(|&k| ReactionRingBuffer::for_delay(k)).collect();

        // ── Probes ────────────────────────────────────────────────────────
        let probe_configs = match self.probe_configs {
            Some(v) => {
                if v.len() != n {
                    return Err(SimError::AgentCountMismatch { expected: n, got: v.len(), what: "probe configs" });
                }
                v
            }
            None => vec![self.probe_default; n],
        };
        let probes = probe_configs.into_iter().map(RaycastProbeState::new).collect();

        // ── Grid ──────────────────────────────────────────────────────────
        let grid = if self.grid_enabled {
            let layout = self.layout.unwrap_or_default();
            check_layout(&layout)?;
            Some(HazardGrid::new(layout))
        } else {
            None
        };

        // ── Worker pool ───────────────────────────────────────────────────
        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(threads) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| SimError::Config(format!("worker pool: {e}")))?,
            ),
            None => None,
        };

        let slice_builder = SliceBuilder::new(self.slice_config).with_run_seed(self.config.seed);

        Ok(Sim {
            clock,
            config:         self.config,
            agents,
            profiles:       self.profiles,
            threats:        self.threats,
            damage:         self.damage,
            fly_threats:    self.fly_threats,
            slice_builder,
            slices:         SliceCollection::new(),
            grid,
            accumulator:    GridAccumulator { team_filter: self.team_filter },
            notch:          HomingNotchBlender::default(),
            physics:        self.physics,
            avoidance:      vec![AgentAvoidanceState::NEUTRAL; n],
            rings,
            formation,
            probes,
            delay_ticks,
            pending_layout: None,
            paused:         false,
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}

/// Reject layouts with an empty axis or a degenerate cell size.
pub(crate) fn check_layout(layout: &GridLayout) -> SimResult<()> {
    if layout.is_valid() {
        return Ok(());
    }
    Err(SimError::InvalidGrid(format!(
        "dims {:?}, cell size {}, origin {}",
        layout.dims, layout.cell_size, layout.origin
    )))
}
