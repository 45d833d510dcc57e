//! The `Sim` struct and its tick pipeline.

use hz_agent::AgentStore;
use hz_avoid::{
    AgentAvoidanceState, AvoidanceSensor, FormationDecision, FormationElasticityController,
    FormationMode, FormationTransition, HomingNotchBlender, PhysicsQuery, ProbeTelemetry,
    RaycastAvoidanceProbe, RaycastProbeState, ReactionRingBuffer, SensorReading,
};
use hz_core::math::with_magnitude;
use hz_core::{AgentId, ProfileTable, SimClock, SimConfig, Tick};
use hz_grid::{GridAccumulator, GridLayout, HazardGrid};
use hz_hazard::{
    DamageSource, SliceBuilder, SliceCollection, SliceSample, ThreatSource, retain_live,
};
use tracing::{debug, info};

use crate::builder::check_layout;
use crate::{SimObserver, SimResult, SimSnapshot, TickReport};

// ── Per-agent stage context ───────────────────────────────────────────────────

/// Everything the per-agent stages read.  Built once per tick; shared by
/// reference across (possibly parallel) agent updates.
struct StageCtx<'a, P: PhysicsQuery> {
    now:         Tick,
    clock:       &'a SimClock,
    agents:      &'a AgentStore,
    profiles:    &'a ProfileTable,
    grid:        Option<&'a HazardGrid>,
    active:      &'a [SliceSample],
    physics:     &'a P,
    notch:       HomingNotchBlender,
    delay_ticks: &'a [u64],
}

/// What one agent's update produced that the sequential apply phase needs.
#[derive(Copy, Clone, Default)]
struct AgentOutcome {
    transition:     Option<FormationTransition>,
    probe_hits:     u32,
    dodge_distance: f32,
}

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The main simulation runner.
///
/// `Sim<P>` owns every piece of pipeline state and drives it one tick at a
/// time:
///
/// 1. **Slices**: rebuild the slice collection from the threat feed and
///    ambient damage.
/// 2. **Grid**: apply any pending re-layout, clear, and accumulate.
/// 3. **Per agent** (optionally parallel with the `parallel` feature):
///    sensor → reaction delay → homing notch → formation controller →
///    raycast probe, which overrides the grid response when more urgent.
/// 4. **Apply** (sequential, ascending `AgentId`): formation leader
///    detach/re-attach and spacing written into formation offsets.
/// 5. **Threats**: optionally fly and age the threat feed by one tick.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<P: PhysicsQuery> {
    /// Global configuration (tick rate, total ticks, seed, …).
    pub config: SimConfig,

    /// Simulation clock.
    pub clock: SimClock,

    /// Agent kinematics and formation links (SoA).
    pub agents: AgentStore,

    /// Avoidance profiles indexed by `ProfileId`.
    pub profiles: ProfileTable,

    /// Live threat feed.  Replace or edit between ticks to inject threats.
    pub threats: Vec<ThreatSource>,

    /// Ambient damage sources.
    pub damage: Vec<DamageSource>,

    /// When `true`, threats are integrated and aged at the end of every
    /// tick and expired ones dropped.  Turn off when an engine owns the feed.
    pub fly_threats: bool,

    pub slice_builder: SliceBuilder,
    pub slices:        SliceCollection,

    /// `None` disables the grid stages; sensing then reads as neutral.
    pub grid:        Option<HazardGrid>,
    pub accumulator: GridAccumulator,

    pub notch: HomingNotchBlender,

    /// Physics world for the raycast probe.
    pub physics: P,

    // ── Per-agent state, indexed by `AgentId` ─────────────────────────────
    pub avoidance: Vec<AgentAvoidanceState>,
    pub rings:     Vec<ReactionRingBuffer>,
    pub formation: Vec<FormationDecision>,
    pub probes:    Vec<RaycastProbeState>,

    pub(crate) delay_ticks:    Vec<u64>,
    pub(crate) pending_layout: Option<GridLayout>,
    pub(crate) paused:         bool,

    /// Dedicated pool sized by `config.num_threads`; `None` runs on Rayon's
    /// global pool.
    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl<P: PhysicsQuery> Sim<P> {
    // ── Public API ────────────────────────────────────────────────────────

    /// Run the simulation from the current tick to `config.end_tick()`.
    ///
    /// Calls observer hooks at every tick boundary.  Use
    /// [`NoopObserver`][crate::NoopObserver] if you don't need callbacks.
    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.current_tick < self.config.end_tick() {
            self.step(observer);
        }
        observer.on_sim_end(self.clock.current_tick);
        Ok(())
    }

    /// Run exactly `n` ticks from the current position (ignores `end_tick`).
    ///
    /// Useful for tests and incremental stepping.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step(observer);
        }
        Ok(())
    }

    /// While paused, ticks advance the clock but run no stage; all state
    /// stays exactly as it was.
    pub fn set_paused(&mut self, paused: bool) {
        if paused != self.paused {
            info!(tick = self.clock.current_tick.0, paused, "simulation pause toggled");
        }
        self.paused = paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Request a new grid layout.  It is applied at the start of the next
    /// tick's grid stage; the backing array is reallocated only if the
    /// dimensions differ.  Creates the grid if there is none.
    ///
    /// An invalid layout is rejected and any earlier pending layout is kept.
    pub fn set_grid_layout(&mut self, layout: GridLayout) -> SimResult<()> {
        check_layout(&layout)?;
        self.pending_layout = Some(layout);
        Ok(())
    }

    /// Integrate and age every threat by `dt` seconds, dropping the expired.
    pub fn advance_threats(&mut self, dt: f32) {
        for threat in &mut self.threats {
            threat.advance(dt);
        }
        retain_live(&mut self.threats);
    }

    /// The most far-sighted lookahead among profiles that agents use.
    pub fn forecast_horizon_secs(&self) -> f32 {
        let in_use = self.agents.profiles_in_use();
        self.slice_builder
            .forecast_horizon_secs(in_use.iter().filter_map(|&id| self.profiles.get(id)))
    }

    /// Run one tick and advance the clock.
    fn step<O: SimObserver>(&mut self, observer: &mut O) {
        let now = self.clock.current_tick;
        observer.on_tick_start(now);

        let report = self.process_tick_pooled(now);
        observer.on_tick_end(now, &report);

        if !report.paused
            && self.config.output_interval_ticks > 0
            && now.0 % self.config.output_interval_ticks == 0
        {
            let intervals: Vec<ProbeTelemetry> =
                self.probes.iter_mut().map(RaycastProbeState::take_interval).collect();
            observer.on_snapshot(now, &SimSnapshot {
                agents:          &self.agents,
                avoidance:       &self.avoidance,
                formation:       &self.formation,
                probes:          &self.probes,
                probe_intervals: &intervals,
                grid:            self.grid.as_ref(),
            });
        }

        self.clock.advance();
    }

    // ── Core tick processing ──────────────────────────────────────────────

    #[cfg(not(feature = "parallel"))]
    fn process_tick_pooled(&mut self, now: Tick) -> TickReport {
        self.process_tick(now)
    }

    /// Parallel stages inside the tick use the dedicated pool when one was
    /// configured.
    #[cfg(feature = "parallel")]
    fn process_tick_pooled(&mut self, now: Tick) -> TickReport {
        match self.pool.take() {
            Some(pool) => {
                let report = pool.install(|| self.process_tick(now));
                self.pool = Some(pool);
                report
            }
            None => self.process_tick(now),
        }
    }

    fn process_tick(&mut self, now: Tick) -> TickReport {
        if self.paused {
            return TickReport { tick: now, paused: true, ..Default::default() };
        }
        let dt = self.clock.dt();

        // ── Stage 1: slices ───────────────────────────────────────────────
        let horizon = self.forecast_horizon_secs();
        let slice_stats = self.slice_builder.rebuild(
            &mut self.slices,
            &self.threats,
            &self.damage,
            now,
            &self.clock,
            horizon,
        );

        // ── Stage 2: grid ─────────────────────────────────────────────────
        if let Some(layout) = self.pending_layout.take() {
            match self.grid.as_mut() {
                Some(grid) => {
                    grid.relayout(layout);
                }
                None => self.grid = Some(HazardGrid::new(layout)),
            }
        }
        let mut active_slices = 0;
        if let Some(grid) = self.grid.as_mut() {
            active_slices = self.accumulator.accumulate(grid, &self.slices, now, dt).active_slices;
        }

        // Samples for the diagnostic cause, filtered like the grid.
        let filter = self.accumulator.team_filter;
        let active: Vec<SliceSample> = self
            .slices
            .active_at(now, dt)
            .into_iter()
            .filter(|s| filter.is_none_or(|mask| s.team_mask & mask == 0))
            .collect();

        // ── Stage 3: per-agent stages ─────────────────────────────────────
        let outcomes = self.update_agents(now, &active);

        // ── Stage 4: apply (sequential, ascending AgentId) ────────────────
        let mut breaks = 0;
        let mut probe_hits = 0;
        let mut dodge_distance = 0.0;
        for (i, outcome) in outcomes.iter().enumerate() {
            probe_hits += outcome.probe_hits;
            dodge_distance += outcome.dodge_distance;
            let agent = AgentId(i as u32);
            if let Some(t) = outcome.transition {
                self.apply_transition(agent, t);
                if t.entered_break() {
                    breaks += 1;
                }
            }
            let offset = self.agents.formation_offset[i];
            self.agents.formation_offset[i] = with_magnitude(offset, self.formation[i].spacing);
        }

        // ── Stage 5: threats ──────────────────────────────────────────────
        if self.fly_threats {
            self.advance_threats(dt);
        }

        let report = TickReport {
            tick: now,
            paused: false,
            slices: slice_stats,
            active_slices,
            max_risk: self.grid.as_ref().map_or(0.0, HazardGrid::max_risk),
            agents_avoiding: self.avoidance.iter().filter(|s| s.is_avoiding()).count(),
            breaks,
            probe_hits,
            dodge_distance,
        };
        debug!(
            tick = now.0,
            slices = report.slices.total_slices(),
            active = report.active_slices,
            avoiding = report.agents_avoiding,
            breaks = report.breaks,
            "tick complete"
        );
        report
    }

    /// Run sensor, delay, notch, formation and probe for every agent.
    ///
    /// Each agent writes only its own entries of the per-agent vectors, so
    /// with the `parallel` feature the agents are split across Rayon's pool.
    /// Outcomes come back in `AgentId` order either way.
    fn update_agents(&mut self, now: Tick, active: &[SliceSample]) -> Vec<AgentOutcome> {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let ctx = StageCtx {
            now,
            clock:       &self.clock,
            agents:      &self.agents,
            profiles:    &self.profiles,
            grid:        self.grid.as_ref(),
            active,
            physics:     &self.physics,
            notch:       self.notch,
            delay_ticks: &self.delay_ticks,
        };
        let avoidance = &mut self.avoidance;
        let rings     = &mut self.rings;
        let formation = &mut self.formation;
        let probes    = &mut self.probes;

        #[cfg(not(feature = "parallel"))]
        {
            avoidance
                .iter_mut()
                .zip(rings.iter_mut())
                .zip(formation.iter_mut())
                .zip(probes.iter_mut())
                .enumerate()
                .map(|(i, (((state, ring), decision), probe))| {
                    update_agent(&ctx, i, state, ring, decision, probe)
                })
                .collect()
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            avoidance
                .par_iter_mut()
                .zip(rings.par_iter_mut())
                .zip(formation.par_iter_mut())
                .zip(probes.par_iter_mut())
                .enumerate()
                .map(|(i, (((state, ring), decision), probe))| {
                    update_agent(&ctx, i, state, ring, decision, probe)
                })
                .collect()
        }
    }

    fn apply_transition(&mut self, agent: AgentId, t: FormationTransition) {
        match t.to {
            FormationMode::Break => {
                self.agents.detach_from_formation(agent);
                info!(tick = t.at.0, agent = agent.0, from = %t.from, "formation break");
            }
            FormationMode::Hold => {
                if !self.agents.in_formation(agent) {
                    self.agents.reattach_to_formation(agent);
                    debug!(tick = t.at.0, agent = agent.0, "rejoined formation");
                }
            }
            FormationMode::Loose => {}
        }
    }
}

// ── Per-agent pipeline ────────────────────────────────────────────────────────

fn update_agent<P: PhysicsQuery>(
    ctx:      &StageCtx<'_, P>,
    i:        usize,
    state:    &mut AgentAvoidanceState,
    ring:     &mut ReactionRingBuffer,
    decision: &mut FormationDecision,
    probe:    &mut RaycastProbeState,
) -> AgentOutcome {
    let agents = ctx.agents;
    let Some(profile) = ctx.profiles.get(agents.profile[i]) else {
        *state = AgentAvoidanceState::NEUTRAL;
        return AgentOutcome::default();
    };
    let position = agents.position[i];
    let velocity = agents.velocity[i];

    // Grid sensing with reaction delay.
    let reading = match ctx.grid {
        Some(grid) => AvoidanceSensor.sense(grid, ctx.active, position, profile.break_formation_threshold),
        None => SensorReading::NONE,
    };
    let mut current = AvoidanceSensor.delayed(ring, reading.immediate, ctx.now, ctx.delay_ticks[i]);

    if agents.homing[i] {
        ctx.notch.blend(&mut current, velocity);
    }

    // Formation reacts to raw risk, not the delayed response.
    let transition = FormationElasticityController.update(
        decision,
        profile,
        reading.risk,
        ctx.now,
        ctx.clock.dt(),
    );

    // Close-range probe; overrides when more urgent.
    let before = probe.telemetry;
    RaycastAvoidanceProbe.update(
        probe,
        ctx.physics,
        position,
        agents.forward[i],
        velocity.length(),
        ctx.now,
        ctx.clock,
    );
    if probe.urgency > current.urgency {
        current = probe.as_avoidance();
    }

    *state = current;
    AgentOutcome {
        transition,
        probe_hits:     probe.telemetry.hits - before.hits,
        dodge_distance: probe.telemetry.dodge_distance - before.dodge_distance,
    }
}
