//! Simulation observer trait and the per-tick data handed to it.

use hz_agent::AgentStore;
use hz_avoid::{AgentAvoidanceState, FormationDecision, ProbeTelemetry, RaycastProbeState};
use hz_core::Tick;
use hz_grid::HazardGrid;
use hz_hazard::SliceBuildStats;

/// What one tick did.  Passed to [`SimObserver::on_tick_end`].
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub tick:            Tick,
    /// `true` if the tick was skipped because the sim is paused.
    pub paused:          bool,
    pub slices:          SliceBuildStats,
    /// Slices valid at this tick (after the team filter).
    pub active_slices:   usize,
    /// Highest cell risk in the grid (0 without a grid).
    pub max_risk:        f32,
    /// Agents whose final avoidance urgency is above zero.
    pub agents_avoiding: usize,
    /// Transitions into `Break` this tick.
    pub breaks:          usize,
    pub probe_hits:      u32,
    /// Probe sidestep distance requested this tick, summed over agents.
    pub dodge_distance:  f32,
}

/// Read-only view of the pipeline state at a snapshot tick.
pub struct SimSnapshot<'a> {
    pub agents:    &'a AgentStore,
    pub avoidance: &'a [AgentAvoidanceState],
    pub formation: &'a [FormationDecision],
    pub probes:    &'a [RaycastProbeState],
    /// Probe telemetry accumulated since the previous snapshot, per agent.
    pub probe_intervals: &'a [ProbeTelemetry],
    pub grid:      Option<&'a HazardGrid>,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// tick loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_tick_end(&mut self, tick: Tick, report: &TickReport) {
///         if tick.0 % self.interval == 0 {
///             println!("tick {tick}: {} agents avoiding", report.agents_avoiding);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before any processing.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called at the end of each tick, paused or not.
    fn on_tick_end(&mut self, _tick: Tick, _report: &TickReport) {}

    /// Called at snapshot intervals (every `config.output_interval_ticks`
    /// ticks) after the tick's stages have run.
    fn on_snapshot(&mut self, _tick: Tick, _snapshot: &SimSnapshot<'_>) {}

    /// Called once after the final tick completes.
    fn on_sim_end(&mut self, _final_tick: Tick) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
