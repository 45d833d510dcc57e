//! `TelemetryObserver<W>` — bridges `SimObserver` to an `OutputWriter`.

use hz_core::{SimConfig, Tick};
use hz_sim::{SimObserver, SimSnapshot, TickReport};
use tracing::warn;

use crate::row::{AgentAvoidanceRow, NO_CAUSE, TickSummaryRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes a summary row every tick and one avoidance
/// row per agent at every snapshot.
///
/// Paused ticks produce no summary row.  Errors from the writer are stored
/// because `SimObserver` methods have no return value; check
/// [`take_error`][Self::take_error] after `sim.run()` returns.
pub struct TelemetryObserver<W: OutputWriter> {
    writer:       W,
    tick_rate_hz: u32,
    last_error:   Option<OutputError>,
}

impl<W: OutputWriter> TelemetryObserver<W> {
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self { writer, tick_rate_hz: config.tick_rate_hz.max(1), last_error: None }
    }

    /// Take the first write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn sim_secs(&self, tick: Tick) -> f64 {
        tick.0 as f64 / self.tick_rate_hz as f64
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                warn!(error = %e, "telemetry write failed");
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for TelemetryObserver<W> {
    fn on_tick_end(&mut self, tick: Tick, report: &TickReport) {
        if report.paused {
            return;
        }
        let row = TickSummaryRow {
            tick:            tick.0,
            sim_secs:        self.sim_secs(tick),
            active_slices:   report.active_slices as u64,
            max_risk:        report.max_risk,
            agents_avoiding: report.agents_avoiding as u64,
            breaks:          report.breaks as u64,
            probe_hits:      report.probe_hits,
            dodge_distance:  report.dodge_distance,
        };
        let result = self.writer.write_tick_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, tick: Tick, snap: &SimSnapshot<'_>) {
        let rows: Vec<AgentAvoidanceRow> = (0..snap.agents.count)
            .map(|i| {
                let state = &snap.avoidance[i];
                let decision = &snap.formation[i];
                AgentAvoidanceRow {
                    tick:          tick.0,
                    agent_id:      i as u32,
                    adjust_x:      state.adjustment.x,
                    adjust_y:      state.adjustment.y,
                    adjust_z:      state.adjustment.z,
                    urgency:       state.urgency,
                    cause:         if state.cause.is_valid() { state.cause.0 } else { NO_CAUSE },
                    mode:          decision.mode,
                    spacing:       decision.spacing,
                    probe_urgency: snap.probes[i].urgency,
                }
            })
            .collect();

        if !rows.is_empty() {
            let result = self.writer.write_avoidance(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_tick: Tick) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
