//! The `OutputWriter` trait implemented by telemetry backends.

use crate::{AgentAvoidanceRow, OutputResult, TickSummaryRow};

/// A telemetry sink.
///
/// The observer never propagates these errors into the sim; it keeps the
/// first one for [`TelemetryObserver::take_error`][crate::TelemetryObserver::take_error].
pub trait OutputWriter {
    /// Write one snapshot's worth of per-agent rows.
    fn write_avoidance(&mut self, rows: &[AgentAvoidanceRow]) -> OutputResult<()>;

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()>;

    /// Flush all underlying handles.  Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
