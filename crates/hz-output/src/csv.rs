//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `agent_avoidance.csv`
//! - `tick_summaries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AgentAvoidanceRow, OutputResult, TickSummaryRow};

pub const AVOIDANCE_FILE: &str = "agent_avoidance.csv";
pub const SUMMARY_FILE: &str = "tick_summaries.csv";

const AVOIDANCE_HEADER: [&str; 10] = [
    "tick", "agent_id", "adjust_x", "adjust_y", "adjust_z", "urgency", "cause", "mode", "spacing",
    "probe_urgency",
];
const SUMMARY_HEADER: [&str; 8] = [
    "tick", "sim_secs", "active_slices", "max_risk", "agents_avoiding", "breaks", "probe_hits",
    "dodge_distance",
];

/// Writes telemetry to two CSV files.
pub struct CsvWriter {
    avoidance: Writer<File>,
    summaries: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create (truncating) the two CSV files in `dir` and write the header
    /// rows.  `dir` must exist.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let mut avoidance = Writer::from_path(dir.join(AVOIDANCE_FILE))?;
        avoidance.write_record(AVOIDANCE_HEADER)?;

        let mut summaries = Writer::from_path(dir.join(SUMMARY_FILE))?;
        summaries.write_record(SUMMARY_HEADER)?;

        Ok(Self { avoidance, summaries, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_avoidance(&mut self, rows: &[AgentAvoidanceRow]) -> OutputResult<()> {
        for row in rows {
            self.avoidance.write_record(&[
                row.tick.to_string(),
                row.agent_id.to_string(),
                row.adjust_x.to_string(),
                row.adjust_y.to_string(),
                row.adjust_z.to_string(),
                row.urgency.to_string(),
                row.cause.to_string(),
                row.mode.as_str().to_owned(),
                row.spacing.to_string(),
                row.probe_urgency.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_tick_summary(&mut self, row: &TickSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.tick.to_string(),
            row.sim_secs.to_string(),
            row.active_slices.to_string(),
            row.max_risk.to_string(),
            row.agents_avoiding.to_string(),
            row.breaks.to_string(),
            row.probe_hits.to_string(),
            row.dodge_distance.to_string(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.avoidance.flush()?;
        self.summaries.flush()?;
        Ok(())
    }
}
