//! `hz-output` — avoidance telemetry writers for the hazard_field framework.
//!
//! | Backend | Files created                                    |
//! |---------|--------------------------------------------------|
//! | CSV     | `agent_avoidance.csv`, `tick_summaries.csv`      |
//!
//! Writers implement [`OutputWriter`] and are driven by
//! [`TelemetryObserver`], which implements `hz_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hz_output::{CsvWriter, TelemetryObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = TelemetryObserver::new(writer, &config);
//! sim.run(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;


pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::TelemetryObserver;
pub use row::{AgentAvoidanceRow, NO_CAUSE, TickSummaryRow};
pub use writer::OutputWriter;
