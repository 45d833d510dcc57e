//! Simulation time model.
//!
//! # Design
//!
//! Time is a monotonically increasing `Tick` counter driven at a fixed rate.
//! `SimClock` maps ticks to simulated seconds:
//!
//!   sim_secs = tick * (1 / tick_rate_hz)
//!
//! Every window, cooldown and delay in the framework is stored in whole
//! ticks, so comparisons are exact and no floating-point drift accumulates
//! across a long engagement.  Seconds only appear at configuration time and
//! inside per-tick integration (`dt`).

use std::fmt;

/// Slack used when converting seconds to ticks, so that `0.5 s * 20 Hz`
/// yields exactly 10 ticks despite `f32` rounding.
const TICK_EPSILON: f32 = 1.0e-4;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute simulation tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// Ticks elapsed from `earlier` to `self`.
    ///
    /// # Panics
    /// Panics in debug mode if `earlier > self`.
    #[inline]
    pub fn since(self, earlier: Tick) -> u64 {
        self.0 - earlier.0
    }

    /// The tick `n` steps before `self`, or `None` if that would precede
    /// tick 0.
    #[inline]
    pub fn checked_back(self, n: u64) -> Option<Tick> {
        self.0.checked_sub(n).map(Tick)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Fixed-rate clock.  Cheap to copy and holds no heap data.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Ticks per simulated second.  Typical values: 20, 30, 60.
    pub tick_rate_hz: u32,
    /// The current tick.  Advanced by `SimClock::advance()` each iteration.
    pub current_tick: Tick,
}

impl SimClock {
    /// Create a clock at tick 0 running at `tick_rate_hz`.
    ///
    /// A rate of 0 is treated as 1 Hz so `dt()` is always finite.
    pub fn new(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz: tick_rate_hz.max(1),
            current_tick: Tick::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = Tick(self.current_tick.0 + 1);
    }

    /// Length of one tick in seconds.
    #[inline]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate_hz as f32
    }

    /// Simulated seconds since tick 0.
    #[inline]
    pub fn elapsed_secs(&self) -> f64 {
        self.current_tick.0 as f64 / self.tick_rate_hz as f64
    }

    /// Simulated seconds spanned by `ticks`.
    #[inline]
    pub fn secs_for_ticks(&self, ticks: u64) -> f32 {
        ticks as f32 / self.tick_rate_hz as f32
    }

    // ── Tick-count helpers ────────────────────────────────────────────────

    /// How many ticks span `secs` seconds? Rounds up, so a cooldown never
    /// expires early.  Negative input yields 0.
    #[inline]
    pub fn ticks_for_secs(&self, secs: f32) -> u64 {
        let raw = secs.max(0.0) * self.tick_rate_hz as f32;
        (raw - TICK_EPSILON).ceil().max(0.0) as u64
    }

    /// Whole ticks that fit inside `secs` (rounds down).  Used for forecast
    /// windows, where a partial trailing tick must not push an impact past
    /// the threat's death.
    #[inline]
    pub fn whole_ticks_in(&self, secs: f32) -> u64 {
        let raw = secs.max(0.0) * self.tick_rate_hz as f32;
        (raw + TICK_EPSILON).floor().max(0.0) as u64
    }

    /// Nearest whole tick count for `secs`.  Used for reaction delays.
    #[inline]
    pub fn nearest_ticks(&self, secs: f32) -> u64 {
        (secs.max(0.0) * self.tick_rate_hz as f32).round() as u64
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2} s @ {} Hz)", self.current_tick, self.elapsed_secs(), self.tick_rate_hz)
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically filled in by the application crate (or deserialized with the
/// `serde` feature) and passed to the simulation builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Fixed simulation rate.  Default: 20 Hz.
    pub tick_rate_hz: u32,

    /// Total ticks to simulate with `Sim::run`.
    pub total_ticks: u64,

    /// Run seed, folded into every hazard slice seed.  Drivers also seed
    /// scenario generation from it.  The same seed reproduces identical
    /// slices.
    pub seed: u64,

    /// Size of the dedicated worker pool when built with `parallel`.
    /// `None` uses Rayon's global pool (all logical cores).
    pub num_threads: Option<usize>,

    /// Emit an observer snapshot every N ticks.  0 disables snapshots.
    pub output_interval_ticks: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz:          20,
            total_ticks:           600,
            seed:                  0,
            num_threads:           None,
            output_interval_ticks: 1,
        }
    }
}

impl SimConfig {
    /// The tick at which the simulation ends (exclusive upper bound).
    #[inline]
    pub fn end_tick(&self) -> Tick {
        Tick(self.total_ticks)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_rate_hz)
    }
}
