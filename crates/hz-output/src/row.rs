//! Plain data rows written by output backends.

use hz_avoid::FormationMode;

/// `cause` value written when no hazard source is known.
pub const NO_CAUSE: u32 = u32::MAX;

/// One agent's avoidance state at a snapshot tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentAvoidanceRow {
    pub tick:          u64,
    pub agent_id:      u32,
    pub adjust_x:      f32,
    pub adjust_y:      f32,
    pub adjust_z:      f32,
    pub urgency:       f32,
    /// Entity id of the dominant hazard source, or [`NO_CAUSE`].
    pub cause:         u32,
    pub mode:          FormationMode,
    pub spacing:       f32,
    /// The probe channel's own urgency, whether or not it won this tick.
    pub probe_urgency: f32,
}

/// Pipeline counters for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickSummaryRow {
    pub tick:            u64,
    pub sim_secs:        f64,
    pub active_slices:   u64,
    pub max_risk:        f32,
    pub agents_avoiding: u64,
    pub breaks:          u64,
    pub probe_hits:      u32,
    pub dodge_distance:  f32,
}
