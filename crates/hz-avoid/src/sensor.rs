//! `AvoidanceSensor` — negative-gradient steering sampled from the risk grid,
//! with optional reaction delay.

use hz_core::math::{safe_normalize, saturate};
use hz_core::{EntityId, Tick, Vec3};
use hz_grid::HazardGrid;
use hz_hazard::SliceSample;

use crate::{AgentAvoidanceState, ReactionRingBuffer, RingEntry};

/// What the sensor saw at one agent on one tick.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SensorReading {
    /// Undelayed response.
    pub immediate: AgentAvoidanceState,
    /// Raw risk of the agent's cell.  The formation controller reads this.
    pub risk:      f32,
}

impl SensorReading {
    pub const NONE: Self = Self { immediate: AgentAvoidanceState::NEUTRAL, risk: 0.0 };
}

/// Stateless per-agent sensing stage.
#[derive(Copy, Clone, Debug, Default)]
pub struct AvoidanceSensor;

impl AvoidanceSensor {
    /// Sample the grid at `position`.
    ///
    /// The gradient is a central difference over the neighbouring cells on
    /// each axis (y is skipped on a planar grid); lookups past the grid edge
    /// are clamped.  `active` is the set of slice samples for this tick and
    /// only feeds the diagnostic cause.
    pub fn sense(
        &self,
        grid:      &HazardGrid,
        active:    &[SliceSample],
        position:  Vec3,
        threshold: f32,
    ) -> SensorReading {
        let layout = grid.layout();
        let cell = layout.cell_of(position);
        let risk = grid.risk_at_cell(cell);

        let c = cell.map(i64::from);
        let mut gradient = Vec3::ZERO;
        for axis in 0..3 {
            if axis == 1 && grid.is_planar() {
                continue;
            }
            let mut up = c;
            let mut down = c;
            up[axis] += 1;
            down[axis] -= 1;
            gradient[axis] =
                (grid.risk_at_clamped(up) - grid.risk_at_clamped(down)) / (2.0 * layout.cell_size);
        }

        let urgency = if threshold > 0.0 { saturate(risk / threshold) } else { 0.0 };
        let cause = if risk > 0.0 { dominant_cause(active, position) } else { EntityId::INVALID };

        SensorReading {
            immediate: AgentAvoidanceState::new(safe_normalize(-gradient), urgency, cause),
            risk,
        }
    }

    /// Resolve the state the agent acts on this tick.
    ///
    /// With `delay_ticks == 0` that is the immediate response.  Otherwise the
    /// immediate response is pushed into `ring` and the newest entry sensed
    /// at or before `now - delay_ticks` is returned, falling back to the
    /// immediate response if there is none yet.
    pub fn delayed(
        &self,
        ring:        &mut ReactionRingBuffer,
        immediate:   AgentAvoidanceState,
        now:         Tick,
        delay_ticks: u64,
    ) -> AgentAvoidanceState {
        if delay_ticks == 0 || ring.capacity() == 0 {
            return immediate;
        }
        ring.push(RingEntry {
            adjustment:  immediate.adjustment,
            urgency:     immediate.urgency,
            cause:       immediate.cause,
            sample_tick: now,
        });
        now.checked_back(delay_ticks)
            .and_then(|target| ring.latest_at_or_before(target))
            .map_or(immediate, |entry| entry.state())
    }
}

/// Source of the active slice contributing the most risk at `position`.
fn dominant_cause(active: &[SliceSample], position: Vec3) -> EntityId {
    let mut best = (0.0_f32, EntityId::INVALID);
    for sample in active {
        let r = sample.risk_at(position);
        if r > best.0 {
            best = (r, sample.source);
        }
    }
    best.1
}
