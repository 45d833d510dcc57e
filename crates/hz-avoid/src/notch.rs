//! `HomingNotchBlender` — lateral evasion for agents that are themselves
//! homing projectiles.

use hz_core::Vec3;
use hz_core::math::{lateral_axis, safe_normalize};

use crate::AgentAvoidanceState;

/// Fraction of urgency given to the lateral component.
pub const NOTCH_GAIN: f32 = 0.5;

#[derive(Copy, Clone, Debug)]
pub struct HomingNotchBlender {
    pub gain: f32,
}

impl Default for HomingNotchBlender {
    fn default() -> Self {
        Self { gain: NOTCH_GAIN }
    }
}

impl HomingNotchBlender {
    /// Add `lateral_axis(velocity) * gain * urgency` to the adjustment, then
    /// renormalize (zero stays zero).  Urgency and cause are untouched.
    pub fn blend(&self, state: &mut AgentAvoidanceState, velocity: Vec3) {
        let notch = lateral_axis(velocity) * (self.gain * state.urgency);
        state.adjustment = safe_normalize(state.adjustment + notch).clamp_length_max(1.0);
    }
}
