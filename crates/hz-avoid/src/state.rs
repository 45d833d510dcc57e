//! The per-agent avoidance output.

use hz_core::{EntityId, Vec3, math::saturate};

/// Steering bias handed to the engine's movement integration.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentAvoidanceState {
    /// Unit length, or zero when there is nothing to avoid.
    pub adjustment: Vec3,
    /// In `[0, 1]`.
    pub urgency:    f32,
    /// Source of the dominant hazard.  Diagnostic only; `INVALID` when none.
    pub cause:      EntityId,
}

impl AgentAvoidanceState {
    pub const NEUTRAL: Self = Self { adjustment: Vec3::ZERO, urgency: 0.0, cause: EntityId::INVALID };

    /// Builds a state, clamping `urgency` into `[0, 1]`.
    pub fn new(adjustment: Vec3, urgency: f32, cause: EntityId) -> Self {
        Self { adjustment, urgency: saturate(urgency), cause }
    }

    #[inline]
    pub fn is_avoiding(&self) -> bool {
        self.urgency > 0.0
    }
}

impl Default for AgentAvoidanceState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}
