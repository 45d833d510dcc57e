//! `FormationElasticityController` — hysteresis between holding, loosening
//! and breaking formation.
//!
//! ```text
//!   risk > threshold, cooldown elapsed      → Break
//!   risk > threshold, cooldown not elapsed  → Loose
//!   0 < risk <= threshold                   → Loose
//!   risk == 0                               → Hold
//! ```
//!
//! "Cooldown elapsed" is measured from the last transition of any kind, so
//! two `Break` transitions are always at least one cooldown apart no matter
//! how the risk oscillates.

use hz_core::math::exp_approach;
use hz_core::{AvoidanceProfile, SimClock, Tick};
use std::fmt;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormationMode {
    #[default]
    Hold,
    Loose,
    Break,
}

impl FormationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            FormationMode::Hold  => "hold",
            FormationMode::Loose => "loose",
            FormationMode::Break => "break",
        }
    }
}

impl fmt::Display for FormationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Per-agent formation state.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormationDecision {
    pub mode:            FormationMode,
    /// `None` until the first transition.
    pub last_transition: Option<Tick>,
    /// The group's break cooldown in ticks.
    pub cooldown_ticks:  u64,
    /// Current (interpolated) spacing from the leader.
    pub spacing:         f32,
}

impl FormationDecision {
    /// `Hold` at the profile's tight spacing.
    pub fn for_profile(profile: &AvoidanceProfile, clock: &SimClock) -> Self {
        Self {
            mode:            FormationMode::Hold,
            last_transition: None,
            cooldown_ticks:  clock.ticks_for_secs(profile.group_break_cooldown_secs),
            spacing:         profile.loose_spacing_min,
        }
    }

    /// `true` if no transition happened within the last `cooldown_ticks`.
    pub fn cooldown_elapsed(&self, now: Tick) -> bool {
        match self.last_transition {
            None => true,
            Some(t) => now.0.saturating_sub(t.0) >= self.cooldown_ticks,
        }
    }
}

impl Default for FormationDecision {
    fn default() -> Self {
        Self { mode: FormationMode::Hold, last_transition: None, cooldown_ticks: 0, spacing: 0.0 }
    }
}

/// A mode change produced by one update.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FormationTransition {
    pub from: FormationMode,
    pub to:   FormationMode,
    pub at:   Tick,
}

impl FormationTransition {
    #[inline]
    pub fn entered_break(&self) -> bool {
        self.to == FormationMode::Break
    }

    #[inline]
    pub fn left_break(&self) -> bool {
        self.from == FormationMode::Break
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct FormationElasticityController;

impl FormationElasticityController {
    /// The mode the rules pick for `risk`, without committing it.
    pub fn next_mode(&self, decision: &FormationDecision, risk: f32, threshold: f32, now: Tick) -> FormationMode {
        if risk > threshold {
            if decision.cooldown_elapsed(now) { FormationMode::Break } else { FormationMode::Loose }
        } else if risk > 0.0 {
            FormationMode::Loose
        } else {
            FormationMode::Hold
        }
    }

    /// Advance one tick: pick the mode, record any transition, and move
    /// spacing toward the mode's target.
    pub fn update(
        &self,
        decision: &mut FormationDecision,
        profile:  &AvoidanceProfile,
        risk:     f32,
        now:      Tick,
        dt:       f32,
    ) -> Option<FormationTransition> {
        let risk = if risk.is_nan() { 0.0 } else { risk };
        let next = self.next_mode(decision, risk, profile.break_formation_threshold, now);

        let transition = (next != decision.mode).then(|| {
            let t = FormationTransition { from: decision.mode, to: next, at: now };
            decision.mode = next;
            decision.last_transition = Some(now);
            t
        });

        let target = match decision.mode {
            FormationMode::Hold => profile.loose_spacing_min,
            FormationMode::Loose | FormationMode::Break => profile.loose_spacing_max,
        };
        decision.spacing = exp_approach(decision.spacing, target, profile.elasticity_rate, dt);

        transition
    }
}
