//! The threat source feed consumed by the slice builder.
//!
//! Threats are owned by the engine's weapon systems.  This crate only reads
//! them; [`ThreatSource::advance`] and [`retain_live`] exist so headless
//! drivers and tests can fly threats without an engine.

use hz_core::{EntityId, Vec3};

/// What kind of ordnance a threat is.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ThreatKind {
    /// Unguided projectile on a straight line.
    Ballistic,
    /// Guided projectile.
    Homing,
    /// Explosive round whose payload detonates at end of flight.
    AreaEffect,
    /// Round whose detonation arcs to nearby targets.
    Chain,
}

/// Payload description carried by a threat.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Payload {
    /// Base blast radius.  `> 0` means the threat carries an area-effect
    /// payload and emits an impact slice.
    pub blast_radius: f32,
    /// Arc radius for chain payloads.
    pub chain_radius: f32,
    /// Probability that the hazard spreads to an adjacent target.
    pub contagion_probability: f32,
    /// Cosine of the seeker cone half-angle for homing payloads.
    pub homing_cone_cos: f32,
    /// Dispersion of the round; widens the flight corridor.
    pub spray_variance: f32,
}

impl Payload {
    #[inline]
    pub fn has_area_effect(&self) -> bool {
        self.blast_radius > 0.0
    }
}

/// One live threat.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThreatSource {
    pub id:            EntityId,
    pub kind:          ThreatKind,
    pub position:      Vec3,
    pub velocity:      Vec3,
    /// Seconds since launch.
    pub age_secs:      f32,
    /// Total flight time; the threat is expired once `age_secs >= lifetime_secs`.
    pub lifetime_secs: f32,
    pub payload:       Payload,
    /// Guided regardless of `kind` (e.g. a homing area-effect missile).
    pub homing:        bool,
    pub team_mask:     u32,
    /// Stable per-threat seed; slices derive theirs from it.
    pub seed:          u64,
}

impl ThreatSource {
    /// Remaining flight time in seconds, never negative.
    #[inline]
    pub fn remaining_secs(&self) -> f32 {
        (self.lifetime_secs - self.age_secs).max(0.0)
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.age_secs >= self.lifetime_secs
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// `true` if either the kind or the explicit flag marks it as guided.
    #[inline]
    pub fn is_homing(&self) -> bool {
        self.homing || self.kind == ThreatKind::Homing
    }

    /// Straight-line integration by `dt` seconds.
    pub fn advance(&mut self, dt: f32) {
        self.position += self.velocity * dt;
        self.age_secs += dt;
    }
}

/// Drop every expired threat, preserving the order of the rest.
pub fn retain_live(threats: &mut Vec<ThreatSource>) {
    threats.retain(|t| !t.is_expired());
}
