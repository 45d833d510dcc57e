//! `SliceBuilder` — turns the threat feed into this tick's slice collection.

use hz_core::{AvoidanceProfile, SimClock, Tick, Vec3, mix_seed};
use tracing::debug;

use crate::damage::{AmbientHazard, DamageSource};
use crate::slice::{HazardSlice, SliceCollection, SliceKind};
use crate::threat::ThreatSource;

/// Seed salts, one per slice role.
const SALT_FLIGHT: u64 = 0;
const SALT_IMPACT: u64 = 1;
const SALT_RADIATION: u64 = 2;
const SALT_FIRE: u64 = 3;

// ── Configuration ─────────────────────────────────────────────────────────────

/// Ambient hazard envelopes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AmbientHazardConfig {
    pub radiation_radius:      f32,
    /// Radius growth per second of a radiation leak.
    pub radiation_growth:      f32,
    pub radiation_contagion:   f32,
    pub fire_radius:           f32,
    pub fire_growth:           f32,
}

impl Default for AmbientHazardConfig {
    fn default() -> Self {
        Self {
            radiation_radius:    20.0,
            radiation_growth:    0.5,
            radiation_contagion: 0.1,
            fire_radius:         8.0,
            fire_growth:         0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceBuilderConfig {
    /// The forecast horizon never drops below this, even if every profile
    /// present looks less far ahead.
    pub lookahead_floor_secs: f32,
    /// Time for an impact envelope to grow from `r` to `2r`.
    pub blast_duration_secs:  f32,
    /// Threats slower than this produce no forecast.
    pub min_speed:            f32,
    /// Radius of a flight-segment corridor before spray is added.
    pub flight_radius:        f32,
    pub ambient:              AmbientHazardConfig,
}

impl Default for SliceBuilderConfig {
    fn default() -> Self {
        Self {
            lookahead_floor_secs: 5.0,
            blast_duration_secs:  1.0,
            min_speed:            0.01,
            flight_radius:        2.0,
            ambient:              AmbientHazardConfig::default(),
        }
    }
}

/// Counts from one rebuild, for logging and telemetry.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SliceBuildStats {
    pub threats_seen:   usize,
    /// Expired or near-stationary threats.
    pub threats_skipped: usize,
    pub flight_slices:  usize,
    pub impact_slices:  usize,
    pub ambient_slices: usize,
}

impl SliceBuildStats {
    pub fn total_slices(&self) -> usize {
        self.flight_slices + self.impact_slices + self.ambient_slices
    }
}

// ── SliceBuilder ──────────────────────────────────────────────────────────────

/// Stateless per-tick slice emitter.
#[derive(Clone, Debug, Default)]
pub struct SliceBuilder {
    pub config:   SliceBuilderConfig,
    /// Run-wide seed folded into every slice seed.
    pub run_seed: u64,
}

impl SliceBuilder {
    pub fn new(config: SliceBuilderConfig) -> Self {
        Self { config, run_seed: 0 }
    }

    pub fn with_run_seed(mut self, seed: u64) -> Self {
        self.run_seed = seed;
        self
    }

    #[inline]
    fn slice_seed(&self, base: u64, salt: u64) -> u64 {
        mix_seed(base ^ self.run_seed, salt)
    }

    /// Forecast horizon: the most far-sighted profile present, floored at
    /// `lookahead_floor_secs`.
    pub fn forecast_horizon_secs<'a, I>(&self, profiles: I) -> f32
    where
        I: IntoIterator<Item = &'a AvoidanceProfile>,
    {
        profiles
            .into_iter()
            .map(|p| p.lookahead_secs)
            .fold(self.config.lookahead_floor_secs, f32::max)
    }

    /// Clear `out` and emit every slice for tick `now`.
    pub fn rebuild(
        &self,
        out:          &mut SliceCollection,
        threats:      &[ThreatSource],
        damage:       &[DamageSource],
        now:          Tick,
        clock:        &SimClock,
        horizon_secs: f32,
    ) -> SliceBuildStats {
        out.begin_rebuild(now);
        let mut stats = SliceBuildStats { threats_seen: threats.len(), ..Default::default() };

        for threat in threats {
            self.emit_threat(out, threat, now, clock, horizon_secs, &mut stats);
        }
        for source in damage {
            self.emit_ambient(out, source, now, clock, horizon_secs, &mut stats);
        }

        debug!(
            tick = now.0,
            threats = stats.threats_seen,
            skipped = stats.threats_skipped,
            slices = stats.total_slices(),
            "slice rebuild"
        );
        stats
    }

    // ── Threats ───────────────────────────────────────────────────────────

    fn emit_threat(
        &self,
        out:          &mut SliceCollection,
        threat:       &ThreatSource,
        now:          Tick,
        clock:        &SimClock,
        horizon_secs: f32,
        stats:        &mut SliceBuildStats,
    ) {
        if threat.is_expired() || threat.speed() < self.config.min_speed {
            stats.threats_skipped += 1;
            return;
        }

        let dt = clock.dt();
        let payload = &threat.payload;

        // Flight segment.  Quantized down so the impact starts no later than
        // the threat's actual end of flight.
        let flight_secs = threat.remaining_secs().min(horizon_secs);
        let flight_ticks = clock.whole_ticks_in(flight_secs);
        let flight_end = now + flight_ticks;

        // AREA_EFFECT is reserved for the impact envelope, which exists only
        // when the payload has a blast radius.  An `AreaEffect` threat with
        // no blast therefore forecasts a plain flight corridor.
        let mut kind = SliceKind::NONE;
        if threat.is_homing() {
            kind |= SliceKind::HOMING;
        }
        if threat.kind == crate::ThreatKind::Chain {
            kind |= SliceKind::CHAIN;
        }
        if payload.contagion_probability > 0.0 {
            kind |= SliceKind::CONTAGION;
        }

        let common = HazardSlice {
            source:                threat.id,
            center:                threat.position,
            velocity:              threat.velocity,
            radius:                self.config.flight_radius + payload.spray_variance.max(0.0),
            radius_growth:         0.0,
            start:                 now,
            end:                   flight_end,
            kind,
            chain_radius:          payload.chain_radius,
            contagion_probability: payload.contagion_probability,
            homing_cone_cos:       payload.homing_cone_cos,
            spray_variance:        payload.spray_variance,
            team_mask:             threat.team_mask,
            seed:                  self.slice_seed(threat.seed, SALT_FLIGHT),
        };

        if flight_ticks > 0 {
            out.push(common.clone());
            stats.flight_slices += 1;
        }

        // Impact envelope at the extrapolated end of flight.
        if payload.has_area_effect() {
            let blast_ticks = clock.ticks_for_secs(self.config.blast_duration_secs).max(1);
            let blast_secs = clock.secs_for_ticks(blast_ticks);
            out.push(HazardSlice {
                center:        threat.position + threat.velocity * (flight_ticks as f32 * dt),
                velocity:      Vec3::ZERO,
                radius:        payload.blast_radius,
                radius_growth: payload.blast_radius / blast_secs,
                start:         flight_end,
                end:           flight_end + blast_ticks,
                kind:          common.kind | SliceKind::AREA_EFFECT,
                seed:          self.slice_seed(threat.seed, SALT_IMPACT),
                ..common
            });
            stats.impact_slices += 1;
        }
    }

    // ── Ambient damage ────────────────────────────────────────────────────

    fn emit_ambient(
        &self,
        out:          &mut SliceCollection,
        source:       &DamageSource,
        now:          Tick,
        clock:        &SimClock,
        horizon_secs: f32,
        stats:        &mut SliceBuildStats,
    ) {
        let Some(hazard) = source.ambient_hazard() else {
            return;
        };
        let ambient = &self.config.ambient;
        let (radius, growth, kind, contagion, salt) = match hazard {
            AmbientHazard::RadiationLeak => (
                ambient.radiation_radius,
                ambient.radiation_growth,
                SliceKind::AREA_EFFECT | SliceKind::CONTAGION,
                ambient.radiation_contagion,
                SALT_RADIATION,
            ),
            AmbientHazard::Fire => (
                ambient.fire_radius,
                ambient.fire_growth,
                SliceKind::AREA_EFFECT,
                0.0,
                SALT_FIRE,
            ),
        };

        out.push(HazardSlice {
            source:                source.entity,
            center:                source.position,
            velocity:              Vec3::ZERO,
            radius,
            radius_growth:         growth,
            start:                 now,
            end:                   now + clock.ticks_for_secs(horizon_secs).max(1),
            kind,
            chain_radius:          0.0,
            contagion_probability: contagion,
            homing_cone_cos:       0.0,
            spray_variance:        0.0,
            team_mask:             source.team_mask,
            seed:                  self.slice_seed(source.entity.0 as u64, salt),
        });
        stats.ambient_slices += 1;
    }
}
