//! `RaycastAvoidanceProbe` — short-range obstacle avoidance from a fan of
//! physics raycasts.
//!
//! The probe runs beside the grid pipeline and keeps its own per-agent
//! channel.  A sample is taken at most once per cooldown; between samples,
//! and after a sample with no hits, urgency decays exponentially:
//!
//! ```text
//!   decay   = clamp(dt / fall_time, 0, 1)
//!   urgency = urgency * (1 - decay)        (cleared below URGENCY_FLOOR)
//! ```

use glam::Quat;
use hz_core::math::{lateral_axis, safe_normalize, saturate, WORLD_UP};
use hz_core::{EntityId, SimClock, Tick, Vec3};

use crate::{AgentAvoidanceState, CollisionFilter, PhysicsQuery};

/// Below this the probe drops its adjustment and cause.
pub const URGENCY_FLOOR: f32 = 1.0e-3;

// ── Configuration ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbeConfig {
    pub ray_count:     u32,
    /// Total fan angle in radians, centered on the forward axis.
    pub spread_angle:  f32,
    /// Cast length in world units.
    pub length:        f32,
    /// Lateral distance between the outermost ray origins.
    pub probe_width:   f32,
    pub cooldown_secs: f32,
    /// Time for urgency to fall away after the last hit.
    pub fall_time_secs: f32,
    pub filter:        CollisionFilter,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ray_count:      5,
            spread_angle:   60f32.to_radians(),
            length:         40.0,
            probe_width:    4.0,
            cooldown_secs:  0.2,
            fall_time_secs: 1.0,
            filter:         CollisionFilter::MASK_OBSTACLES,
        }
    }
}

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// Probe counters for one reporting interval.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProbeTelemetry {
    /// Individual ray hits.
    pub hits:           u32,
    /// Nearest hit distance, if any ray hit.
    pub nearest:        Option<f32>,
    pub last_sample:    Option<Tick>,
    /// Ticks on which urgency went from zero to positive.
    pub entered:        u32,
    /// Ticks on which urgency fell back to zero.
    pub exited:         u32,
    /// Distance the agent was asked to sidestep: `urgency * speed * dt`,
    /// summed.
    pub dodge_distance: f32,
}

// ── Per-agent state ───────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RaycastProbeState {
    pub config:      ProbeConfig,
    pub adjustment:  Vec3,
    pub urgency:     f32,
    pub cause:       EntityId,
    /// First tick a new sample may be taken.
    pub next_sample: Tick,
    pub telemetry:   ProbeTelemetry,
}

impl RaycastProbeState {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            adjustment:  Vec3::ZERO,
            urgency:     0.0,
            cause:       EntityId::INVALID,
            next_sample: Tick::ZERO,
            telemetry:   ProbeTelemetry::default(),
        }
    }

    pub fn as_avoidance(&self) -> AgentAvoidanceState {
        AgentAvoidanceState::new(self.adjustment, self.urgency, self.cause)
    }

    /// Return this interval's telemetry and start a new interval.  The last
    /// sample tick carries over.
    pub fn take_interval(&mut self) -> ProbeTelemetry {
        let out = self.telemetry;
        self.telemetry = ProbeTelemetry { last_sample: out.last_sample, ..Default::default() };
        out
    }

    fn decay(&mut self, dt: f32) {
        let fall = self.config.fall_time_secs;
        let decay = if fall > 0.0 { (dt / fall).clamp(0.0, 1.0) } else { 1.0 };
        self.urgency *= 1.0 - decay;
        if self.urgency < URGENCY_FLOOR {
            self.urgency = 0.0;
            self.adjustment = Vec3::ZERO;
            self.cause = EntityId::INVALID;
        }
    }
}

impl Default for RaycastProbeState {
    fn default() -> Self {
        Self::new(ProbeConfig::default())
    }
}

// ── Probe stage ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, Default)]
pub struct RaycastAvoidanceProbe;

impl RaycastAvoidanceProbe {
    /// Ray origins and unit directions for a fan around `forward`.
    ///
    /// Ray `i` sits at `t = i / (n - 1) - 0.5` across the fan: yawed by
    /// `t * spread_angle` about world-up and shifted `t * probe_width` along
    /// the lateral axis.  A single ray points straight ahead.
    pub fn fan(config: &ProbeConfig, origin: Vec3, forward: Vec3) -> Vec<(Vec3, Vec3)> {
        let forward = match safe_normalize(forward) {
            v if v == Vec3::ZERO => Vec3::Z,
            v => v,
        };
        let lateral = lateral_axis(forward);
        let n = config.ray_count.max(1);
        (0..n)
            .map(|i| {
                let t = if n == 1 { 0.0 } else { i as f32 / (n - 1) as f32 - 0.5 };
                let dir = Quat::from_axis_angle(WORLD_UP, t * config.spread_angle) * forward;
                (origin + lateral * (t * config.probe_width), dir)
            })
            .collect()
    }

    /// Advance one agent's probe by one tick.  Returns `true` if a sample was
    /// taken.
    pub fn update<P: PhysicsQuery + ?Sized>(
        &self,
        state:   &mut RaycastProbeState,
        physics: &P,
        origin:  Vec3,
        forward: Vec3,
        speed:   f32,
        now:     Tick,
        clock:   &SimClock,
    ) -> bool {
        let dt = clock.dt();
        let was_avoiding = state.urgency > 0.0;
        let sampled = now >= state.next_sample;

        let mut hit_any = false;
        if sampled {
            let cfg = state.config;
            state.next_sample = now + clock.ticks_for_secs(cfg.cooldown_secs).max(1);
            state.telemetry.last_sample = Some(now);

            let mut push = Vec3::ZERO;
            let mut max_weight = 0.0_f32;
            let mut nearest: Option<(f32, EntityId)> = None;

            for (ray_origin, dir) in Self::fan(&cfg, origin, forward) {
                let Some(hit) = physics.cast_ray(ray_origin, dir, cfg.length, cfg.filter) else {
                    continue;
                };
                let fraction = hit.fraction.clamp(0.0, 1.0);
                let weight = 1.0 - fraction;
                push += (ray_origin - hit.point) * weight;
                max_weight = max_weight.max(weight);

                let distance = fraction * cfg.length;
                if nearest.is_none_or(|(d, _)| distance < d) {
                    nearest = Some((distance, hit.entity));
                }
                state.telemetry.hits += 1;
            }

            if let Some((distance, entity)) = nearest {
                hit_any = true;
                state.adjustment = safe_normalize(push);
                state.urgency = saturate(max_weight);
                state.cause = entity;
                state.telemetry.nearest =
                    Some(state.telemetry.nearest.map_or(distance, |d| d.min(distance)));
            }
        }

        if !hit_any {
            state.decay(dt);
        }

        let avoiding = state.urgency > 0.0;
        if avoiding && !was_avoiding {
            state.telemetry.entered += 1;
        } else if !avoiding && was_avoiding {
            state.telemetry.exited += 1;
        }
        if avoiding {
            state.telemetry.dodge_distance += state.urgency * speed.max(0.0) * dt;
        }

        sampled
    }
}
