//! Integration tests for hz-sim.

use hz_agent::{AgentSpawn, AgentStore, AgentStoreBuilder};
use hz_avoid::{
    CollisionFilter, FormationMode, NoPhysics, ProbeConfig, SphereObstacle, SphereWorld,
};
use hz_core::{AgentId, AvoidanceProfile, EntityId, ProfileId, ProfileTable, SimConfig, Tick, Vec3};
use hz_grid::GridLayout;
use hz_hazard::{DamageSource, ModuleKind, Payload, ThreatKind, ThreatSource};

use crate::{NoopObserver, SimBuilder, SimError, SimObserver, SimSnapshot, TickReport};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn test_config(total_ticks: u64) -> SimConfig {
    SimConfig {
        tick_rate_hz:          20,
        total_ticks,
        seed:                  42,
        num_threads:           Some(1),
        output_interval_ticks: 1,
    }
}

fn profile(threshold: f32, delay_secs: f32) -> AvoidanceProfile {
    AvoidanceProfile {
        lookahead_secs:            6.0,
        break_formation_threshold: threshold,
        reaction_delay_secs:       delay_secs,
        loose_spacing_min:         10.0,
        loose_spacing_max:         25.0,
        elasticity_rate:           2.0,
        group_break_cooldown_secs: 1.0,
        ..Default::default()
    }
}

/// Leader far away at (60, 0, 60); wingman at the origin following it.
fn pair() -> AgentStore {
    let mut store = AgentStore::default();
    store.push_agent(AgentSpawn {
        entity:   EntityId(500),
        position: Vec3::new(60.0, 0.0, 60.0),
        ..Default::default()
    });
    store.push_agent(AgentSpawn {
        entity:           EntityId(501),
        position:         Vec3::ZERO,
        formation_offset: Vec3::new(-1.0, 0.0, -1.0),
        leader:           AgentId(0),
        ..Default::default()
    });
    store
}

/// Area-effect shell 40 m short of the origin, closing at 20 m/s.  The
/// lifetime puts its last live tick half a tick before impact.
fn inbound_shell() -> ThreatSource {
    ThreatSource {
        id:            EntityId(900),
        kind:          ThreatKind::AreaEffect,
        position:      Vec3::new(0.0, 0.0, -40.0),
        velocity:      Vec3::new(0.0, 0.0, 20.0),
        age_secs:      0.0,
        lifetime_secs: 2.025,
        payload:       Payload { blast_radius: 10.0, ..Default::default() },
        homing:        false,
        team_mask:     0b01,
        seed:          77,
    }
}

fn reactor_at(position: Vec3) -> DamageSource {
    DamageSource {
        entity:    EntityId(700),
        module:    ModuleKind::Reactor,
        position,
        destroyed: true,
        damaged:   true,
        team_mask: 0,
    }
}

/// Records every report and the wingman's state at every snapshot.
#[derive(Default)]
struct Recorder {
    reports:   Vec<TickReport>,
    modes:     Vec<FormationMode>,
    urgency:   Vec<f32>,
    snapshots: usize,
    ended:     Option<Tick>,
}

impl SimObserver for Recorder {
    fn on_tick_end(&mut self, _tick: Tick, report: &TickReport) {
        self.reports.push(*report);
    }

    fn on_snapshot(&mut self, _tick: Tick, snap: &SimSnapshot<'_>) {
        self.snapshots += 1;
        assert_eq!(snap.probe_intervals.len(), snap.agents.count);
        let last = snap.agents.count - 1;
        self.modes.push(snap.formation[last].mode);
        self.urgency.push(snap.avoidance[last].urgency);
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        self.ended = Some(final_tick);
    }
}

// ── SimBuilder validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod builder_tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let sim = SimBuilder::new(test_config(10), pair(), profiles, NoPhysics).build().unwrap();
        assert_eq!(sim.agents.count, 2);
        assert_eq!(sim.avoidance.len(), 2);
        assert_eq!(sim.formation.len(), 2);
        assert_eq!(sim.probes.len(), 2);
        assert_eq!(sim.rings[0].capacity(), 0);
        assert!(sim.grid.is_some());
        assert!(!sim.is_paused());
    }

    #[test]
    fn reaction_delay_sizes_rings() {
        let profiles = ProfileTable::single(profile(1.0, 0.2)).unwrap();
        let sim = SimBuilder::new(test_config(10), pair(), profiles, NoPhysics).build().unwrap();
        // 0.2 s at 20 Hz = 4 ticks.
        assert_eq!(sim.rings[1].capacity(), 6);
        assert_eq!(sim.formation[1].cooldown_ticks, 20);
    }

    #[test]
    fn unknown_profile_errors() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let agents = AgentStoreBuilder::new(3).profile(ProfileId(4)).build();
        let err = SimBuilder::new(test_config(10), agents, profiles, NoPhysics).build().err().unwrap();
        assert!(matches!(err, SimError::UnknownProfile { profile: ProfileId(4), .. }));
    }

    #[test]
    fn column_length_mismatch_errors() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let mut agents = pair();
        agents.velocity.pop();
        let err = SimBuilder::new(test_config(10), agents, profiles, NoPhysics).build().err().unwrap();
        assert!(matches!(err, SimError::AgentCountMismatch { what: "velocity", expected: 2, got: 1 }));
    }

    #[test]
    fn probe_config_count_mismatch_errors() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let err = SimBuilder::new(test_config(10), pair(), profiles, NoPhysics)
            .probe_configs(vec![ProbeConfig::default()])
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::AgentCountMismatch { what: "probe configs", .. }));
    }

    #[test]
    fn invalid_grid_errors() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let err = SimBuilder::new(test_config(10), pair(), profiles, NoPhysics)
            .grid_layout(GridLayout { dims: [0, 1, 4], cell_size: 1.0, origin: Vec3::ZERO })
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, SimError::InvalidGrid(_)));
    }

    #[test]
    fn horizon_uses_profiles_in_use() {
        let far = AvoidanceProfile { lookahead_secs: 12.0, ..profile(1.0, 0.0) };
        let unused = AvoidanceProfile { lookahead_secs: 30.0, ..profile(1.0, 0.0) };
        let profiles = ProfileTable::new(vec![far, unused]).unwrap();
        let sim = SimBuilder::new(test_config(10), pair(), profiles, NoPhysics).build().unwrap();
        assert_eq!(sim.forecast_horizon_secs(), 12.0);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn num_threads_sizes_worker_pool() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let sim = SimBuilder::new(test_config(10), pair(), profiles.clone(), NoPhysics).build().unwrap();
        assert_eq!(sim.pool.as_ref().map(|p| p.current_num_threads()), Some(1));

        let global = SimConfig { num_threads: None, ..test_config(10) };
        let sim = SimBuilder::new(global, pair(), profiles, NoPhysics).build().unwrap();
        assert!(sim.pool.is_none());
    }
}

// ── Run loop ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod run_tests {
    use super::*;

    #[test]
    fn run_reaches_end_tick_and_snapshots() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let mut cfg = test_config(12);
        cfg.output_interval_ticks = 4;
        let mut sim = SimBuilder::new(cfg, pair(), profiles, NoPhysics).build().unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert_eq!(sim.clock.current_tick, Tick(12));
        assert_eq!(rec.reports.len(), 12);
        // Ticks 0, 4, 8.
        assert_eq!(rec.snapshots, 3);
        assert_eq!(rec.ended, Some(Tick(12)));
    }

    #[test]
    fn pause_advances_clock_only() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(100), pair(), profiles, NoPhysics)
            .threats(vec![inbound_shell()])
            .build()
            .unwrap();
        sim.set_paused(true);
        let mut rec = Recorder::default();
        sim.run_ticks(5, &mut rec).unwrap();

        assert_eq!(sim.clock.current_tick, Tick(5));
        assert!(rec.reports.iter().all(|r| r.paused));
        assert_eq!(rec.snapshots, 0);
        assert_eq!(sim.threats[0].position, Vec3::new(0.0, 0.0, -40.0));
        assert!(sim.slices.is_empty());

        sim.set_paused(false);
        sim.run_ticks(1, &mut rec).unwrap();
        assert!(!rec.reports[5].paused);
        assert_eq!(rec.reports[5].slices.impact_slices, 1);
    }

    #[test]
    fn threats_fly_and_expire() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(100), pair(), profiles, NoPhysics)
            .threats(vec![inbound_shell()])
            .build()
            .unwrap();
        sim.run_ticks(10, &mut NoopObserver).unwrap();
        assert!((sim.threats[0].position.z - -30.0).abs() < 1e-3);
        sim.run_ticks(40, &mut NoopObserver).unwrap();
        assert!(sim.threats.is_empty());
    }

    #[test]
    fn engine_owned_feed_is_left_alone() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(100), pair(), profiles, NoPhysics)
            .threats(vec![inbound_shell()])
            .fly_threats(false)
            .build()
            .unwrap();
        sim.run_ticks(10, &mut NoopObserver).unwrap();
        assert_eq!(sim.threats[0].position, Vec3::new(0.0, 0.0, -40.0));
    }

    #[test]
    fn grid_relayout_applies_next_tick() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(100), pair(), profiles, NoPhysics).build().unwrap();
        let layout = GridLayout::centered([16, 4, 16], 8.0, Vec3::ZERO);
        sim.set_grid_layout(layout).unwrap();
        assert_ne!(sim.grid.as_ref().map(|g| g.layout().dims), Some([16, 4, 16]));
        sim.run_ticks(1, &mut NoopObserver).unwrap();
        assert_eq!(sim.grid.as_ref().map(|g| *g.layout()), Some(layout));
    }

    #[test]
    fn run_seed_reaches_slice_seeds() {
        let slice_seeds = |seed: u64| {
            let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
            let cfg = SimConfig { seed, ..test_config(10) };
            let mut sim = SimBuilder::new(cfg, pair(), profiles, NoPhysics)
                .threats(vec![inbound_shell()])
                .build()
                .unwrap();
            sim.run_ticks(1, &mut NoopObserver).unwrap();
            sim.slices.iter().map(|s| s.seed).collect::<Vec<_>>()
        };
        let a = slice_seeds(42);
        assert_eq!(a.len(), 2);
        assert_eq!(a, slice_seeds(42));
        assert_ne!(a, slice_seeds(43));
    }

    #[test]
    fn invalid_relayout_is_rejected_and_ticks_keep_running() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(100), pair(), profiles, NoPhysics)
            .damage(vec![reactor_at(Vec3::new(3.0, 0.0, 0.0))])
            .build()
            .unwrap();
        let before = sim.grid.as_ref().map(|g| *g.layout());

        let empty = GridLayout { dims: [0, 1, 8], ..GridLayout::default() };
        let err = sim.set_grid_layout(empty).unwrap_err();
        assert!(matches!(err, SimError::InvalidGrid(_)));
        let flat = GridLayout { cell_size: f32::NAN, ..GridLayout::default() };
        assert!(sim.set_grid_layout(flat).is_err());

        let mut rec = Recorder::default();
        sim.run_ticks(2, &mut rec).unwrap();
        assert_eq!(sim.grid.as_ref().map(|g| *g.layout()), before);
        assert!(rec.urgency.iter().all(|&u| u > 0.0));
    }

    #[test]
    fn without_grid_senses_nothing() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(100), pair(), profiles, NoPhysics)
            .without_grid()
            .damage(vec![reactor_at(Vec3::new(3.0, 0.0, 0.0))])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(5, &mut rec).unwrap();
        assert!(sim.grid.is_none());
        assert!(rec.urgency.iter().all(|&u| u == 0.0));
        assert!(rec.modes.iter().all(|&m| m == FormationMode::Hold));
    }
}

// ── End-to-end behaviour ──────────────────────────────────────────────────────

#[cfg(test)]
mod pipeline_tests {
    use super::*;

    #[test]
    fn area_effect_threat_drives_avoidance_and_formation() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(60), pair(), profiles, NoPhysics)
            .threats(vec![inbound_shell()])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();

        let first = &rec.reports[0];
        assert_eq!(first.slices.flight_slices, 1);
        assert_eq!(first.slices.impact_slices, 1);

        assert!(rec.reports.iter().any(|r| r.max_risk > 0.0));
        assert!(rec.urgency.iter().any(|&u| u > 0.0));
        assert!(rec.modes.iter().any(|&m| m != FormationMode::Hold));
    }

    #[test]
    fn impact_tick_breaks_formation_and_detaches() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(60), pair(), profiles, NoPhysics)
            .threats(vec![inbound_shell()])
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(41, &mut rec).unwrap();

        // Tick 40: under one tick of flight left, so the blast is current.
        let impact = &rec.reports[40];
        assert_eq!(impact.slices.flight_slices, 0);
        assert_eq!(impact.slices.impact_slices, 1);
        assert!(impact.active_slices >= 1);
        assert_eq!(sim.avoidance[1].cause, EntityId(900));
        assert_eq!(sim.avoidance[1].urgency, 1.0);
        assert_eq!(sim.formation[1].mode, FormationMode::Break);
        assert_eq!(impact.breaks, 1);
        assert!(!sim.agents.in_formation(AgentId(1)));
    }

    #[test]
    fn reaction_delay_shifts_step_response() {
        let profiles = ProfileTable::single(profile(0.5, 0.2)).unwrap();
        let mut sim = SimBuilder::new(test_config(100), pair(), profiles, NoPhysics).build().unwrap();

        let step_at = 10;
        let mut urgency = Vec::new();
        for t in 0..25u64 {
            if t == step_at {
                sim.damage = vec![reactor_at(Vec3::new(8.0, 0.0, 0.0))];
            }
            sim.run_ticks(1, &mut NoopObserver).unwrap();
            urgency.push(sim.avoidance[1].urgency);
        }
        for (t, &u) in urgency.iter().enumerate() {
            if (t as u64) < step_at + 4 {
                assert_eq!(u, 0.0, "tick {t}");
            } else {
                assert!(u > 0.0, "tick {t}");
            }
        }
    }

    #[test]
    fn oscillating_risk_never_double_breaks_and_rejoins_on_hold() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(1_000), pair(), profiles, NoPhysics).build().unwrap();
        let cooldown = sim.formation[1].cooldown_ticks;

        let mut breaks = Vec::new();
        let mut rec = Recorder::default();
        for t in 0..300u64 {
            let hot = t % 50 < 25 || t % 7 == 0;
            sim.damage = if hot { vec![reactor_at(Vec3::new(2.0, 0.0, 2.0))] } else { Vec::new() };
            sim.run_ticks(1, &mut rec).unwrap();
            if rec.reports[t as usize].breaks > 0 {
                breaks.push(t);
                assert!(!sim.agents.in_formation(AgentId(1)));
            }
            if sim.formation[1].mode == FormationMode::Hold {
                assert_eq!(sim.agents.formation_leader[1], AgentId(0));
            }
        }
        assert!(breaks.len() >= 2, "{breaks:?}");
        for w in breaks.windows(2) {
            assert!(w[1] - w[0] >= cooldown, "{w:?}");
        }
    }

    /// Risk held above threshold: Break on the first tick, Loose on the next
    /// (that Break restarted the cooldown), Break again once the cooldown
    /// after the Loose transition runs out.  The agent never rejoins.
    #[test]
    fn sustained_risk_cycles_break_and_loose() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(1_000), pair(), profiles, NoPhysics)
            .damage(vec![reactor_at(Vec3::new(2.0, 0.0, 2.0))])
            .build()
            .unwrap();
        let cooldown = sim.formation[1].cooldown_ticks;
        assert_eq!(cooldown, 20);

        let mut rec = Recorder::default();
        sim.run_ticks(70, &mut rec).unwrap();

        let breaks: Vec<u64> = rec
            .reports
            .iter()
            .filter(|r| r.breaks > 0)
            .map(|r| r.tick.0)
            .collect();
        assert_eq!(breaks, [0, 21, 42, 63]);
        for (t, &mode) in rec.modes.iter().enumerate() {
            let expected = if breaks.contains(&(t as u64)) { FormationMode::Break } else { FormationMode::Loose };
            assert_eq!(mode, expected, "tick {t}");
        }
        assert!(!sim.agents.in_formation(AgentId(1)));
    }

    #[test]
    fn spacing_resizes_formation_offset() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(1_000), pair(), profiles, NoPhysics)
            .damage(vec![reactor_at(Vec3::new(2.0, 0.0, 2.0))])
            .build()
            .unwrap();
        sim.run_ticks(200, &mut NoopObserver).unwrap();
        let offset = sim.agents.formation_offset[1];
        assert!((offset.length() - 25.0).abs() < 0.05);
        // Direction preserved.
        assert!((offset.normalize() - Vec3::new(-1.0, 0.0, -1.0).normalize()).length() < 1e-4);
        // The leader's zero offset stays zero.
        assert_eq!(sim.agents.formation_offset[0], Vec3::ZERO);
    }

    #[test]
    fn team_filter_ignores_own_ordnance() {
        let profiles = ProfileTable::single(profile(0.2, 0.0)).unwrap();
        let mut sim = SimBuilder::new(test_config(60), pair(), profiles, NoPhysics)
            .threats(vec![inbound_shell()])
            .team_filter(0b01)
            .build()
            .unwrap();
        let mut rec = Recorder::default();
        sim.run(&mut rec).unwrap();
        assert!(rec.reports.iter().all(|r| r.max_risk == 0.0 && r.active_slices == 0));
        assert!(rec.urgency.iter().all(|&u| u == 0.0));
    }

    #[test]
    fn probe_overrides_when_grid_is_quiet() {
        let profiles = ProfileTable::single(profile(1.0, 0.0)).unwrap();
        let world = SphereWorld::new(vec![SphereObstacle {
            entity:   EntityId(321),
            center:   Vec3::new(0.0, 0.0, 10.0),
            radius:   3.0,
            contents: CollisionFilter::SOLID,
        }]);
        let mut sim = SimBuilder::new(test_config(10), pair(), profiles, world).build().unwrap();
        let mut rec = Recorder::default();
        sim.run_ticks(1, &mut rec).unwrap();

        assert!(rec.reports[0].probe_hits > 0);
        let wingman = sim.avoidance[1];
        assert!(wingman.urgency > 0.0);
        assert_eq!(wingman.cause, EntityId(321));
        assert!(wingman.adjustment.z < 0.0);
        // Probe never moves formation.
        assert_eq!(sim.formation[1].mode, FormationMode::Hold);
    }
}
