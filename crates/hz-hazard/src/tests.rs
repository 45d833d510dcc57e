//! Unit tests for hz-hazard.

#[cfg(test)]
mod fixtures {
    use hz_core::{EntityId, Vec3};

    use crate::{Payload, ThreatKind, ThreatSource};

    /// 20 m/s along +Z, 2 s of flight left, no payload.
    pub fn bolt() -> ThreatSource {
        ThreatSource {
            id:            EntityId(100),
            kind:          ThreatKind::Ballistic,
            position:      Vec3::ZERO,
            velocity:      Vec3::new(0.0, 0.0, 20.0),
            age_secs:      0.0,
            lifetime_secs: 2.0,
            payload:       Payload::default(),
            homing:        false,
            team_mask:     0b01,
            seed:          9,
        }
    }

    pub fn shell(blast: f32) -> ThreatSource {
        ThreatSource {
            kind:    ThreatKind::AreaEffect,
            payload: Payload { blast_radius: blast, ..Payload::default() },
            ..bolt()
        }
    }
}

#[cfg(test)]
mod slice_tests {
    use hz_core::{EntityId, Tick, Vec3};

    use crate::slice::{AREA_EFFECT_WEIGHT, CHAIN_WEIGHT, HOMING_WEIGHT};
    use crate::{HazardSlice, SliceCollection, SliceKind};

    fn slice(start: u64, end: u64) -> HazardSlice {
        HazardSlice {
            source:                EntityId(1),
            center:                Vec3::ZERO,
            velocity:              Vec3::new(10.0, 0.0, 0.0),
            radius:                2.0,
            radius_growth:         1.0,
            start:                 Tick(start),
            end:                   Tick(end),
            kind:                  SliceKind::NONE,
            chain_radius:          0.0,
            contagion_probability: 0.0,
            homing_cone_cos:       0.0,
            spray_variance:        0.0,
            team_mask:             0,
            seed:                  0,
        }
    }

    #[test]
    fn weights_stack_multiplicatively() {
        assert_eq!(SliceKind::NONE.weight(), 1.0);
        assert_eq!(SliceKind::AREA_EFFECT.weight(), AREA_EFFECT_WEIGHT);
        let all = SliceKind::AREA_EFFECT | SliceKind::CHAIN | SliceKind::HOMING;
        let expected = AREA_EFFECT_WEIGHT * CHAIN_WEIGHT * HOMING_WEIGHT;
        assert!((all.weight() - expected).abs() < 1e-6);
        // Contagion carries no bonus of its own.
        assert_eq!((SliceKind::CONTAGION | SliceKind::CHAIN).weight(), CHAIN_WEIGHT);
    }

    #[test]
    fn flag_ops() {
        let mut k = SliceKind::HOMING;
        k |= SliceKind::CHAIN;
        assert!(k.contains(SliceKind::HOMING));
        assert!(k.contains(SliceKind::CHAIN));
        assert!(!k.contains(SliceKind::AREA_EFFECT));
        assert!(SliceKind::default().is_empty());
    }

    #[test]
    fn validity_window_is_half_open() {
        let s = slice(10, 20);
        assert!(!s.is_valid_at(Tick(9)));
        assert!(s.is_valid_at(Tick(10)));
        assert!(s.is_valid_at(Tick(19)));
        assert!(!s.is_valid_at(Tick(20)));
        assert!(s.sample_at(Tick(20), 0.1).is_none());
    }

    #[test]
    fn sample_moves_and_grows() {
        let s = slice(10, 20);
        // 5 ticks at 0.1 s = 0.5 s elapsed.
        let sample = s.sample_at(Tick(15), 0.1).unwrap();
        assert!((sample.center - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
        assert!((sample.radius - 2.5).abs() < 1e-5);
        assert_eq!(sample.source, EntityId(1));
    }

    #[test]
    fn sample_risk_falls_off_and_cuts_at_radius() {
        let sample = slice(0, 10).sample_at(Tick(0), 0.1).unwrap();
        assert!((sample.risk_at(Vec3::ZERO) - 1.0).abs() < 1e-6);
        assert!((sample.risk_at(Vec3::new(1.0, 0.0, 0.0)) - 0.5).abs() < 1e-6);
        assert_eq!(sample.risk_at(Vec3::new(2.5, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn collection_rebuild_and_active() {
        let mut c = SliceCollection::new();
        assert_eq!(c.built_at(), None);
        c.begin_rebuild(Tick(5));
        c.push(slice(0, 10));
        c.push(slice(6, 10));
        assert_eq!(c.len(), 2);
        assert_eq!(c.active_at(Tick(5), 0.1).len(), 1);
        assert_eq!(c.active_at(Tick(6), 0.1).len(), 2);

        c.begin_rebuild(Tick(6));
        assert!(c.is_empty());
        assert_eq!(c.built_at(), Some(Tick(6)));
    }
}

#[cfg(test)]
mod threat_tests {
    use hz_core::Vec3;

    use super::fixtures::bolt;
    use crate::{ThreatKind, retain_live};

    #[test]
    fn advance_moves_and_ages() {
        let mut t = bolt();
        t.advance(0.5);
        assert!((t.position - Vec3::new(0.0, 0.0, 10.0)).length() < 1e-5);
        assert!((t.remaining_secs() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn retain_live_drops_expired() {
        let mut old = bolt();
        old.age_secs = 2.0;
        let mut threats = vec![bolt(), old, bolt()];
        retain_live(&mut threats);
        assert_eq!(threats.len(), 2);
    }

    #[test]
    fn homing_from_kind_or_flag() {
        let mut t = bolt();
        assert!(!t.is_homing());
        t.homing = true;
        assert!(t.is_homing());
        t.homing = false;
        t.kind = ThreatKind::Homing;
        assert!(t.is_homing());
    }
}

#[cfg(test)]
mod damage_tests {
    use hz_core::{EntityId, Vec3};

    use crate::{AmbientHazard, DamageSource, ModuleKind};

    fn module(kind: ModuleKind, destroyed: bool, damaged: bool) -> DamageSource {
        DamageSource {
            entity: EntityId(7),
            module: kind,
            position: Vec3::ZERO,
            destroyed,
            damaged,
            team_mask: 0,
        }
    }

    #[test]
    fn classify_module_ids() {
        assert_eq!(ModuleKind::classify("Reactor_Core_Mk2"), ModuleKind::Reactor);
        assert_eq!(ModuleKind::classify("ion_engine_port"), ModuleKind::Engine);
        assert_eq!(ModuleKind::classify("aft_thruster"), ModuleKind::Engine);
        assert_eq!(ModuleKind::classify("shield_gen"), ModuleKind::Other);
    }

    #[test]
    fn ambient_hazard_rules() {
        assert_eq!(module(ModuleKind::Reactor, true, false).ambient_hazard(), Some(AmbientHazard::RadiationLeak));
        assert_eq!(module(ModuleKind::Reactor, false, true).ambient_hazard(), None);
        assert_eq!(module(ModuleKind::Engine, false, true).ambient_hazard(), Some(AmbientHazard::Fire));
        assert_eq!(module(ModuleKind::Engine, true, false).ambient_hazard(), Some(AmbientHazard::Fire));
        assert_eq!(module(ModuleKind::Engine, false, false).ambient_hazard(), None);
        assert_eq!(module(ModuleKind::Other, true, true).ambient_hazard(), None);
    }
}

#[cfg(test)]
mod builder_tests {
    use hz_core::{AvoidanceProfile, EntityId, SimClock, Tick, Vec3};

    use super::fixtures::{bolt, shell};
    use crate::{DamageSource, ModuleKind, SliceBuilder, SliceCollection, SliceKind, ThreatKind};

    const RATE: u32 = 10; // dt = 0.1 s

    fn build(threats: &[crate::ThreatSource], damage: &[DamageSource], now: Tick, horizon: f32) -> (SliceCollection, crate::SliceBuildStats) {
        let builder = SliceBuilder::default();
        let clock = SimClock::new(RATE);
        let mut out = SliceCollection::new();
        let stats = builder.rebuild(&mut out, threats, damage, now, &clock, horizon);
        (out, stats)
    }

    #[test]
    fn horizon_is_max_profile_lookahead_with_floor() {
        let builder = SliceBuilder::default();
        let short = AvoidanceProfile { lookahead_secs: 2.0, ..Default::default() };
        let long = AvoidanceProfile { lookahead_secs: 9.0, ..Default::default() };
        assert_eq!(builder.forecast_horizon_secs([&short]), 5.0);
        assert_eq!(builder.forecast_horizon_secs([&short, &long]), 9.0);
        assert_eq!(builder.forecast_horizon_secs(std::iter::empty()), 5.0);
    }

    #[test]
    fn ballistic_emits_single_flight_segment() {
        let (out, stats) = build(&[bolt()], &[], Tick(3), 5.0);
        assert_eq!(stats.flight_slices, 1);
        assert_eq!(stats.impact_slices, 0);
        let s = &out.as_slice()[0];
        // 2 s remaining at 10 Hz.
        assert_eq!((s.start, s.end), (Tick(3), Tick(23)));
        assert_eq!(s.velocity, Vec3::new(0.0, 0.0, 20.0));
        assert_eq!(s.radius_growth, 0.0);
        assert_eq!(s.source, EntityId(100));
        assert!(s.kind.is_empty());
    }

    #[test]
    fn flight_is_capped_by_horizon() {
        let mut long = bolt();
        long.lifetime_secs = 60.0;
        let (out, _) = build(&[long], &[], Tick(0), 5.0);
        assert_eq!(out.as_slice()[0].end, Tick(50));
    }

    #[test]
    fn area_effect_impact_follows_flight() {
        let (out, stats) = build(&[shell(4.0)], &[], Tick(0), 5.0);
        assert_eq!(stats.flight_slices, 1);
        assert_eq!(stats.impact_slices, 1);
        let flight = &out.as_slice()[0];
        let impact = &out.as_slice()[1];

        assert_eq!(impact.start, flight.end);
        assert_eq!(impact.end, Tick(20 + 10)); // 1 s blast at 10 Hz
        assert_eq!(impact.velocity, Vec3::ZERO);
        // 2 s at 20 m/s along +Z.
        assert!((impact.center - Vec3::new(0.0, 0.0, 40.0)).length() < 1e-4);
        assert!(impact.kind.contains(SliceKind::AREA_EFFECT));
        assert!(!flight.kind.contains(SliceKind::AREA_EFFECT));

        // Radius doubles over the blast.
        let last = impact.sample_at(Tick(29), 0.1).unwrap();
        assert!((last.radius - 4.0 * 1.9).abs() < 1e-4);
        let first = impact.sample_at(Tick(20), 0.1).unwrap();
        assert!((first.radius - 4.0).abs() < 1e-6);
    }

    #[test]
    fn imminent_impact_is_valid_now() {
        let mut t = shell(3.0);
        t.age_secs = 1.95; // 0.05 s left, less than one tick
        let (out, stats) = build(&[t], &[], Tick(7), 5.0);
        assert_eq!(stats.flight_slices, 0);
        assert_eq!(stats.impact_slices, 1);
        assert!(out.as_slice()[0].is_valid_at(Tick(7)));
    }

    #[test]
    fn expired_and_stationary_threats_skipped() {
        let mut dead = shell(3.0);
        dead.age_secs = 5.0;
        let mut parked = shell(3.0);
        parked.velocity = Vec3::ZERO;
        let (out, stats) = build(&[dead, parked], &[], Tick(0), 5.0);
        assert!(out.is_empty());
        assert_eq!(stats.threats_skipped, 2);
    }

    #[test]
    fn kind_tags() {
        let mut chain = bolt();
        chain.kind = ThreatKind::Chain;
        chain.homing = true;
        chain.payload.contagion_probability = 0.3;
        let (out, _) = build(&[chain], &[], Tick(0), 5.0);
        let k = out.as_slice()[0].kind;
        assert!(k.contains(SliceKind::CHAIN));
        assert!(k.contains(SliceKind::HOMING));
        assert!(k.contains(SliceKind::CONTAGION));
    }

    #[test]
    fn spray_widens_flight_corridor() {
        let mut sprayed = bolt();
        sprayed.payload.spray_variance = 1.5;
        let (out, _) = build(&[sprayed], &[], Tick(0), 5.0);
        assert!((out.as_slice()[0].radius - 3.5).abs() < 1e-6);
    }

    #[test]
    fn seeds_are_stable_across_rebuilds_and_roles() {
        let (a, _) = build(&[shell(2.0)], &[], Tick(0), 5.0);
        let (b, _) = build(&[shell(2.0)], &[], Tick(0), 5.0);
        assert_eq!(a.as_slice()[0].seed, b.as_slice()[0].seed);
        assert_ne!(a.as_slice()[0].seed, a.as_slice()[1].seed);
    }

    #[test]
    fn run_seed_changes_every_slice_seed() {
        let reactor = DamageSource {
            entity:    EntityId(40),
            module:    ModuleKind::Reactor,
            position:  Vec3::ZERO,
            destroyed: true,
            damaged:   true,
            team_mask: 0,
        };
        let clock = SimClock::new(10);
        let rebuild = |seed: u64| {
            let mut out = SliceCollection::new();
            SliceBuilder::default().with_run_seed(seed).rebuild(
                &mut out,
                &[shell(2.0)],
                std::slice::from_ref(&reactor),
                Tick(0),
                &clock,
                5.0,
            );
            out.iter().map(|s| s.seed).collect::<Vec<_>>()
        };
        let a = rebuild(7);
        let b = rebuild(8);
        assert_eq!(a.len(), 3);
        assert_eq!(a, rebuild(7));
        assert!(a.iter().zip(&b).all(|(x, y)| x != y));
    }

    #[test]
    fn area_effect_without_blast_is_a_plain_corridor() {
        let (out, stats) = build(&[shell(0.0)], &[], Tick(0), 5.0);
        assert_eq!(stats.flight_slices, 1);
        assert_eq!(stats.impact_slices, 0);
        assert!(!out.as_slice()[0].kind.contains(SliceKind::AREA_EFFECT));
    }

    #[test]
    fn ambient_sources_emit_current_slices() {
        let reactor = DamageSource {
            entity:    EntityId(40),
            module:    ModuleKind::Reactor,
            position:  Vec3::new(5.0, 0.0, 5.0),
            destroyed: true,
            damaged:   true,
            team_mask: 0,
        };
        let intact_engine = DamageSource { module: ModuleKind::Engine, destroyed: false, damaged: false, ..reactor.clone() };
        let burning_engine = DamageSource { module: ModuleKind::Engine, damaged: true, destroyed: false, ..reactor.clone() };

        let (out, stats) = build(&[], &[reactor, intact_engine, burning_engine], Tick(4), 5.0);
        assert_eq!(stats.ambient_slices, 2);
        let radiation = &out.as_slice()[0];
        assert!(radiation.kind.contains(SliceKind::CONTAGION));
        assert!(radiation.is_valid_at(Tick(4)));
        assert_eq!(radiation.end, Tick(4 + 50));
        let fire = &out.as_slice()[1];
        assert_eq!(fire.kind, SliceKind::AREA_EFFECT);
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let builder = SliceBuilder::default();
        let clock = SimClock::new(RATE);
        let mut out = SliceCollection::new();
        builder.rebuild(&mut out, &[bolt(), bolt()], &[], Tick(0), &clock, 5.0);
        assert_eq!(out.len(), 2);
        builder.rebuild(&mut out, &[bolt()], &[], Tick(1), &clock, 5.0);
        assert_eq!(out.len(), 1);
        assert_eq!(out.built_at(), Some(Tick(1)));
    }
}
