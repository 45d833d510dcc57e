//! skirmish — an area-effect salvo against a fighter squad.
//!
//! Eight ships cruise in a wedge toward an enemy battery.  At launch the
//! battery fires a salvo of area-effect shells at where the squad will be,
//! plus a chain round and a guided missile; a wreck with a breached reactor
//! leaks radiation beside the flight path and a few asteroids sit ahead.
//! Two friendly missiles fly the other way and notch around whatever they
//! sense.
//!
//! The driver integrates motion itself between ticks (formation following
//! plus the avoidance adjustment), keeps the risk grid centered on the squad
//! leader, and writes CSV telemetry and a JSON summary to `output/skirmish/`.
//!
//! Set `RUST_LOG=hz_sim=debug` (or `info` for formation breaks only) to see
//! the pipeline log.

use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hz_agent::{AgentStore, AgentStoreBuilder};
use hz_avoid::{CollisionFilter, PhysicsQuery, SphereObstacle, SphereWorld};
use hz_core::{AgentId, EntityId, ProfileId, SimConfig, SimRng, Tick, Vec3, load_profiles_reader};
use hz_grid::GridLayout;
use hz_hazard::{DamageSource, ModuleKind, Payload, ThreatKind, ThreatSource};
use hz_output::{CsvWriter, TelemetryObserver};
use hz_sim::{Sim, SimBuilder, SimObserver, SimSnapshot, TickReport};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:                  u64 = 7;
const TICK_RATE_HZ:          u32 = 20;
const SIM_SECS:              u64 = 12;
const OUTPUT_INTERVAL_TICKS: u64 = 5;
const GRID_RECENTER_TICKS:   u64 = 20;

const SQUAD_SIZE:    usize = 8;
const MISSILE_COUNT: usize = 2;
const SQUAD_TEAM:    u32   = 0b01;
const ENEMY_TEAM:    u32   = 0b10;

const CRUISE_SPEED:  f32 = 40.0;
const MISSILE_SPEED: f32 = 150.0;
/// Extra speed available for sidestepping, scaled by urgency.
const DODGE_SPEED:   f32 = 25.0;
/// Proportional gain pulling a wingman toward its slot.
const FOLLOW_GAIN:   f32 = 1.5;

const SQUAD_START_Z: f32 = -150.0;
const BATTERY_Z:     f32 = 250.0;
const SALVO_SIZE:    usize = 6;
/// Seconds after launch at which the salvo is timed to land.
const SALVO_FLIGHT:  f32 = 4.0;

// ── Profiles ──────────────────────────────────────────────────────────────────

const PROFILES_CSV: &str = "\
profile_id,name,lookahead_secs,break_formation_threshold,reaction_delay_secs,loose_spacing_min,loose_spacing_max,elasticity_rate,group_break_cooldown_secs\n\
0,fighter,5.0,0.8,0.15,12,30,2.5,2.0\n\
1,bomber,7.0,1.2,0.35,18,40,1.2,3.0\n\
2,missile,2.0,0.5,0.0,0,0,0,0\n\
";

const FIGHTER: ProfileId = ProfileId(0);
const BOMBER:  ProfileId = ProfileId(1);
const MISSILE: ProfileId = ProfileId(2);

// ── Scenario ──────────────────────────────────────────────────────────────────

/// Wedge slots behind the leader, in leader-relative (x, z).
const WEDGE: [[f32; 2]; SQUAD_SIZE] = [
    [0.0, 0.0],
    [-1.0, -1.0],
    [1.0, -1.0],
    [-2.0, -2.0],
    [2.0, -2.0],
    [-3.0, -3.0],
    [3.0, -3.0],
    [0.0, -2.0],
];

fn build_agents() -> AgentStore {
    let count = SQUAD_SIZE + MISSILE_COUNT;
    let mut agents = AgentStoreBuilder::new(count)
        .profile(FIGHTER)
        .forward(Vec3::Z)
        .build();

    let start = Vec3::new(0.0, 0.0, SQUAD_START_Z);
    for (i, slot) in WEDGE.iter().enumerate() {
        let offset = Vec3::new(slot[0], 0.0, slot[1]);
        agents.entity[i] = EntityId(100 + i as u32);
        agents.position[i] = start + offset * 12.0;
        agents.velocity[i] = Vec3::Z * CRUISE_SPEED;
        agents.formation_offset[i] = offset;
        if i > 0 {
            agents.formation_leader[i] = AgentId(0);
            agents.squad_leader[i] = AgentId(0);
        }
    }
    // The tail of the wedge is bombers.
    for i in 5..SQUAD_SIZE {
        agents.profile[i] = BOMBER;
    }

    // Friendly missiles launched from the leader toward the battery.
    for m in 0..MISSILE_COUNT {
        let i = SQUAD_SIZE + m;
        let side = if m == 0 { -1.0 } else { 1.0 };
        agents.entity[i] = EntityId(200 + m as u32);
        agents.profile[i] = MISSILE;
        agents.homing[i] = true;
        agents.position[i] = start + Vec3::new(side * 6.0, 0.0, 10.0);
        agents.velocity[i] = Vec3::Z * MISSILE_SPEED;
    }
    agents
}

fn build_salvo(rng: &mut SimRng) -> Vec<ThreatSource> {
    let impact_z = SQUAD_START_Z + CRUISE_SPEED * SALVO_FLIGHT;
    let mut threats = Vec::with_capacity(SALVO_SIZE + 2);

    for s in 0..SALVO_SIZE {
        let muzzle = Vec3::new(-50.0 + 20.0 * s as f32, 0.0, BATTERY_Z);
        let aim = rng.point_in_box(
            Vec3::new(-30.0, 0.0, impact_z - 20.0),
            Vec3::new(30.0, 0.0, impact_z + 10.0),
        );
        let lifetime = SALVO_FLIGHT + rng.gen_range(-0.2..0.2);
        threats.push(ThreatSource {
            id:            EntityId(900 + s as u32),
            kind:          ThreatKind::AreaEffect,
            position:      muzzle,
            velocity:      (aim - muzzle) / lifetime,
            age_secs:      0.0,
            lifetime_secs: lifetime,
            payload:       Payload { blast_radius: 14.0, spray_variance: 1.5, ..Default::default() },
            homing:        false,
            team_mask:     ENEMY_TEAM,
            seed:          rng.random(),
        });
    }

    // Chain round at the bombers and a guided missile at the leader.
    let bombers = Vec3::new(0.0, 0.0, impact_z - 30.0);
    let muzzle = Vec3::new(0.0, 0.0, BATTERY_Z);
    threats.push(ThreatSource {
        id:            EntityId(950),
        kind:          ThreatKind::Chain,
        position:      muzzle,
        velocity:      (bombers - muzzle) / 5.0,
        age_secs:      0.0,
        lifetime_secs: 5.0,
        payload:       Payload {
            blast_radius:          8.0,
            chain_radius:          20.0,
            contagion_probability: 0.3,
            ..Default::default()
        },
        homing:        false,
        team_mask:     ENEMY_TEAM,
        seed:          rng.random(),
    });
    threats.push(ThreatSource {
        id:            EntityId(960),
        kind:          ThreatKind::Homing,
        position:      muzzle + Vec3::new(40.0, 0.0, 0.0),
        velocity:      Vec3::new(-8.0, 0.0, -90.0),
        age_secs:      0.0,
        lifetime_secs: 6.0,
        payload:       Payload { homing_cone_cos: 0.9, ..Default::default() },
        homing:        true,
        team_mask:     ENEMY_TEAM,
        seed:          rng.random(),
    });
    threats
}

fn build_world() -> SphereWorld {
    let rock = |id: u32, x: f32, z: f32, r: f32| SphereObstacle {
        entity:   EntityId(id),
        center:   Vec3::new(x, 0.0, z),
        radius:   r,
        contents: CollisionFilter::SOLID,
    };
    SphereWorld::new(vec![
        rock(300, -25.0, 40.0, 6.0),
        rock(301, 18.0, 110.0, 9.0),
        rock(302, 0.0, 190.0, 5.0),
    ])
}

fn wreck() -> DamageSource {
    DamageSource {
        entity:    EntityId(400),
        module:    ModuleKind::classify("reactor_core_mk2"),
        position:  Vec3::new(45.0, 0.0, 30.0),
        destroyed: true,
        damaged:   true,
        team_mask: 0,
    }
}

fn grid_around(center: Vec3) -> GridLayout {
    GridLayout::planar([96, 96], 4.0, [center.x, center.z])
}

// ── Motion ────────────────────────────────────────────────────────────────────

/// Move every agent one tick: cruise, follow the formation slot, and apply
/// the avoidance adjustment.
fn integrate<P: PhysicsQuery>(sim: &mut Sim<P>) {
    let dt = sim.clock.dt();
    let agents = &mut sim.agents;
    for i in 0..agents.count {
        let cruise = if agents.homing[i] { MISSILE_SPEED } else { CRUISE_SPEED };
        let mut velocity = Vec3::Z * cruise;

        let leader = agents.formation_leader[i];
        if leader.is_valid() {
            let slot = agents.position[leader.index()] + agents.formation_offset[i];
            velocity += (slot - agents.position[i]) * FOLLOW_GAIN;
        }

        let avoid = &sim.avoidance[i];
        velocity += avoid.adjustment * (avoid.urgency * DODGE_SPEED);

        agents.position[i] += velocity * dt;
        agents.velocity[i] = velocity;
        if velocity.length_squared() > 0.0 {
            agents.forward[i] = velocity.normalize();
        }
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tally {
    summary_rows:    usize,
    avoidance_rows:  usize,
    breaks:          usize,
    peak_avoiding:   usize,
    peak_risk:       f32,
    probe_hits:      u64,
    dodge_distance:  f32,
}

/// Forwards to the telemetry writer and keeps run-wide totals.
struct SkirmishObserver {
    inner: TelemetryObserver<CsvWriter>,
    tally: Tally,
}

impl SimObserver for SkirmishObserver {
    fn on_tick_end(&mut self, tick: Tick, report: &TickReport) {
        let t = &mut self.tally;
        t.summary_rows += usize::from(!report.paused);
        t.breaks += report.breaks;
        t.peak_avoiding = t.peak_avoiding.max(report.agents_avoiding);
        t.peak_risk = t.peak_risk.max(report.max_risk);
        t.probe_hits += u64::from(report.probe_hits);
        t.dodge_distance += report.dodge_distance;
        self.inner.on_tick_end(tick, report);
    }

    fn on_snapshot(&mut self, tick: Tick, snapshot: &SimSnapshot<'_>) {
        self.tally.avoidance_rows += snapshot.agents.count;
        self.inner.on_snapshot(tick, snapshot);
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        self.inner.on_sim_end(final_tick);
    }
}

// ── JSON summary ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct AgentSummary {
    agent:        u32,
    profile:      String,
    mode:         &'static str,
    spacing:      f32,
    in_formation: bool,
    position:     [f32; 3],
}

#[derive(Serialize)]
struct RunSummary {
    seed:                 u64,
    ticks:                u64,
    sim_secs:             f64,
    wall_secs:            f64,
    threats_fired:        usize,
    formation_breaks:     usize,
    peak_agents_avoiding: usize,
    peak_risk:            f32,
    probe_hits:           u64,
    dodge_distance:       f32,
    agents:               Vec<AgentSummary>,
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    println!("=== skirmish — hazard_field avoidance demo ===");
    println!("Squad: {SQUAD_SIZE} ships + {MISSILE_COUNT} missiles  |  {SIM_SECS} s @ {TICK_RATE_HZ} Hz  |  Seed: {SEED}");
    println!();

    // 1. Profiles.
    let profiles = load_profiles_reader(Cursor::new(PROFILES_CSV))?;
    for (id, p) in profiles.iter() {
        println!(
            "  profile {:<2} {:<8} lookahead {:>4.1} s  threshold {:>4.2}  delay {:>4.2} s",
            id.0, p.name, p.lookahead_secs, p.break_formation_threshold, p.reaction_delay_secs
        );
    }

    // 2. Scenario, seeded from the run config.
    let config = SimConfig {
        tick_rate_hz:          TICK_RATE_HZ,
        total_ticks:           SIM_SECS * TICK_RATE_HZ as u64,
        seed:                  SEED,
        num_threads:           None,
        output_interval_ticks: OUTPUT_INTERVAL_TICKS,
    };
    let mut rng = SimRng::new(config.seed);
    let agents = build_agents();
    let threats = build_salvo(&mut rng);
    let threats_fired = threats.len();
    println!("Salvo: {threats_fired} rounds inbound");

    // 3. Sim.  The squad ignores its own team's ordnance.
    let leader_start = agents.position[0];
    let mut sim = SimBuilder::new(config.clone(), agents, profiles, build_world())
        .grid_layout(grid_around(leader_start))
        .team_filter(SQUAD_TEAM)
        .threats(threats)
        .damage(vec![wreck()])
        .build()?;
    println!("Forecast horizon: {:.1} s", sim.forecast_horizon_secs());
    println!();

    // 4. Output.
    let out_dir = Path::new("output/skirmish");
    std::fs::create_dir_all(out_dir)?;
    let mut obs = SkirmishObserver {
        inner: TelemetryObserver::new(CsvWriter::new(out_dir)?, &config),
        tally: Tally::default(),
    };

    // 5. Run, integrating motion between ticks.
    let t0 = Instant::now();
    while sim.clock.current_tick < config.end_tick() {
        let tick = sim.clock.current_tick;
        if tick.0 > 0 && tick.0 % GRID_RECENTER_TICKS == 0 {
            sim.set_grid_layout(grid_around(sim.agents.position[0]))?;
        }
        sim.run_ticks(1, &mut obs)?;
        integrate(&mut sim);
    }
    obs.on_sim_end(sim.clock.current_tick);
    let elapsed = t0.elapsed();

    if let Some(e) = obs.inner.take_error() {
        eprintln!("output error: {e}");
    }
    info!(ticks = sim.clock.current_tick.0, "skirmish complete");

    // 6. Console summary.
    let tally = &obs.tally;
    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  agent_avoidance.csv : {} rows", tally.avoidance_rows);
    println!("  tick_summaries.csv  : {} rows", tally.summary_rows);
    println!(
        "  breaks {}  |  peak avoiding {}  |  peak risk {:.3}  |  probe hits {}",
        tally.breaks, tally.peak_avoiding, tally.peak_risk, tally.probe_hits
    );
    println!();

    println!("{:<6} {:<8} {:<6} {:>8} {:<9}", "Agent", "Profile", "Mode", "Spacing", "Formation");
    println!("{}", "-".repeat(42));
    let mut agent_rows = Vec::with_capacity(sim.agents.count);
    for i in 0..sim.agents.count {
        let agent = AgentId(i as u32);
        let profile = sim
            .profiles
            .get(sim.agents.profile[i])
            .map_or_else(|| "?".to_owned(), |p| p.name.clone());
        let decision = &sim.formation[i];
        let in_formation = sim.agents.in_formation(agent);
        println!(
            "{:<6} {:<8} {:<6} {:>8.2} {:<9}",
            i,
            profile,
            decision.mode,
            decision.spacing,
            if in_formation { "yes" } else { "-" },
        );
        agent_rows.push(AgentSummary {
            agent: agent.0,
            profile,
            mode: decision.mode.as_str(),
            spacing: decision.spacing,
            in_formation,
            position: sim.agents.position[i].to_array(),
        });
    }

    // 7. JSON summary.
    let summary = RunSummary {
        seed:                 SEED,
        ticks:                sim.clock.current_tick.0,
        sim_secs:             sim.clock.elapsed_secs(),
        wall_secs:            elapsed.as_secs_f64(),
        threats_fired,
        formation_breaks:     tally.breaks,
        peak_agents_avoiding: tally.peak_avoiding,
        peak_risk:            tally.peak_risk,
        probe_hits:           tally.probe_hits,
        dodge_distance:       tally.dodge_distance,
        agents:               agent_rows,
    };
    let json = BufWriter::new(File::create(out_dir.join("summary.json"))?);
    serde_json::to_writer_pretty(json, &summary)?;
    println!();
    println!("Wrote {}", out_dir.join("summary.json").display());

    Ok(())
}
