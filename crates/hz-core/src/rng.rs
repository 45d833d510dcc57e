//! Deterministic seeding and simulation-level RNG.
//!
//! # Determinism strategy
//!
//! Slices carry a seed derived from their source threat's stable seed and
//! the slice's role within that threat:
//!
//!   seed = threat_seed XOR (salt * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive salts uniformly across the seed space.  Rebuilding
//! the slice collection every tick therefore reproduces identical seeds for
//! the same threat, regardless of the order threats arrive in.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Mix a base seed with a salt (slice role, agent index, …).
#[inline]
pub fn mix_seed(base: u64, salt: u64) -> u64 {
    base ^ salt.wrapping_add(1).wrapping_mul(MIXING_CONSTANT)
}

// ── SimRng ────────────────────────────────────────────────────────────────────

/// Simulation-level RNG for scenario generation and randomized tests.
///
/// Single-threaded.  The tick pipeline itself draws no random numbers.
pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn random<T>(&mut self) -> T
    where
        rand::distributions::Standard: rand::distributions::Distribution<T>,
    {
        self.0.r#gen()
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// A point uniformly distributed in the axis-aligned box `[min, max]`.
    pub fn point_in_box(&mut self, min: glam::Vec3, max: glam::Vec3) -> glam::Vec3 {
        glam::Vec3::new(
            self.sample_span(min.x, max.x),
            self.sample_span(min.y, max.y),
            self.sample_span(min.z, max.z),
        )
    }

    fn sample_span(&mut self, lo: f32, hi: f32) -> f32 {
        if hi > lo { self.0.gen_range(lo..hi) } else { lo }
    }
}
