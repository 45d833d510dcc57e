//! Hazard slices and the per-world slice collection.

use hz_core::{EntityId, Tick, Vec3};

// ── Kind flags ────────────────────────────────────────────────────────────────

/// Risk multiplier for area-effect slices.
pub const AREA_EFFECT_WEIGHT: f32 = 1.5;
/// Risk multiplier for chain slices.
pub const CHAIN_WEIGHT: f32 = 1.2;
/// Risk multiplier for homing slices.
pub const HOMING_WEIGHT: f32 = 1.3;

/// Kind tags on a slice.  Several may be set at once; their risk weights
/// stack multiplicatively.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceKind(pub u8);

impl SliceKind {
    pub const NONE: Self = Self(0);
    pub const AREA_EFFECT: Self = Self(1 << 0);
    pub const CHAIN: Self = Self(1 << 1);
    pub const HOMING: Self = Self(1 << 2);
    pub const CONTAGION: Self = Self(1 << 3);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Multiplicative stack of the per-kind bonuses.  An untagged slice
    /// weighs 1.
    pub fn weight(self) -> f32 {
        let mut w = 1.0;
        if self.contains(Self::AREA_EFFECT) {
            w *= AREA_EFFECT_WEIGHT;
        }
        if self.contains(Self::CHAIN) {
            w *= CHAIN_WEIGHT;
        }
        if self.contains(Self::HOMING) {
            w *= HOMING_WEIGHT;
        }
        w
    }
}

impl std::ops::BitOr for SliceKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SliceKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

// ── HazardSlice ───────────────────────────────────────────────────────────────

/// A time-windowed predicted danger envelope derived from one source.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HazardSlice {
    /// Emitting threat or damaged ship.  Diagnostic only.
    pub source: EntityId,

    /// Center at `start`.
    pub center: Vec3,
    pub velocity: Vec3,

    /// Radius at `start`.
    pub radius: f32,
    /// Radius growth per second.
    pub radius_growth: f32,

    /// First tick the slice is valid.
    pub start: Tick,
    /// First tick the slice is no longer valid.
    pub end: Tick,

    pub kind: SliceKind,

    pub chain_radius: f32,
    pub contagion_probability: f32,
    pub homing_cone_cos: f32,
    pub spray_variance: f32,
    pub team_mask: u32,
    pub seed: u64,
}

/// A slice evaluated at one instant: where it is, how big, how heavy.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliceSample {
    pub source:    EntityId,
    pub center:    Vec3,
    pub radius:    f32,
    pub weight:    f32,
    pub team_mask: u32,
}

impl SliceSample {
    /// Risk this sample contributes at `point`: `weight / (1 + d)` inside the
    /// sphere, 0 outside.
    #[inline]
    pub fn risk_at(&self, point: Vec3) -> f32 {
        let d = point.distance(self.center);
        if d <= self.radius { self.weight / (1.0 + d) } else { 0.0 }
    }
}

impl HazardSlice {
    /// `start <= tick < end`.
    #[inline]
    pub fn is_valid_at(&self, tick: Tick) -> bool {
        self.start <= tick && tick < self.end
    }

    /// Instantaneous center and radius at `tick`, or `None` outside the
    /// validity window.  `dt` is the tick length in seconds.
    pub fn sample_at(&self, tick: Tick, dt: f32) -> Option<SliceSample> {
        if !self.is_valid_at(tick) {
            return None;
        }
        let elapsed = tick.since(self.start) as f32 * dt;
        let radius = (self.radius + self.radius_growth * elapsed).max(0.0);
        Some(SliceSample {
            source:    self.source,
            center:    self.center + self.velocity * elapsed,
            radius,
            weight:    self.kind.weight(),
            team_mask: self.team_mask,
        })
    }
}

// ── SliceCollection ───────────────────────────────────────────────────────────

/// All slices for the current tick.  Owned by the pipeline and rebuilt in
/// place so the backing allocation is reused across ticks.
#[derive(Clone, Debug, Default)]
pub struct SliceCollection {
    slices:   Vec<HazardSlice>,
    built_at: Option<Tick>,
}

impl SliceCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every slice and stamp the collection with the tick being built.
    pub fn begin_rebuild(&mut self, tick: Tick) {
        self.slices.clear();
        self.built_at = Some(tick);
    }

    pub fn push(&mut self, slice: HazardSlice) {
        self.slices.push(slice);
    }

    /// Tick of the last rebuild, `None` if never built.
    pub fn built_at(&self) -> Option<Tick> {
        self.built_at
    }

    pub fn as_slice(&self) -> &[HazardSlice] {
        &self.slices
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HazardSlice> {
        self.slices.iter()
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Samples for every slice valid at `tick`, in collection order.
    pub fn active_at(&self, tick: Tick, dt: f32) -> Vec<SliceSample> {
        self.slices
            .iter()
            .filter_map(|s| s.sample_at(tick, dt))
            .collect()
    }
}

impl<'a> IntoIterator for &'a SliceCollection {
    type Item = &'a HazardSlice;
    type IntoIter = std::slice::Iter<'a, HazardSlice>;
    fn into_iter(self) -> Self::IntoIter {
        self.slices.iter()
    }
}
