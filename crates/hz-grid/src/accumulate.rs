//! `GridAccumulator` — clears the grid and rasterizes every active slice.

use std::ops::RangeInclusive;

use hz_core::Tick;
use hz_hazard::{SliceCollection, SliceSample};
use tracing::debug;

use crate::grid::{GridLayout, HazardGrid};

/// Counts from one accumulation pass.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AccumulateStats {
    /// Slices valid at the sampled tick and not filtered out.
    pub active_slices:   usize,
    /// Slices dropped by the team filter.
    pub filtered_slices: usize,
    /// Active slices whose envelope misses the grid entirely.
    pub outside_grid:    usize,
}

/// A slice sample with its clamped cell bounding box.
struct Stamp {
    sample: SliceSample,
    x:      RangeInclusive<u32>,
    y:      RangeInclusive<u32>,
    z:      RangeInclusive<u32>,
}

/// Rasterizes a `SliceCollection` into a `HazardGrid`.
#[derive(Copy, Clone, Debug, Default)]
pub struct GridAccumulator {
    /// When set, slices whose team mask intersects this mask are skipped.
    pub team_filter: Option<u32>,
}

impl GridAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team_filter(mask: u32) -> Self {
        Self { team_filter: Some(mask) }
    }

    /// Clear `grid` and add the risk of every slice valid at `at`.
    ///
    /// `at` need not be the current tick: accumulating a future tick yields
    /// that cross-section of the forecast.  `dt` is the tick length in
    /// seconds.
    pub fn accumulate(
        &self,
        grid:   &mut HazardGrid,
        slices: &SliceCollection,
        at:     Tick,
        dt:     f32,
    ) -> AccumulateStats {
        grid.clear();

        let mut stats = AccumulateStats::default();
        let layout = *grid.layout();
        let mut stamps = Vec::new();

        for slice in slices {
            let Some(sample) = slice.sample_at(at, dt) else {
                continue;
            };
            if self.team_filter.is_some_and(|mask| sample.team_mask & mask != 0) {
                stats.filtered_slices += 1;
                continue;
            }
            stats.active_slices += 1;
            match stamp_bounds(&layout, sample) {
                Some(stamp) => stamps.push(stamp),
                None => stats.outside_grid += 1,
            }
        }

        if !stamps.is_empty() {
            stamp_all(&layout, grid.as_mut_slice(), &stamps);
        }

        debug!(
            tick = at.0,
            active = stats.active_slices,
            filtered = stats.filtered_slices,
            outside = stats.outside_grid,
            "grid accumulated"
        );
        stats
    }
}

// ── Rasterization ─────────────────────────────────────────────────────────────

/// Cell bounding box of `center ± radius`, clamped to the grid.  `None` if
/// the box misses the grid on any axis.
fn stamp_bounds(layout: &GridLayout, sample: SliceSample) -> Option<Stamp> {
    let mut ranges = [0u32..=0, 0..=0, 0..=0];
    for (axis, range) in ranges.iter_mut().enumerate() {
        let lo = layout.raw_cell(sample.center - sample.radius, axis);
        let hi = layout.raw_cell(sample.center + sample.radius, axis);
        let last = layout.dims[axis] as i64 - 1;
        if hi < 0 || lo > last {
            return None;
        }
        *range = layout.clamp_axis(lo, axis)..=layout.clamp_axis(hi, axis);
    }
    let [x, y, z] = ranges;
    Some(Stamp { sample, x, y, z })
}

/// Stamp every sample into one z-slab.
fn stamp_slab(layout: &GridLayout, z: u32, slab: &mut [f32], stamps: &[Stamp]) {
    let dx = layout.dims[0] as usize;
    for stamp in stamps.iter().filter(|s| s.z.contains(&z)) {
        let s = &stamp.sample;
        for y in stamp.y.clone() {
            let row = y as usize * dx;
            for x in stamp.x.clone() {
                let d = layout.cell_center([x, y, z]).distance(s.center);
                if d <= s.radius {
                    slab[row + x as usize] += s.weight / (1.0 + d);
                }
            }
        }
    }
}

/// Each cell receives its contributions in slice order in both builds, so the
/// parallel result is bit-identical to the sequential one.
fn stamp_all(layout: &GridLayout, risk: &mut [f32], stamps: &[Stamp]) {
    let slab_len = layout.slab_len();
    if slab_len == 0 {
        return;
    }

    #[cfg(not(feature = "parallel"))]
    {
        risk.chunks_mut(slab_len)
            .enumerate()
            .for_each(|(z, slab)| stamp_slab(layout, z as u32, slab, stamps));
    }

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        risk.par_chunks_mut(slab_len)
            .enumerate()
            .for_each(|(z, slab)| stamp_slab(layout, z as u32, slab, stamps));
    }
}
