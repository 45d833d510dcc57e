//! `GridLayout` and the `HazardGrid` backing store.

use hz_core::Vec3;
use tracing::{info, warn};

// ── GridLayout ────────────────────────────────────────────────────────────────

/// Shape and placement of a risk grid.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLayout {
    /// Cell counts along x, y, z.  Every entry must be ≥ 1.
    pub dims:      [u32; 3],
    /// Edge length of a cubic cell in world units.
    pub cell_size: f32,
    /// World position of the minimum corner of cell `(0, 0, 0)`.
    pub origin:    Vec3,
}

impl GridLayout {
    /// A layout of `dims` cells of `cell_size` centered on `center`.
    pub fn centered(dims: [u32; 3], cell_size: f32, center: Vec3) -> Self {
        let extent = Vec3::new(dims[0] as f32, dims[1] as f32, dims[2] as f32) * cell_size;
        Self { dims, cell_size, origin: center - extent * 0.5 }
    }

    /// A single-layer (planar) layout in the XZ plane.  The layer's center
    /// sits at `y = 0`.
    pub fn planar(dims_xz: [u32; 2], cell_size: f32, center_xz: [f32; 2]) -> Self {
        Self::centered(
            [dims_xz[0], 1, dims_xz[1]],
            cell_size,
            Vec3::new(center_xz[0], 0.0, center_xz[1]),
        )
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.dims[0] as usize * self.dims[1] as usize * self.dims[2] as usize
    }

    /// Cells in one z-slab.
    #[inline]
    pub fn slab_len(&self) -> usize {
        self.dims[0] as usize * self.dims[1] as usize
    }

    /// `true` when every dimension is non-zero and the cell size is a
    /// positive finite number.
    pub fn is_valid(&self) -> bool {
        self.dims.iter().all(|&d| d > 0)
            && self.cell_size.is_finite()
            && self.cell_size > 0.0
            && self.origin.is_finite()
    }

    /// One layer along y.
    #[inline]
    pub fn is_planar(&self) -> bool {
        self.dims[1] == 1
    }

    /// Unclamped cell coordinate of `pos` along `axis`.
    #[inline]
    pub(crate) fn raw_cell(&self, pos: Vec3, axis: usize) -> i64 {
        ((pos[axis] - self.origin[axis]) / self.cell_size).floor() as i64
    }

    /// Cell containing `pos`, clamped into bounds.
    pub fn cell_of(&self, pos: Vec3) -> [u32; 3] {
        std::array::from_fn(|axis| self.clamp_axis(self.raw_cell(pos, axis), axis))
    }

    #[inline]
    pub fn clamp_axis(&self, c: i64, axis: usize) -> u32 {
        c.clamp(0, (self.dims[axis] as i64 - 1).max(0)) as u32
    }

    /// World position of a cell's center.
    #[inline]
    pub fn cell_center(&self, cell: [u32; 3]) -> Vec3 {
        self.origin
            + (Vec3::new(cell[0] as f32, cell[1] as f32, cell[2] as f32) + Vec3::splat(0.5))
                * self.cell_size
    }

    #[inline]
    pub fn index(&self, cell: [u32; 3]) -> usize {
        let [dx, dy, _] = self.dims;
        cell[0] as usize + dx as usize * (cell[1] as usize + dy as usize * cell[2] as usize)
    }
}

impl Default for GridLayout {
    /// 64 × 1 × 64 planar grid of 4-unit cells around the origin.
    fn default() -> Self {
        Self::planar([64, 64], 4.0, [0.0, 0.0])
    }
}

// ── HazardGrid ────────────────────────────────────────────────────────────────

/// Dense risk field.  Every value is ≥ 0.
#[derive(Clone, Debug)]
pub struct HazardGrid {
    layout: GridLayout,
    risk:   Vec<f32>,
}

impl HazardGrid {
    pub fn new(layout: GridLayout) -> Self {
        Self { layout, risk: vec![0.0; layout.cell_count()] }
    }

    #[inline]
    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    #[inline]
    pub fn is_planar(&self) -> bool {
        self.layout.is_planar()
    }

    /// Adopt `layout`.  The backing array is reallocated (zeroed) only when
    /// the dimensions change; a moved origin or new cell size reuses it.
    /// Returns `true` if it was reallocated.  An invalid layout is ignored.
    pub fn relayout(&mut self, layout: GridLayout) -> bool {
        if !layout.is_valid() {
            warn!(dims = ?layout.dims, cell_size = layout.cell_size, "ignoring invalid grid layout");
            return false;
        }
        let resized = layout.dims != self.layout.dims;
        if resized {
            info!(from = ?self.layout.dims, to = ?layout.dims, "hazard grid reallocated");
            self.risk = vec![0.0; layout.cell_count()];
        }
        self.layout = layout;
        resized
    }

    /// Zero every cell.
    pub fn clear(&mut self) {
        self.risk.fill(0.0);
    }

    /// Risk at an in-bounds cell.
    #[inline]
    pub fn risk_at_cell(&self, cell: [u32; 3]) -> f32 {
        self.risk[self.layout.index(cell)]
    }

    /// Risk at a possibly out-of-bounds cell coordinate; each axis is clamped
    /// to the grid edge first.
    #[inline]
    pub fn risk_at_clamped(&self, cell: [i64; 3]) -> f32 {
        let l = &self.layout;
        self.risk_at_cell([l.clamp_axis(cell[0], 0), l.clamp_axis(cell[1], 1), l.clamp_axis(cell[2], 2)])
    }

    /// Risk of the cell containing `pos` (nearest cell if outside).
    #[inline]
    pub fn sample(&self, pos: Vec3) -> f32 {
        self.risk_at_cell(self.layout.cell_of(pos))
    }

    /// Highest risk anywhere in the grid (0 for an empty grid).
    pub fn max_risk(&self) -> f32 {
        self.risk.iter().copied().fold(0.0, f32::max)
    }

    /// Number of cells with risk > 0.
    pub fn hot_cells(&self) -> usize {
        self.risk.iter().filter(|&&r| r > 0.0).count()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.risk
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.risk
    }
}
