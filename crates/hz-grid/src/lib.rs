//! `hz-grid` — the persistent risk grid and the per-tick slice rasterizer.
//!
//! # Layout
//!
//! The grid is a dense `dims.x × dims.y × dims.z` array of `f32` risk values,
//! x-fastest:
//!
//! ```text
//! index(x, y, z) = x + dims.x * (y + dims.y * z)
//! ```
//!
//! so one z-slab (`dims.x * dims.y` cells) is a contiguous sub-slice.  The
//! accumulator partitions work along those slabs; with the `parallel`
//! feature each slab is stamped by one Rayon task and no two tasks ever
//! write the same cell.  A grid with `dims.y == 1` is planar: the sensor
//! skips the vertical axis.
//!
//! Risk is never decayed: the grid is cleared and fully re-accumulated every
//! tick, so stale risk disappears as soon as its slice expires.

pub mod accumulate;
pub mod grid;


pub use accumulate::{AccumulateStats, GridAccumulator};
pub use grid::{GridLayout, HazardGrid};
