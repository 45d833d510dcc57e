//! Small vector and scalar helpers shared by the avoidance stages.
//!
//! The world is Y-up: `WORLD_UP` is `+Y`, `WORLD_RIGHT` is `+X`.  A planar
//! (2D) hazard grid therefore collapses the Y axis.

use glam::Vec3;

/// Magnitudes at or below this are treated as zero.
pub const EPSILON: f32 = 1.0e-6;

pub const WORLD_UP: Vec3 = Vec3::Y;
pub const WORLD_RIGHT: Vec3 = Vec3::X;

/// Clamp to `[0, 1]`.  NaN maps to 0 so a bad sample can never raise urgency.
#[inline]
pub fn saturate(x: f32) -> f32 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

/// Unit vector in the direction of `v`, or zero if `v` is (near) zero.
#[inline]
pub fn safe_normalize(v: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq <= EPSILON * EPSILON || !len_sq.is_finite() {
        Vec3::ZERO
    } else {
        v / len_sq.sqrt()
    }
}

/// Keep the direction of `v`, replace its magnitude.  Zero stays zero.
#[inline]
pub fn with_magnitude(v: Vec3, magnitude: f32) -> Vec3 {
    safe_normalize(v) * magnitude
}

/// Unit vector perpendicular to `velocity` in the horizontal plane
/// (`velocity × up`).  Falls back to world-right when `velocity` is vertical
/// or zero.
pub fn lateral_axis(velocity: Vec3) -> Vec3 {
    let lateral = safe_normalize(velocity.cross(WORLD_UP));
    if lateral == Vec3::ZERO { WORLD_RIGHT } else { lateral }
}

/// Frame-rate independent exponential approach of `current` toward `target`
/// at `rate` per second.
#[inline]
pub fn exp_approach(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    if rate <= 0.0 || dt <= 0.0 {
        return current;
    }
    let alpha = 1.0 - (-rate * dt).exp();
    current + (target - current) * alpha
}
