//! The physics raycast seam and a small reference world.
//!
//! The engine's physics is a black box behind [`PhysicsQuery`].  Headless
//! runs and tests use [`SphereWorld`]: static sphere obstacles indexed by an
//! R-tree, or [`NoPhysics`] when nothing should ever be hit.

use hz_core::math::safe_normalize;
use hz_core::{EntityId, Vec3};
use rstar::{PointDistance, RTree, RTreeObject, AABB};

// ── CollisionFilter ───────────────────────────────────────────────────────────

/// Content bits an obstacle carries and a ray collides with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionFilter(pub u32);

impl CollisionFilter {
    pub const NONE: Self = Self(0);
    /// Hulls, stations, asteroids.
    pub const SOLID: Self = Self(1 << 0);
    /// Wrecks and drifting debris.
    pub const DEBRIS: Self = Self(1 << 1);
    /// Other agents.
    pub const SHIP: Self = Self(1 << 2);
    pub const PROJECTILE: Self = Self(1 << 3);

    /// What the avoidance probe looks for by default.
    pub const MASK_OBSTACLES: Self = Self(Self::SOLID.0 | Self::DEBRIS.0 | Self::SHIP.0);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl std::ops::BitOr for CollisionFilter {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ── Query seam ────────────────────────────────────────────────────────────────

/// Nearest hit along a ray.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    pub point:    Vec3,
    /// Unit surface normal pointing back toward the ray.
    pub normal:   Vec3,
    /// Hit distance over cast length, in `[0, 1]`.
    pub fraction: f32,
    pub entity:   EntityId,
}

/// Synchronous, side-effect-free raycast.
pub trait PhysicsQuery: Send + Sync {
    /// Nearest hit on the segment `origin .. origin + dir * max_len` against
    /// anything intersecting `filter`.  `dir` need not be normalized.
    fn cast_ray(&self, origin: Vec3, dir: Vec3, max_len: f32, filter: CollisionFilter) -> Option<RayHit>;
}

/// A world with nothing in it.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoPhysics;

impl PhysicsQuery for NoPhysics {
    fn cast_ray(&self, _: Vec3, _: Vec3, _: f32, _: CollisionFilter) -> Option<RayHit> {
        None
    }
}

// ── SphereWorld ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SphereObstacle {
    pub entity:   EntityId,
    pub center:   Vec3,
    pub radius:   f32,
    pub contents: CollisionFilter,
}

impl RTreeObject for SphereObstacle {
    type Envelope = AABB<[f32; 3]>;
    fn envelope(&self) -> Self::Envelope {
        let r = Vec3::splat(self.radius);
        AABB::from_corners((self.center - r).to_array(), (self.center + r).to_array())
    }
}

impl PointDistance for SphereObstacle {
    /// Squared distance from `point` to the sphere's surface; 0 inside.
    fn distance_2(&self, point: &[f32; 3]) -> f32 {
        let d = (Vec3::from_array(*point).distance(self.center) - self.radius).max(0.0);
        d * d
    }
}

impl SphereObstacle {
    /// Entry distance along a unit ray, or `None` on a miss.  A ray starting
    /// inside the sphere hits at 0.
    fn ray_entry(&self, origin: Vec3, dir: Vec3) -> Option<f32> {
        let m = origin - self.center;
        let b = m.dot(dir);
        let c = m.length_squared() - self.radius * self.radius;
        if c > 0.0 && b > 0.0 {
            return None;
        }
        let disc = b * b - c;
        if disc < 0.0 {
            return None;
        }
        Some((-b - disc.sqrt()).max(0.0))
    }
}

/// Static sphere obstacles with an R-tree broadphase.
#[derive(Clone, Debug)]
pub struct SphereWorld {
    tree: RTree<SphereObstacle>,
}

impl SphereWorld {
    pub fn new(obstacles: Vec<SphereObstacle>) -> Self {
        Self { tree: RTree::bulk_load(obstacles) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &SphereObstacle> {
        self.tree.iter()
    }
}

impl Default for SphereWorld {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PhysicsQuery for SphereWorld {
    fn cast_ray(&self, origin: Vec3, dir: Vec3, max_len: f32, filter: CollisionFilter) -> Option<RayHit> {
        let dir = safe_normalize(dir);
        if dir == Vec3::ZERO || max_len <= 0.0 {
            return None;
        }

        // Obstacles come back ordered by surface distance from the origin,
        // which bounds any entry distance from below.
        let mut best: Option<(f32, &SphereObstacle)> = None;
        for obstacle in self.tree.nearest_neighbor_iter(&origin.to_array()) {
            let surface = obstacle.distance_2(&origin.to_array()).sqrt();
            let bound = best.map_or(max_len, |(t, _)| t);
            if surface > bound {
                break;
            }
            if !filter.intersects(obstacle.contents) {
                continue;
            }
            let Some(t) = obstacle.ray_entry(origin, dir) else {
                continue;
            };
            if best.map_or(t <= max_len, |(b, _)| t < b) {
                best = Some((t, obstacle));
            }
        }

        best.map(|(t, obstacle)| {
            let point = origin + dir * t;
            let normal = safe_normalize(point - obstacle.center);
            RayHit {
                point,
                normal: if normal == Vec3::ZERO { -dir } else { normal },
                fraction: t / max_len,
                entity: obstacle.entity,
            }
        })
    }
}
