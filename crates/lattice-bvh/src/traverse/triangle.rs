//! Ray-cast crossings against a triangle mesh.
//!
//! Casting a ray from a point and counting crossings of a closed surface
//! gives an even-odd inside test; the full hit list also serves layer and
//! thickness queries.

use lattice_math::{narrow_point, Point3, Real, Vec3};

use super::{Descent, Traverser};
use crate::aabb::Aabb;
use crate::error::Result;
use crate::mesh::{SkipSet, TriMesh};
use crate::ray::{Ray, WatertightRay};

/// One ray-triangle crossing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Triangle index.
    pub prim: usize,
    /// Ray parameter of the crossing, in single precision.
    pub t: f32,
}

/// Every crossing found by a ray-cast query, in visit order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RayHits {
    /// Recorded crossings.
    pub hits: Vec<RayHit>,
}

impl RayHits {
    /// Number of crossings.
    pub fn count(&self) -> usize {
        self.hits.len()
    }

    /// Even-odd test: an odd crossing count means the origin is inside a
    /// closed surface.
    pub fn is_inside(&self) -> bool {
        self.hits.len() % 2 == 1
    }

    /// Crossings ordered by distance along the ray.
    pub fn sorted_by_t(&self) -> Vec<RayHit> {
        let mut hits = self.hits.clone();
        hits.sort_by(|a, b| a.t.total_cmp(&b.t));
        hits
    }
}

/// Collects every crossing of a ray cast from a point through a triangle
/// mesh.
///
/// Never halts early: every leaf whose box the ray enters is tested.
/// Box tests run in the query precision; the triangle test always runs in
/// `f32` through [`WatertightRay`].
#[derive(Debug, Clone)]
pub struct PointInTriangleMeshTraverse<'a, T: Real> {
    ray: Ray<T>,
    watertight: WatertightRay,
    mesh: TriMesh<'a, T>,
    skip_verts: SkipSet<'a, u32>,
    /// Query result.
    pub output: RayHits,
}

impl<'a, T: Real> PointInTriangleMeshTraverse<'a, T> {
    /// Cast from `point` along +Z against every triangle of `mesh`.
    pub fn new(point: Point3<T>, mesh: TriMesh<'a, T>) -> Self {
        Self::with_skips(point, mesh, &[])
    }

    /// Cast from `point` along +Z, ignoring triangles that use any of
    /// `skip_verts`.
    pub fn with_skips(point: Point3<T>, mesh: TriMesh<'a, T>, skip_verts: &'a [u32]) -> Self {
        let dir = Vec3::z();
        Self {
            ray: Ray::new(point, dir),
            watertight: WatertightRay::new(&point, &dir),
            mesh,
            skip_verts: SkipSet::new(skip_verts),
            output: RayHits::default(),
        }
    }

    /// Cast along `direction` instead of +Z. The direction is normalized.
    ///
    /// A random direction avoids systematic grazing hits on axis-aligned
    /// geometry. Fails with [`BvhError::InvalidDirection`] for a zero or
    /// non-finite direction.
    pub fn with_direction(mut self, direction: Vec3<T>) -> Result<Self> {
        self.ray = Ray::try_new(self.ray.origin, direction)?;
        self.watertight = WatertightRay::new(&self.ray.origin, &self.ray.direction);
        Ok(self)
    }

    /// The cast ray.
    pub fn ray(&self) -> &Ray<T> {
        &self.ray
    }

    fn hits_box(&self, aabb: &Aabb<T>) -> bool {
        self.ray
            .intersect_aabb(aabb, T::zero(), T::infinity())
            .is_some()
    }
}

impl<T: Real> Traverser<T> for PointInTriangleMeshTraverse<'_, T> {
    fn traverse(&self, left: &Aabb<T>, right: &Aabb<T>) -> Descent {
        let go_left = self.hits_box(left);
        Descent {
            go_left,
            go_right: self.hits_box(right),
            left_first: go_left,
        }
    }

    fn stop_traversing(&mut self, aabb: &Aabb<T>, prim: usize) -> bool {
        if !self.hits_box(aabb) {
            return false;
        }

        let tri = self.mesh.tri(prim);
        if self.skip_verts.contains_any(&tri) {
            return false;
        }

        let [q0, q1, q2] = self.mesh.tri_points(prim).map(|p| narrow_point(&p));
        if let Some((t, _uv)) = self.watertight.intersect_triangle(&q0, &q1, &q2) {
            self.output.hits.push(RayHit { prim, t });
        }

        // Multi-hit: keep walking.
        false
    }
}
