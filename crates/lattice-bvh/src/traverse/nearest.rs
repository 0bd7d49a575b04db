//! Closest point on a triangle surface.

use lattice_math::{Point3, Real};

use super::{Descent, Traverser};
use crate::aabb::Aabb;
use crate::geom::point_on_triangle;
use crate::mesh::{SkipSet, TriMesh};

/// Best candidate found so far by a nearest-triangle query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestHit<T: Real> {
    /// Closest triangle, `None` until a triangle has been accepted.
    pub prim: Option<usize>,
    /// Distance to the closest triangle, infinite until one is accepted.
    pub dist: T,
    /// Closest point on that triangle.
    pub point_on_tri: Point3<T>,
}

impl<T: Real> Default for NearestHit<T> {
    fn default() -> Self {
        Self {
            prim: None,
            dist: T::infinity(),
            point_on_tri: Point3::origin(),
        }
    }
}

/// Finds the closest point to a query point on any triangle of a mesh.
///
/// Branch and bound: subtrees whose box is no closer than the current best
/// are skipped, nearer boxes are tried first, and every remaining leaf is
/// tested.
#[derive(Debug, Clone)]
pub struct NearestTriangleTraverse<'a, T: Real> {
    point: Point3<T>,
    mesh: TriMesh<'a, T>,
    skip_verts: SkipSet<'a, u32>,
    /// Query result.
    pub output: NearestHit<T>,
}

impl<'a, T: Real> NearestTriangleTraverse<'a, T> {
    /// Query `point` against every triangle of `mesh`.
    pub fn new(point: Point3<T>, mesh: TriMesh<'a, T>) -> Self {
        Self::with_skips(point, mesh, &[])
    }

    /// Query `point`, ignoring triangles that use any of `skip_verts`.
    pub fn with_skips(point: Point3<T>, mesh: TriMesh<'a, T>, skip_verts: &'a [u32]) -> Self {
        Self {
            point,
            mesh,
            skip_verts: SkipSet::new(skip_verts),
            output: NearestHit::default(),
        }
    }

    /// The query point.
    pub fn point(&self) -> &Point3<T> {
        &self.point
    }
}

impl<T: Real> Traverser<T> for NearestTriangleTraverse<'_, T> {
    fn traverse(&self, left: &Aabb<T>, right: &Aabb<T>) -> Descent {
        let l_d = left.exterior_distance(&self.point);
        let r_d = right.exterior_distance(&self.point);
        Descent {
            go_left: l_d < self.output.dist,
            go_right: r_d < self.output.dist,
            left_first: l_d <= r_d,
        }
    }

    fn stop_traversing(&mut self, aabb: &Aabb<T>, prim: usize) -> bool {
        if aabb.exterior_distance(&self.point) > self.output.dist {
            return false;
        }

        let tri = self.mesh.tri(prim);
        if self.skip_verts.contains_any(&tri) {
            return false;
        }

        let [a, b, c] = self.mesh.tri_points(prim);
        let pt_on_tri = point_on_triangle(&self.point, &a, &b, &c);
        let dist = (self.point - pt_on_tri).norm();
        if dist < self.output.dist {
            self.output = NearestHit {
                prim: Some(prim),
                dist,
                point_on_tri: pt_on_tri,
            };
        }

        false
    }
}
