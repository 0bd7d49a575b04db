//! Point-in-tetrahedral-mesh containment.

use lattice_math::{Point3, Real};

use super::{Descent, Traverser};
use crate::aabb::Aabb;
use crate::geom::point_in_tet;
use crate::mesh::{SkipSet, TetMesh};

/// Result of a containment query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TetHit {
    /// Containing tet, if any.
    pub prim: Option<usize>,
}

impl TetHit {
    /// Whether a containing tet was found.
    pub fn found(&self) -> bool {
        self.prim.is_some()
    }
}

/// Finds the tet of a mesh that contains a point.
///
/// The walk halts at the first containing tet. In a valid mesh at most one
/// tet contains a point off the shared faces; if tets overlap, which one is
/// reported depends on tree layout.
#[derive(Debug, Clone)]
pub struct PointInTetMeshTraverse<'a, T: Real> {
    point: Point3<T>,
    mesh: TetMesh<'a, T>,
    skip_verts: SkipSet<'a, u32>,
    skip_tets: SkipSet<'a, usize>,
    /// Query result.
    pub output: TetHit,
}

impl<'a, T: Real> PointInTetMeshTraverse<'a, T> {
    /// Query `point` against every tet of `mesh`.
    pub fn new(point: Point3<T>, mesh: TetMesh<'a, T>) -> Self {
        Self::with_skips(point, mesh, &[], &[])
    }

    /// Query `point`, ignoring tets that use any of `skip_verts` and the
    /// tets listed in `skip_tets`.
    pub fn with_skips(
        point: Point3<T>,
        mesh: TetMesh<'a, T>,
        skip_verts: &'a [u32],
        skip_tets: &'a [usize],
    ) -> Self {
        Self {
            point,
            mesh,
            skip_verts: SkipSet::new(skip_verts),
            skip_tets: SkipSet::new(skip_tets),
            output: TetHit::default(),
        }
    }

    /// The query point.
    pub fn point(&self) -> &Point3<T> {
        &self.point
    }
}

impl<T: Real> Traverser<T> for PointInTetMeshTraverse<'_, T> {
    fn traverse(&self, left: &Aabb<T>, right: &Aabb<T>) -> Descent {
        // Order is irrelevant: boxes of neighbouring tets overlap, so both
        // children may need a visit.
        Descent {
            go_left: left.contains(&self.point),
            go_right: right.contains(&self.point),
            left_first: true,
        }
    }

    fn stop_traversing(&mut self, aabb: &Aabb<T>, prim: usize) -> bool {
        if !aabb.contains(&self.point) {
            return false;
        }
        if self.skip_tets.contains(prim) {
            return false;
        }
        if self.skip_verts.contains_any(&self.mesh.tet(prim)) {
            return false;
        }

        let [a, b, c, d] = self.mesh.tet_points(prim);
        let hit = point_in_tet(&self.point, &a, &b, &c, &d);
        if hit {
            self.output.prim = Some(prim);
        }
        hit
    }
}
