//! Query visitors driven by [`Bvh::traverse`](crate::Bvh::traverse).
//!
//! A visitor answers two questions during the walk:
//!
//! - [`Traverser::traverse`] at each internal node: which children can
//!   still hold a result, and which to try first.
//! - [`Traverser::stop_traversing`] at each leaf: test the primitive,
//!   record it in the visitor's output, and say whether the walk is done.
//!
//! Visitors borrow the mesh and skip lists, own their output, and are used
//! for a single query. Run concurrent queries with one visitor each; the
//! tree and mesh can be shared freely since nothing here mutates them.

mod nearest;
mod tet;
mod triangle;

pub use nearest::{NearestHit, NearestTriangleTraverse};
pub use tet::{PointInTetMeshTraverse, TetHit};
pub use triangle::{PointInTriangleMeshTraverse, RayHit, RayHits};

use lattice_math::Real;

use crate::aabb::Aabb;

/// Descent decision for the two children of an internal node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descent {
    /// Enter the left subtree.
    pub go_left: bool,
    /// Enter the right subtree.
    pub go_right: bool,
    /// Try the left subtree before the right one. Ordering hint only.
    pub left_first: bool,
}

impl Descent {
    /// Enter both children, left first.
    pub const BOTH: Self = Self {
        go_left: true,
        go_right: true,
        left_first: true,
    };
}

/// A query walked over a [`Bvh`](crate::Bvh).
pub trait Traverser<T: Real> {
    /// Decide which children of an internal node to enter.
    ///
    /// Must depend only on the visitor's state and the two boxes.
    fn traverse(&self, left: &Aabb<T>, right: &Aabb<T>) -> Descent;

    /// Process the primitive stored at a leaf. Returning true halts the
    /// whole walk.
    fn stop_traversing(&mut self, aabb: &Aabb<T>, prim: usize) -> bool;
}

/// One of the three query visitors, for call sites that pick the query at
/// run time.
#[derive(Debug, Clone)]
pub enum AnyTraverse<'a, T: Real> {
    /// Point-in-tet containment.
    PointInTet(PointInTetMeshTraverse<'a, T>),
    /// Ray-cast crossings.
    PointInTriangle(PointInTriangleMeshTraverse<'a, T>),
    /// Closest point on surface.
    Nearest(NearestTriangleTraverse<'a, T>),
}

impl<T: Real> Traverser<T> for AnyTraverse<'_, T> {
    fn traverse(&self, left: &Aabb<T>, right: &Aabb<T>) -> Descent {
        match self {
            AnyTraverse::PointInTet(v) => v.traverse(left, right),
            AnyTraverse::PointInTriangle(v) => v.traverse(left, right),
            AnyTraverse::Nearest(v) => v.traverse(left, right),
        }
    }

    fn stop_traversing(&mut self, aabb: &Aabb<T>, prim: usize) -> bool {
        match self {
            AnyTraverse::PointInTet(v) => v.stop_traversing(aabb, prim),
            AnyTraverse::PointInTriangle(v) => v.stop_traversing(aabb, prim),
            AnyTraverse::Nearest(v) => v.stop_traversing(aabb, prim),
        }
    }
}

impl<'a, T: Real> From<PointInTetMeshTraverse<'a, T>> for AnyTraverse<'a, T> {
    fn from(v: PointInTetMeshTraverse<'a, T>) -> Self {
        AnyTraverse::PointInTet(v)
    }
}

impl<'a, T: Real> From<PointInTriangleMeshTraverse<'a, T>> for AnyTraverse<'a, T> {
    fn from(v: PointInTriangleMeshTraverse<'a, T>) -> Self {
        AnyTraverse::PointInTriangle(v)
    }
}

impl<'a, T: Real> From<NearestTriangleTraverse<'a, T>> for AnyTraverse<'a, T> {
    fn from(v: NearestTriangleTraverse<'a, T>) -> Self {
        AnyTraverse::Nearest(v)
    }
}
