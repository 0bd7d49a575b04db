//! Bounding volume hierarchy and its depth-first descent engine.
//!
//! Uses Surface Area Heuristic (SAH) for construction. Every leaf holds
//! exactly one primitive; queries walk the tree through a [`Traverser`].

use lattice_math::{Point3, Real};

use crate::aabb::Aabb;
use crate::config::QueryConfig;
use crate::error::{BvhError, Result};
use crate::traverse::{Descent, Traverser};

/// Default number of SAH buckets tried per axis.
pub const DEFAULT_SAH_BUCKETS: usize = 12;

/// A BVH node - either a leaf holding one primitive or an internal node with children.
#[derive(Debug, Clone)]
pub enum BvhNode<T: Real> {
    /// Leaf node.
    Leaf {
        /// Box of the primitive.
        aabb: Aabb<T>,
        /// Index of the primitive in the caller's buffer.
        prim: usize,
    },
    /// Internal node with two children.
    Internal {
        /// Box enclosing both children.
        aabb: Aabb<T>,
        /// Left child node.
        left: Box<BvhNode<T>>,
        /// Right child node.
        right: Box<BvhNode<T>>,
    },
}

impl<T: Real> BvhNode<T> {
    /// Box of this node.
    pub fn aabb(&self) -> &Aabb<T> {
        match self {
            BvhNode::Leaf { aabb, .. } => aabb,
            BvhNode::Internal { aabb, .. } => aabb,
        }
    }

    fn depth(&self) -> usize {
        match self {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Bounding volume hierarchy over per-primitive boxes.
///
/// The tree stores only boxes and primitive indices. Vertex and index
/// buffers stay with the caller and are reached through the visitor.
#[derive(Debug, Clone)]
pub struct Bvh<T: Real> {
    root: Option<BvhNode<T>>,
    len: usize,
}

impl<T: Real> Default for Bvh<T> {
    fn default() -> Self {
        Self { root: None, len: 0 }
    }
}

impl<T: Real> Bvh<T> {
    /// Build a BVH over `boxes` using SAH construction.
    ///
    /// Leaf `i` of the tree refers to `boxes[i]`.
    pub fn build(boxes: &[Aabb<T>]) -> Self {
        Self::build_with_buckets(boxes, DEFAULT_SAH_BUCKETS)
    }

    /// Build using the bucket count from `config`.
    pub fn build_with_config(boxes: &[Aabb<T>], config: &QueryConfig) -> Self {
        Self::build_with_buckets(boxes, config.sah_buckets)
    }

    /// Build with an explicit SAH bucket count (at least 2).
    pub fn build_with_buckets(boxes: &[Aabb<T>], buckets: usize) -> Self {
        let buckets = buckets.max(2);
        let mut prim_data: Vec<(usize, Aabb<T>, Point3<T>)> = boxes
            .iter()
            .enumerate()
            .map(|(i, aabb)| (i, *aabb, aabb.centroid()))
            .collect();

        let root = if prim_data.is_empty() {
            None
        } else {
            Some(build_node(&mut prim_data, buckets))
        };

        let bvh = Self {
            root,
            len: boxes.len(),
        };
        log::debug!(
            "built BVH over {} primitives (depth {})",
            bvh.len,
            bvh.depth()
        );
        bvh
    }

    /// Recompute every node box from updated primitive boxes, keeping the
    /// tree topology.
    ///
    /// Used for deforming meshes where a full rebuild each step is too
    /// costly. Query results stay correct; only pruning efficiency degrades
    /// as primitives drift from their original grouping.
    pub fn refit(&mut self, boxes: &[Aabb<T>]) -> Result<()> {
        if boxes.len() != self.len {
            return Err(BvhError::PrimitiveCount {
                expected: self.len,
                actual: boxes.len(),
            });
        }
        if let Some(root) = self.root.as_mut() {
            refit_node(root, boxes);
        }
        log::debug!("refit BVH over {} primitives", self.len);
        Ok(())
    }

    /// Walk the tree with `visitor`.
    ///
    /// At every internal node the visitor decides which children to enter
    /// and in which order; children it rejects are never entered. Every
    /// entered leaf is passed to [`Traverser::stop_traversing`] exactly once,
    /// and the walk halts as soon as that returns true.
    ///
    /// Returns true if a leaf halted the walk.
    pub fn traverse<V: Traverser<T>>(&self, visitor: &mut V) -> bool {
        match &self.root {
            Some(root) => traverse_node(root, visitor, false),
            None => false,
        }
    }

    /// Walk the tree with pruning disabled: every subtree is entered
    /// regardless of the visitor's decision, in the visitor's preferred
    /// order. Leaf handling and halting are unchanged.
    pub fn traverse_exhaustive<V: Traverser<T>>(&self, visitor: &mut V) -> bool {
        match &self.root {
            Some(root) => traverse_node(root, visitor, true),
            None => false,
        }
    }

    /// Number of primitives (leaves).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree has no primitives.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels, zero for an empty tree.
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, BvhNode::depth)
    }

    /// Box of the whole tree, if any.
    pub fn root_aabb(&self) -> Option<&Aabb<T>> {
        self.root.as_ref().map(BvhNode::aabb)
    }

    /// Get a reference to the root node, if any.
    pub fn root(&self) -> Option<&BvhNode<T>> {
        self.root.as_ref()
    }
}

fn traverse_node<T: Real, V: Traverser<T>>(
    node: &BvhNode<T>,
    visitor: &mut V,
    exhaustive: bool,
) -> bool {
    match node {
        BvhNode::Leaf { aabb, prim } => visitor.stop_traversing(aabb, *prim),
        BvhNode::Internal { left, right, .. } => {
            let mut descent = visitor.traverse(left.aabb(), right.aabb());
            if exhaustive {
                descent = Descent {
                    left_first: descent.left_first,
                    ..Descent::BOTH
                };
            }
            let Descent {
                go_left,
                go_right,
                left_first,
            } = descent;

            let (first, go_first, second, go_second) = if left_first {
                (left, go_left, right, go_right)
            } else {
                (right, go_right, left, go_left)
            };

            if go_first && traverse_node(first, visitor, exhaustive) {
                return true;
            }
            go_second && traverse_node(second, visitor, exhaustive)
        }
    }
}

fn refit_node<T: Real>(node: &mut BvhNode<T>, boxes: &[Aabb<T>]) -> Aabb<T> {
    match node {
        BvhNode::Leaf { aabb, prim } => {
            *aabb = boxes[*prim];
            *aabb
        }
        BvhNode::Internal { aabb, left, right } => {
            let l = refit_node(left, boxes);
            let r = refit_node(right, boxes);
            *aabb = l.merge(&r);
            *aabb
        }
    }
}

/// Build a BVH node recursively using SAH.
fn build_node<T: Real>(prim_data: &mut [(usize, Aabb<T>, Point3<T>)], buckets: usize) -> BvhNode<T> {
    let mut bounds = Aabb::empty();
    for (_, aabb, _) in prim_data.iter() {
        bounds = bounds.merge(aabb);
    }

    if let [(prim, aabb, _)] = prim_data {
        return BvhNode::Leaf {
            aabb: *aabb,
            prim: *prim,
        };
    }

    let split = find_best_split(prim_data, buckets)
        .map(|(axis, pos)| partition_prims(prim_data, axis, pos))
        .filter(|&mid| mid != 0 && mid != prim_data.len());

    // Fall back to a median split when no SAH plane separates the centroids.
    let mid = split.unwrap_or(prim_data.len() / 2);
    let (left_data, right_data) = prim_data.split_at_mut(mid);

    BvhNode::Internal {
        aabb: bounds,
        left: Box::new(build_node(left_data, buckets)),
        right: Box::new(build_node(right_data, buckets)),
    }
}

/// Find the best split axis and position using SAH over primitive centroids.
fn find_best_split<T: Real>(
    prim_data: &[(usize, Aabb<T>, Point3<T>)],
    buckets: usize,
) -> Option<(usize, T)> {
    let mut centroid_bounds = Aabb::empty();
    let mut bounds = Aabb::empty();
    for (_, aabb, centroid) in prim_data {
        centroid_bounds.include_point(centroid);
        bounds = bounds.merge(aabb);
    }
    let total_area = bounds.surface_area();
    let n_buckets = T::lit(buckets as f64);

    let mut best_cost = T::infinity();
    let mut best = None;

    let mut bucket_counts = vec![0usize; buckets];
    let mut bucket_bounds = vec![Aabb::empty(); buckets];

    for axis in 0..3 {
        let axis_min = centroid_bounds.min[axis];
        let axis_extent = centroid_bounds.max[axis] - axis_min;
        if axis_extent <= T::lit(1e-10) {
            continue;
        }

        bucket_counts.iter_mut().for_each(|c| *c = 0);
        bucket_bounds.iter_mut().for_each(|b| *b = Aabb::empty());

        for (_, aabb, centroid) in prim_data {
            let b = ((centroid[axis] - axis_min) / axis_extent * n_buckets).to_f64() as usize;
            let b = b.min(buckets - 1);
            bucket_counts[b] += 1;
            bucket_bounds[b] = bucket_bounds[b].merge(aabb);
        }

        for split in 1..buckets {
            let (left_count, left_bounds) = sweep(&bucket_counts[..split], &bucket_bounds[..split]);
            let (right_count, right_bounds) = sweep(&bucket_counts[split..], &bucket_bounds[split..]);
            if left_count == 0 || right_count == 0 {
                continue;
            }

            // SAH cost: traversal + P(left) * N_left + P(right) * N_right
            let cost = if total_area > T::zero() {
                T::lit(0.125)
                    + left_bounds.surface_area() / total_area * T::lit(left_count as f64)
                    + right_bounds.surface_area() / total_area * T::lit(right_count as f64)
            } else {
                T::lit(0.125) + T::lit((left_count * right_count) as f64)
            };

            if cost < best_cost {
                best_cost = cost;
                best = Some((axis, axis_min + T::lit(split as f64) / n_buckets * axis_extent));
            }
        }
    }

    best
}

fn sweep<T: Real>(counts: &[usize], bounds: &[Aabb<T>]) -> (usize, Aabb<T>) {
    counts
        .iter()
        .zip(bounds)
        .fold((0, Aabb::empty()), |(n, acc), (&c, b)| (n + c, acc.merge(b)))
}

/// Partition primitives by centroid along an axis.
fn partition_prims<T: Real>(
    prim_data: &mut [(usize, Aabb<T>, Point3<T>)],
    axis: usize,
    pos: T,
) -> usize {
    let mut left = 0;
    let mut right = prim_data.len();

    while left < right {
        if prim_data[left].2[axis] < pos {
            left += 1;
        } else {
            right -= 1;
            prim_data.swap(left, right);
        }
    }

    left
}
