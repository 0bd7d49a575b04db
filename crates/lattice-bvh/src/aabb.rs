//! Axis-aligned bounding boxes.
//!
//! Every tree node and leaf carries one. Visitors use [`Aabb::contains`]
//! and [`Aabb::exterior_distance`] to prune subtrees.

use lattice_math::{Point3, Real};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb<T: Real> {
    /// Minimum corner.
    pub min: Point3<T>,
    /// Maximum corner.
    pub max: Point3<T>,
}

impl<T: Real> Aabb<T> {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3<T>, max: Point3<T>) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        let inf = T::infinity();
        Self {
            min: Point3::new(inf, inf, inf),
            max: Point3::new(-inf, -inf, -inf),
        }
    }

    /// Tight box around a set of points.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a Point3<T>>,
    {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        aabb
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3<T>) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Smallest box enclosing both `self` and `other`.
    pub fn merge(&self, other: &Aabb<T>) -> Aabb<T> {
        let mut out = *self;
        if other.is_valid() {
            out.include_point(&other.min);
            out.include_point(&other.max);
        }
        out
    }

    /// Expand the AABB by a tolerance in all directions.
    pub fn expand(&mut self, tol: T) {
        for i in 0..3 {
            self.min[i] -= tol;
            self.max[i] += tol;
        }
    }

    /// Whether the box has non-negative extent on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Test if a point lies in the box (boundary inclusive).
    pub fn contains(&self, p: &Point3<T>) -> bool {
        (0..3).all(|i| self.min[i] <= p[i] && p[i] <= self.max[i])
    }

    /// Squared distance from `p` to the box, zero when `p` is inside.
    pub fn squared_exterior_distance(&self, p: &Point3<T>) -> T {
        let mut dist2 = T::zero();
        for i in 0..3 {
            if p[i] < self.min[i] {
                let d = self.min[i] - p[i];
                dist2 += d * d;
            } else if p[i] > self.max[i] {
                let d = p[i] - self.max[i];
                dist2 += d * d;
            }
        }
        dist2
    }

    /// Euclidean distance from `p` to the box, zero when `p` is inside.
    pub fn exterior_distance(&self, p: &Point3<T>) -> T {
        self.squared_exterior_distance(p).sqrt()
    }

    /// Center of the box.
    pub fn centroid(&self) -> Point3<T> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Surface area of the box, zero for an empty box.
    pub fn surface_area(&self) -> T {
        if !self.is_valid() {
            return T::zero();
        }
        let d = self.max - self.min;
        T::lit(2.0) * (d.x * d.y + d.y * d.z + d.z * d.x)
    }
}
