#![warn(missing_docs)]

//! Math types for the lattice spatial query kernel.
//!
//! Thin wrappers around nalgebra: a [`Real`] scalar trait implemented for
//! `f32` and `f64`, point/vector aliases generic over it, and the
//! tolerance constants shared by the query crates.

use bytemuck::Pod;
use nalgebra::{RealField, Vector3};

/// A point in 3D space.
pub type Point3<T> = nalgebra::Point3<T>;

/// A vector in 3D space.
pub type Vec3<T> = Vector3<T>;

/// Scalar type of every geometric query.
///
/// Only `f32` and `f64` implement it. The `Pod` bound lets flat vertex
/// buffers be viewed as `[T; 3]` rows without copying; `Send + Sync` lets
/// batches of queries share meshes across threads.
pub trait Real: RealField + Copy + Pod + Send + Sync {
    /// Positive infinity.
    fn infinity() -> Self;

    /// Convert to single precision, rounding if needed.
    fn narrow(self) -> f32;

    /// Convert from single precision.
    fn widen(v: f32) -> Self;

    /// Convert to double precision.
    fn to_f64(self) -> f64;

    /// Convert an `f64` literal into this scalar type.
    #[inline]
    fn lit(v: f64) -> Self {
        nalgebra::convert(v)
    }
}

impl Real for f32 {
    #[inline]
    fn infinity() -> Self {
        f32::INFINITY
    }

    #[inline]
    fn narrow(self) -> f32 {
        self
    }

    #[inline]
    fn widen(v: f32) -> Self {
        v
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }
}

impl Real for f64 {
    #[inline]
    fn infinity() -> Self {
        f64::INFINITY
    }

    #[inline]
    fn narrow(self) -> f32 {
        self as f32
    }

    #[inline]
    fn widen(v: f32) -> Self {
        v as f64
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

/// Build a point from a `[T; 3]` row.
#[inline]
pub fn point<T: Real>(row: &[T; 3]) -> Point3<T> {
    Point3::new(row[0], row[1], row[2])
}

/// Narrow a point to single precision.
#[inline]
pub fn narrow_point<T: Real>(p: &Point3<T>) -> [f32; 3] {
    [p.x.narrow(), p.y.narrow(), p.z.narrow()]
}

/// Tolerance constants for spatial queries.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Slack allowed when checking barycentric coordinates lie in `[0, 1]`.
    pub barycentric: f64,
}

impl Tolerance {
    /// Default query tolerances (1e-8 barycentric slack).
    pub const DEFAULT: Self = Self { barycentric: 1e-8 };

    /// Check that barycentric weights are non-negative and sum to at most one,
    /// within the barycentric slack.
    pub fn barys_valid<T: Real>(&self, barys: &[T]) -> bool {
        let eps = T::lit(self.barycentric);
        let mut sum = T::zero();
        for &b in barys {
            if b < -eps {
                return false;
            }
            sum += b;
        }
        sum <= T::one() + eps
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
