//! Ray representation, ray-box slab test and the watertight ray-triangle test.

use lattice_math::{narrow_point, Point3, Real, Vec3};

use crate::aabb::Aabb;
use crate::error::{BvhError, Result};

/// A ray in 3D space defined by origin and unit direction.
#[derive(Debug, Clone, Copy)]
pub struct Ray<T: Real> {
    /// Origin point of the ray.
    pub origin: Point3<T>,
    /// Unit direction of the ray.
    pub direction: Vec3<T>,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3<T>,
}

impl<T: Real> Ray<T> {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized. It must be finite and non-zero;
    /// see [`Ray::try_new`] for a checked constructor.
    pub fn new(origin: Point3<T>, direction: Vec3<T>) -> Self {
        let dir = direction.normalize();
        let inv = dir.map(|c| T::one() / c);
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
        }
    }

    /// Create a ray, rejecting a direction that cannot be normalized.
    pub fn try_new(origin: Point3<T>, direction: Vec3<T>) -> Result<Self> {
        let len = direction.norm();
        if !len.is_finite() || len == T::zero() {
            return Err(BvhError::InvalidDirection([
                direction.x.to_f64(),
                direction.y.to_f64(),
                direction.z.to_f64(),
            ]));
        }
        Ok(Self::new(origin, direction))
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: T) -> Point3<T> {
        self.origin + self.direction * t
    }

    /// Test ray-AABB intersection using the slab method, clipped to
    /// `[t_min, t_max]`.
    ///
    /// Returns the entry and exit parameters, or `None` on a miss. Axes the
    /// ray runs parallel to are handled as an inside-slab check so that an
    /// origin lying exactly on a slab plane never yields `0 * inf`.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb<T>, t_min: T, t_max: T) -> Option<(T, T)> {
        let mut t0 = t_min;
        let mut t1 = t_max;
        for i in 0..3 {
            if self.direction[i] == T::zero() {
                if self.origin[i] < aabb.min[i] || self.origin[i] > aabb.max[i] {
                    return None;
                }
                continue;
            }
            let mut near = (aabb.min[i] - self.origin[i]) * self.inv_direction[i];
            let mut far = (aabb.max[i] - self.origin[i]) * self.inv_direction[i];
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            t0 = t0.max(near);
            t1 = t1.min(far);
            if t0 > t1 {
                return None;
            }
        }
        Some((t0, t1))
    }
}

/// Single-precision ray prepared for the watertight ray-triangle test of
/// Woop, Benthin and Wald.
///
/// The dominant direction axis becomes `kz`; `kx`/`ky` are the remaining
/// axes, swapped when the direction along `kz` is negative so triangle
/// winding is preserved.
#[derive(Debug, Clone, Copy)]
pub struct WatertightRay {
    origin: [f32; 3],
    kx: usize,
    ky: usize,
    kz: usize,
    sx: f32,
    sy: f32,
    sz: f32,
}

impl WatertightRay {
    /// Precompute the shear for a ray. Both inputs are narrowed to `f32`.
    pub fn new<T: Real>(origin: &Point3<T>, direction: &Vec3<T>) -> Self {
        let o = narrow_point(origin);
        let d = [
            direction.x.narrow(),
            direction.y.narrow(),
            direction.z.narrow(),
        ];

        let kz = dominant_axis(&d);
        let mut kx = if kz != 2 { kz + 1 } else { 0 };
        let mut ky = if kx != 2 { kx + 1 } else { 0 };
        if d[kz] < 0.0 {
            std::mem::swap(&mut kx, &mut ky);
        }

        let inv_dir_z = 1.0 / d[kz];
        Self {
            origin: o,
            kx,
            ky,
            kz,
            sx: d[kx] * inv_dir_z,
            sy: d[ky] * inv_dir_z,
            sz: inv_dir_z,
        }
    }

    /// Intersect with the triangle `(v0, v1, v2)`.
    ///
    /// Returns the ray parameter and the barycentric `(u, v)` of the hit.
    /// Hits behind the origin are rejected. A ray through an edge shared by
    /// two triangles never slips between them.
    pub fn intersect_triangle(
        &self,
        v0: &[f32; 3],
        v1: &[f32; 3],
        v2: &[f32; 3],
    ) -> Option<(f32, [f32; 2])> {
        let (kx, ky, kz) = (self.kx, self.ky, self.kz);
        let o = &self.origin;

        let a = [v0[0] - o[0], v0[1] - o[1], v0[2] - o[2]];
        let b = [v1[0] - o[0], v1[1] - o[1], v1[2] - o[2]];
        let c = [v2[0] - o[0], v2[1] - o[1], v2[2] - o[2]];

        let (a_kz, b_kz, c_kz) = (a[kz], b[kz], c[kz]);

        // Shear and scale into ray space.
        let ax = a[kx] - self.sx * a_kz;
        let ay = a[ky] - self.sy * a_kz;
        let bx = b[kx] - self.sx * b_kz;
        let by = b[ky] - self.sy * b_kz;
        let cx = c[kx] - self.sx * c_kz;
        let cy = c[ky] - self.sy * c_kz;

        // Scaled barycentrics.
        let u = cx * by - cy * bx;
        let v = ax * cy - ay * cx;
        let w = bx * ay - by * ax;

        if (u < 0.0 || v < 0.0 || w < 0.0) && (u > 0.0 || v > 0.0 || w > 0.0) {
            return None;
        }

        let det = u + v + w;
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let t = (u * a_kz + v * b_kz + w * c_kz) * self.sz;
        let sign_t = if det.is_sign_negative() { -t } else { t };
        if sign_t < 0.0 {
            return None;
        }

        let inv_det = 1.0 / det;
        Some((t * inv_det, [u * inv_det, v * inv_det]))
    }
}

/// Axis with the largest absolute component. Ties favour the later axis.
fn dominant_axis(d: &[f32; 3]) -> usize {
    let (x, y, z) = (d[0].abs(), d[1].abs(), d[2].abs());
    if x > y {
        if x > z {
            0
        } else {
            2
        }
    } else if y > z {
        1
    } else {
        2
    }
}
