//! Geometric kernels used by the traversal visitors.
//!
//! All functions are pure and generic over the query scalar type.

use lattice_math::{Point3, Real};
use nalgebra::Matrix3;

/// Test whether `p` lies inside the tetrahedron `(a, b, c, d)`.
///
/// The point is inside when, for every face, it lies on the same side as
/// the opposite vertex. Points on a face count as inside. A degenerate
/// (zero-volume) tet contains nothing.
pub fn point_in_tet<T: Real>(
    p: &Point3<T>,
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
    d: &Point3<T>,
) -> bool {
    same_side(a, b, c, d, p)
        && same_side(b, c, d, a, p)
        && same_side(c, d, a, b, p)
        && same_side(d, a, b, c, p)
}

/// Whether `p` and `opposite` are on the same side of the plane through
/// `(v0, v1, v2)`.
fn same_side<T: Real>(
    v0: &Point3<T>,
    v1: &Point3<T>,
    v2: &Point3<T>,
    opposite: &Point3<T>,
    p: &Point3<T>,
) -> bool {
    let n = (v1 - v0).cross(&(v2 - v0));
    let side_opposite = n.dot(&(opposite - v0));
    if side_opposite == T::zero() {
        return false;
    }
    let side_p = n.dot(&(p - v0));
    side_p * side_opposite >= T::zero()
}

/// Barycentric coordinates of `p` with respect to the tet `(a, b, c, d)`.
///
/// The weights sum to one and reproduce `p` as `w0*a + w1*b + w2*c + w3*d`.
/// Returns `None` for a degenerate tet.
pub fn point_tet_barys<T: Real>(
    p: &Point3<T>,
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
    d: &Point3<T>,
) -> Option<[T; 4]> {
    let m = Matrix3::from_columns(&[b - a, c - a, d - a]);
    let inv = m.try_inverse()?;
    let w = inv * (p - a);
    Some([T::one() - w.x - w.y - w.z, w.x, w.y, w.z])
}

/// Closest point to `p` on the triangle `(a, b, c)`, including its edges
/// and vertices.
///
/// Classifies `p` against the triangle's Voronoi regions (three vertex
/// regions, three edge regions, the face) and projects accordingly. A
/// zero-area triangle is treated as its three edges.
pub fn point_on_triangle<T: Real>(
    p: &Point3<T>,
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
) -> Point3<T> {
    let zero = T::zero();
    let ab = b - a;
    let ac = c - a;

    if ab.cross(&ac).norm_squared() == zero {
        return nearest_on_edges(p, a, b, c);
    }

    // Vertex region A
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= zero && d2 <= zero {
        return *a;
    }

    // Vertex region B
    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= zero && d4 <= d3 {
        return *b;
    }

    // Edge region AB
    let vc = d1 * d4 - d3 * d2;
    if vc <= zero && d1 >= zero && d3 <= zero {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    // Vertex region C
    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= zero && d5 <= d6 {
        return *c;
    }

    // Edge region AC
    let vb = d5 * d2 - d1 * d6;
    if vb <= zero && d2 >= zero && d6 <= zero {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    // Edge region BC
    let va = d3 * d6 - d5 * d4;
    if va <= zero && (d4 - d3) >= zero && (d5 - d6) >= zero {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    // Face region
    let denom = T::one() / (va + vb + vc);
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

fn nearest_on_edges<T: Real>(
    p: &Point3<T>,
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
) -> Point3<T> {
    let mut best = *a;
    let mut best_d2 = T::infinity();
    for (s, e) in [(a, b), (b, c), (c, a)] {
        let q = point_on_segment(p, s, e);
        let d2 = (p - q).norm_squared();
        if d2 < best_d2 {
            best = q;
            best_d2 = d2;
        }
    }
    best
}

/// Closest point to `p` on the segment `(a, b)`.
pub fn point_on_segment<T: Real>(p: &Point3<T>, a: &Point3<T>, b: &Point3<T>) -> Point3<T> {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == T::zero() {
        return *a;
    }
    let t = (ab.dot(&(p - a)) / len2).clamp(T::zero(), T::one());
    a + ab * t
}

/// Barycentric coordinates of `p` (assumed to lie in the triangle's plane)
/// with respect to `(a, b, c)`.
///
/// Returns `None` for a degenerate triangle.
pub fn point_triangle_barys<T: Real>(
    p: &Point3<T>,
    a: &Point3<T>,
    b: &Point3<T>,
    c: &Point3<T>,
) -> Option<[T; 3]> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if denom == T::zero() {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some([T::one() - v - w, v, w])
}
