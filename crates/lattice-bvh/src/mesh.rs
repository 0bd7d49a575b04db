//! Borrowed views over externally owned vertex and index buffers.
//!
//! Views never copy. Construction checks the buffer shapes and that every
//! index refers to an existing vertex, so the visitors can index freely.

use lattice_math::{point, Point3, Real};

use crate::aabb::Aabb;
use crate::error::{BvhError, Result};

/// Read-only tetrahedral mesh: `N x 3` vertices and `M x 4` tets.
#[derive(Debug, Clone, Copy)]
pub struct TetMesh<'a, T: Real> {
    verts: &'a [[T; 3]],
    tets: &'a [[u32; 4]],
}

/// Read-only triangle mesh: `N x 3` vertices and `M x 3` triangles.
#[derive(Debug, Clone, Copy)]
pub struct TriMesh<'a, T: Real> {
    verts: &'a [[T; 3]],
    tris: &'a [[u32; 3]],
}

impl<'a, T: Real> TetMesh<'a, T> {
    /// Wrap row buffers, checking every tet index is in range.
    pub fn new(verts: &'a [[T; 3]], tets: &'a [[u32; 4]]) -> Result<Self> {
        check_indices(verts.len(), tets)?;
        Ok(Self { verts, tets })
    }

    /// Wrap flat row-major buffers (`3N` scalars, `4M` indices).
    pub fn from_flat(verts: &'a [T], tets: &'a [u32]) -> Result<Self> {
        Self::new(rows(verts, "vertex")?, rows(tets, "tet index")?)
    }

    /// Number of tets.
    pub fn len(&self) -> usize {
        self.tets.len()
    }

    /// Whether the mesh has no tets.
    pub fn is_empty(&self) -> bool {
        self.tets.is_empty()
    }

    /// Vertex buffer.
    pub fn verts(&self) -> &'a [[T; 3]] {
        self.verts
    }

    /// Vertex indices of tet `prim`.
    #[inline]
    pub fn tet(&self, prim: usize) -> [u32; 4] {
        self.tets[prim]
    }

    /// Vertex positions of tet `prim`.
    #[inline]
    pub fn tet_points(&self, prim: usize) -> [Point3<T>; 4] {
        self.tet(prim).map(|v| point(&self.verts[v as usize]))
    }

    /// One box per tet, padded by `pad`, in tet order.
    pub fn prim_boxes(&self, pad: T) -> Vec<Aabb<T>> {
        (0..self.len())
            .map(|i| padded_box(&self.tet_points(i), pad))
            .collect()
    }
}

impl<'a, T: Real> TriMesh<'a, T> {
    /// Wrap row buffers, checking every triangle index is in range.
    pub fn new(verts: &'a [[T; 3]], tris: &'a [[u32; 3]]) -> Result<Self> {
        check_indices(verts.len(), tris)?;
        Ok(Self { verts, tris })
    }

    /// Wrap flat row-major buffers (`3N` scalars, `3M` indices).
    pub fn from_flat(verts: &'a [T], tris: &'a [u32]) -> Result<Self> {
        Self::new(rows(verts, "vertex")?, rows(tris, "triangle index")?)
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.tris.len()
    }

    /// Whether the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    /// Vertex buffer.
    pub fn verts(&self) -> &'a [[T; 3]] {
        self.verts
    }

    /// Vertex indices of triangle `prim`.
    #[inline]
    pub fn tri(&self, prim: usize) -> [u32; 3] {
        self.tris[prim]
    }

    /// Vertex positions of triangle `prim`.
    #[inline]
    pub fn tri_points(&self, prim: usize) -> [Point3<T>; 3] {
        self.tri(prim).map(|v| point(&self.verts[v as usize]))
    }

    /// One box per triangle, padded by `pad`, in triangle order.
    pub fn prim_boxes(&self, pad: T) -> Vec<Aabb<T>> {
        (0..self.len())
            .map(|i| padded_box(&self.tri_points(i), pad))
            .collect()
    }
}

/// A small set of excluded indices, tested by linear scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkipSet<'a, I> {
    items: &'a [I],
}

impl<'a, I: PartialEq + Copy> SkipSet<'a, I> {
    /// Wrap a slice of excluded indices.
    pub fn new(items: &'a [I]) -> Self {
        Self { items }
    }

    /// The empty set.
    pub fn none() -> Self {
        Self { items: &[] }
    }

    /// Membership test.
    #[inline]
    pub fn contains(&self, item: I) -> bool {
        self.items.contains(&item)
    }

    /// Whether any of `items` is in the set.
    #[inline]
    pub fn contains_any(&self, items: &[I]) -> bool {
        !self.items.is_empty() && items.iter().any(|&i| self.contains(i))
    }

    /// Number of excluded indices.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is excluded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn padded_box<T: Real>(points: &[Point3<T>], pad: T) -> Aabb<T> {
    let mut aabb = Aabb::from_points(points);
    aabb.expand(pad);
    aabb
}

/// View a flat buffer as rows of `N` columns.
fn rows<'a, S: bytemuck::Pod, const N: usize>(
    flat: &'a [S],
    buffer: &'static str,
) -> Result<&'a [[S; N]]> {
    bytemuck::try_cast_slice(flat).map_err(|_| BvhError::Shape {
        buffer,
        len: flat.len(),
        columns: N,
    })
}

fn check_indices<const N: usize>(vertex_count: usize, prims: &[[u32; N]]) -> Result<()> {
    for (prim, idx) in prims.iter().enumerate() {
        if let Some(&vertex) = idx.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(BvhError::VertexOutOfRange {
                prim,
                vertex,
                vertex_count,
            });
        }
    }
    Ok(())
}
