//! Parallel batch queries and tet-mesh embedding.
//!
//! Every query of a batch gets its own visitor; the tree and mesh are shared
//! read-only across rayon workers.

use lattice_math::{Point3, Real, Tolerance, Vec3};
use rayon::prelude::*;

use crate::bvh::Bvh;
use crate::error::{BvhError, Result};
use crate::geom::point_tet_barys;
use crate::mesh::{TetMesh, TriMesh};
use crate::ray::Ray;
use crate::traverse::{
    NearestHit, NearestTriangleTraverse, PointInTetMeshTraverse, PointInTriangleMeshTraverse,
    TetHit,
};

/// Points of a batch located in a tet mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Embedding<T: Real> {
    /// Containing tet of each point.
    pub tets: Vec<usize>,
    /// Barycentric weights of each point within its tet, one per tet vertex.
    pub barys: Vec<[T; 4]>,
}

impl<T: Real> Embedding<T> {
    /// Number of embedded points.
    pub fn len(&self) -> usize {
        self.tets.len()
    }

    /// Whether the embedding is empty.
    pub fn is_empty(&self) -> bool {
        self.tets.is_empty()
    }

    /// Reconstruct embedded point `i` from the tet it lies in.
    pub fn position(&self, mesh: &TetMesh<'_, T>, i: usize) -> Point3<T> {
        let pts = mesh.tet_points(self.tets[i]);
        let w = self.barys[i];
        let mut acc = Vec3::zeros();
        for (p, &wi) in pts.iter().zip(w.iter()) {
            acc += p.coords * wi;
        }
        Point3::from(acc)
    }
}

/// Locate every point in `mesh` and compute its barycentric weights.
///
/// `tree` must have been built over `mesh.prim_boxes(..)`. Fails on the
/// lowest-indexed point that lies outside every tet or whose weights fall
/// outside the tet beyond `tol.barycentric`.
pub fn embed_points<T: Real>(
    tree: &Bvh<T>,
    mesh: TetMesh<'_, T>,
    points: &[Point3<T>],
    tol: &Tolerance,
) -> Result<Embedding<T>> {
    log::debug!(
        "embedding {} points in {} tets",
        points.len(),
        mesh.len()
    );

    let located: Vec<Result<(usize, [T; 4])>> = points
        .par_iter()
        .enumerate()
        .map(|(idx, p)| embed_one(tree, mesh, idx, p, tol))
        .collect();

    let mut embedding = Embedding {
        tets: Vec::with_capacity(points.len()),
        barys: Vec::with_capacity(points.len()),
    };
    for result in located {
        let (tet, barys) = result?;
        embedding.tets.push(tet);
        embedding.barys.push(barys);
    }

    log::trace!("embedded {} points", embedding.len());
    Ok(embedding)
}

fn embed_one<T: Real>(
    tree: &Bvh<T>,
    mesh: TetMesh<'_, T>,
    idx: usize,
    p: &Point3<T>,
    tol: &Tolerance,
) -> Result<(usize, [T; 4])> {
    let mut v = PointInTetMeshTraverse::new(*p, mesh);
    tree.traverse(&mut v);
    let Some(tet) = v.output.prim else {
        log::warn!("point {} lies outside the tet mesh", idx);
        return Err(BvhError::Unembedded { point: idx });
    };

    let [a, b, c, d] = mesh.tet_points(tet);
    match point_tet_barys(p, &a, &b, &c, &d) {
        Some(barys) if tol.barys_valid(&barys) => Ok((tet, barys)),
        _ => {
            log::warn!("point {} has bad barycentric coordinates in tet {}", idx, tet);
            Err(BvhError::BadBarycentrics { point: idx, tet })
        }
    }
}

/// Containing tet of every point.
pub fn batch_point_in_tet<T: Real>(
    tree: &Bvh<T>,
    mesh: TetMesh<'_, T>,
    points: &[Point3<T>],
) -> Vec<TetHit> {
    log::debug!("point-in-tet batch of {}", points.len());
    points
        .par_iter()
        .map(|p| {
            let mut v = PointInTetMeshTraverse::new(*p, mesh);
            tree.traverse(&mut v);
            v.output
        })
        .collect()
}

/// Closest surface point of every query point.
pub fn batch_nearest_triangle<T: Real>(
    tree: &Bvh<T>,
    mesh: TriMesh<'_, T>,
    points: &[Point3<T>],
) -> Vec<NearestHit<T>> {
    log::debug!("nearest-triangle batch of {}", points.len());
    points
        .par_iter()
        .map(|p| {
            let mut v = NearestTriangleTraverse::new(*p, mesh);
            tree.traverse(&mut v);
            v.output
        })
        .collect()
}

/// Even-odd inside test of every point against a closed triangle mesh,
/// casting along `direction`.
///
/// Fails with [`BvhError::InvalidDirection`] before any query runs if
/// `direction` is zero or not finite.
pub fn batch_is_inside<T: Real>(
    tree: &Bvh<T>,
    mesh: TriMesh<'_, T>,
    points: &[Point3<T>],
    direction: Vec3<T>,
) -> Result<Vec<bool>> {
    let unit = Ray::try_new(Point3::origin(), direction)?.direction;
    log::debug!("inside-test batch of {}", points.len());
    points
        .par_iter()
        .map(|p| {
            let mut v = PointInTriangleMeshTraverse::new(*p, mesh).with_direction(unit)?;
            tree.traverse(&mut v);
            Ok(v.output.is_inside())
        })
        .collect()
}
