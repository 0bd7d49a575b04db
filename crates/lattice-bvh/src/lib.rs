#![warn(missing_docs)]

//! Bounding volume hierarchy queries over tetrahedral and triangle meshes.
//!
//! A [`Bvh`] is built over one padded box per primitive and walked by a
//! visitor implementing [`Traverser`]. The visitor prunes subtrees, tests
//! the primitives it reaches and keeps its own result.
//!
//! # Architecture
//!
//! - [`Aabb`] - Axis-aligned box and its point/ray tests
//! - [`Bvh`] - SAH-built binary tree with refit and visitor-driven traversal
//! - [`traverse`] - The three query visitors
//! - [`mesh`] - Borrowed tet and triangle mesh views
//! - [`geom`] - Point-in-tet, closest-point and barycentric kernels
//! - [`embed`] - Parallel batch queries and tet-mesh embedding
//!
//! # Example
//!
//! ```
//! use lattice_bvh::{Bvh, NearestTriangleTraverse, TriMesh};
//! use lattice_math::Point3;
//!
//! let verts = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
//! let tris = [[0, 1, 2]];
//! let mesh = TriMesh::new(&verts, &tris).unwrap();
//! let tree = Bvh::build(&mesh.prim_boxes(1e-12));
//!
//! let mut query = NearestTriangleTraverse::new(Point3::new(0.2, 0.2, 1.0), mesh);
//! tree.traverse(&mut query);
//! assert_eq!(query.output.prim, Some(0));
//! ```

pub mod aabb;
pub mod bvh;
mod config;
pub mod embed;
mod error;
pub mod geom;
pub mod mesh;
mod ray;
pub mod traverse;

pub use aabb::Aabb;
pub use bvh::{Bvh, BvhNode, DEFAULT_SAH_BUCKETS};
pub use config::QueryConfig;
pub use embed::{batch_is_inside, batch_nearest_triangle, batch_point_in_tet, embed_points, Embedding};
pub use error::{BvhError, Result};
pub use mesh::{SkipSet, TetMesh, TriMesh};
pub use ray::{Ray, WatertightRay};
pub use traverse::{
    AnyTraverse, Descent, NearestHit, NearestTriangleTraverse, PointInTetMeshTraverse,
    PointInTriangleMeshTraverse, RayHit, RayHits, TetHit, Traverser,
};
