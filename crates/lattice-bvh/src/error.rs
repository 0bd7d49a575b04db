//! Error types for mesh views, tree maintenance and batch queries.

use thiserror::Error;

/// Errors raised when caller-supplied data violates a query precondition.
#[derive(Error, Debug)]
pub enum BvhError {
    /// A flat buffer length is not a multiple of its column count.
    #[error("{buffer} buffer has {len} values, not a multiple of {columns} columns")]
    Shape {
        /// Which buffer was malformed.
        buffer: &'static str,
        /// Number of scalars in the buffer.
        len: usize,
        /// Required column count.
        columns: usize,
    },

    /// A primitive references a vertex that does not exist.
    #[error("primitive {prim} references vertex {vertex}, but only {vertex_count} vertices exist")]
    VertexOutOfRange {
        /// Primitive index.
        prim: usize,
        /// Offending vertex index.
        vertex: u32,
        /// Size of the vertex buffer.
        vertex_count: usize,
    },

    /// Refit was given a different number of boxes than the tree was built with.
    #[error("tree holds {expected} primitives, refit received {actual} boxes")]
    PrimitiveCount {
        /// Primitive count of the tree.
        expected: usize,
        /// Number of boxes supplied.
        actual: usize,
    },

    /// A point of an embedding batch lies outside every tet.
    #[error("point {point} is not inside any tetrahedron")]
    Unembedded {
        /// Index of the point in the batch.
        point: usize,
    },

    /// Barycentric coordinates of an embedded point fell outside the tet.
    #[error("point {point} has invalid barycentric coordinates in tet {tet}")]
    BadBarycentrics {
        /// Index of the point in the batch.
        point: usize,
        /// Tet that reported containment.
        tet: usize,
    },

    /// A ray cast direction has zero length or a non-finite component.
    #[error("ray direction {0:?} is zero or not finite")]
    InvalidDirection([f64; 3]),

    /// Invalid query configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration could not be parsed.
    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result type for lattice BVH operations.
pub type Result<T> = std::result::Result<T, BvhError>;
