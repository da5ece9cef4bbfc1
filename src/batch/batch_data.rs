//! Batch data structures - Pure DOP
//!
//! NO METHODS beyond trivial lookups. Just data.
//! All transformations happen in batch_operations.rs

/// Primitive assembled from the batched vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Triangles,
    Lines,
    Points,
}

impl PrimitiveKind {
    /// Vertices per primitive
    pub fn vertices(self) -> usize {
        match self {
            PrimitiveKind::Triangles => 3,
            PrimitiveKind::Lines => 2,
            PrimitiveKind::Points => 1,
        }
    }
}

/// Fixed-capacity vertex batch
///
/// Attribute arrays are flat and sized for `capacity` vertices up front;
/// `count` is the number of vertices written since the last flush.
pub struct TriangleBatchData {
    pub capacity: usize,

    /// xyz per vertex
    pub positions: Vec<f32>,
    /// xyz per vertex
    pub normals: Vec<f32>,
    /// uv per vertex
    pub uvs: Vec<f32>,
    /// rgba per vertex
    pub colors: Vec<f32>,

    pub count: usize,
    pub primitive: PrimitiveKind,

    /// Attributes written during the current pass
    pub has_position: bool,
    pub has_normal: bool,
    pub has_uv: bool,
    pub has_color: bool,

    /// Flushes since `begin`
    pub flush_count: u32,
    /// Vertices submitted since `begin`
    pub submitted_vertices: usize,
}
