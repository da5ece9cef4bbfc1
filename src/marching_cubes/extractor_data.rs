//! CPU extractor data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in extractor_operations.rs

use crate::batch::TriangleBatchData;
use crate::config::Resolution;
use crate::field::ScalarField;
use bit_vec::BitVec;

/// Where the extractor is in the frame lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorStage {
    /// Buffers allocated, no field yet
    Empty,
    FieldReady,
    NormalsCleared,
    Polygonizing,
    Flushed,
}

/// Lazily computed gradient per grid point
///
/// `computed` is the authority on validity; a zero gradient is a legal value.
pub struct NormalCacheData {
    pub gradients: Vec<[f32; 3]>,
    pub computed: BitVec,
}

/// Counters for one extraction pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub voxels_visited: usize,
    pub voxels_empty: usize,
    pub triangles: usize,
    pub draw_calls: u32,
}

/// CPU isosurface extractor state for one resolution
pub struct CpuExtractorData {
    pub resolution: Resolution,

    /// Grid points per axis
    pub size: u32,
    pub y_stride: usize,
    pub z_stride: usize,

    pub field: ScalarField,
    pub normals: NormalCacheData,

    /// Crossing position per edge of the current voxel, in [-1,1] space
    pub edge_positions: [[f32; 3]; 12],
    /// Interpolated gradient per edge of the current voxel
    pub edge_normals: [[f32; 3]; 12],

    pub batch: TriangleBatchData,
    pub stage: ExtractorStage,
    pub stats: ExtractionStats,
}
