/// Marching Cubes Module - Data-Oriented Programming (DOP) style
///
/// - tables.rs: the immutable lookup tables shared with the GPU path
/// - extractor_data.rs: CPU extractor state, including the normal cache
/// - extractor_operations.rs: per-frame extraction into a batching emitter

pub mod extractor_data;
pub mod extractor_operations;
pub mod tables;

pub use extractor_data::{CpuExtractorData, ExtractionStats, ExtractorStage, NormalCacheData};
pub use extractor_operations::{
    clear_normals, create_cpu_extractor, ensure_normal, extract_surface, grid_to_surface,
    load_field, polygonize_voxel, resize_cpu_extractor, run_cpu_frame,
};
pub use tables::{
    cube_index, edge_table_texels, tri_table_texels, triangle_count, CORNER_OFFSETS,
    EDGE_CORNERS, EDGE_TABLE, TRI_TABLE,
};
