/// GPU Module - Data-Oriented Programming (DOP) style
///
/// - device_caps.rs: capability checks and validated shader/pipeline creation
/// - field_atlas_*: density field rasterized into a tiled 2D atlas
/// - gpu_extractor_*: index-only marching cubes over the atlas
///
/// Data files hold GPU resources and uniforms, operations files are free
/// functions over them.

pub mod device_caps;
pub mod field_atlas_data;
pub mod field_atlas_operations;
pub mod gpu_extractor_data;
pub mod gpu_extractor_operations;

pub use device_caps::{
    check_device_capabilities, create_validated_render_pipeline, create_validated_shader,
    required_limits, ShaderStage,
};
pub use field_atlas_data::{AtlasLayout, FieldAtlasData, FieldParams};
pub use field_atlas_operations::{
    atlas_layout, create_field_atlas, generate_field_atlas, grid_to_texel, texel_to_grid,
};
pub use gpu_extractor_data::{GpuExtractorData, MarchParams, TableTextures, VertexSlot};
pub use gpu_extractor_operations::{
    bind_field_atlas, create_gpu_extractor, create_table_textures, decode_vertex_index,
    gpu_vertex_count, record_extraction, surface_depth_state, voxel_coords,
};
