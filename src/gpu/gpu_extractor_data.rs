//! GPU extractor data structures - Pure DOP
//!
//! NO METHODS. Just data.

use super::field_atlas_data::AtlasLayout;
use static_assertions::const_assert_eq;

/// What one vertex invocation of the index-only draw is responsible for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexSlot {
    /// Linear voxel index over the (N-1)^3 cells
    pub voxel: u32,
    /// Triangle slot within the voxel, 0..5
    pub triangle: u32,
    /// Corner within the triangle, 0..3
    pub corner: u32,
}

/// Must match `MarchParams` in gpu_marching_cubes.wgsl
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MarchParams {
    pub grid_size: u32,
    pub tiles_x: u32,
    pub tiles_y: u32,
    pub iso_level: f32,
}

const_assert_eq!(std::mem::size_of::<MarchParams>() % 16, 0);

/// Edge and tri tables baked into integer textures
///
/// Created once per device; independent of resolution.
pub struct TableTextures {
    /// R8Uint, 16 x 256
    pub tri_table: wgpu::Texture,
    pub tri_view: wgpu::TextureView,
    /// R32Uint, 256 x 1
    pub edge_table: wgpu::Texture,
    pub edge_view: wgpu::TextureView,
}

pub struct GpuExtractorData {
    pub layout: AtlasLayout,
    /// (N-1)^3 * 15
    pub vertex_count: u32,
    pub params_buffer: wgpu::Buffer,
    pub bind_group_layout: wgpu::BindGroupLayout,
    /// Rebuilt whenever the atlas is replaced
    pub bind_group: wgpu::BindGroup,
    pub pipeline: wgpu::RenderPipeline,
}
