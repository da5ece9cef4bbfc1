//! Engine constants
//!
//! Every empirically tuned value lives here. The WGSL sources repeat the
//! kernel constants; the iso level and grid layout reach them through uniforms.

/// Field kernel constants
pub mod field {
    /// Added to the squared distance so the kernel stays finite at a blob center
    pub const KERNEL_EPSILON: f32 = 1e-6;

    /// Subtracted from every kernel contribution; only positive results count
    pub const KERNEL_THRESHOLD: f32 = 12.0;

    /// Numerator of the floor kernel
    pub const FLOOR_STRENGTH: f32 = 2.0;

    /// Added to the squared floor distance
    pub const FLOOR_EPSILON: f32 = 1e-4;

    /// Base blob strength before scaling by blob count
    pub const BLOB_BASE_STRENGTH: f32 = 1.2;
}

/// Isosurface extraction constants
pub mod surface {
    /// Iso level shared by both extraction paths
    pub const ISO_LEVEL: f32 = 80.0;

    /// Upper bound of triangles a single voxel can produce
    pub const MAX_TRIANGLES_PER_VOXEL: u32 = 5;

    /// Corners per triangle
    pub const VERTICES_PER_TRIANGLE: u32 = 3;

    /// Vertex slots reserved per voxel in the index-only draw
    pub const VERTICES_PER_VOXEL: u32 = MAX_TRIANGLES_PER_VOXEL * VERTICES_PER_TRIANGLE;

    /// Tri table sentinel
    pub const TRI_TABLE_END: i8 = -1;

    /// Tri table sentinel once baked into an unsigned texture
    pub const TRI_TABLE_TEXEL_END: u8 = 255;
}

/// Batching emitter constants
pub mod batching {
    /// Vertices held by one batch before it must be flushed
    pub const BATCH_CAPACITY: usize = 4096;
}

/// GPU resource limits
pub mod gpu_limits {
    /// Size of the blob uniform array
    pub const MAX_BLOBS: usize = 100;

    /// Atlas texture format
    pub const FIELD_ATLAS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

    /// Depth target format
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
}

/// Shading constants
pub mod lighting {
    pub const LIGHT_DIRECTION: [f32; 3] = [-1.0, 1.0, 1.0];
    pub const LIGHT_COLOR: [f32; 4] = [0.8, 0.7, 0.6, 1.0];
    pub const AMBIENT_UP: [f32; 4] = [0.05, 0.1, 0.2, 1.0];
    pub const AMBIENT_DOWN: [f32; 4] = [0.15, 0.075, 0.01, 1.0];

    /// Clear color when the CPU path is active
    pub const CPU_CLEAR_COLOR: wgpu::Color = wgpu::Color {
        r: 0.2,
        g: 0.15,
        b: 0.12,
        a: 1.0,
    };

    /// Clear color when the GPU path is active
    pub const GPU_CLEAR_COLOR: wgpu::Color = wgpu::Color {
        r: 0.114,
        g: 0.172,
        b: 0.125,
        a: 1.0,
    };
}

/// View constants
pub mod view {
    /// Vertical field of view (radians)
    pub const FOV_RADIANS: f32 = std::f32::consts::FRAC_PI_3;
    pub const NEAR_PLANE: f32 = 0.1;
    pub const FAR_PLANE: f32 = 500.0;

    /// Camera spawn point, looking down -Z at the unit cube
    pub const SPAWN_POSITION: [f32; 3] = [0.0, 0.0, 1.7];

    /// Movement speed (world units per second)
    pub const MOVEMENT_SPEED: f32 = 2.0;

    /// Look sensitivity (radians per pixel)
    pub const LOOK_SENSITIVITY: f32 = 0.005;

    /// Pitch stays this far from straight up/down
    pub const PITCH_MARGIN: f32 = 0.005;
}
