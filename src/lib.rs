// Metaball Surface - Data-Oriented Programming (DOP) Architecture
//
// Real-time isosurface of animated metaballs with two extraction paths:
// - CPU: dense scalar field, marching cubes, batched triangle uploads
// - GPU: field rasterized into a tiled atlas, index-only marching cubes draw
//
// For new code, prefer:
// - *_data modules for plain data
// - *_operations modules for transformations
// - Pure functions over methods

// Constants module
pub mod constants;

// Core modules
pub mod config;
pub mod error;

// Surface extraction
pub mod batch;
pub mod field;
pub mod marching_cubes;

// Rendering
pub mod camera;
pub mod gpu;
pub mod renderer;

pub use batch::{CollectedMesh, DrawSubmitter, PrimitiveKind, TriangleBatchData};
pub use camera::{CameraData, CameraInput, CameraSnapshot};
pub use config::{load_config, BlobCount, RenderMode, Resolution, SurfaceConfig, SurfaceSettings};
pub use error::{EngineError, EngineResult, ErrorContext};
pub use field::{Blob, BlobSet, ScalarField};
pub use marching_cubes::{CpuExtractorData, ExtractionStats};
pub use renderer::{
    create_depth_target, create_renderer, render_frame, request_device, resource_sizes,
    set_blob_count, set_resolution, DepthTarget, FrameInput, FrameStats, ResourceSizes,
    SurfaceRendererData,
};
