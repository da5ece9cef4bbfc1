/// Renderer Module - Data-Oriented Programming (DOP) style
///
/// - renderer_data.rs: GPU resources and per-frame inputs, no methods
/// - renderer_operations.rs: device setup, frame orchestration, resizing
/// - cpu_submitter.rs: wgpu-backed `DrawSubmitter` for the CPU path
///
/// One frame is one command encoder and one submit in either mode.

pub mod cpu_submitter;
pub mod renderer_data;
pub mod renderer_operations;

pub use cpu_submitter::GpuBatchSubmitter;
pub use renderer_data::{
    BatchBufferPool, BatchBuffers, DepthTarget, FrameInput, FrameStats, ResourceSizes,
    SurfaceRendererData,
};
pub use renderer_operations::{
    create_depth_target, create_renderer, render_frame, request_device, resource_sizes,
    set_blob_count, set_resolution,
};
