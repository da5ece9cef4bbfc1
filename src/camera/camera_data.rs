//! Camera data structures - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in camera_operations.rs

use cgmath::Point3;
use static_assertions::const_assert_eq;

/// Immutable camera pose handed to the core once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSnapshot {
    pub position: [f32; 3],
    /// Rotation around Y (radians)
    pub yaw: f32,
    /// Rotation around the camera's right axis (radians)
    pub pitch: f32,
}

/// Free-fly camera owned by a driver
#[derive(Debug, Clone, Copy)]
pub struct CameraData {
    pub position: Point3<f32>,
    pub yaw_radians: f32,
    pub pitch_radians: f32,

    /// Aspect ratio (width / height)
    pub aspect_ratio: f32,

    /// Movement speed (world units per second)
    pub movement_speed: f32,

    /// Rotation sensitivity (radians per pixel)
    pub rotation_sensitivity: f32,
}

/// Held movement keys and accumulated look delta for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,

    /// Pointer movement in pixels since the last frame
    pub look_delta: [f32; 2],
}

/// Per-frame uniform shared by both surface pipelines
/// Must match `SceneUniforms` in the WGSL sources
#[repr(C)]
#[derive(Debug, Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    /// View-projection matrix (4x4, column-major)
    pub view_projection: [[f32; 4]; 4],

    /// Normalized light direction (vec3 + padding)
    pub light_direction: [f32; 4],
    pub light_color: [f32; 4],
    pub ambient_up: [f32; 4],
    pub ambient_down: [f32; 4],
}

const_assert_eq!(std::mem::size_of::<SceneUniform>() % 16, 0);
