//! Camera operations - Pure DOP functions
//!
//! All functions are pure: they take data, return new data, no side effects.
//! No methods, no self, just transformations.

use super::camera_data::{CameraData, CameraInput, CameraSnapshot, SceneUniform};
use crate::constants::{lighting, view};
use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3};

/// Remaps OpenGL clip depth [-1, 1] to wgpu's [0, 1]
#[rustfmt::skip]
const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize camera with default settings
pub fn init_camera(position: Point3<f32>, yaw: f32, pitch: f32) -> CameraData {
    CameraData {
        position,
        yaw_radians: yaw,
        pitch_radians: pitch,
        aspect_ratio: 1.0,
        movement_speed: view::MOVEMENT_SPEED,
        rotation_sensitivity: view::LOOK_SENSITIVITY,
    }
}

/// Initialize camera at the default spawn, looking down -Z
pub fn init_camera_at_spawn() -> CameraData {
    let [x, y, z] = view::SPAWN_POSITION;
    init_camera(Point3::new(x, y, z), 0.0, 0.0)
}

// ============================================================================
// VIEW/PROJECTION MATRICES
// ============================================================================

/// Build view matrix from a camera pose
pub fn build_view_matrix(camera: &CameraSnapshot) -> Matrix4<f32> {
    let [x, y, z] = camera.position;
    let eye = Point3::new(x, y, z);
    let forward = calculate_forward_vector(camera.yaw, camera.pitch);
    let up = Vector3::new(0.0, 1.0, 0.0);

    Matrix4::look_at_rh(eye, eye + forward, up)
}

/// Build projection matrix for the given aspect ratio
pub fn build_projection_matrix(aspect_ratio: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX
        * cgmath::perspective(
            Rad(view::FOV_RADIANS),
            aspect_ratio,
            view::NEAR_PLANE,
            view::FAR_PLANE,
        )
}

pub fn build_view_projection(camera: &CameraSnapshot, aspect_ratio: f32) -> Matrix4<f32> {
    build_projection_matrix(aspect_ratio) * build_view_matrix(camera)
}

/// Build the per-frame scene uniform for GPU
pub fn build_scene_uniform(camera: &CameraSnapshot, aspect_ratio: f32) -> SceneUniform {
    let light = Vector3::from(lighting::LIGHT_DIRECTION).normalize();

    SceneUniform {
        view_projection: build_view_projection(camera, aspect_ratio).into(),
        light_direction: [light.x, light.y, light.z, 0.0],
        light_color: lighting::LIGHT_COLOR,
        ambient_up: lighting::AMBIENT_UP,
        ambient_down: lighting::AMBIENT_DOWN,
    }
}

// ============================================================================
// UPDATES
// ============================================================================

/// Update aspect ratio (e.g., on window resize)
pub fn update_aspect_ratio(camera: &CameraData, width: u32, height: u32) -> CameraData {
    let mut new_camera = *camera;
    new_camera.aspect_ratio = width.max(1) as f32 / height.max(1) as f32;
    new_camera
}

/// Rotate camera by a pointer delta in pixels
///
/// Moving the pointer right or down turns the view right or down.
pub fn rotate(camera: &CameraData, dx: f32, dy: f32) -> CameraData {
    let mut new_camera = *camera;
    new_camera.yaw_radians -= dx * camera.rotation_sensitivity;
    new_camera.pitch_radians -= dy * camera.rotation_sensitivity;

    let pitch_limit = std::f32::consts::FRAC_PI_2 - view::PITCH_MARGIN;
    new_camera.pitch_radians = new_camera.pitch_radians.clamp(-pitch_limit, pitch_limit);

    new_camera
}

/// Apply one frame of input: look first, then move along the new heading
pub fn apply_input(camera: &CameraData, input: &CameraInput, delta_time: f32) -> CameraData {
    let mut result = rotate(camera, input.look_delta[0], input.look_delta[1]);

    let forward = calculate_forward_vector(result.yaw_radians, result.pitch_radians);
    let right = calculate_right_vector(result.yaw_radians);
    let step = result.movement_speed * delta_time;

    let mut movement = Vector3::new(0.0, 0.0, 0.0);
    if input.forward {
        movement += forward * step;
    }
    if input.back {
        movement -= forward * step;
    }
    if input.left {
        movement -= right * step;
    }
    if input.right {
        movement += right * step;
    }
    if input.down {
        movement.y -= step;
    }
    if input.up {
        movement.y += step;
    }

    result.position += movement;
    result
}

/// Freeze the current pose for the core
pub fn snapshot(camera: &CameraData) -> CameraSnapshot {
    CameraSnapshot {
        position: camera.position.into(),
        yaw: camera.yaw_radians,
        pitch: camera.pitch_radians,
    }
}

// ============================================================================
// UTILITIES
// ============================================================================

/// Calculate forward vector from yaw and pitch (yaw 0 looks down -Z)
pub fn calculate_forward_vector(yaw: f32, pitch: f32) -> Vector3<f32> {
    Vector3::new(
        -yaw.sin() * pitch.cos(),
        pitch.sin(),
        -yaw.cos() * pitch.cos(),
    )
}

/// Calculate right vector from yaw
pub fn calculate_right_vector(yaw: f32) -> Vector3<f32> {
    Vector3::new(yaw.cos(), 0.0, -yaw.sin())
}

/// Log camera context for debugging
pub fn log_camera_context(camera: &CameraData) {
    log::debug!(
        "[Camera] Position: ({:.2}, {:.2}, {:.2}) | Yaw: {:.3}rad ({:.1}°) | Pitch: {:.3}rad ({:.1}°)",
        camera.position.x,
        camera.position.y,
        camera.position.z,
        camera.yaw_radians,
        camera.yaw_radians.to_degrees(),
        camera.pitch_radians,
        camera.pitch_radians.to_degrees()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn test_spawn_looks_down_negative_z() {
        let camera = init_camera_at_spawn();
        assert_eq!(snapshot(&camera).position, [0.0, 0.0, 1.7]);

        let forward = calculate_forward_vector(camera.yaw_radians, camera.pitch_radians);
        assert!(approx(forward.z, -1.0));
        let right = calculate_right_vector(camera.yaw_radians);
        assert!(approx(right.x, 1.0));
    }

    #[test]
    fn test_basis_is_orthonormal() {
        for (yaw, pitch) in [(0.3, 0.2), (-2.0, 1.1), (4.0, -0.7)] {
            let forward = calculate_forward_vector(yaw, pitch);
            let right = calculate_right_vector(yaw);
            assert!(approx(forward.magnitude(), 1.0));
            assert!(approx(right.magnitude(), 1.0));
            assert!(approx(forward.dot(right), 0.0));
        }
    }

    #[test]
    fn test_pitch_is_clamped() {
        let camera = init_camera_at_spawn();
        let looked_up = rotate(&camera, 0.0, -100_000.0);
        let limit = std::f32::consts::FRAC_PI_2 - view::PITCH_MARGIN;
        assert!(approx(looked_up.pitch_radians, limit));

        let looked_down = rotate(&camera, 0.0, 100_000.0);
        assert!(approx(looked_down.pitch_radians, -limit));
    }

    #[test]
    fn test_forward_input_moves_along_heading() {
        let camera = init_camera_at_spawn();
        let input = CameraInput {
            forward: true,
            ..Default::default()
        };
        let moved = apply_input(&camera, &input, 0.5);
        // speed 2 for half a second
        assert!(approx(moved.position.z, 1.7 - 1.0));
        assert!(approx(moved.position.x, 0.0));
    }

    #[test]
    fn test_vertical_input_ignores_heading() {
        let camera = rotate(&init_camera_at_spawn(), 50.0, -80.0);
        let input = CameraInput {
            up: true,
            ..Default::default()
        };
        let moved = apply_input(&camera, &input, 1.0);
        assert!(approx(moved.position.y, 2.0));
        assert!(approx(moved.position.x, camera.position.x));
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let camera = init_camera_at_spawn();
        let input = CameraInput {
            left: true,
            right: true,
            forward: true,
            back: true,
            ..Default::default()
        };
        let moved = apply_input(&camera, &input, 1.0);
        assert_eq!(moved.position, camera.position);
    }

    #[test]
    fn test_view_projection_maps_into_wgpu_depth_range() {
        let camera = snapshot(&init_camera_at_spawn());
        let view_proj = build_view_projection(&camera, 16.0 / 9.0);

        // Origin sits straight ahead of the spawn point
        let clip = view_proj * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc_z = clip.z / clip.w;
        assert!(clip.w > 0.0);
        assert!((0.0..=1.0).contains(&ndc_z));
        assert!(approx(clip.x / clip.w, 0.0));

        // Points behind the camera end up with negative w
        let behind = view_proj * Vector4::new(0.0, 0.0, 3.0, 1.0);
        assert!(behind.w < 0.0);
    }

    #[test]
    fn test_scene_uniform_light_is_normalized() {
        let uniform = build_scene_uniform(&snapshot(&init_camera_at_spawn()), 1.0);
        let [x, y, z, w] = uniform.light_direction;
        assert!(approx((x * x + y * y + z * z).sqrt(), 1.0));
        assert_eq!(w, 0.0);
        assert_eq!(uniform.light_color, lighting::LIGHT_COLOR);
    }

    #[test]
    fn test_aspect_ratio_guards_zero_height() {
        let camera = update_aspect_ratio(&init_camera_at_spawn(), 800, 0);
        assert!(camera.aspect_ratio.is_finite());
    }
}
