//! Matrix stack and camera-to-clip pipeline.
//!
//! `Transforms` owns the model-view, projection, and normal matrices and an
//! explicit stack of saved model-view matrices. Traversal pushes before
//! applying per-object offsets and pops afterwards; an unbalanced pop is a
//! caller bug and panics.

use cgmath::{Deg, Matrix, Matrix4, SquareMatrix};

use crate::{gfx::camera::Camera, wgpu_utils::UniformBuffer};

/// Maps OpenGL clip space (z in [-1, 1]) to wgpu clip space (z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Per-object matrix uniform block uploaded before each draw.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MatrixUniform {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 4],
}

impl Default for MatrixUniform {
    fn default() -> Self {
        Self {
            model_view: convert_matrix4_to_array(Matrix4::identity()),
            projection: convert_matrix4_to_array(Matrix4::identity()),
            normal: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}

pub struct Transforms {
    pub model_view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub normal_matrix: Matrix4<f32>,
    stack: Vec<Matrix4<f32>>,
}

impl Transforms {
    pub fn new() -> Self {
        Self {
            model_view: Matrix4::identity(),
            projection: Matrix4::identity(),
            normal_matrix: Matrix4::identity(),
            stack: Vec::new(),
        }
    }

    /// Resets the model-view to the camera's view transform. Call once per
    /// frame (or per object, before applying that object's offsets).
    pub fn calculate_model_view(&mut self, camera: &Camera) {
        self.model_view = camera.view_transform();
    }

    /// Rebuilds the projection matrix from the camera frustum and the
    /// current surface aspect ratio. Call whenever the surface resizes.
    pub fn update_perspective(&mut self, camera: &Camera, width: u32, height: u32) {
        let aspect = width as f32 / height.max(1) as f32;
        self.projection =
            OPENGL_TO_WGPU_MATRIX * cgmath::perspective(Deg(camera.fov), aspect, camera.near, camera.far);
    }

    /// Saves a copy of the current model-view on the stack.
    pub fn push(&mut self) {
        self.stack.push(self.model_view);
    }

    /// Restores the most recently pushed model-view.
    ///
    /// # Panics
    /// Panics when the stack is empty; an unmatched pop corrupts sibling
    /// objects' transforms and is a bug at the call site.
    pub fn pop(&mut self) {
        self.model_view = self
            .stack
            .pop()
            .expect("transform stack underflow: pop() without a matching push()");
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Recomputes the normal matrix from the *current* model-view and
    /// returns the full uniform block. The normal matrix must reflect any
    /// per-object edits made since the last push; a stale one breaks
    /// lighting.
    pub fn matrix_uniform(&mut self) -> MatrixUniform {
        self.normal_matrix = self
            .model_view
            .invert()
            .unwrap_or_else(Matrix4::identity)
            .transpose();

        MatrixUniform {
            model_view: convert_matrix4_to_array(self.model_view),
            projection: convert_matrix4_to_array(self.projection),
            normal: convert_matrix4_to_array(self.normal_matrix),
        }
    }

    /// Recomputes the normal matrix and uploads all three matrices to the
    /// given per-object uniform buffer. Call after per-object transform
    /// edits and before issuing the draw.
    pub fn set_matrix_uniforms(
        &mut self,
        queue: &wgpu::Queue,
        ubo: &mut UniformBuffer<MatrixUniform>,
    ) {
        let uniform = self.matrix_uniform();
        ubo.update_content(queue, uniform);
    }
}

impl Default for Transforms {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn push_pop_restores_model_view_exactly() {
        let mut transforms = Transforms::new();
        transforms.model_view = Matrix4::from_translation(Vector3::new(1.5, -2.0, 3.25));
        let before = transforms.model_view;

        for i in 0..4 {
            transforms.push();
            transforms.model_view =
                transforms.model_view * Matrix4::from_translation(Vector3::new(i as f32, 0.0, 0.0));
        }
        for _ in 0..4 {
            transforms.pop();
        }

        // Bit-identical, not approximately equal: pop restores a copy.
        let after: &[f32; 16] = transforms.model_view.as_ref();
        let expected: &[f32; 16] = before.as_ref();
        assert_eq!(after, expected);
        assert_eq!(transforms.stack_depth(), 0);
    }

    #[test]
    fn single_push_pop_round_trip() {
        let mut transforms = Transforms::new();
        transforms.model_view = Matrix4::from_angle_y(Deg(33.0));
        let before = transforms.model_view;

        transforms.push();
        transforms.model_view = Matrix4::identity();
        transforms.pop();

        let after: &[f32; 16] = transforms.model_view.as_ref();
        let expected: &[f32; 16] = before.as_ref();
        assert_eq!(after, expected);
    }

    #[test]
    #[should_panic(expected = "transform stack underflow")]
    fn pop_on_empty_stack_panics() {
        let mut transforms = Transforms::new();
        transforms.push();
        transforms.pop();
        transforms.pop();
    }

    #[test]
    fn perspective_maps_view_depth_into_unit_range() {
        use crate::gfx::camera::{Camera, CameraMode};

        let camera = Camera::new(CameraMode::Orbiting);
        let mut transforms = Transforms::new();
        transforms.update_perspective(&camera, 800, 600);

        let ndc_depth = |z: f32| {
            let clip = transforms.projection * cgmath::Vector4::new(0.0, 0.0, z, 1.0);
            clip.z / clip.w
        };

        // Near plane lands at 0, far plane at 1 (default frustum is
        // near 0.1, far 10000).
        assert!(ndc_depth(-camera.near).abs() < 1e-4);
        assert!((ndc_depth(-camera.far) - 1.0).abs() < 1e-3);

        // Depths just inside the near plane stay inside the clip volume.
        let d = ndc_depth(-0.11);
        assert!(d > 0.0 && d < 1.0, "depth out of range: {d}");
    }

    #[test]
    fn normal_matrix_is_inverse_transpose_of_model_view() {
        let mut transforms = Transforms::new();
        // Non-uniform scale makes the normal matrix differ from model-view.
        transforms.model_view = Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0);

        let uniform = transforms.matrix_uniform();
        assert!((uniform.normal[0][0] - 0.5).abs() < 1e-6);
        assert!((uniform.normal[1][1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normal_matrix_tracks_per_object_edits() {
        use crate::gfx::camera::{Camera, CameraMode};

        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.go_home(Vector3::new(0.0, 0.0, 10.0));

        let mut transforms = Transforms::new();
        transforms.calculate_model_view(&camera);
        transforms.push();
        transforms.model_view =
            transforms.model_view * Matrix4::from_nonuniform_scale(4.0, 1.0, 1.0);

        // The normal matrix must be derived from the edited model-view,
        // not from the camera-level one.
        let uniform = transforms.matrix_uniform();
        assert!((uniform.normal[0][0] - 0.25).abs() < 1e-6);
        transforms.pop();
    }
}
