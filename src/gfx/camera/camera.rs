//! Orbiting and tracking camera.
//!
//! Angles are stored in degrees and wrapped into `[0, 360)`; conversion to
//! radians happens only when the world matrix is composed. The view
//! transform consumed by rendering is always the inverse of the camera's
//! own world matrix.

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3, Vector4};

/// How the camera interprets its position and angles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// The camera rotates around a fixed focus point; `position` is the
    /// offset from that focus.
    Orbiting,
    /// The camera rotates about its own evolving eye point.
    Tracking,
}

pub struct Camera {
    mode: CameraMode,

    /// Eye placement. In orbiting mode this is the caller-supplied offset
    /// from the focus point. In tracking mode it is re-derived from the
    /// composed matrix on every [`update`](Self::update), so after the
    /// first update it is an output of the camera, not an input. This dual
    /// role is preserved from the original design on purpose.
    position: Vector3<f32>,

    // Derived basis vectors, transformed unit axes of `matrix`.
    right: Vector3<f32>,
    up: Vector3<f32>,
    normal: Vector3<f32>,

    /// The camera's own world placement. Only `update()` writes this.
    matrix: Matrix4<f32>,

    // Degrees, wrapped into [0, 360).
    azimuth: f32,
    elevation: f32,

    /// Cumulative dolly step; `dolly()` applies only the delta against it.
    steps: f32,

    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(mode: CameraMode) -> Self {
        let mut camera = Self {
            mode,
            position: Vector3::new(0.0, 0.0, 0.0),
            right: Vector3::unit_x(),
            up: Vector3::unit_y(),
            normal: Vector3::unit_z(),
            matrix: Matrix4::identity(),
            azimuth: 0.0,
            elevation: 0.0,
            steps: 0.0,
            fov: 45.0,
            near: 0.1,
            far: 10000.0,
        };
        camera.update();
        camera
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn elevation(&self) -> f32 {
        self.elevation
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }

    pub fn up(&self) -> Vector3<f32> {
        self.up
    }

    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// The camera's world placement, as last composed by `update()`.
    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    /// Resets position to `home` and both angles to zero.
    pub fn go_home(&mut self, home: Vector3<f32>) {
        self.position = home;
        self.azimuth = 0.0;
        self.elevation = 0.0;
        self.steps = 0.0;
        self.update();
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.position = position;
        self.update();
    }

    /// Absolute azimuth in degrees, applied as a delta against the current
    /// value.
    pub fn set_azimuth(&mut self, azimuth: f32) {
        self.change_azimuth(azimuth - self.azimuth);
    }

    pub fn change_azimuth(&mut self, delta: f32) {
        self.azimuth = (self.azimuth + delta).rem_euclid(360.0);
        self.update();
    }

    /// Absolute elevation in degrees, applied as a delta against the
    /// current value.
    pub fn set_elevation(&mut self, elevation: f32) {
        self.change_elevation(elevation - self.elevation);
    }

    pub fn change_elevation(&mut self, delta: f32) {
        self.elevation = (self.elevation + delta).rem_euclid(360.0);
        self.update();
    }

    /// Moves the camera along its forward axis. `step_increment` is
    /// cumulative; only the delta against the previously applied step is
    /// walked. Positionally a no-op in tracking mode, which records the
    /// step but keeps the eye where the composed matrix put it.
    pub fn dolly(&mut self, step_increment: f32) {
        let step = step_increment - self.steps;
        self.steps = step_increment;

        if self.mode == CameraMode::Orbiting {
            // The offset is pre-rotation (matrix = rotation * translation),
            // so stepping its z component changes the orbit distance no
            // matter where the camera has rotated to.
            self.position.z -= step;
            self.update();
        }
    }

    /// Rebuilds `matrix` from position and angles.
    ///
    /// Orbiting composes rotations before the translation so the camera
    /// circles a fixed focus; tracking translates first and then re-extracts
    /// the eye point from the composed matrix.
    pub fn update(&mut self) {
        let rotation =
            Matrix4::from_angle_y(Deg(self.azimuth)) * Matrix4::from_angle_x(Deg(self.elevation));
        let translation = Matrix4::from_translation(self.position);

        self.matrix = match self.mode {
            CameraMode::Tracking => translation * rotation,
            CameraMode::Orbiting => rotation * translation,
        };

        if self.mode == CameraMode::Tracking {
            let eye = self.matrix * Vector4::new(0.0, 0.0, 0.0, 1.0);
            self.position = eye.truncate();
        }

        self.right = (self.matrix * Vector4::unit_x()).truncate();
        self.up = (self.matrix * Vector4::unit_y()).truncate();
        self.normal = (self.matrix * Vector4::unit_z()).truncate();
    }

    /// The model-view basis consumed by rendering: the inverse of the
    /// camera's own world placement.
    pub fn view_transform(&self) -> Matrix4<f32> {
        // Rotation * translation is always invertible.
        self.matrix.invert().unwrap_or_else(Matrix4::identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::InnerSpace;

    const EPS: f32 = 1e-5;

    fn assert_matrix_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < EPS, "matrices differ: {:?} vs {:?}", a, b);
        }
    }

    #[test]
    fn angles_wrap_into_zero_to_360() {
        let mut camera = Camera::new(CameraMode::Orbiting);

        camera.change_azimuth(-10.0);
        assert!((camera.azimuth() - 350.0).abs() < EPS);

        camera.change_azimuth(20.0);
        assert!((camera.azimuth() - 10.0).abs() < EPS);

        camera.change_elevation(725.0);
        assert!((camera.elevation() - 5.0).abs() < EPS);

        for delta in [-33.0, 720.0, -359.5, 12.25] {
            camera.change_azimuth(delta);
            camera.change_elevation(delta);
            assert!(camera.azimuth() >= 0.0 && camera.azimuth() < 360.0);
            assert!(camera.elevation() >= 0.0 && camera.elevation() < 360.0);
        }
    }

    #[test]
    fn view_transform_inverts_camera_matrix() {
        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.go_home(Vector3::new(3.0, -1.5, 40.0));
        camera.set_azimuth(37.0);
        camera.set_elevation(-22.0);

        let product = camera.view_transform() * camera.matrix();
        assert_matrix_eq(product, Matrix4::identity());
    }

    #[test]
    fn orbiting_home_view_is_negated_translation() {
        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.go_home(Vector3::new(0.0, 2.0, 50.0));

        let view = camera.view_transform();
        assert!((view.w.x - 0.0).abs() < EPS);
        assert!((view.w.y - -2.0).abs() < EPS);
        assert!((view.w.z - -50.0).abs() < EPS);
    }

    #[test]
    fn tracking_update_rederives_position() {
        let mut camera = Camera::new(CameraMode::Tracking);
        camera.go_home(Vector3::new(0.0, 0.0, 10.0));

        // With no rotation the eye stays where the caller put it.
        let p = camera.position();
        assert!((p.z - 10.0).abs() < EPS);

        // Rotating does not move the eye: translation is composed first,
        // so the re-extracted origin is unchanged.
        camera.set_azimuth(90.0);
        let p = camera.position();
        assert!((p.x - 0.0).abs() < EPS);
        assert!((p.z - 10.0).abs() < EPS);
    }

    #[test]
    fn dolly_applies_incremental_delta_in_orbiting_mode() {
        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.go_home(Vector3::new(0.0, 0.0, 50.0));

        camera.dolly(2.0);
        assert!((camera.position().z - 48.0).abs() < EPS);

        // Cumulative: a second call with the same value is a no-op.
        camera.dolly(2.0);
        assert!((camera.position().z - 48.0).abs() < EPS);

        camera.dolly(5.0);
        assert!((camera.position().z - 45.0).abs() < EPS);
    }

    #[test]
    fn dolly_changes_orbit_distance_under_rotation() {
        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.go_home(Vector3::new(0.0, 0.0, 50.0));
        camera.set_azimuth(90.0);

        camera.dolly(10.0);

        // The eye closes in on the focus point by the step, wherever the
        // orbit has rotated to.
        let eye = (camera.matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate();
        assert!((eye.magnitude() - 40.0).abs() < 1e-3);

        camera.dolly(25.0);
        let eye = (camera.matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0)).truncate();
        assert!((eye.magnitude() - 25.0).abs() < 1e-3);
    }

    #[test]
    fn dolly_keeps_tracking_position() {
        let mut camera = Camera::new(CameraMode::Tracking);
        camera.go_home(Vector3::new(0.0, 0.0, 10.0));

        camera.dolly(3.0);
        assert!((camera.position().z - 10.0).abs() < EPS);
    }

    #[test]
    fn basis_vectors_follow_rotation() {
        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.set_azimuth(90.0);

        // After a 90 degree yaw the camera's forward axis points along -x.
        let n = camera.normal();
        assert!((n.x - 1.0).abs() < 1e-4 || (n.x + 1.0).abs() < 1e-4);
        assert!(n.z.abs() < 1e-4);

        let u = camera.up();
        assert!((u.y - 1.0).abs() < 1e-4);
    }
}
