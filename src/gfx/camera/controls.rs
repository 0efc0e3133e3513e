//! Pointer controls driving the camera and the picker.
//!
//! A left-button drag rotates the camera. If the press landed on a
//! pickable object the drag moves the picked set instead, and releasing
//! without shift commits the picks. Shift-clicking accumulates picks
//! across presses.

use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, Modifiers, MouseButton},
};

use crate::gfx::{picking::Picker, scene::Scene};

use super::Camera;

pub struct Controls {
    dragging: bool,
    /// The current drag started on a picked object and moves it instead
    /// of the camera.
    picking: bool,
    shift: bool,
    cursor: PhysicalPosition<f64>,
    last: PhysicalPosition<f64>,
    pub motion_factor: f32,
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

impl Controls {
    pub fn new() -> Self {
        Self {
            dragging: false,
            picking: false,
            shift: false,
            cursor: PhysicalPosition::new(0.0, 0.0),
            last: PhysicalPosition::new(0.0, 0.0),
            motion_factor: 10.0,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn is_picking(&self) -> bool {
        self.picking
    }

    pub fn modifiers_changed(&mut self, modifiers: &Modifiers) {
        self.shift = modifiers.state().shift_key();
    }

    /// Left-button press starts a drag and asks the picker what sits
    /// under the cursor; a miss commits any pending picks. Release ends
    /// the drag and, without shift held, commits.
    pub fn mouse_input(
        &mut self,
        state: ElementState,
        button: MouseButton,
        surface_height: u32,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        picker: &mut Picker,
        scene: &mut Scene,
    ) {
        if button != MouseButton::Left {
            return;
        }
        match state {
            ElementState::Pressed => {
                self.dragging = true;
                self.last = self.cursor;
                let coords = pick_coords(self.cursor, surface_height);
                self.picking = picker.find(coords, device, queue, scene).is_some();
                if !self.picking {
                    picker.stop(scene);
                }
            }
            ElementState::Released => {
                self.dragging = false;
                if !self.shift {
                    self.picking = false;
                    picker.stop(scene);
                }
            }
        }
    }

    /// Routes pointer motion to either the picked set or the camera.
    /// Returns true when something changed and a redraw is due.
    pub fn cursor_moved(
        &mut self,
        position: PhysicalPosition<f64>,
        surface_size: (u32, u32),
        camera: &mut Camera,
        picker: &Picker,
        scene: &mut Scene,
    ) -> bool {
        let dx = (position.x - self.last.x) as f32;
        let dy = (position.y - self.last.y) as f32;
        self.cursor = position;
        if !self.dragging {
            return false;
        }
        self.last = position;

        if self.picking {
            picker.move_hits(dx, dy, camera, scene);
        } else {
            self.rotate(dx, dy, camera, surface_size);
        }
        true
    }

    fn rotate(&self, dx: f32, dy: f32, camera: &mut Camera, surface_size: (u32, u32)) {
        let (width, height) = surface_size;
        if width == 0 || height == 0 {
            return;
        }
        let delta_azimuth = -20.0 / width as f32;
        let delta_elevation = -20.0 / height as f32;
        camera.change_azimuth(dx * delta_azimuth * self.motion_factor);
        camera.change_elevation(-dy * delta_elevation * self.motion_factor);
    }
}

/// Converts a window cursor position (origin top-left) into picking
/// coordinates (origin bottom-left), clamped to the surface.
pub fn pick_coords(cursor: PhysicalPosition<f64>, surface_height: u32) -> (u32, u32) {
    let x = cursor.x.max(0.0) as u32;
    let y = cursor.y.max(0.0) as u32;
    let top_row = surface_height.saturating_sub(1);
    let flipped = top_row - y.min(top_row);
    (x, flipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::camera::CameraMode;
    use cgmath::Vector3;

    #[test]
    fn pick_coords_flip_the_y_axis() {
        // Top of a 600px surface maps to the last row, bottom to the first.
        assert_eq!(pick_coords(PhysicalPosition::new(10.0, 0.0), 600), (10, 599));
        assert_eq!(pick_coords(PhysicalPosition::new(10.0, 599.0), 600), (10, 0));
        // Out-of-window coordinates clamp instead of wrapping.
        assert_eq!(pick_coords(PhysicalPosition::new(-5.0, 1000.0), 600), (0, 0));
    }

    #[test]
    fn drag_rotates_the_camera() {
        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.go_home(Vector3::new(0.0, 0.0, 50.0));
        let controls = Controls::new();

        // A full-width drag at the default motion factor sweeps 200
        // degrees of azimuth, wrapped into [0, 360).
        controls.rotate(800.0, 0.0, &mut camera, (800, 600));
        assert!((camera.azimuth() - 160.0).abs() < 1e-4);

        controls.rotate(0.0, 600.0, &mut camera, (800, 600));
        assert!((camera.elevation() - 200.0).abs() < 1e-4);
    }

    #[test]
    fn motion_outside_a_drag_only_tracks_the_cursor() {
        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.go_home(Vector3::new(0.0, 0.0, 50.0));
        let mut controls = Controls::new();
        let picker = Picker::new();
        let mut scene = Scene::new();

        let redraw = controls.cursor_moved(
            PhysicalPosition::new(100.0, 100.0),
            (800, 600),
            &mut camera,
            &picker,
            &mut scene,
        );
        assert!(!redraw);
        assert_eq!(camera.azimuth(), 0.0);
        assert_eq!(camera.elevation(), 0.0);
    }
}
