use std::sync::Arc;

use anyhow::Context;
use cgmath::Vector3;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::gfx::{
    camera::{Camera, CameraMode, Controls},
    picking::Picker,
    rendering::Renderer,
    scene::Scene,
    transforms::Transforms,
};

/// Windowed application wiring the scene, camera, picker and renderer
/// into a winit event loop.
pub struct GlintApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    scene: Scene,
    camera: Camera,
    transforms: Transforms,
    picker: Picker,
    controls: Controls,
}

impl GlintApp {
    /// Create a new application with default settings
    pub fn new() -> Self {
        env_logger::init();
        let event_loop = EventLoop::new().expect("Failed to create event loop");

        let mut camera = Camera::new(CameraMode::Orbiting);
        camera.go_home(Vector3::new(0.0, 2.0, 80.0));

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                renderer: None,
                scene: Scene::new(),
                camera,
                transforms: Transforms::new(),
                picker: Picker::new(),
                controls: Controls::new(),
            },
        }
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.app_state.scene
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.app_state.camera
    }

    pub fn picker_mut(&mut self) -> &mut Picker {
        &mut self.app_state.picker
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated with an error")?;
        Ok(())
    }
}

impl Default for GlintApp {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default().with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();

            let window_clone = window_handle.clone();
            let renderer =
                pollster::block_on(async move { Renderer::new(window_clone, width, height).await });

            self.picker.configure(renderer.device(), width, height);
            self.renderer = Some(renderer);
            log::debug!("renderer initialized at {}x{}", width, height);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let Some(window) = self.window.as_ref() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        ..
                    },
                ..
            } => {
                if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.controls.modifiers_changed(&modifiers);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let (_, height) = renderer.surface_size();
                self.controls.mouse_input(
                    state,
                    button,
                    height,
                    renderer.device(),
                    renderer.queue(),
                    &mut self.picker,
                    &mut self.scene,
                );
                window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let redraw = self.controls.cursor_moved(
                    position,
                    renderer.surface_size(),
                    &mut self.camera,
                    &self.picker,
                    &mut self.scene,
                );
                if redraw {
                    window.request_redraw();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                renderer.resize(width, height, &mut self.picker);
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                renderer.render_frame(
                    &mut self.scene,
                    &self.camera,
                    &mut self.transforms,
                    &mut self.picker,
                );
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
