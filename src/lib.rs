// src/lib.rs
//! Glint
//!
//! A small 3D scene, camera, and GPU color-id picking toolkit built on wgpu
//! and winit. A [`Scene`](gfx::scene::Scene) owns renderable objects and
//! their GPU buffers, [`Transforms`](gfx::transforms::Transforms) keeps the
//! matrix stack and the camera-to-clip pipeline, and
//! [`Picker`](gfx::picking::Picker) resolves pointer clicks to objects by
//! rendering flat per-object colors off-screen and reading back a single
//! pixel.

pub mod app;
pub mod gfx;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::GlintApp;

/// Creates a default Glint application instance
pub fn default() -> GlintApp {
    GlintApp::new()
}
