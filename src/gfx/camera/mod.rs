pub mod camera;
pub mod controls;

// Re-export main types
pub use camera::{Camera, CameraMode};
pub use controls::Controls;
