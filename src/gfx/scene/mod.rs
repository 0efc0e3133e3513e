//! # Scene Management Module
//!
//! The scene owns the list of renderable objects and their GPU buffer
//! resources. Objects carry geometry (immutable once added), a material
//! with OBJ-style alias defaulting, render-state flags, and the optional
//! picking fields the [`Picker`](crate::gfx::picking::Picker) uses.
//!
//! Assets are the demos' JSON geometry schema, loaded best-effort: a failed
//! read or parse logs a warning and leaves the scene unchanged.

pub mod asset;
pub mod material;
pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use asset::AssetError;
pub use material::Material;
pub use object::{ObjectOptions, SceneObject};
pub use scene::Scene;
pub use vertex::Vertex3D;
