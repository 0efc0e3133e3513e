//! # Graphics Module
//!
//! Scene management, cameras, transforms, picking, and the wgpu render
//! engine. The data-model types ([`scene`], [`camera`], [`transforms`],
//! [`geometry`]) are usable headless; [`rendering`] and [`picking`] own the
//! GPU-facing half.

pub mod camera;
pub mod geometry;
pub mod picking;
pub mod rendering;
pub mod resources;
pub mod scene;
pub mod transforms;
