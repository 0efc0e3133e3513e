//! GPU texture resources.

pub mod texture_resource;

pub use texture_resource::TextureResource;
