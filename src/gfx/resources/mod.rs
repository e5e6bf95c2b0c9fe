//! GPU resource management: textures and shared uniform bindings.

pub mod global_bindings;
pub mod texture_resource;

pub use global_bindings::{material_bind_group_layout, FrameBindings, ObjectBindings};
pub use texture_resource::TextureResource;
