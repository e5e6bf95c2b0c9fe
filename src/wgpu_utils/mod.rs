//! WGPU utility helpers
//!
//! Small wrappers for the uniform-buffer and binding plumbing used by
//! the render engine.

pub mod binding_types;
pub mod uniform_buffer;

pub use uniform_buffer::UniformBuffer;
