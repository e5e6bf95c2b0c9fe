//! Rendering backbone: shader programs and the wgpu render engine.

pub mod render_engine;
pub mod shader_program;

pub use render_engine::RenderEngine;
pub use shader_program::ShaderProgram;
