//! Shader program loading and pipeline construction.
//!
//! A program is a pair of WGSL files found from one path template:
//! `<dir>/<prefix>_shader_vertex.wgsl` and
//! `<dir>/<prefix>_shader_fragment.wgsl`. Failing to read or compile
//! either file is fatal at startup; there is no hot reload.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::info;

use crate::gfx::scene::Vertex;

pub struct ShaderProgram {
    pub vertex_module: wgpu::ShaderModule,
    pub fragment_module: wgpu::ShaderModule,
    pub prefix: String,
}

impl ShaderProgram {
    /// Expands the path template for one shader stage.
    pub fn stage_path(dir: &Path, prefix: &str, stage: &str) -> PathBuf {
        dir.join(format!("{}_shader_{}.wgsl", prefix, stage))
    }

    /// Loads and compiles both stages of a program.
    pub fn from_prefix(device: &wgpu::Device, dir: &Path, prefix: &str) -> anyhow::Result<Self> {
        let vertex_module = Self::load_stage(device, dir, prefix, "vertex")?;
        let fragment_module = Self::load_stage(device, dir, prefix, "fragment")?;
        info!("compiled shader program '{}'", prefix);

        Ok(Self {
            vertex_module,
            fragment_module,
            prefix: prefix.to_string(),
        })
    }

    fn load_stage(
        device: &wgpu::Device,
        dir: &Path,
        prefix: &str,
        stage: &str,
    ) -> anyhow::Result<wgpu::ShaderModule> {
        let path = Self::stage_path(dir, prefix, stage);
        let source = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {} shader {}", stage, path.display()))?;

        Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(&format!("{} {} shader", prefix, stage)),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        }))
    }

    /// Builds the scene pipeline: triangle list, CCW front faces with
    /// back-face culling, depth test with `Less`.
    pub fn create_pipeline(
        &self,
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        depth_format: wgpu::TextureFormat,
        bind_group_layouts: &[&wgpu::BindGroupLayout],
    ) -> wgpu::RenderPipeline {
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} Pipeline Layout", self.prefix)),
            bind_group_layouts,
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("{} Pipeline", self.prefix)),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.fragment_module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: depth_format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_path_follows_the_template() {
        let path = ShaderProgram::stage_path(Path::new("shader"), "scene", "vertex");
        assert_eq!(path, Path::new("shader/scene_shader_vertex.wgsl"));
        let path = ShaderProgram::stage_path(Path::new("shader"), "scene", "fragment");
        assert_eq!(path, Path::new("shader/scene_shader_fragment.wgsl"));
    }
}
