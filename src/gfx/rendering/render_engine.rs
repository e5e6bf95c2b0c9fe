//! wgpu-based render engine: surface, device, pipeline, frame loop.

use std::path::Path;

use anyhow::Context;
use cgmath::{perspective, Deg, Matrix4, SquareMatrix};

use crate::gfx::camera::camera_utils::{
    convert_matrix4_to_array, FrameUniforms, ObjectUniforms, OPENGL_TO_WGPU_MATRIX,
};
use crate::gfx::camera::Camera;
use crate::gfx::resources::{
    material_bind_group_layout, FrameBindings, ObjectBindings, TextureResource,
};
use crate::gfx::scene::Model;

use super::shader_program::ShaderProgram;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.2,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};
const LIGHT_POS: [f32; 4] = [1.0, 1.0, 2.0, 1.0];
const FOV_Y_DEG: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 100.0;

/// Core render state: one surface, one pipeline, one model slot.
pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: TextureResource,
    frame_bindings: FrameBindings,
    object_bindings: ObjectBindings,
    material_layout: wgpu::BindGroupLayout,
    pipeline: wgpu::RenderPipeline,
}

impl RenderEngine {
    /// Initializes the GPU context for a window and compiles the scene
    /// shader program from `shader_dir`.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        shader_dir: &Path,
    ) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create render surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no compatible graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("WGPU Device"),
                required_features: wgpu::Features::default(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to acquire graphics device")?;

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            // Fifo is vsync; the frame loop paces itself against it.
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, "Depth Texture");

        let frame_bindings = FrameBindings::new(&device);
        let object_bindings = ObjectBindings::new(&device);
        let material_layout = material_bind_group_layout(&device);

        let program = ShaderProgram::from_prefix(&device, shader_dir, "scene")?;
        let pipeline = program.create_pipeline(
            &device,
            config.format,
            TextureResource::DEPTH_FORMAT,
            &[
                &frame_bindings.layout,
                &object_bindings.layout,
                &material_layout,
            ],
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            frame_bindings,
            object_bindings,
            material_layout,
            pipeline,
        })
    }

    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    /// Reconfigures the surface and depth buffer. Zero-sized resize
    /// requests (minimized window) are ignored.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        self.depth_texture =
            TextureResource::create_depth_texture(&self.device, &self.config, "Depth Texture");
    }

    /// Writes the per-frame and per-object uniforms from camera state.
    /// The model matrix stays identity; object rotation lives in the
    /// camera's view matrix.
    pub fn update(&mut self, camera: &Camera) {
        let projection = OPENGL_TO_WGPU_MATRIX
            * perspective(Deg(FOV_Y_DEG), self.aspect_ratio(), Z_NEAR, Z_FAR);

        let frame = FrameUniforms {
            view_mat: convert_matrix4_to_array(camera.view_mat()),
            projection_mat: convert_matrix4_to_array(projection),
            camera_pos: camera.position.extend(1.0).into(),
            camera_front: camera.front.extend(0.0).into(),
            light_pos: LIGHT_POS,
        };
        self.frame_bindings.ubo.update_content(&self.queue, frame);

        let object = ObjectUniforms {
            model_mat: convert_matrix4_to_array(Matrix4::identity()),
            normal_model_mat: convert_matrix4_to_array(Matrix4::identity()),
        };
        self.object_bindings.ubo.update_content(&self.queue, object);
    }

    /// Renders one frame: clear, then draw the model if one is loaded.
    pub fn render_frame(&mut self, model: Option<&Model>) -> Result<(), wgpu::SurfaceError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                // Surface state went stale, reconfigure and retry once.
                self.surface.configure(&self.device, &self.config);
                self.surface.get_current_texture()?
            }
            Err(err) => return Err(err),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_pipeline(&self.pipeline);
            render_pass.set_bind_group(0, &self.frame_bindings.bind_group, &[]);
            render_pass.set_bind_group(1, &self.object_bindings.bind_group, &[]);

            if let Some(model) = model {
                model.draw(&mut render_pass);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}
