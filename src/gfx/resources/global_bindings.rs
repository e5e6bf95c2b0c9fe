//! Bind group layouts and groups shared by every draw call.
//!
//! Group 0 carries per-frame data, group 1 per-object data, group 2
//! the material textures. The layouts here MUST match the group and
//! binding declarations in the WGSL shaders exactly.

use crate::gfx::camera::camera_utils::{FrameUniforms, ObjectUniforms};
use crate::gfx::scene::TextureChannel;
use crate::wgpu_utils::{binding_types, UniformBuffer};

/// Per-frame uniform buffer plus its layout and bind group (group 0).
pub struct FrameBindings {
    pub ubo: UniformBuffer<FrameUniforms>,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl FrameBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let ubo = UniformBuffer::new_with_data(device, &FrameUniforms::default());
        let (layout, bind_group) = uniform_binding(device, "Frame", &ubo, wgpu::ShaderStages::VERTEX_FRAGMENT);
        Self {
            ubo,
            layout,
            bind_group,
        }
    }
}

/// Per-object uniform buffer plus its layout and bind group (group 1).
pub struct ObjectBindings {
    pub ubo: UniformBuffer<ObjectUniforms>,
    pub layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl ObjectBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let ubo = UniformBuffer::new_with_data(device, &ObjectUniforms::default());
        let (layout, bind_group) = uniform_binding(device, "Object", &ubo, wgpu::ShaderStages::VERTEX);
        Self {
            ubo,
            layout,
            bind_group,
        }
    }
}

fn uniform_binding<Content: bytemuck::Pod>(
    device: &wgpu::Device,
    label: &str,
    ubo: &UniformBuffer<Content>,
    visibility: wgpu::ShaderStages,
) -> (wgpu::BindGroupLayout, wgpu::BindGroup) {
    let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} Bind Group Layout", label)),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: binding_types::uniform(),
            count: None,
        }],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{} Bind Group", label)),
        layout: &layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: ubo.binding_resource(),
        }],
    });

    (layout, bind_group)
}

/// Layout for group 2: one sampler at binding 0, then one texture per
/// material channel at that channel's binding.
pub fn material_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = vec![wgpu::BindGroupLayoutEntry {
        binding: 0,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: binding_types::sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }];
    for channel in TextureChannel::ALL {
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: channel.binding(),
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: binding_types::texture_2d(),
            count: None,
        });
    }

    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Material Bind Group Layout"),
        entries: &entries,
    })
}
