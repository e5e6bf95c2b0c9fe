use wgpu::util::DeviceExt;

use crate::gfx::resources::texture_resource::TextureResource;

use super::model::TextureSlot;
use super::vertex::Vertex;

/// Semantic role of a texture within a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureChannel {
    Diffuse,
    Specular,
    Normal,
    Height,
}

impl TextureChannel {
    /// Extraction order is fixed: diffuse, specular, normal, height.
    pub const ALL: [TextureChannel; 4] = [
        TextureChannel::Diffuse,
        TextureChannel::Specular,
        TextureChannel::Normal,
        TextureChannel::Height,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TextureChannel::Diffuse => "diffuse",
            TextureChannel::Specular => "specular",
            TextureChannel::Normal => "normal",
            TextureChannel::Height => "height",
        }
    }

    /// Bind group slot of the first texture of this channel in the
    /// material bind group (binding 0 is the sampler).
    pub fn binding(self) -> u32 {
        match self {
            TextureChannel::Diffuse => 1,
            TextureChannel::Specular => 2,
            TextureChannel::Normal => 3,
            TextureChannel::Height => 4,
        }
    }
}

/// Shader-facing sampler name for the `index`-th texture of a channel.
///
/// The running index starts at 1 per channel, so the first diffuse
/// texture is `tex_diffuse1`, the second `tex_diffuse2` and so on.
/// The fragment shader must declare exactly these names; keeping the
/// mapping here as one function (instead of ad-hoc string pasting at
/// the draw site) is what makes the host/shader contract checkable.
pub fn sampler_name(channel: TextureChannel, index: usize) -> String {
    format!("tex_{}{}", channel.label(), index)
}

/// Reference from a mesh into the model-level texture slot table.
#[derive(Debug, Clone)]
pub struct TextureRef {
    pub slot: usize,
    pub channel: TextureChannel,
    pub name: String,
}

/// GPU-side state created once by `setup_gpu`.
pub struct MeshBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub material_bind_group: wgpu::BindGroup,
}

/// One drawable mesh: vertices, a triangle-list index sequence, and
/// references into the owning model's texture table.
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub textures: Vec<TextureRef>,
    gpu: Option<MeshBuffers>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>, textures: Vec<TextureRef>) -> Self {
        Self {
            vertices,
            indices,
            textures,
            gpu: None,
        }
    }

    /// Placeholder for source meshes missing positions or faces.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Sampler names for this mesh's textures, in list order, with the
    /// per-channel running index the shader contract expects.
    pub fn sampler_names(&self) -> Vec<String> {
        let mut next_index = [1usize; TextureChannel::ALL.len()];
        self.textures
            .iter()
            .map(|tex| {
                let channel_pos = TextureChannel::ALL
                    .iter()
                    .position(|c| *c == tex.channel)
                    .unwrap_or(0);
                let index = next_index[channel_pos];
                next_index[channel_pos] += 1;
                sampler_name(tex.channel, index)
            })
            .collect()
    }

    /// Textures beyond the first of their channel, as (source name,
    /// sampler name) pairs. Only index 1 of each channel has a bind
    /// point, so everything returned here is skipped at draw time.
    pub fn unbound_sampler_names(&self) -> Vec<(String, String)> {
        let mut next_index = [1usize; TextureChannel::ALL.len()];
        self.textures
            .iter()
            .filter_map(|tex| {
                let channel_pos = TextureChannel::ALL
                    .iter()
                    .position(|c| *c == tex.channel)
                    .unwrap_or(0);
                let index = next_index[channel_pos];
                next_index[channel_pos] += 1;
                (index > 1).then(|| (tex.name.clone(), sampler_name(tex.channel, index)))
            })
            .collect()
    }

    /// First texture of the given channel, if any.
    fn first_of_channel(&self, channel: TextureChannel) -> Option<&TextureRef> {
        self.textures.iter().find(|tex| tex.channel == channel)
    }

    /// Uploads vertex/index buffers and builds the material bind group.
    ///
    /// Channels without a texture bind the shared placeholder. Only
    /// the first texture per channel can be bound; the shader contract
    /// covers index 1 of each channel.
    pub fn setup_gpu(
        &mut self,
        device: &wgpu::Device,
        material_layout: &wgpu::BindGroupLayout,
        slots: &[TextureSlot],
        placeholder: &TextureResource,
    ) {
        if self.is_empty() {
            return;
        }

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        for (texture_name, sampler) in self.unbound_sampler_names() {
            log::warn!(
                "texture '{}' maps to sampler '{}' which the shader does not bind",
                texture_name,
                sampler
            );
        }

        let view_for = |channel: TextureChannel| -> &wgpu::TextureView {
            self.first_of_channel(channel)
                .and_then(|tex| slots.get(tex.slot))
                .and_then(|slot| slot.gpu.as_ref())
                .map(|res| &res.view)
                .unwrap_or(&placeholder.view)
        };

        let sampler = self
            .first_of_channel(TextureChannel::Diffuse)
            .and_then(|tex| slots.get(tex.slot))
            .and_then(|slot| slot.gpu.as_ref())
            .map(|res| &res.sampler)
            .unwrap_or(&placeholder.sampler);

        let material_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Material Bind Group"),
            layout: material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
                wgpu::BindGroupEntry {
                    binding: TextureChannel::Diffuse.binding(),
                    resource: wgpu::BindingResource::TextureView(view_for(
                        TextureChannel::Diffuse,
                    )),
                },
                wgpu::BindGroupEntry {
                    binding: TextureChannel::Specular.binding(),
                    resource: wgpu::BindingResource::TextureView(view_for(
                        TextureChannel::Specular,
                    )),
                },
                wgpu::BindGroupEntry {
                    binding: TextureChannel::Normal.binding(),
                    resource: wgpu::BindingResource::TextureView(view_for(TextureChannel::Normal)),
                },
                wgpu::BindGroupEntry {
                    binding: TextureChannel::Height.binding(),
                    resource: wgpu::BindingResource::TextureView(view_for(TextureChannel::Height)),
                },
            ],
        });

        self.gpu = Some(MeshBuffers {
            vertex_buffer,
            index_buffer,
            material_bind_group,
        });
    }

    /// Records this mesh's draw call; no-op until `setup_gpu` ran.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        let Some(gpu) = self.gpu.as_ref() else {
            return;
        };

        render_pass.set_bind_group(2, &gpu.material_bind_group, &[]);
        render_pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
        render_pass.set_index_buffer(gpu.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.indices.len() as u32, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tex_ref(slot: usize, channel: TextureChannel, name: &str) -> TextureRef {
        TextureRef {
            slot,
            channel,
            name: name.to_string(),
        }
    }

    #[test]
    fn sampler_names_use_per_channel_running_index() {
        let mesh = Mesh::new(
            Vec::new(),
            Vec::new(),
            vec![
                tex_ref(0, TextureChannel::Diffuse, "a.png"),
                tex_ref(1, TextureChannel::Diffuse, "b.png"),
                tex_ref(2, TextureChannel::Specular, "c.png"),
                tex_ref(3, TextureChannel::Normal, "d.png"),
                tex_ref(4, TextureChannel::Diffuse, "e.png"),
            ],
        );

        assert_eq!(
            mesh.sampler_names(),
            vec![
                "tex_diffuse1",
                "tex_diffuse2",
                "tex_specular1",
                "tex_normal1",
                "tex_diffuse3",
            ]
        );
    }

    #[test]
    fn channel_bindings_are_stable() {
        assert_eq!(TextureChannel::Diffuse.binding(), 1);
        assert_eq!(TextureChannel::Specular.binding(), 2);
        assert_eq!(TextureChannel::Normal.binding(), 3);
        assert_eq!(TextureChannel::Height.binding(), 4);
        assert_eq!(sampler_name(TextureChannel::Height, 1), "tex_height1");
    }

    #[test]
    fn empty_mesh_reports_empty() {
        assert!(Mesh::empty().is_empty());
    }

    #[test]
    fn only_first_texture_per_channel_is_bound() {
        let mut textures: Vec<TextureRef> = (0..11)
            .map(|i| tex_ref(i, TextureChannel::Diffuse, &format!("d{}.png", i)))
            .collect();
        textures.push(tex_ref(11, TextureChannel::Specular, "s.png"));
        let mesh = Mesh::new(Vec::new(), Vec::new(), textures);

        let unbound = mesh.unbound_sampler_names();
        assert_eq!(unbound.len(), 10);
        // Two-digit running indices are still flagged as unbound.
        assert_eq!(
            unbound.last(),
            Some(&("d10.png".to_string(), "tex_diffuse11".to_string()))
        );
        assert!(!unbound.iter().any(|(_, s)| s == "tex_diffuse1"));
        assert!(!unbound.iter().any(|(_, s)| s == "tex_specular1"));
    }
}
