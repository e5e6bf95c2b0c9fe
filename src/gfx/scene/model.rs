//! Drawable model assembled from an imported scene graph.
//!
//! Meshes are flattened out of the node tree in pre-order and share a
//! model-wide texture slot table, so a texture referenced by several
//! meshes is decoded and uploaded once.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::gfx::resources::texture_resource::TextureResource;

use super::graph::{self, ImportError, RawMesh, SceneGraph, SceneNode};
use super::mesh::{Mesh, TextureChannel, TextureRef};
use super::vertex::Vertex;

/// One entry of the model-wide texture table. The image is decoded
/// lazily at GPU setup so loading and tests stay device-free.
#[derive(Debug)]
pub struct TextureSlot {
    pub name: String,
    pub channel: TextureChannel,
    pub path: PathBuf,
    pub gpu: Option<TextureResource>,
}

pub struct Model {
    pub meshes: Vec<Mesh>,
    pub directory: PathBuf,
    texture_slots: Vec<TextureSlot>,
    placeholder: Option<TextureResource>,
}

impl Model {
    /// Loads a scene file and flattens it into drawable meshes.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let graph = graph::import(path)?;
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let model = Self::from_graph(&graph, directory);
        info!(
            "loaded model {}: {} meshes, {} texture slots",
            path.display(),
            model.meshes.len(),
            model.texture_slots.len()
        );
        Ok(model)
    }

    /// Builds the model from an already imported graph. Split out so
    /// traversal and texture dedup are testable without files.
    pub fn from_graph(graph: &SceneGraph, directory: PathBuf) -> Self {
        let mut model = Self {
            meshes: Vec::new(),
            directory,
            texture_slots: Vec::new(),
            placeholder: None,
        };
        let mut texture_cache = HashMap::new();
        model.process_node(&graph.root, graph, &mut texture_cache);
        model
    }

    pub fn texture_slots(&self) -> &[TextureSlot] {
        &self.texture_slots
    }

    /// Pre-order traversal; children after the node's own meshes.
    fn process_node(
        &mut self,
        node: &SceneNode,
        graph: &SceneGraph,
        texture_cache: &mut HashMap<String, usize>,
    ) {
        for &mesh_index in &node.mesh_indices {
            let mesh = self.process_mesh(&graph.meshes[mesh_index], graph, texture_cache);
            self.meshes.push(mesh);
        }
        for child in &node.children {
            self.process_node(child, graph, texture_cache);
        }
    }

    fn process_mesh(
        &mut self,
        raw: &RawMesh,
        graph: &SceneGraph,
        texture_cache: &mut HashMap<String, usize>,
    ) -> Mesh {
        if raw.positions.is_empty() {
            warn!("mesh {} has no vertices, keeping it empty", raw.name);
            return Mesh::empty();
        }
        if raw.indices.is_empty() {
            warn!("mesh {} has no faces, keeping it empty", raw.name);
            return Mesh::empty();
        }

        let vertex_count = raw.positions.len();
        let mut vertices = Vec::with_capacity(vertex_count);
        for i in 0..vertex_count {
            vertices.push(Vertex {
                position: raw.positions[i],
                normal: raw.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
                tex_coord: raw.tex_coords.get(i).copied().unwrap_or([0.0, 0.0]),
                tangent: raw.tangents.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
                bitangent: raw.bitangents.get(i).copied().unwrap_or([0.0, 0.0, 0.0]),
                ..Default::default()
            });
        }

        let mut textures = Vec::new();
        if let Some(material_index) = raw.material {
            if let Some(material) = graph.materials.get(material_index) {
                for &channel in TextureChannel::ALL.iter() {
                    for name in material.textures(channel) {
                        textures.push(self.resolve_texture(name, channel, texture_cache));
                    }
                }
            }
        }

        Mesh::new(vertices, raw.indices.clone(), textures)
    }

    /// Returns the slot for a texture name, creating it on first use.
    /// Dedup is by source name alone, so the same image referenced on
    /// two channels shares one upload.
    fn resolve_texture(
        &mut self,
        name: &str,
        channel: TextureChannel,
        texture_cache: &mut HashMap<String, usize>,
    ) -> TextureRef {
        let slot = *texture_cache.entry(name.to_string()).or_insert_with(|| {
            self.texture_slots.push(TextureSlot {
                name: name.to_string(),
                channel,
                path: self.directory.join(name),
                gpu: None,
            });
            self.texture_slots.len() - 1
        });

        TextureRef {
            slot,
            channel,
            name: name.to_string(),
        }
    }

    /// Uploads every texture slot and builds per-mesh GPU state. A
    /// slot whose image fails to decode gets the shared placeholder
    /// so the bind group is always complete.
    pub fn setup_gpu(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        material_layout: &wgpu::BindGroupLayout,
    ) {
        if self.placeholder.is_none() {
            self.placeholder = Some(TextureResource::placeholder(device, queue));
        }

        for slot in &mut self.texture_slots {
            if slot.gpu.is_some() {
                continue;
            }
            match TextureResource::from_image_file(device, queue, &slot.path, slot.channel) {
                Ok(texture) => slot.gpu = Some(texture),
                Err(err) => {
                    warn!("texture {} failed to load: {}", slot.path.display(), err);
                }
            }
        }

        if let Some(placeholder) = &self.placeholder {
            for mesh in &mut self.meshes {
                mesh.setup_gpu(device, material_layout, &self.texture_slots, placeholder);
            }
        }
    }

    /// Draws every mesh in flattening order.
    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        for mesh in &self.meshes {
            mesh.draw(render_pass);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::scene::graph::{RawMaterial, SceneGraph, SceneNode};

    fn tri_mesh(name: &str, material: Option<usize>) -> RawMesh {
        RawMesh {
            name: name.to_string(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            normals: vec![[0.0, 0.0, 1.0]; 3],
            tex_coords: vec![[0.0, 0.0]; 3],
            tangents: vec![[1.0, 0.0, 0.0]; 3],
            bitangents: vec![[0.0, 1.0, 0.0]; 3],
            indices: vec![0, 1, 2],
            material,
        }
    }

    fn nested_graph() -> SceneGraph {
        // Root owns mesh 0, one child owns meshes 1 and 2, a grandchild
        // owns mesh 3. Pre-order flattening must keep 0, 1, 2, 3.
        SceneGraph {
            root: SceneNode {
                name: "root".to_string(),
                mesh_indices: vec![0],
                children: vec![SceneNode {
                    name: "child".to_string(),
                    mesh_indices: vec![1, 2],
                    children: vec![SceneNode {
                        name: "grandchild".to_string(),
                        mesh_indices: vec![3],
                        children: Vec::new(),
                    }],
                }],
            },
            meshes: vec![
                tri_mesh("m0", None),
                tri_mesh("m1", None),
                tri_mesh("m2", None),
                tri_mesh("m3", None),
            ],
            materials: Vec::new(),
        }
    }

    #[test]
    fn flattening_is_pre_order() {
        let model = Model::from_graph(&nested_graph(), PathBuf::from("."));
        assert_eq!(model.meshes.len(), 4);
        for mesh in &model.meshes {
            assert_eq!(mesh.vertices.len(), 3);
        }
    }

    #[test]
    fn mesh_without_positions_stays_empty() {
        let graph = SceneGraph {
            root: SceneNode {
                name: "root".to_string(),
                mesh_indices: vec![0],
                children: Vec::new(),
            },
            meshes: vec![RawMesh {
                name: "hollow".to_string(),
                ..Default::default()
            }],
            materials: Vec::new(),
        };
        let model = Model::from_graph(&graph, PathBuf::from("."));
        assert_eq!(model.meshes.len(), 1);
        assert!(model.meshes[0].is_empty());
    }

    #[test]
    fn mesh_without_faces_stays_empty() {
        let mut faceless = tri_mesh("faceless", None);
        faceless.indices.clear();

        let graph = SceneGraph {
            root: SceneNode {
                name: "root".to_string(),
                mesh_indices: vec![0],
                children: Vec::new(),
            },
            meshes: vec![faceless],
            materials: Vec::new(),
        };
        let model = Model::from_graph(&graph, PathBuf::from("."));
        assert_eq!(model.meshes.len(), 1);
        assert!(model.meshes[0].is_empty());
        assert!(model.meshes[0].vertices.is_empty());
    }

    #[test]
    fn shared_texture_names_share_one_slot() {
        let mut diffuse_only = RawMaterial::new("a");
        diffuse_only.push_texture(TextureChannel::Diffuse, "shared.png");
        let mut both = RawMaterial::new("b");
        both.push_texture(TextureChannel::Diffuse, "shared.png");
        both.push_texture(TextureChannel::Specular, "spec.png");

        let graph = SceneGraph {
            root: SceneNode {
                name: "root".to_string(),
                mesh_indices: vec![0, 1],
                children: Vec::new(),
            },
            meshes: vec![tri_mesh("m0", Some(0)), tri_mesh("m1", Some(1))],
            materials: vec![diffuse_only, both],
        };

        let model = Model::from_graph(&graph, PathBuf::from("assets"));
        assert_eq!(model.texture_slots().len(), 2);
        assert_eq!(model.texture_slots()[0].name, "shared.png");
        assert_eq!(
            model.texture_slots()[0].path,
            PathBuf::from("assets").join("shared.png")
        );

        // Both meshes resolve the shared name to slot 0.
        assert_eq!(model.meshes[0].textures[0].slot, 0);
        assert_eq!(model.meshes[1].textures[0].slot, 0);
        assert_eq!(model.meshes[1].textures[1].slot, 1);
    }
}
