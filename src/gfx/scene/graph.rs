//! Owned scene graph built from an imported scene file.
//!
//! The importer wraps tobj with a fixed post-process configuration:
//! triangulate, unify indices, synthesize smooth normals when the
//! source has none, flip texture V, and compute tangent space. The
//! result is an acyclic tree of value nodes holding indices into a
//! flat raw-mesh array, so later passes never touch importer types.

use std::path::{Path, PathBuf};

use cgmath::{InnerSpace, Vector2, Vector3, Zero};
use log::{info, warn};
use thiserror::Error;

use super::mesh::TextureChannel;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to parse scene file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: tobj::LoadError,
    },
    #[error("scene file {0} contains no geometry")]
    EmptyScene(PathBuf),
}

/// One node of the imported hierarchy.
#[derive(Debug, Clone, Default)]
pub struct SceneNode {
    pub name: String,
    pub mesh_indices: Vec<usize>,
    pub children: Vec<SceneNode>,
}

/// Raw per-mesh channels as delivered by the importer.
#[derive(Debug, Clone, Default)]
pub struct RawMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
    pub tangents: Vec<[f32; 3]>,
    pub bitangents: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    pub material: Option<usize>,
}

/// Texture names per semantic channel for one material.
#[derive(Debug, Clone, Default)]
pub struct RawMaterial {
    pub name: String,
    textures: [Vec<String>; TextureChannel::ALL.len()],
}

impl RawMaterial {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            textures: Default::default(),
        }
    }

    pub fn push_texture(&mut self, channel: TextureChannel, name: impl Into<String>) {
        self.textures[channel_pos(channel)].push(name.into());
    }

    pub fn textures(&self, channel: TextureChannel) -> &[String] {
        &self.textures[channel_pos(channel)]
    }
}

fn channel_pos(channel: TextureChannel) -> usize {
    TextureChannel::ALL
        .iter()
        .position(|c| *c == channel)
        .unwrap_or(0)
}

/// The full import result: node tree plus flat mesh/material arrays.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    pub root: SceneNode,
    pub meshes: Vec<RawMesh>,
    pub materials: Vec<RawMaterial>,
}

/// Imports a scene file into an owned graph.
///
/// Parse failure and an empty scene are both fatal for the caller;
/// this is a one-shot startup path with no retry story.
pub fn import(path: &Path) -> Result<SceneGraph, ImportError> {
    let load_options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };

    let (models, materials) = tobj::load_obj(path, &load_options).map_err(|source| {
        ImportError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let materials = materials.unwrap_or_else(|err| {
        warn!("no usable material library for {}: {}", path.display(), err);
        Vec::new()
    });

    let root_name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string());

    let graph = build_graph(&root_name, models, materials);
    if graph.meshes.is_empty() {
        return Err(ImportError::EmptyScene(path.to_path_buf()));
    }

    info!(
        "imported {}: {} meshes, {} materials",
        path.display(),
        graph.meshes.len(),
        graph.materials.len()
    );
    Ok(graph)
}

/// Assembles the graph from parsed models. OBJ has no real hierarchy,
/// so every model becomes one child of the root; the traversal code
/// handles arbitrarily deep trees regardless.
fn build_graph(
    root_name: &str,
    models: Vec<tobj::Model>,
    materials: Vec<tobj::Material>,
) -> SceneGraph {
    let mut root = SceneNode {
        name: root_name.to_string(),
        mesh_indices: Vec::new(),
        children: Vec::new(),
    };
    let mut meshes = Vec::with_capacity(models.len());

    for (i, model) in models.into_iter().enumerate() {
        let name = if model.name.is_empty() {
            format!("mesh_{}", i)
        } else {
            model.name.clone()
        };

        root.children.push(SceneNode {
            name: name.clone(),
            mesh_indices: vec![meshes.len()],
            children: Vec::new(),
        });
        meshes.push(convert_mesh(name, model.mesh));
    }

    SceneGraph {
        root,
        meshes,
        materials: materials.into_iter().map(convert_material).collect(),
    }
}

fn convert_mesh(name: String, mesh: tobj::Mesh) -> RawMesh {
    let positions: Vec<[f32; 3]> = mesh
        .positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals: Vec<[f32; 3]> =
        if !mesh.normals.is_empty() && mesh.normals.len() == mesh.positions.len() {
            mesh.normals
                .chunks_exact(3)
                .map(|n| [n[0], n[1], n[2]])
                .collect()
        } else {
            compute_smooth_normals(&positions, &mesh.indices)
        };

    // Flip V so texture origin matches the sampling convention.
    let tex_coords: Vec<[f32; 2]> = mesh
        .texcoords
        .chunks_exact(2)
        .map(|t| [t[0], 1.0 - t[1]])
        .collect();

    let (tangents, bitangents) = if tex_coords.len() == positions.len() {
        compute_tangent_space(&positions, &tex_coords, &mesh.indices)
    } else {
        (Vec::new(), Vec::new())
    };

    RawMesh {
        name,
        positions,
        normals,
        tex_coords,
        tangents,
        bitangents,
        indices: mesh.indices,
        material: mesh.material_id,
    }
}

/// Maps MTL texture statements onto the four semantic channels. tobj
/// parses `map_bump` into `normal_texture`, so height stays sparse for
/// typical OBJ input.
fn convert_material(material: tobj::Material) -> RawMaterial {
    let mut raw = RawMaterial::new(material.name);

    if let Some(name) = material.diffuse_texture {
        raw.push_texture(TextureChannel::Diffuse, name);
    }
    if let Some(name) = material.specular_texture {
        raw.push_texture(TextureChannel::Specular, name);
    }
    if let Some(name) = material.normal_texture {
        raw.push_texture(TextureChannel::Normal, name);
    }
    if let Some(name) = material.shininess_texture {
        raw.push_texture(TextureChannel::Height, name);
    }

    raw
}

/// Area-weighted smooth normals over the triangle list.
fn compute_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accumulated = vec![Vector3::<f32>::zero(); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let p0 = Vector3::from(positions[i0]);
        let p1 = Vector3::from(positions[i1]);
        let p2 = Vector3::from(positions[i2]);

        // Unnormalized cross product: contribution scales with area.
        let face_normal = (p1 - p0).cross(p2 - p0);
        accumulated[i0] += face_normal;
        accumulated[i1] += face_normal;
        accumulated[i2] += face_normal;
    }

    accumulated
        .into_iter()
        .map(|n| {
            if n.magnitude2() > 0.0 {
                n.normalize().into()
            } else {
                [0.0, 0.0, 0.0]
            }
        })
        .collect()
}

/// Per-vertex tangent frame from UV-space triangle derivatives.
fn compute_tangent_space(
    positions: &[[f32; 3]],
    tex_coords: &[[f32; 2]],
    indices: &[u32],
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let mut tangents = vec![Vector3::<f32>::zero(); positions.len()];
    let mut bitangents = vec![Vector3::<f32>::zero(); positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let edge1 = Vector3::from(positions[i1]) - Vector3::from(positions[i0]);
        let edge2 = Vector3::from(positions[i2]) - Vector3::from(positions[i0]);
        let duv1 = Vector2::from(tex_coords[i1]) - Vector2::from(tex_coords[i0]);
        let duv2 = Vector2::from(tex_coords[i2]) - Vector2::from(tex_coords[i0]);

        let det = duv1.x * duv2.y - duv2.x * duv1.y;
        if det.abs() < f32::EPSILON {
            // Degenerate UV mapping; this triangle contributes nothing.
            continue;
        }
        let r = 1.0 / det;

        let tangent = (edge1 * duv2.y - edge2 * duv1.y) * r;
        let bitangent = (edge2 * duv1.x - edge1 * duv2.x) * r;

        for &i in &[i0, i1, i2] {
            tangents[i] += tangent;
            bitangents[i] += bitangent;
        }
    }

    let normalize_all = |vectors: Vec<Vector3<f32>>| -> Vec<[f32; 3]> {
        vectors
            .into_iter()
            .map(|v| {
                if v.magnitude2() > 0.0 {
                    v.normalize().into()
                } else {
                    [0.0, 0.0, 0.0]
                }
            })
            .collect()
    };

    (normalize_all(tangents), normalize_all(bitangents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TWO_OBJECTS: &str = "\
o first
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
vt 1 0
vt 1 1
vt 0 1
f 1/1 2/2 3/3 4/4
o second
v 0 0 1
v 1 0 1
v 1 1 1
vt 0 0
vt 1 0
vt 1 1
f 5/5 6/6 7/7
";

    fn parse(source: &str) -> SceneGraph {
        let load_options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj_buf(&mut Cursor::new(source), &load_options, |_| {
            tobj::load_mtl_buf(&mut Cursor::new(""))
        })
        .expect("obj text should parse");
        build_graph("test", models, materials.unwrap_or_default())
    }

    #[test]
    fn each_object_becomes_one_node_and_mesh() {
        let graph = parse(TWO_OBJECTS);
        assert_eq!(graph.meshes.len(), 2);
        assert_eq!(graph.root.children.len(), 2);
        assert_eq!(graph.root.children[0].name, "first");
        assert_eq!(graph.root.children[0].mesh_indices, vec![0]);
        assert_eq!(graph.root.children[1].mesh_indices, vec![1]);
    }

    #[test]
    fn quads_are_triangulated() {
        let graph = parse(TWO_OBJECTS);
        // One quad becomes two triangles.
        assert_eq!(graph.meshes[0].indices.len(), 6);
        assert_eq!(graph.meshes[1].indices.len(), 3);
    }

    #[test]
    fn texture_v_is_flipped() {
        let graph = parse(TWO_OBJECTS);
        let uv = graph.meshes[0].tex_coords[0];
        assert_eq!(uv, [0.0, 1.0]);
    }

    #[test]
    fn missing_normals_are_synthesized_unit_length() {
        let graph = parse(TWO_OBJECTS);
        let mesh = &graph.meshes[0];
        assert_eq!(mesh.normals.len(), mesh.positions.len());
        for normal in &mesh.normals {
            let len = Vector3::from(*normal).magnitude();
            assert!((len - 1.0).abs() < 1e-4, "normal length {}", len);
        }
        // Planar quad in z = 0 with CCW winding faces +Z.
        assert!((mesh.normals[0][2] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn tangents_are_unit_length_where_uvs_exist() {
        let graph = parse(TWO_OBJECTS);
        let mesh = &graph.meshes[0];
        assert_eq!(mesh.tangents.len(), mesh.positions.len());
        for tangent in &mesh.tangents {
            let len = Vector3::from(*tangent).magnitude();
            assert!((len - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn material_channels_follow_fixed_mapping() {
        let mut material = tobj::Material::default();
        material.name = "painted".to_string();
        material.diffuse_texture = Some("albedo.png".to_string());
        material.specular_texture = Some("gloss.png".to_string());
        material.normal_texture = Some("bumps.png".to_string());

        let raw = convert_material(material);
        assert_eq!(raw.textures(TextureChannel::Diffuse), ["albedo.png"]);
        assert_eq!(raw.textures(TextureChannel::Specular), ["gloss.png"]);
        assert_eq!(raw.textures(TextureChannel::Normal), ["bumps.png"]);
        assert!(raw.textures(TextureChannel::Height).is_empty());
    }
}
