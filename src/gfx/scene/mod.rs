//! Scene content: import, mesh data, and drawable models.

pub mod graph;
pub mod mesh;
pub mod model;
pub mod vertex;

pub use graph::{ImportError, SceneGraph};
pub use mesh::{Mesh, TextureChannel};
pub use model::Model;
pub use vertex::Vertex;
