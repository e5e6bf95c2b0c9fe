//! Graphics subsystem: camera, rendering backbone, resources, scene.

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;
