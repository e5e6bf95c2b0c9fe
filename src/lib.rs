//! orbview, a small model viewer.
//!
//! Opens a window, loads a scene file with its textures, and renders
//! it with a free-look camera that can also orbit the object. Input:
//! right-drag looks around, left-drag rotates the object, the wheel
//! and W/S move forward and back, A/D turn, R resets the camera.

pub mod app;
pub mod gfx;
pub mod wgpu_utils;

pub use app::ViewerApp;
