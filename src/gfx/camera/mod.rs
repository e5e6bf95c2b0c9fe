pub mod camera_controller;
pub mod camera_utils;
pub mod free_camera;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::{FrameUniforms, ObjectUniforms};
pub use free_camera::Camera;
