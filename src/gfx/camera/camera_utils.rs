use cgmath::{Matrix4, SquareMatrix};

/// Projection correction for wgpu's clip space (z in [0, 1] instead of
/// OpenGL's [-1, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Per-frame uniforms shared by every draw call.
///
/// MUST match the FrameUniforms struct in both shader files exactly.
/// Vectors are padded to vec4 for the 16 byte alignment requirement.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_mat: [[f32; 4]; 4],
    pub projection_mat: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub camera_front: [f32; 4],
    pub light_pos: [f32; 4],
}

impl Default for FrameUniforms {
    fn default() -> Self {
        Self {
            view_mat: convert_matrix4_to_array(Matrix4::identity()),
            projection_mat: convert_matrix4_to_array(Matrix4::identity()),
            camera_pos: [0.0; 4],
            camera_front: [0.0, 0.0, -1.0, 0.0],
            light_pos: [0.0; 4],
        }
    }
}

/// Per-object uniforms (one set per model for now).
///
/// MUST match the ObjectUniforms struct in the vertex shader exactly.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model_mat: [[f32; 4]; 4],
    pub normal_model_mat: [[f32; 4]; 4],
}

impl Default for ObjectUniforms {
    fn default() -> Self {
        Self {
            model_mat: convert_matrix4_to_array(Matrix4::identity()),
            normal_model_mat: convert_matrix4_to_array(Matrix4::identity()),
        }
    }
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}
