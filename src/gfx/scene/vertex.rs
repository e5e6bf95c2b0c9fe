//! GPU-compatible vertex layout for imported meshes.

/// Maximum number of bones that may influence one vertex.
pub const MAX_BONE_INFLUENCE: usize = 4;

/// A single mesh vertex.
///
/// Bone indices and weights are part of the GPU layout for skinned
/// models but no consumer reads them yet; they upload as zeros.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coord: [f32; 2],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
    pub bone_ids: [i32; MAX_BONE_INFLUENCE],
    pub weights: [f32; MAX_BONE_INFLUENCE],
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0; 3],
            tex_coord: [0.0; 2],
            tangent: [0.0; 3],
            bitangent: [0.0; 3],
            bone_ids: [0; MAX_BONE_INFLUENCE],
            weights: [0.0; MAX_BONE_INFLUENCE],
        }
    }
}

impl Vertex {
    /// Vertex buffer layout matching the attribute locations declared
    /// in the vertex shader.
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;

        const ATTRIBUTES: [wgpu::VertexAttribute; 7] = [
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
            wgpu::VertexAttribute {
                offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: mem::size_of::<[f32; 11]>() as wgpu::BufferAddress,
                shader_location: 4,
                format: wgpu::VertexFormat::Float32x3,
            },
            wgpu::VertexAttribute {
                offset: mem::size_of::<[f32; 14]>() as wgpu::BufferAddress,
                shader_location: 5,
                format: wgpu::VertexFormat::Sint32x4,
            },
            wgpu::VertexAttribute {
                offset: mem::size_of::<[f32; 18]>() as wgpu::BufferAddress,
                shader_location: 6,
                format: wgpu::VertexFormat::Float32x4,
            },
        ];

        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_is_tightly_packed() {
        // 14 f32 channels + 4 i32 bone ids + 4 f32 weights
        assert_eq!(std::mem::size_of::<Vertex>(), 22 * 4);
        assert_eq!(
            Vertex::desc().array_stride,
            std::mem::size_of::<Vertex>() as wgpu::BufferAddress
        );
    }
}
