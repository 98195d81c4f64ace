//! Instance transformation data for GPU rendering.
//!
//! Every drawable (mesh or plane) is placed by one instance whose matrices are
//! streamed to the vertex shader through a per-instance vertex buffer.

use std::ops::Mul;

use cgmath::{Matrix, Matrix3, Matrix4, One, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::data_structures::model;

/// Position, rotation (as quaternion) and scale of an object in its parent's space.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw::from_matrix(self.to_matrix())
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl<'a> Mul<Matrix4<f32>> for &'a Instance {
    type Output = Matrix4<f32>;

    /// Places a child given in this instance's local space.
    fn mul(self, rhs: Matrix4<f32>) -> Self::Output {
        self.to_matrix() * rhs
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    /// Normals are transformed by the inverse transpose so that non-uniform
    /// scales keep them perpendicular to the surface.
    pub fn from_matrix(world: Matrix4<f32>) -> Self {
        let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
        let normal = linear
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or(linear);
        Self {
            model: world.into(),
            normal: normal.into(),
        }
    }

    #[cfg(test)]
    pub fn model(&self) -> Matrix4<f32> {
        self.model.into()
    }

    pub fn mk_buffer(&self, device: &wgpu::Device, label: &str) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        })
    }
}

/**
 * As we store vertex data directly in the GPU memory we need to tell what the bytes refer to.
 *
 * Stride layout here: the model matrix as four vec4s followed by the normal matrix as three vec3s.
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // Shaders only move on to the next instance when a new instance starts
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Quaternion, Rotation3, Vector3, Vector4};

    use super::*;

    #[test]
    fn matrix_applies_scale_then_rotation_then_translation() {
        let instance = Instance {
            position: Vector3::new(0.0, 0.182, 0.0),
            rotation: Quaternion::from_angle_x(Deg(-90.0)),
            scale: Vector3::new(2.0, 2.0, 2.0),
        };
        // A point on the plane's local +Y axis ends up on world -Z
        let p = instance.to_matrix() * Vector4::new(0.0, 1.0, 0.0, 1.0);
        assert!(p.x.abs() < 1e-6);
        assert!((p.y - 0.182).abs() < 1e-6);
        assert!((p.z + 2.0).abs() < 1e-6);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let raw = InstanceRaw::from_matrix(Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0));
        assert_eq!(raw.normal[0][0], 0.5);
        assert_eq!(raw.normal[1][1], 1.0);
        assert_eq!(raw.model()[0][0], 2.0);
    }

    #[test]
    fn raw_layout_matches_the_vertex_attributes() {
        assert_eq!(std::mem::size_of::<InstanceRaw>(), 25 * 4);
    }
}
