//! The ground plane and its texture transition material.

use std::f32::consts::FRAC_PI_2;

use cgmath::Rotation3;
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{instance::Instance, model::Vertex, texture::Texture},
    transition::TransitionParams,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PlaneVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex for PlaneVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<PlaneVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// A `width` x `height` grid in the XY plane facing +Z, centred on the origin.
///
/// Rows run from the top edge down. `u` grows with x and `v` is `1` on the top
/// edge, so the texture reads upright once it was uploaded flipped.
pub fn plane_geometry(
    width: f32,
    height: f32,
    width_segments: u32,
    height_segments: u32,
) -> (Vec<PlaneVertex>, Vec<u32>) {
    let grid_x = width_segments.max(1);
    let grid_y = height_segments.max(1);
    let segment_width = width / grid_x as f32;
    let segment_height = height / grid_y as f32;

    let mut vertices = Vec::with_capacity(((grid_x + 1) * (grid_y + 1)) as usize);
    for iy in 0..=grid_y {
        let y = iy as f32 * segment_height - height / 2.0;
        for ix in 0..=grid_x {
            let x = ix as f32 * segment_width - width / 2.0;
            vertices.push(PlaneVertex {
                position: [x, -y, 0.0],
                tex_coords: [ix as f32 / grid_x as f32, 1.0 - iy as f32 / grid_y as f32],
            });
        }
    }

    let row = grid_x + 1;
    let mut indices = Vec::with_capacity((grid_x * grid_y * 6) as usize);
    for iy in 0..grid_y {
        for ix in 0..grid_x {
            let a = ix + row * iy;
            let b = ix + row * (iy + 1);
            let c = (ix + 1) + row * (iy + 1);
            let d = (ix + 1) + row * iy;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    (vertices, indices)
}

/// The three images the transition samples.
#[derive(Debug)]
pub struct PlaneTextures {
    pub a: Texture,
    pub b: Texture,
    pub mask: Texture,
}

/// Uniform buffer plus textures of the transition shader.
///
/// Holds the only copy of [`TransitionParams`] the GPU sees.
#[derive(Debug)]
pub struct TransitionMaterial {
    pub params: TransitionParams,
    textures: PlaneTextures,
    uniform_buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    pub bind_group: wgpu::BindGroup,
}

impl TransitionMaterial {
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        params: TransitionParams,
        textures: PlaneTextures,
    ) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transition Uniform Buffer"),
            contents: bytemuck::cast_slice(&[params.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = mk_bind_group(device, layout, &uniform_buffer, &textures);
        Self {
            params,
            textures,
            uniform_buffer,
            layout: layout.clone(),
            bind_group,
        }
    }

    pub fn write_uniform(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::cast_slice(&[self.params.to_uniform()]),
        );
    }

    /// Texture B becomes the starting image and A the target.
    pub fn swap_sources(&mut self, device: &wgpu::Device) {
        std::mem::swap(&mut self.textures.a, &mut self.textures.b);
        self.bind_group = mk_bind_group(device, &self.layout, &self.uniform_buffer, &self.textures);
    }
}

fn mk_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    uniform_buffer: &wgpu::Buffer,
    textures: &PlaneTextures,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&textures.a.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&textures.a.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(&textures.b.view),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::Sampler(&textures.b.sampler),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(&textures.mask.view),
            },
            wgpu::BindGroupEntry {
                binding: 6,
                resource: wgpu::BindingResource::Sampler(&textures.mask.sampler),
            },
        ],
        label: Some("transition_bind_group"),
    })
}

/// Plane rotation that turns the XY grid into a floor facing +Y.
pub fn floor_instance() -> Instance {
    Instance {
        rotation: cgmath::Quaternion::from_angle_x(cgmath::Rad(-FRAC_PI_2)),
        ..Default::default()
    }
}

#[derive(Debug)]
pub struct TransitionPlane {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_elements: u32,
    instance: Instance,
    instance_buffer: wgpu::Buffer,
    pub material: TransitionMaterial,
}

impl TransitionPlane {
    pub fn new(
        device: &wgpu::Device,
        size: [f32; 2],
        segments: [u32; 2],
        material: TransitionMaterial,
    ) -> Self {
        let (vertices, indices) = plane_geometry(size[0], size[1], segments[0], segments[1]);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Plane Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Plane Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance = floor_instance();
        let instance_buffer = instance.to_raw().mk_buffer(device, "Plane Instance Buffer");

        Self {
            vertex_buffer,
            index_buffer,
            num_elements: indices.len() as u32,
            instance,
            instance_buffer,
            material,
        }
    }

    pub fn offset(&self) -> [f32; 2] {
        [self.instance.position.x, self.instance.position.y]
    }

    /// Moves the plane within its parent's XY plane.
    pub fn set_offset(&mut self, queue: &wgpu::Queue, offset: [f32; 2]) {
        self.instance.position.x = offset[0];
        self.instance.position.y = offset[1];
        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&[self.instance.to_raw()]),
        );
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass<'_>, camera_bind_group: &wgpu::BindGroup) {
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.set_bind_group(0, &self.material.bind_group, &[]);
        render_pass.set_bind_group(1, camera_bind_group, &[]);
        render_pass.draw_indexed(0..self.num_elements, 0, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::Vector4;

    use super::*;

    #[test]
    fn grid_has_the_expected_size() {
        let (vertices, indices) = plane_geometry(7.0, 5.0, 10, 1);
        assert_eq!(vertices.len(), 11 * 2);
        assert_eq!(indices.len(), 10 * 6);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    }

    #[test]
    fn corners_and_uvs() {
        let (vertices, _) = plane_geometry(7.0, 5.0, 10, 1);
        let top_left = vertices[0];
        assert_eq!(top_left.position, [-3.5, 2.5, 0.0]);
        assert_eq!(top_left.tex_coords, [0.0, 1.0]);

        let bottom_right = vertices[21];
        assert_eq!(bottom_right.position, [3.5, -2.5, 0.0]);
        assert_eq!(bottom_right.tex_coords, [1.0, 0.0]);

        let second = vertices[1];
        assert!((second.position[0] - (-2.8)).abs() < 1e-6);
        assert!((second.tex_coords[0] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn faces_wind_counter_clockwise_towards_plus_z() {
        let (vertices, indices) = plane_geometry(7.0, 5.0, 10, 1);
        for face in indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| vertices[face[k] as usize].position);
            let cross_z = (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0]);
            assert!(cross_z > 0.0);
        }
    }

    #[test]
    fn zero_segments_still_make_one_quad() {
        let (vertices, indices) = plane_geometry(1.0, 1.0, 0, 0);
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices, vec![0, 2, 1, 2, 3, 1]);
    }

    #[test]
    fn floor_faces_up() {
        let normal = floor_instance().to_matrix() * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!((normal.y - 1.0).abs() < 1e-6);
        let top_edge = floor_instance().to_matrix() * Vector4::new(0.0, 2.5, 0.0, 1.0);
        assert!((top_edge.z + 2.5).abs() < 1e-6);
    }
}
