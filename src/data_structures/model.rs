//! Meshes, the shared model material and the draw helpers.
//!
//! Loading produces CPU-side [`ModelData`]. Once the material textures are on the
//! GPU, [`Model::new`] uploads every mesh and binds the one shared
//! [`PbrMaterial`] to all of them in a single pass.

use std::sync::Arc;

use anyhow::{Result, bail};
use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::data_structures::{
    instance::{Instance, InstanceRaw},
    texture::{Orientation, Texture},
};

pub trait Vertex {
    fn desc() -> wgpu::VertexBufferLayout<'static>;
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub normal: [f32; 3],
    pub tangent: [f32; 3],
    pub bitangent: [f32; 3],
}

impl Vertex for ModelVertex {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
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
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 5]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
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
            ],
        }
    }
}

/// One mesh primitive as read from the model file.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Accumulated node transform from the scene root.
    pub transform: Matrix4<f32>,
}

impl MeshData {
    pub fn new(name: impl Into<String>, vertices: Vec<ModelVertex>, indices: Vec<u32>) -> Self {
        Self {
            name: name.into(),
            vertices,
            indices,
            transform: Matrix4::identity(),
        }
    }
}

/// Everything a model file contributes before any GPU work.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ModelData {
    pub name: String,
    pub meshes: Vec<MeshData>,
}

impl ModelData {
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|m| m.vertices.len()).sum()
    }
}

/// Diffuse plus normal map, shared by every mesh of a model.
#[derive(Debug)]
pub struct PbrMaterial {
    pub name: String,
    pub diffuse_texture: Texture,
    pub normal_texture: Texture,
    pub bind_group: wgpu::BindGroup,
}

impl PbrMaterial {
    pub fn new(
        device: &wgpu::Device,
        name: &str,
        diffuse_texture: Texture,
        normal_texture: Texture,
        layout: &wgpu::BindGroupLayout,
    ) -> Result<Self> {
        check_orientation(name, diffuse_texture.orientation, normal_texture.orientation)?;
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&diffuse_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&diffuse_texture.sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&normal_texture.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&normal_texture.sampler),
                },
            ],
            label: Some(name),
        });

        Ok(Self {
            name: String::from(name),
            diffuse_texture,
            normal_texture,
            bind_group,
        })
    }
}

/// A normal map read with a different vertical axis than its colour map
/// lights the surface upside down.
pub fn check_orientation(name: &str, diffuse: Orientation, normal: Orientation) -> Result<()> {
    if diffuse != normal {
        bail!(
            "Material {name}: diffuse texture is {:?} but the normal map is {:?}",
            diffuse,
            normal
        );
    }
    Ok(())
}

#[derive(Debug)]
pub struct Mesh {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub instance_buffer: wgpu::Buffer,
    pub num_elements: u32,
    pub material: Arc<PbrMaterial>,
}

impl Mesh {
    fn upload(
        device: &wgpu::Device,
        data: &MeshData,
        world: Matrix4<f32>,
        material: Arc<PbrMaterial>,
    ) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Vertex Buffer", data.name)),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{:?} Index Buffer", data.name)),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        let instance_buffer =
            InstanceRaw::from_matrix(world).mk_buffer(device, &format!("{:?} Instance Buffer", data.name));

        Self {
            name: data.name.clone(),
            vertex_buffer,
            index_buffer,
            instance_buffer,
            num_elements: data.indices.len() as u32,
            material,
        }
    }
}

#[derive(Debug)]
pub struct Model {
    pub meshes: Vec<Mesh>,
    pub placement: Instance,
}

impl Model {
    /// Uploads `data` placed at `placement` and binds `material` to every mesh.
    pub fn new(
        device: &wgpu::Device,
        data: &ModelData,
        material: Arc<PbrMaterial>,
        placement: Instance,
    ) -> Self {
        let meshes = world_transforms(data, &placement)
            .into_iter()
            .zip(&data.meshes)
            .map(|(world, mesh)| Mesh::upload(device, mesh, world, Arc::clone(&material)))
            .collect::<Vec<_>>();
        log::info!(
            "Bound material {} to {} meshes of {} ({} vertices)",
            material.name,
            meshes.len(),
            data.name,
            data.vertex_count()
        );
        Self { meshes, placement }
    }
}

/// World matrix of every mesh once the model root sits at `placement`.
pub fn world_transforms(data: &ModelData, placement: &Instance) -> Vec<Matrix4<f32>> {
    data.meshes.iter().map(|mesh| placement * mesh.transform).collect()
}

pub trait DrawModel {
    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );

    fn draw_model(
        &mut self,
        model: &Model,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    );
}

impl DrawModel for wgpu::RenderPass<'_> {
    fn draw_mesh(
        &mut self,
        mesh: &Mesh,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        self.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
        self.set_vertex_buffer(1, mesh.instance_buffer.slice(..));
        self.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.set_bind_group(0, &mesh.material.bind_group, &[]);
        self.set_bind_group(1, camera_bind_group, &[]);
        self.set_bind_group(2, light_bind_group, &[]);
        self.draw_indexed(0..mesh.num_elements, 0, 0..1);
    }

    fn draw_model(
        &mut self,
        model: &Model,
        camera_bind_group: &wgpu::BindGroup,
        light_bind_group: &wgpu::BindGroup,
    ) {
        for mesh in &model.meshes {
            self.draw_mesh(mesh, camera_bind_group, light_bind_group);
        }
    }
}
