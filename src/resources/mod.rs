//! Loading of the scene's external files.
//!
//! Everything here stays on the CPU: files are fetched through an
//! [`texture::AssetSource`], decoded and parsed. Uploading happens once the
//! results reached the thread that owns the GPU.

use anyhow::{Context, Result, anyhow, bail};
use cgmath::{Matrix4, SquareMatrix};
use image::RgbaImage;

use crate::{
    config::AssetPaths,
    data_structures::{
        model::{MeshData, ModelData, ModelVertex},
        texture::Orientation,
    },
    resources::texture::{AssetSource, load_image},
};

pub mod mesh;
pub mod texture;

/// Decoded images of the transition plane.
#[derive(Debug)]
pub struct PlaneImages {
    pub a: RgbaImage,
    pub b: RgbaImage,
    pub mask: RgbaImage,
}

/// The model file together with its material images.
#[derive(Debug)]
pub struct ModelAssets {
    pub data: ModelData,
    pub diffuse: RgbaImage,
    pub normal: RgbaImage,
}

/// Outcome of all startup loads. Both halves fail independently.
#[derive(Debug)]
pub struct SceneAssets {
    pub plane: Result<PlaneImages>,
    pub model: Result<ModelAssets>,
}

/// Loads the plane images and the model concurrently.
pub async fn load_scene_assets<S: AssetSource>(source: &S, paths: &AssetPaths) -> SceneAssets {
    let (plane, model) = futures::join!(
        load_plane_images(source, paths),
        load_model_assets(source, paths)
    );
    SceneAssets { plane, model }
}

pub async fn load_plane_images<S: AssetSource>(source: &S, paths: &AssetPaths) -> Result<PlaneImages> {
    let (a, b, mask) = futures::join!(
        load_image(source, &paths.texture_a, Orientation::FlippedY),
        load_image(source, &paths.texture_b, Orientation::FlippedY),
        load_image(source, &paths.mask, Orientation::FlippedY),
    );
    Ok(PlaneImages {
        a: a?,
        b: b?,
        mask: mask?,
    })
}

/// Model textures are used as stored: glTF texture coordinates start at the top.
pub async fn load_model_assets<S: AssetSource>(source: &S, paths: &AssetPaths) -> Result<ModelAssets> {
    let (data, diffuse, normal) = futures::join!(
        load_model_data(source, &paths.model),
        load_image(source, &paths.model_diffuse, Orientation::TopDown),
        load_image(source, &paths.model_normal, Orientation::TopDown),
    );
    Ok(ModelAssets {
        data: data?,
        diffuse: diffuse?,
        normal: normal?,
    })
}

/// Parses a `.glb` or `.gltf` file into meshes with world transforms.
///
/// External buffers are resolved relative to the model file. Normals and
/// tangents the file does not provide are computed.
pub async fn load_model_data<S: AssetSource>(source: &S, name: &str) -> Result<ModelData> {
    let bytes = source
        .load_binary(name)
        .await
        .with_context(|| format!("Could not load model {name}"))?;
    let gltf = gltf::Gltf::from_slice(&bytes).with_context(|| format!("Could not parse model {name}"))?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        let data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf
                .blob
                .clone()
                .ok_or_else(|| anyhow!("Model {name} has no binary chunk"))?,
            gltf::buffer::Source::Uri(uri) if uri.starts_with("data:") => {
                bail!("Model {name} embeds buffer {} as a data URI, which is not supported", buffer.index())
            }
            gltf::buffer::Source::Uri(uri) => {
                let path = relative_to(name, uri);
                source
                    .load_binary(&path)
                    .await
                    .with_context(|| format!("Could not load buffer {path} of model {name}"))?
            }
        };
        if data.len() < buffer.length() {
            bail!(
                "Buffer {} of model {name} holds {} bytes, expected {}",
                buffer.index(),
                data.len(),
                buffer.length()
            );
        }
        buffer_data.push(data);
    }

    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow!("Model {name} contains no scene"))?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_meshes(&node, Matrix4::identity(), &buffer_data, &mut meshes)
            .with_context(|| format!("Could not read the meshes of model {name}"))?;
    }
    if meshes.is_empty() {
        log::warn!("Model {name} contains no triangle meshes");
    }
    log::info!("Loaded model {name} with {} meshes", meshes.len());

    Ok(ModelData {
        name: name.to_string(),
        meshes,
    })
}

/// Walks a node and its children, accumulating the node transforms.
fn collect_meshes(
    node: &gltf::Node,
    parent: Matrix4<f32>,
    buffers: &[Vec<u8>],
    out: &mut Vec<MeshData>,
) -> Result<()> {
    let world = parent * Matrix4::from(node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let mesh_name = mesh
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("mesh_{}", mesh.index()));
        let split = mesh.primitives().len() > 1;
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::warn!(
                    "Skipping primitive {} of {mesh_name}: {:?} is not supported",
                    primitive.index(),
                    primitive.mode()
                );
                continue;
            }
            let name = if split {
                format!("{mesh_name}#{}", primitive.index())
            } else {
                mesh_name.clone()
            };
            let mut data = read_primitive(&primitive, buffers).with_context(|| format!("Mesh {name}"))?;
            data.name = name;
            data.transform = world;
            out.push(data);
        }
    }

    for child in node.children() {
        collect_meshes(&child, world, buffers, out)?;
    }
    Ok(())
}

fn read_primitive(primitive: &gltf::Primitive, buffers: &[Vec<u8>]) -> Result<MeshData> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));

    let mut vertices: Vec<ModelVertex> = reader
        .read_positions()
        .context("Primitive has no positions")?
        .map(|position| ModelVertex {
            position,
            ..Default::default()
        })
        .collect();

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    if let Some(bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        bail!("Index {bad} is out of range for {} vertices", vertices.len());
    }

    if let Some(tex_coords) = reader.read_tex_coords(0) {
        for (v, tex_coord) in vertices.iter_mut().zip(tex_coords.into_f32()) {
            v.tex_coords = tex_coord;
        }
    }

    match reader.read_normals() {
        Some(normals) => {
            for (v, normal) in vertices.iter_mut().zip(normals) {
                v.normal = normal;
            }
        }
        None => mesh::compute_normals(&mut vertices, &indices),
    }

    match reader.read_tangents() {
        Some(tangents) => {
            for (v, tangent) in vertices.iter_mut().zip(tangents) {
                v.tangent = [tangent[0], tangent[1], tangent[2]];
                v.bitangent = mesh::bitangent_from(v.normal, tangent);
            }
        }
        None => mesh::compute_tangents(&mut vertices, &indices),
    }

    Ok(MeshData::new(String::new(), vertices, indices))
}

/// Resolves `uri` against the directory of the asset `base`.
fn relative_to(base: &str, uri: &str) -> String {
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], uri),
        None => uri.to_string(),
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use std::collections::HashMap;

    use cgmath::Vector4;

    use super::*;

    #[derive(Default)]
    struct MemoryAssets {
        files: HashMap<String, Vec<u8>>,
    }

    impl MemoryAssets {
        fn with(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
            self.files.insert(name.to_string(), data.into());
            self
        }
    }

    impl AssetSource for MemoryAssets {
        async fn load_binary(&self, name: &str) -> Result<Vec<u8>> {
            self.files
                .get(name)
                .cloned()
                .ok_or_else(|| anyhow!("No such asset {name}"))
        }
    }

    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "translation": [1.0, 0.0, 0.0], "children": [1] },
            { "mesh": 0, "scale": [2.0, 2.0, 2.0] }
        ],
        "meshes": [{
            "name": "tri",
            "primitives": [{ "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "indices": 2 }]
        }],
        "buffers": [{ "uri": "tri.bin", "byteLength": 68 }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 24 },
            { "buffer": 0, "byteOffset": 60, "byteLength": 6 }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
              "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" },
            { "bufferView": 2, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;

    fn triangle_bin() -> Vec<u8> {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let tex_coords: [f32; 6] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
        let indices: [u16; 3] = [0, 1, 2];
        let mut bin = Vec::new();
        bin.extend_from_slice(bytemuck::cast_slice(&positions));
        bin.extend_from_slice(bytemuck::cast_slice(&tex_coords));
        bin.extend_from_slice(bytemuck::cast_slice(&indices));
        bin.resize(68, 0);
        bin
    }

    fn triangle_assets() -> MemoryAssets {
        MemoryAssets::default()
            .with("models/tri.gltf", TRIANGLE_GLTF)
            .with("models/tri.bin", triangle_bin())
    }

    #[tokio::test]
    async fn reads_vertices_indices_and_transform() {
        let model = load_model_data(&triangle_assets(), "models/tri.gltf").await.unwrap();
        assert_eq!(model.meshes.len(), 1);
        let mesh = &model.meshes[0];
        assert_eq!(mesh.name, "tri");
        assert_eq!(mesh.indices, vec![0, 1, 2]);
        assert_eq!(mesh.vertices[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(mesh.vertices[2].tex_coords, [0.0, 1.0]);

        // Parent translation applied after the child's scale
        let p = mesh.transform * Vector4::new(1.0, 0.0, 0.0, 1.0);
        assert_eq!(p, Vector4::new(3.0, 0.0, 0.0, 1.0));
    }

    #[tokio::test]
    async fn generates_normals_and_tangents() {
        let model = load_model_data(&triangle_assets(), "models/tri.gltf").await.unwrap();
        for v in &model.meshes[0].vertices {
            assert_eq!(v.normal, [0.0, 0.0, 1.0]);
            assert_eq!(v.tangent, [1.0, 0.0, 0.0]);
            assert_eq!(v.bitangent, [0.0, 1.0, 0.0]);
        }
    }

    #[tokio::test]
    async fn missing_buffer_names_it() {
        let assets = MemoryAssets::default().with("models/tri.gltf", TRIANGLE_GLTF);
        let err = load_model_data(&assets, "models/tri.gltf").await.unwrap_err();
        assert!(format!("{err:#}").contains("models/tri.bin"));
    }

    #[tokio::test]
    async fn data_uris_are_rejected() {
        let gltf = TRIANGLE_GLTF.replace(
            "\"uri\": \"tri.bin\"",
            "\"uri\": \"data:application/octet-stream;base64,AAAA\"",
        );
        let assets = MemoryAssets::default().with("tri.gltf", gltf);
        let err = load_model_data(&assets, "tri.gltf").await.unwrap_err();
        assert!(err.to_string().contains("data URI"));
    }

    #[tokio::test]
    async fn garbage_is_reported_as_a_parse_error() {
        let assets = MemoryAssets::default().with("models/watermelon2.glb", b"nope".to_vec());
        let err = load_model_data(&assets, "models/watermelon2.glb").await.unwrap_err();
        assert!(err.to_string().contains("Could not parse model models/watermelon2.glb"));
    }

    #[tokio::test]
    async fn plane_images_fail_as_a_whole() {
        let paths = AssetPaths::default();
        let assets = MemoryAssets::default();
        let err = load_plane_images(&assets, &paths).await.unwrap_err();
        assert!(err.to_string().contains("img/sea.jpg"));
    }

    #[test]
    fn uris_resolve_next_to_the_model() {
        assert_eq!(relative_to("models/tri.gltf", "tri.bin"), "models/tri.bin");
        assert_eq!(relative_to("tri.gltf", "tri.bin"), "tri.bin");
    }
}
