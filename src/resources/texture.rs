use std::future::Future;

use anyhow::Context;
use image::RgbaImage;

use crate::data_structures::texture::{Orientation, decode_image};

/// Where asset bytes come from.
pub trait AssetSource {
    fn load_binary(&self, name: &str) -> impl Future<Output = anyhow::Result<Vec<u8>>>;
}

/// Assets below a root directory (native) or URL path (web).
#[derive(Clone, Debug, PartialEq)]
pub struct Assets {
    root: String,
}

impl Assets {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn path(&self, name: &str) -> std::path::PathBuf {
        std::path::Path::new(&self.root).join(name)
    }

    #[cfg(target_arch = "wasm32")]
    fn url(&self, name: &str) -> anyhow::Result<reqwest::Url> {
        let window = web_sys::window().context("No browser window")?;
        let origin = window
            .location()
            .origin()
            .map_err(|e| anyhow::anyhow!("Could not read the page origin: {:?}", e))?;
        let base = reqwest::Url::parse(&format!("{}/{}/", origin, self.root.trim_matches('/')))?;
        Ok(base.join(name)?)
    }
}

impl AssetSource for Assets {
    async fn load_binary(&self, name: &str) -> anyhow::Result<Vec<u8>> {
        #[cfg(target_arch = "wasm32")]
        let data = {
            let url = self.url(name)?;
            reqwest::get(url.clone())
                .await
                .and_then(|response| response.error_for_status())
                .with_context(|| format!("Could not fetch asset {url}"))?
                .bytes()
                .await?
                .to_vec()
        };
        #[cfg(not(target_arch = "wasm32"))]
        let data = {
            let path = self.path(name);
            tokio::fs::read(&path)
                .await
                .with_context(|| format!("Could not read asset {}", path.display()))?
        };

        Ok(data)
    }
}

/// Fetches and decodes one image without touching the GPU.
pub async fn load_image<S: AssetSource>(
    source: &S,
    name: &str,
    orientation: Orientation,
) -> anyhow::Result<RgbaImage> {
    let data = source.load_binary(name).await?;
    decode_image(&data, name, orientation)
}

pub fn diffuse_normal_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    multisampled: false,
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
        label: Some("Model texture_bind_group_layout"),
    })
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_below_the_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/a.bin"), [1u8, 2, 3]).unwrap();

        let assets = Assets::new(dir.path().to_string_lossy());
        assert_eq!(assets.load_binary("img/a.bin").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let assets = Assets::new(dir.path().to_string_lossy());
        let err = assets.load_binary("img/sea.jpg").await.unwrap_err();
        assert!(format!("{err:#}").contains("img/sea.jpg"));
    }
}
