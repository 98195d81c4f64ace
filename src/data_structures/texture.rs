//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU texture resources,
//! plus the CPU-side decoding step ([`decode_image`]) that applies the
//! orientation and colour space requested through [`TextureOptions`].

use anyhow::*;
use image::{DynamicImage, ImageFormat, RgbaImage, load_from_memory_with_format};

/// Vertical texture-axis convention of an uploaded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// First image row at `v = 0` (glTF convention).
    TopDown,
    /// Image flipped on upload so the first row lands at `v = 1`.
    FlippedY,
}

/// How an image file becomes a GPU texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureOptions {
    pub orientation: Orientation,
    /// Colour data (sRGB) versus raw data such as normal maps or masks (linear).
    pub srgb: bool,
    pub address_mode: wgpu::AddressMode,
}

impl TextureOptions {
    /// Colour image flipped like a plane texture, clamped at the edges.
    pub fn plane_color() -> Self {
        Self {
            orientation: Orientation::FlippedY,
            srgb: true,
            address_mode: wgpu::AddressMode::ClampToEdge,
        }
    }

    pub fn repeating(mut self) -> Self {
        self.address_mode = wgpu::AddressMode::Repeat;
        self
    }

    pub fn linear(mut self) -> Self {
        self.srgb = false;
        self
    }

    /// Unflipped colour image as used by model materials.
    pub fn model_color() -> Self {
        Self {
            orientation: Orientation::TopDown,
            srgb: true,
            address_mode: wgpu::AddressMode::Repeat,
        }
    }

    pub fn normal_map() -> Self {
        Self::model_color().linear()
    }
}

/// A GPU texture with a view and sampler.
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub orientation: Orientation,
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(device: &wgpu::Device, size: [u32; 2], label: &str) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 100.0,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            orientation: Orientation::TopDown,
        }
    }

    /// Upload a decoded image.
    ///
    /// Fails without touching the GPU when the image does not fit the device's
    /// texture size limit.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: &RgbaImage,
        label: Option<&str>,
        options: TextureOptions,
    ) -> Result<Self> {
        let dimensions = rgba.dimensions();
        check_dimensions(
            dimensions,
            device.limits().max_texture_dimension_2d,
            label.unwrap_or("texture"),
        )?;
        let size = wgpu::Extent3d {
            width: dimensions.0,
            height: dimensions.1,
            depth_or_array_layers: 1,
        };
        let format = if options.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * dimensions.0),
                rows_per_image: Some(dimensions.1),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = create_sampler(device, options.address_mode);

        Ok(Self {
            texture,
            view,
            sampler,
            orientation: options.orientation,
        })
    }
}

/// Rejects images the device cannot hold as a single 2D texture.
pub fn check_dimensions((width, height): (u32, u32), max: u32, name: &str) -> Result<()> {
    ensure!(width > 0 && height > 0, "Image {name} is empty");
    ensure!(
        width <= max && height <= max,
        "Image {name} is {width}x{height}, the device allows at most {max}x{max}"
    );
    Ok(())
}

/// Decode an image file and bring it into the requested orientation.
///
/// The format is taken from the extension of `name` when it has a known one
/// and guessed from the content otherwise.
pub fn decode_image(bytes: &[u8], name: &str, orientation: Orientation) -> Result<RgbaImage> {
    let format = std::path::Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ImageFormat::from_extension);
    let img: DynamicImage = match format {
        Some(format) => load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    }
    .with_context(|| format!("Could not decode image {name}"))?;
    let img = match orientation {
        Orientation::TopDown => img,
        Orientation::FlippedY => img.flipv(),
    };
    Ok(img.to_rgba8())
}

pub fn create_sampler(device: &wgpu::Device, address_mode: wgpu::AddressMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}
