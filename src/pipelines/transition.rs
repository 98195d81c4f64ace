use crate::{
    data_structures::{
        instance::InstanceRaw,
        model::Vertex,
        plane::PlaneVertex,
        texture::Texture,
    },
    pipelines::basic::mk_render_pipeline,
};

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            multisampled: false,
            view_dimension: wgpu::TextureViewDimension::D2,
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

/// Uniform at binding 0, then texture/sampler pairs for A, B and the mask.
pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            texture_entry(1),
            sampler_entry(2),
            texture_entry(3),
            sampler_entry(4),
            texture_entry(5),
            sampler_entry(6),
        ],
        label: Some("transition_bind_group_layout"),
    })
}

/**
 * Transparent and double sided: the plane is visible from below and blends
 * with whatever was drawn before it.
 */
pub fn mk_transition_pipeline(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    transition_bind_group_layout: &wgpu::BindGroupLayout,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Transition Pipeline Layout"),
        bind_group_layouts: &[transition_bind_group_layout, camera_bind_group_layout],
        push_constant_ranges: &[],
    });
    let shader = wgpu::ShaderModuleDescriptor {
        label: Some("Transition Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("transition.wgsl").into()),
    };
    mk_render_pipeline(
        device,
        &layout,
        config.format,
        Some(wgpu::BlendState::ALPHA_BLENDING),
        Some(Texture::DEPTH_FORMAT),
        None,
        &[PlaneVertex::desc(), InstanceRaw::desc()],
        shader,
    )
}

#[cfg(test)]
mod tests {
    #[test]
    fn shader_uses_the_cpu_blend_arithmetic() {
        let source = include_str!("transition.wgsl");
        assert!(source.contains("clamp(t + s * (t - m), 0.0, 1.0)"));
        assert!(source.contains("a * (1.0 - w) + b * w"));
    }
}
