use cgmath::InnerSpace;
use wgpu::util::DeviceExt;

use crate::config::LightSettings;

/// The three scene lights, stored the way `model.wgsl` reads them.
///
/// Colours are premultiplied with their intensity. Every field is a vec4 so the
/// struct needs no manual padding.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    directional_direction: [f32; 4],
    directional_color: [f32; 4],
    point_position: [f32; 4],
    point_color: [f32; 4],
}

impl LightUniform {
    pub fn new(settings: &LightSettings) -> Self {
        // A directional light shines from its position towards the origin
        let direction = cgmath::Vector3::from(settings.directional_position);
        let direction = if direction.magnitude2() > 0.0 {
            direction.normalize()
        } else {
            cgmath::Vector3::unit_y()
        };
        Self {
            ambient: premultiply(settings.ambient_color, settings.ambient_intensity),
            directional_direction: direction.extend(0.0).into(),
            directional_color: premultiply(settings.directional_color, settings.directional_intensity),
            point_position: cgmath::Vector3::from(settings.point_position).extend(1.0).into(),
            point_color: premultiply(settings.point_color, settings.point_intensity),
        }
    }
}

fn premultiply(color: [f32; 3], intensity: f32) -> [f32; 4] {
    [color[0] * intensity, color[1] * intensity, color[2] * intensity, 1.0]
}

#[derive(Debug)]
pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, settings: &LightSettings) -> Self {
        let uniform = LightUniform::new(settings);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        log::info!("Lights ready: {:?}", settings);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Uniform Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lights() {
        let uniform = LightUniform::new(&LightSettings::default());
        assert_eq!(uniform.ambient, [0.5, 0.5, 0.5, 1.0]);
        let d = 1.0 / 3.0f32.sqrt();
        for c in &uniform.directional_direction[..3] {
            assert!((c - d).abs() < 1e-6);
        }
        assert_eq!(uniform.point_position, [0.0, 2.0, 1.0, 1.0]);
        assert_eq!(uniform.point_color, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn light_at_the_origin_still_has_a_direction() {
        let settings = LightSettings {
            directional_position: [0.0; 3],
            ..Default::default()
        };
        let uniform = LightUniform::new(&settings);
        assert_eq!(uniform.directional_direction, [0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn uniform_is_five_vec4s() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 80);
    }
}
