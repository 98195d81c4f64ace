//! In-code configuration of the scene.
//!
//! There are no configuration files. Binaries build a [`SceneConfig`] (usually
//! via `Default`, which reproduces the reference scene) and hand it to
//! [`crate::flow::run`].

use std::f32::consts::PI;

use crate::transition::TransitionParams;

/// What happens to the camera when the surface changes size after startup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResizePolicy {
    /// The aspect ratio stays the one measured at startup. The image stretches.
    #[default]
    KeepStartupAspect,
    /// The aspect ratio follows the surface.
    TrackSurface,
}

/// Asset names relative to the asset root.
#[derive(Clone, Debug, PartialEq)]
pub struct AssetPaths {
    /// Directory (native) or URL path segment (web) that holds all assets.
    pub root: String,
    /// Shown while the transition is at `0`.
    pub texture_a: String,
    /// Shown once the transition reached `1`.
    pub texture_b: String,
    pub mask: String,
    pub model: String,
    pub model_diffuse: String,
    pub model_normal: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            root: "assets".to_string(),
            texture_a: "img/sea.jpg".to_string(),
            texture_b: "img/fire.png".to_string(),
            mask: "img/transition1.png".to_string(),
            model: "models/watermelon2.glb".to_string(),
            model_diffuse: "img/watermelontexture2.jpg".to_string(),
            model_normal: "img/NormalMap2.png".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraSettings {
    pub eye: [f32; 3],
    pub target: [f32; 3],
    /// Vertical field of view in degrees.
    pub fovy: f32,
    pub znear: f32,
    pub zfar: f32,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_polar: f32,
    pub max_polar: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            eye: [1.5, 1.0, 2.0],
            target: [0.0, 0.0, 0.0],
            fovy: 75.0,
            znear: 0.1,
            zfar: 1000.0,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_polar: 0.0,
            max_polar: PI / 2.2,
            min_distance: 0.05,
            max_distance: 100.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightSettings {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub directional_position: [f32; 3],
    pub directional_color: [f32; 3],
    pub directional_intensity: f32,
    pub point_position: [f32; 3],
    pub point_color: [f32; 3],
    pub point_intensity: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            ambient_color: [1.0; 3],
            ambient_intensity: 0.5,
            directional_position: [5.0, 5.0, 5.0],
            directional_color: [1.0; 3],
            directional_intensity: 1.0,
            point_position: [0.0, 2.0, 1.0],
            point_color: [1.0; 3],
            point_intensity: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnimationSettings {
    /// Start with the auto animation running.
    pub auto_animate: bool,
    /// Transition units per second while running.
    pub speed: f32,
    /// Multiplier from frame time to the shader's `time` uniform.
    pub time_scale: f32,
    pub transition_step: f32,
    pub strength_step: f32,
    /// Let the plane drift towards the pointer.
    pub follow_pointer: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            auto_animate: false,
            speed: 0.25,
            time_scale: 0.3,
            transition_step: 0.05,
            strength_step: 0.01,
            follow_pointer: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneConfig {
    pub title: String,
    pub clear_colour: wgpu::Color,
    pub assets: AssetPaths,
    pub camera: CameraSettings,
    pub lights: LightSettings,
    pub transition: TransitionParams,
    pub animation: AnimationSettings,
    pub resize_policy: ResizePolicy,
    /// World position of the loaded model.
    pub model_position: [f32; 3],
    /// Width and depth of the transition plane.
    pub plane_size: [f32; 2],
    pub plane_segments: [u32; 2],
}

impl Default for SceneConfig {
    fn default() -> Self {
        // #CCCCCC, cleared into an sRGB surface
        let grey = srgb_to_linear(0xCC as f64 / 255.0);
        Self {
            title: "melon-scene".to_string(),
            clear_colour: wgpu::Color {
                r: grey,
                g: grey,
                b: grey,
                a: 1.0,
            },
            assets: AssetPaths::default(),
            camera: CameraSettings::default(),
            lights: LightSettings::default(),
            transition: TransitionParams::default(),
            animation: AnimationSettings::default(),
            resize_policy: ResizePolicy::default(),
            model_position: [0.0, 0.182, 0.0],
            plane_size: [7.0, 5.0],
            plane_segments: [10, 1],
        }
    }
}

pub fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
