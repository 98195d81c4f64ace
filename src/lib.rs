//! melon-scene
//!
//! A watermelon model above a ground plane, viewed through a damped orbit
//! camera. The plane blends two textures through a grayscale mask, driven by a
//! transition and a strength parameter. Runs natively and in the browser.
//!
//! High-level modules
//! - `animation`: keyboard driven tweens of the transition parameters
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `config`: scene settings and their defaults
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: meshes, instances, textures and the transition plane
//! - `flow`: the winit application and its event loop
//! - `input`: pointer tracking and key bindings
//! - `pipelines`: the PBR model pipeline and the transition pipeline
//! - `render_loop`: gate that starts rendering once the model loaded
//! - `resources`: asset fetching and glTF loading
//! - `scene`: the drawables and their per-frame updates
//! - `transition`: CPU mirror of the blend shader
//!

pub mod animation;
pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod input;
pub mod pipelines;
pub mod render_loop;
pub mod resources;
pub mod scene;
pub mod transition;

pub use config::SceneConfig;
pub use flow::run;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn run_web() -> Result<(), wasm_bindgen::JsValue> {
    run(SceneConfig::default()).map_err(|e| wasm_bindgen::JsValue::from_str(&format!("{e:#}")))
}
