//! Application event loop.
//!
//! [`run`] opens the window, builds the [`Context`] and starts the asset loads.
//! Loaded assets are uploaded on the event loop thread. The per-frame work is
//! gated by a [`RenderLoop`]: nothing is drawn before the model arrived.
//!
//! # Lifecycle
//!
//! 1. `resumed` creates the window and the GPU context
//! 2. textures and the model load concurrently
//! 3. the plane is attached when its textures arrived, the model resolves the render loop
//! 4. each redraw advances the camera and the animation, then draws model and plane

use std::{fmt::Debug, iter, sync::Arc};

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    config::SceneConfig,
    context::Context,
    input::command_for_key,
    render_loop::{Frame, RenderLoop},
    resources::{SceneAssets, load_scene_assets, texture::Assets},
    scene::Scene,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Results handed back to the event loop by the web loaders.
pub(crate) enum SceneEvent {
    #[allow(dead_code)]
    Initialized(Box<Context>),
    #[allow(dead_code)]
    Loaded(SceneAssets),
    #[allow(dead_code)]
    Failed(anyhow::Error),
}

impl Debug for SceneEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialized(_) => f.write_str("Initialized"),
            Self::Loaded(_) => f.write_str("Loaded"),
            Self::Failed(e) => f.debug_tuple("Failed").field(e).finish(),
        }
    }
}

/// GPU context plus everything drawn with it.
#[derive(Debug)]
struct AppState {
    ctx: Context,
    scene: Scene,
}

/// One frame of the scene as seen by the [`RenderLoop`].
struct SceneFrame<'a> {
    ctx: &'a mut Context,
    scene: &'a mut Scene,
    dt: Duration,
    result: Result<(), wgpu::SurfaceError>,
}

impl Frame for SceneFrame<'_> {
    fn update_controls(&mut self) {
        self.ctx.camera.update(&self.ctx.queue, &self.ctx.projection);
        self.scene.update(self.ctx, self.dt);
    }

    fn rasterize(&mut self) {
        self.result = render(self.ctx, self.scene);
    }
}

fn render(ctx: &Context, scene: &Scene) -> Result<(), wgpu::SurfaceError> {
    // invoke main render loop
    ctx.window.request_redraw();

    // Rendering requires the surface to be configured
    if !ctx.is_surface_configured() {
        return Ok(());
    }

    let output = ctx.surface.get_current_texture()?;
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });
    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(ctx.clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        scene.draw(ctx, &mut render_pass);
    }

    ctx.queue.submit(iter::once(encoder.finish()));
    output.present();
    Ok(())
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<SceneEvent>,
    config: SceneConfig,
    assets: Assets,
    state: Option<AppState>,
    render_loop: RenderLoop,
    last_time: Instant,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(event_loop: &EventLoop<SceneEvent>, config: SceneConfig) -> anyhow::Result<Self> {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new()?;
        let assets = Assets::new(config.assets.root.clone());
        Ok(Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            config,
            assets,
            state: None,
            render_loop: RenderLoop::new(),
            last_time: Instant::now(),
            error: None,
        })
    }

    fn initialized(&mut self, ctx: Context) {
        let mut state = AppState {
            scene: Scene::new(&self.config),
            ctx,
        };
        let size = state.ctx.window().inner_size();
        state.ctx.resize(size.width, size.height);
        self.state = Some(state);
    }

    /// Uploads what arrived and feeds the model result into the render loop.
    fn loaded(&mut self, assets: SceneAssets) {
        let Some(state) = &mut self.state else {
            log::warn!("Assets arrived before the GPU context, dropping them");
            return;
        };
        let plane = assets
            .plane
            .and_then(|images| state.scene.attach_plane(&state.ctx, images, &self.config));
        if let Err(e) = plane {
            log::error!("Could not load the plane textures, leaving the plane out: {:#}", e);
        }
        let model = assets
            .model
            .and_then(|model| Scene::upload_model(&state.ctx, model, &self.config));
        if let Some(model) = self.render_loop.resolve_model(model) {
            state.scene.model = Some(model);
            self.last_time = Instant::now();
            state.ctx.window().request_redraw();
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{:#}", error);
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler<SceneEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes().with_title(self.config.title.clone());

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            const CANVAS_ID: &str = "canvas";

            let window = web_sys::window().unwrap_throw();
            let document = window.document().unwrap_throw();
            let canvas = document.get_element_by_id(CANVAS_ID).unwrap_throw();
            let html_canvas_element = canvas.unchecked_into();
            window_attributes = window_attributes.with_canvas(Some(html_canvas_element));
        }

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow::Error::new(e).context("Could not open a window")),
        };

        #[cfg(not(target_arch = "wasm32"))]
        {
            let ctx = match self.async_runtime.block_on(Context::new(window, &self.config)) {
                Ok(ctx) => ctx,
                Err(e) => return self.fail(event_loop, e.context("App initialization failed")),
            };
            self.initialized(ctx);
            let assets = self
                .async_runtime
                .block_on(load_scene_assets(&self.assets, &self.config.assets));
            self.loaded(assets);
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            let config = self.config.clone();
            let assets = self.assets.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let ctx = match Context::new(window, &config).await {
                    Ok(ctx) => ctx,
                    Err(e) => {
                        let _ = proxy.send_event(SceneEvent::Failed(e.context("App initialization failed")));
                        return;
                    }
                };
                if proxy.send_event(SceneEvent::Initialized(Box::new(ctx))).is_err() {
                    return;
                }
                let loaded = load_scene_assets(&assets, &config.assets).await;
                let _ = proxy.send_event(SceneEvent::Loaded(loaded));
            });
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: SceneEvent) {
        match event {
            // This is the message from our wasm `spawn_local`
            SceneEvent::Initialized(ctx) => self.initialized(*ctx),
            SceneEvent::Loaded(assets) => self.loaded(assets),
            SceneEvent::Failed(e) => self.fail(event_loop, e),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let state = match &mut self.state {
            Some(state) => state,
            None => return,
        };

        state.ctx.camera.controller.handle_window_events(&event);
        state
            .scene
            .pointer
            .handle_window_events(&event, state.ctx.window().inner_size());

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => state.ctx.resize(size.width, size.height),
            WindowEvent::KeyboardInput { event, .. } => {
                if let Some(command) = command_for_key(&event, &self.config.animation) {
                    log::debug!("Key {:?} -> {:?}", event.physical_key, command);
                    state.scene.animation.push(command);
                }
            }
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();

                let mut frame = SceneFrame {
                    ctx: &mut state.ctx,
                    scene: &mut state.scene,
                    dt,
                    result: Ok(()),
                };
                if !self.render_loop.frame(&mut frame) {
                    return;
                }
                let result = frame.result;
                match result {
                    Ok(()) => {}
                    // Reconfigure the surface if it's lost or outdated
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = state.ctx.window().inner_size();
                        state.ctx.resize(size.width, size.height);
                    }
                    Err(e) => {
                        log::error!("Unable to render {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Opens the window and runs the scene until it is closed.
pub fn run(config: SceneConfig) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            eprintln!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<SceneEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, config)?;

    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
