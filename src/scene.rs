//! The drawables of the scene and their per-frame state.

use std::sync::Arc;

use instant::Duration;

use crate::{
    animation::{AnimationController, PointerFollow},
    config::SceneConfig,
    context::Context,
    data_structures::{
        instance::Instance,
        model::{DrawModel, Model, PbrMaterial},
        plane::{PlaneTextures, TransitionMaterial, TransitionPlane},
        texture::{Texture, TextureOptions},
    },
    input::PointerState,
    resources::{ModelAssets, PlaneImages},
};

#[derive(Debug)]
pub struct Scene {
    pub model: Option<Model>,
    pub plane: Option<TransitionPlane>,
    pub animation: AnimationController,
    pub pointer: PointerState,
    follow: Option<PointerFollow>,
}

impl Scene {
    pub fn new(config: &SceneConfig) -> Self {
        Self {
            model: None,
            plane: None,
            animation: AnimationController::new(&config.animation),
            pointer: PointerState::default(),
            follow: config.animation.follow_pointer.then(PointerFollow::default),
        }
    }

    /// Uploads the plane textures and creates the plane.
    pub fn attach_plane(
        &mut self,
        ctx: &Context,
        images: PlaneImages,
        config: &SceneConfig,
    ) -> anyhow::Result<()> {
        let textures = PlaneTextures {
            a: Texture::from_rgba(
                &ctx.device,
                &ctx.queue,
                &images.a,
                Some(config.assets.texture_a.as_str()),
                TextureOptions::plane_color().repeating(),
            )?,
            b: Texture::from_rgba(
                &ctx.device,
                &ctx.queue,
                &images.b,
                Some(config.assets.texture_b.as_str()),
                TextureOptions::plane_color(),
            )?,
            mask: Texture::from_rgba(
                &ctx.device,
                &ctx.queue,
                &images.mask,
                Some(config.assets.mask.as_str()),
                TextureOptions::plane_color().repeating().linear(),
            )?,
        };
        let material = TransitionMaterial::new(
            &ctx.device,
            &ctx.pipelines.transition_layout,
            config.transition,
            textures,
        );
        self.plane = Some(TransitionPlane::new(
            &ctx.device,
            config.plane_size,
            config.plane_segments,
            material,
        ));
        log::info!("Transition plane ready");
        Ok(())
    }

    /// Uploads the model and gives every mesh the shared material.
    pub fn upload_model(ctx: &Context, assets: ModelAssets, config: &SceneConfig) -> anyhow::Result<Model> {
        let diffuse = Texture::from_rgba(
            &ctx.device,
            &ctx.queue,
            &assets.diffuse,
            Some(config.assets.model_diffuse.as_str()),
            TextureOptions::model_color(),
        )?;
        let normal = Texture::from_rgba(
            &ctx.device,
            &ctx.queue,
            &assets.normal,
            Some(config.assets.model_normal.as_str()),
            TextureOptions::normal_map(),
        )?;
        let material = PbrMaterial::new(
            &ctx.device,
            &assets.data.name,
            diffuse,
            normal,
            &ctx.pipelines.model_layout,
        )?;
        let placement = Instance::from(cgmath::Vector3::from(config.model_position));
        Ok(Model::new(&ctx.device, &assets.data, Arc::new(material), placement))
    }

    /// Applies queued animation commands and moves the plane.
    pub fn update(&mut self, ctx: &Context, dt: Duration) {
        let Some(plane) = &mut self.plane else {
            return;
        };
        let outcome = self.animation.update(&mut plane.material.params, dt);
        if outcome.swap_textures {
            plane.material.swap_sources(&ctx.device);
        }
        if outcome.params_changed {
            plane.material.write_uniform(&ctx.queue);
        }
        if let Some(follow) = &self.follow {
            let offset = follow.step(plane.offset(), &self.pointer, dt);
            plane.set_offset(&ctx.queue, offset);
        }
    }

    /// Opaque model first, then the transparent plane on top.
    pub fn draw(&self, ctx: &Context, render_pass: &mut wgpu::RenderPass<'_>) {
        if let Some(model) = &self.model {
            render_pass.set_pipeline(&ctx.pipelines.model);
            render_pass.draw_model(model, &ctx.camera.bind_group, &ctx.light.bind_group);
        }
        if let Some(plane) = &self.plane {
            render_pass.set_pipeline(&ctx.pipelines.transition);
            plane.draw(render_pass, &ctx.camera.bind_group);
        }
    }
}
