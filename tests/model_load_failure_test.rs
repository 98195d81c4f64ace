use std::{cell::RefCell, path::Path, rc::Rc};

use image::{DynamicImage, RgbImage, RgbaImage};
use melon_scene::{
    config::AssetPaths,
    render_loop::{Frame, LoopState, RenderLoop},
    resources::{load_scene_assets, texture::Assets},
};

#[derive(Default)]
struct SpyFrame {
    updates: u32,
    rasterized: u32,
}

impl Frame for SpyFrame {
    fn update_controls(&mut self) {
        self.updates += 1;
    }

    fn rasterize(&mut self) {
        self.rasterized += 1;
    }
}

fn write_plane_images(root: &Path, paths: &AssetPaths) {
    std::fs::create_dir_all(root.join("img")).unwrap();
    DynamicImage::ImageRgb8(RgbImage::new(4, 4))
        .save(root.join(&paths.texture_a))
        .unwrap();
    RgbaImage::new(4, 4).save(root.join(&paths.texture_b)).unwrap();
    RgbaImage::new(4, 4).save(root.join(&paths.mask)).unwrap();
}

fn spy_loop() -> (RenderLoop, Rc<RefCell<Vec<String>>>) {
    let reported = Rc::new(RefCell::new(Vec::new()));
    let sink = reported.clone();
    let render_loop = RenderLoop::with_diagnostics(Box::new(move |e: &anyhow::Error| {
        sink.borrow_mut().push(format!("{e:#}"));
    }));
    (render_loop, reported)
}

#[tokio::test]
async fn missing_model_never_rasterizes() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AssetPaths::default();
    write_plane_images(dir.path(), &paths);

    let assets = load_scene_assets(&Assets::new(dir.path().to_string_lossy()), &paths).await;
    assert!(assets.plane.is_ok(), "plane textures should load on their own");

    let (mut render_loop, reported) = spy_loop();
    assert!(render_loop.resolve_model(assets.model).is_none());
    assert_eq!(render_loop.state(), LoopState::Idle);

    let reported = reported.borrow();
    assert_eq!(reported.len(), 1);
    assert!(
        reported[0].contains("models/watermelon2.glb"),
        "diagnostic should name the model: {}",
        reported[0]
    );

    let mut frame = SpyFrame::default();
    for _ in 0..10 {
        assert!(!render_loop.frame(&mut frame));
    }
    assert_eq!(frame.updates, 0);
    assert_eq!(frame.rasterized, 0);
    assert_eq!(render_loop.frames(), 0);
}

#[tokio::test]
async fn corrupt_model_is_reported_once() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AssetPaths::default();
    write_plane_images(dir.path(), &paths);
    std::fs::create_dir_all(dir.path().join("models")).unwrap();
    std::fs::write(dir.path().join(&paths.model), b"not a glb").unwrap();

    let assets = load_scene_assets(&Assets::new(dir.path().to_string_lossy()), &paths).await;

    let (mut render_loop, reported) = spy_loop();
    assert!(render_loop.resolve_model(assets.model).is_none());
    assert_eq!(reported.borrow().len(), 1);
    assert!(reported.borrow()[0].contains("watermelon2.glb"));
    assert!(!render_loop.frame(&mut SpyFrame::default()));
}

#[tokio::test]
async fn missing_textures_do_not_block_the_model_result() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AssetPaths::default();

    let assets = load_scene_assets(&Assets::new(dir.path().to_string_lossy()), &paths).await;
    let err = assets.plane.unwrap_err();
    assert!(format!("{err:#}").contains("img/"));
    assert!(assets.model.is_err());
}
