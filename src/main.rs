use melon_scene::{SceneConfig, run};

fn main() -> anyhow::Result<()> {
    run(SceneConfig::default())
}
