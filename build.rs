use anyhow::{Context, Result};
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::{Path, PathBuf};

const ASSETS: &str = "assets";

/// `target/<profile>`, the directory the binary lands in.
fn profile_dir(out_dir: &Path) -> Result<PathBuf> {
    // OUT_DIR is target/<profile>/build/<crate>-<hash>/out
    out_dir
        .ancestors()
        .nth(3)
        .map(Path::to_path_buf)
        .context("Unexpected OUT_DIR layout")
}

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed={ASSETS}");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join(ASSETS);
    if !assets_src.exists() {
        println!(
            "cargo:warning=No {ASSETS}/ directory, the scene needs the textures and the model at runtime"
        );
        return Ok(());
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let target = profile_dir(&out_dir)?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], &target, &copy_options)
        .with_context(|| format!("Could not copy {ASSETS}/ to {}", target.display()))?;

    Ok(())
}
