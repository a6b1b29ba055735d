//! Compiles `glint-shaders` into SPIR-V and puts one `<pass>.spv` per compute
//! pass into the output directory (`target/shaders` by default), where
//! `glint::Engine::new()` picks them up.

use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use spirv_builder::{MetadataPrintout, SpirvBuilder};

fn main() -> Result<(), Box<dyn Error>> {
    let workspace_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .ok_or("couldn't find workspace directory")?;

    let crate_path = workspace_path.join("glint-shaders");

    let out_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace_path.join("target").join("shaders"));

    fs::create_dir_all(&out_dir)?;

    let result = SpirvBuilder::new(crate_path, "spirv-unknown-spv1.3")
        .multimodule(true)
        .print_metadata(MetadataPrintout::DependencyOnly)
        .build()?;

    for (shader_name, shader_path) in result.module.unwrap_multi() {
        let shader_id = shader_name.replace("::", "_");
        let shader_id = shader_id.strip_suffix("_main").unwrap_or(&shader_id);
        let target = out_dir.join(format!("{shader_id}.spv"));

        fs::copy(shader_path, &target)?;

        println!("{shader_name} -> {}", target.display());
    }

    Ok(())
}
