// Compiles the GLSL sources in shaders/ to the SPIR-V the renderer loads at startup.

use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADER_DIR: &str = "shaders";
const SHADERS: &[(&str, &str)] = &[("shader.vert", "vert.spv"), ("shader.frag", "frag.spv")];

fn glslc() -> PathBuf {
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");

    match env::var_os("VULKAN_SDK") {
        Some(sdk) => Path::new(&sdk).join("bin").join("glslc"),
        None => PathBuf::from("glslc"),
    }
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");

    if env::var_os("SKIP_SHADERS").is_some() {
        println!("cargo:warning=SKIP_SHADERS set, shader compilation skipped");
        return;
    }

    let glslc = glslc();
    let shader_dir = Path::new(SHADER_DIR);

    for (source, output) in SHADERS {
        let source = shader_dir.join(source);
        let output = shader_dir.join(output);
        println!("cargo:rerun-if-changed={}", source.display());

        match Command::new(&glslc).arg(&source).arg("-o").arg(&output).status() {
            Ok(status) if status.success() => {}
            Ok(status) => panic!("glslc failed for {:?} ({:?})", source, status.code()),
            // Prebuilt SPIR-V or shaders/compile.sh still work without the SDK.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                println!("cargo:warning=glslc not found, {:?} not compiled", source);
                return;
            }
            Err(e) => panic!("Failed to run glslc for {:?}: {}", source, e),
        }
    }
}
