//! Entry point for the model viewer.
//! Flags are `--name=value`; every flag is optional.

use std::path::PathBuf;

use anyhow::Result;
use platform::ViewerConfig;
use platform::viewer::DEFAULT_TEXTURE;

fn parse_backend(val: &str) -> wgpu::Backends {
    match val.to_ascii_lowercase().as_str() {
        "auto" => wgpu::Backends::all(),
        "vulkan" | "vk" => wgpu::Backends::VULKAN,
        "dx12" | "d3d12" => wgpu::Backends::DX12,
        "metal" | "mtl" => wgpu::Backends::METAL,
        "gl" | "opengl" | "gles" => wgpu::Backends::GL,
        other => {
            log::warn!("Unknown backend '{}', falling back to auto.", other);
            wgpu::Backends::all()
        }
    }
}

fn parse_switch(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

fn parse_size(val: &str) -> Option<(u32, u32)> {
    let (w, h) = val.split_once('x').or_else(|| val.split_once('X'))?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

/// Build the viewer configuration from command-line arguments.
fn parse_args(args: impl IntoIterator<Item = String>) -> ViewerConfig {
    let mut config = ViewerConfig::default();
    let mut textures: Vec<PathBuf> = Vec::new();

    for arg in args {
        if arg == "--show-fps" {
            config.show_fps = true;
            continue;
        }
        let Some((key, val)) = arg.split_once('=') else {
            log::warn!("Ignoring argument '{}'", arg);
            continue;
        };
        match key {
            "--gpu-backend" => config.backends = parse_backend(val),
            "--show-fps" => config.show_fps = parse_switch(val),
            "--size" => match parse_size(val) {
                Some((w, h)) => {
                    config.width = w;
                    config.height = h;
                }
                None => log::warn!("Bad --size '{}', expected WxH", val),
            },
            "--width" => config.width = val.parse().unwrap_or(config.width),
            "--height" => config.height = val.parse().unwrap_or(config.height),
            "--model" => config.source.model = PathBuf::from(val),
            "--texture" => textures.push(PathBuf::from(val)),
            "--drawing" => config.source.drawings.push(PathBuf::from(val)),
            "--cleaner" => config.source.cleaner = Some(PathBuf::from(val)),
            "--canvas" => config.canvas = val.to_owned(),
            _ => log::warn!("Ignoring unknown flag '{}'", key),
        }
    }

    if !textures.is_empty() {
        config.source.textures = textures;
    }
    config.width = config.width.max(1);
    config.height = config.height.max(1);
    config
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = parse_args(std::env::args().skip(1));
    log::info!(
        "Starting viewer. Backend: {:?}, show_fps={}, canvas={}x{}, model={}",
        config.backends,
        config.show_fps,
        config.width,
        config.height,
        config.source.model.display()
    );

    platform::run_viewer(config)?;

    log::info!("Graceful shutdown. Bye!");
    Ok(())
}
