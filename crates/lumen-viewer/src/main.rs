use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;

use lumen_engine::config::LumenConfig;
use lumen_engine::device::GpuInit;
use lumen_engine::logging::{init_logging, LoggingConfig};
use lumen_engine::window::{Runtime, RuntimeConfig};

mod viewer;

use viewer::Viewer;

/// Config file read from the working directory when present.
const CONFIG_PATH: &str = "lumen.toml";

fn main() {
    init_logging(LoggingConfig::default());

    if let Err(err) = run() {
        log::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = LumenConfig::load(CONFIG_PATH).context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    let runtime = RuntimeConfig {
        title: config.window.title.clone(),
        initial_size: PhysicalSize::new(config.window.width, config.window.height),
        resizable: false,
    };

    let viewer = Viewer::load(config);
    Runtime::run(runtime, GpuInit::default(), viewer)
}
