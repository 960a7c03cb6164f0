use anyhow::Context;
use winit::dpi::LogicalSize;

use rendr_engine::device::GpuInit;
use rendr_engine::logging::{init_logging, LoggingConfig};
use rendr_engine::window::{Runtime, RuntimeConfig};
use rendr_fern::{FernApp, FernMesh, SceneConfig};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let mesh = FernMesh::builtin().context("failed to load fern mesh")?;
    let app = FernApp::new(mesh, SceneConfig::default());

    let config = RuntimeConfig {
        title: "rendr fern".to_string(),
        initial_size: LogicalSize::new(1280.0, 720.0),
    };

    Runtime::run(config, GpuInit::default(), app)
}
