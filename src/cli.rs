// SPDX-License-Identifier: GPL-3.0-only

//! Command implementations
//!
//! - Default: run the preview until stopped
//! - `bench`: run the preview benchmark

use crate::PreviewArgs;
use picamviewer::backends::camera::GstRegistry;
use picamviewer::bench::{self, BenchOptions};
use picamviewer::config::PreviewConfig;
use picamviewer::constants::defaults;
use picamviewer::display::{self, DisplayProbe};
use picamviewer::errors::AppResult;
use picamviewer::launcher;
use picamviewer::shutdown::ShutdownSignal;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Freeze the command line and environment into a configuration
fn build_config(args: &PreviewArgs) -> AppResult<PreviewConfig> {
    let env_display = std::env::var(defaults::DISPLAY_ENV).ok();
    let display = display::resolve_display(args.display.as_deref(), env_display.as_deref());

    // `--fullscreen` only exists for symmetry; clap rejects it with `--no-fullscreen`
    let fullscreen = args.fullscreen || !args.no_fullscreen;

    let config = PreviewConfig::new(
        args.width,
        args.height,
        args.framerate,
        fullscreen,
        args.rotation,
        display,
    )?;

    info!(
        width = config.width(),
        height = config.height(),
        framerate = config.framerate(),
        fullscreen = config.fullscreen(),
        rotation = config.rotation().degrees(),
        display = config.display(),
        "Configuration"
    );
    Ok(config)
}

/// Process-wide setup shared by both commands.
///
/// Order matters: the display is exported while the process is still
/// single-threaded, before the signal thread and GStreamer start.
fn setup(args: &PreviewArgs) -> AppResult<(PreviewConfig, ShutdownSignal, GstRegistry)> {
    let config = build_config(args)?;
    display::export_display(config.display());
    let shutdown = ShutdownSignal::install()?;
    let registry = GstRegistry::init()?;
    Ok((config, shutdown, registry))
}

/// Show the preview until SIGINT/SIGTERM or the window is closed
pub fn run_preview(args: &PreviewArgs) -> AppResult<()> {
    let (config, shutdown, registry) = setup(args)?;
    let exit = launcher::launch(&config, &DisplayProbe::default(), &registry, &shutdown)?;
    info!(?exit, "PiCamViewer exiting");
    Ok(())
}

/// Benchmark the preview and write a JSON report
pub fn run_bench(
    args: &PreviewArgs,
    runs: u32,
    warmup: u64,
    duration: u64,
    output: Option<PathBuf>,
) -> AppResult<()> {
    let (config, shutdown, registry) = setup(args)?;
    let backend = launcher::prepare(&config, &DisplayProbe::default(), &registry)?;

    let options = BenchOptions {
        runs,
        warmup: Duration::from_secs(warmup),
        duration: Duration::from_secs(duration),
        output,
    };
    bench::run(backend, &config, &options, &shutdown)?;
    Ok(())
}
