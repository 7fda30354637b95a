// SPDX-License-Identifier: GPL-3.0-only

//! Startup sequence: display check, backend probe, preview, teardown
//!
//! Every failure is terminal. The display is verified before the camera
//! stacks are probed, so the no-display path never touches the camera.

use crate::backends::camera::{CameraBackendType, ElementRegistry, select_backend};
use crate::config::PreviewConfig;
use crate::display::DisplayProbe;
use crate::errors::AppResult;
use crate::preview::{PreviewExit, PreviewSession};
use crate::shutdown::ShutdownSignal;
use tracing::info;

/// Check the display and pick a backend without starting anything
pub fn prepare<R: ElementRegistry + ?Sized>(
    config: &PreviewConfig,
    display_probe: &DisplayProbe,
    registry: &R,
) -> AppResult<CameraBackendType> {
    display_probe.check(config.display())?;
    Ok(select_backend(registry)?)
}

/// Run the preview until it is stopped.
///
/// Returns how the preview ended; the session is already torn down when
/// this returns, on success and on error alike.
pub fn launch<R: ElementRegistry + ?Sized>(
    config: &PreviewConfig,
    display_probe: &DisplayProbe,
    registry: &R,
    shutdown: &ShutdownSignal,
) -> AppResult<PreviewExit> {
    let backend = prepare(config, display_probe, registry)?;

    let session = PreviewSession::start(backend, config)?;
    let exit = session.run_until(shutdown, None)?;
    drop(session);

    info!(?exit, "Preview finished");
    Ok(exit)
}
