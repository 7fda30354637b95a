// SPDX-License-Identifier: GPL-3.0-only

//! PiCamViewer - full-screen Raspberry Pi camera preview launcher
//!
//! Meant to be started at boot by the service manager. It checks that the
//! display is reachable, picks whichever camera stack is installed
//! (libcamera first, the legacy rpicam stack otherwise), and keeps a
//! GPU-composited preview on screen until it is told to stop.
//!
//! # Architecture
//!
//! - [`config`]: validated preview configuration
//! - [`display`]: display identifier resolution and reachability
//! - [`backends`]: camera stack detection and pipeline construction
//! - [`preview`]: the running pipeline and its teardown
//! - [`launcher`]: the startup sequence tying these together
//! - [`shutdown`]: SIGINT/SIGTERM handling
//! - [`window`]: the X11 window the libcamera preview renders into
//! - [`bench`]: preview FPS/CPU/memory benchmark
//! - [`errors`], [`constants`]: error taxonomy, exit codes and defaults

pub mod backends;
pub mod bench;
pub mod config;
pub mod constants;
pub mod display;
pub mod errors;
pub mod launcher;
pub mod preview;
pub mod shutdown;
pub mod window;

// Re-export commonly used types
pub use backends::camera::{CameraBackendType, select_backend};
pub use config::{PreviewConfig, Rotation};
pub use errors::{AppError, AppResult};
pub use preview::PreviewExit;
