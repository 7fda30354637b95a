// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for the camera backends

use crate::constants::{elements, install};
use serde::Serialize;

/// Camera stack used for the preview
///
/// The variants are listed in preference order; see
/// [`CameraBackendType::PREFERENCE_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CameraBackendType {
    /// libcamera stack via `libcamerasrc` (Bullseye and newer)
    Libcamera,
    /// Legacy MMAL stack via `rpicamsrc` (Buster and older)
    Legacy,
}

impl CameraBackendType {
    /// Fixed probe order. The first available backend wins.
    pub const PREFERENCE_ORDER: [CameraBackendType; 2] =
        [CameraBackendType::Libcamera, CameraBackendType::Legacy];

    /// GStreamer source element providing this stack
    pub fn source_element(&self) -> &'static str {
        match self {
            CameraBackendType::Libcamera => elements::LIBCAMERA_SRC,
            CameraBackendType::Legacy => elements::LEGACY_SRC,
        }
    }

    /// Package that installs the source element
    pub fn install_package(&self) -> &'static str {
        match self {
            CameraBackendType::Libcamera => install::LIBCAMERA_PACKAGE,
            CameraBackendType::Legacy => install::LEGACY_PACKAGE,
        }
    }

    /// Releases the package is meant for
    pub fn target_releases(&self) -> &'static str {
        match self {
            CameraBackendType::Libcamera => "Bullseye/Bookworm",
            CameraBackendType::Legacy => "Buster (legacy)",
        }
    }
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::Libcamera => write!(f, "libcamera"),
            CameraBackendType::Legacy => write!(f, "legacy rpicam"),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Neither camera stack is installed
    NoBackend,
    /// A GStreamer element needed by the pipeline could not be created
    ElementMissing(String),
    /// Failed to initialize GStreamer or assemble the pipeline
    InitializationFailed(String),
    /// State change refused by the pipeline
    StateChange(String),
    /// Error posted on the bus while streaming
    Pipeline(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NoBackend => {
                let names: Vec<&str> = CameraBackendType::PREFERENCE_ORDER
                    .iter()
                    .map(|b| b.source_element())
                    .collect();
                writeln!(
                    f,
                    "Neither {} is installed.",
                    names.join(" nor ")
                )?;
                writeln!(f, "Install one of:")?;
                for backend in CameraBackendType::PREFERENCE_ORDER {
                    writeln!(
                        f,
                        "  sudo apt install -y {:<28} # {}",
                        backend.install_package(),
                        backend.target_releases()
                    )?;
                }
                write!(f, "See README.md for full instructions.")
            }
            BackendError::ElementMissing(name) => {
                write!(f, "GStreamer element not available: {}", name)
            }
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::StateChange(msg) => write!(f, "State change failed: {}", msg),
            BackendError::Pipeline(msg) => write!(f, "Pipeline error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<gstreamer::glib::Error> for BackendError {
    fn from(err: gstreamer::glib::Error) -> Self {
        BackendError::InitializationFailed(err.to_string())
    }
}

impl From<gstreamer::glib::BoolError> for BackendError {
    fn from(err: gstreamer::glib::BoolError) -> Self {
        BackendError::InitializationFailed(err.to_string())
    }
}

impl From<gstreamer::StateChangeError> for BackendError {
    fn from(err: gstreamer::StateChangeError) -> Self {
        BackendError::StateChange(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preference_order() {
        assert_eq!(
            CameraBackendType::PREFERENCE_ORDER,
            [CameraBackendType::Libcamera, CameraBackendType::Legacy]
        );
    }

    #[test]
    fn test_no_backend_message_has_both_remedies() {
        let msg = BackendError::NoBackend.to_string();
        assert!(msg.contains("libcamerasrc"));
        assert!(msg.contains("rpicamsrc"));
        assert!(msg.contains("sudo apt install -y gstreamer1.0-libcamera"));
        assert!(msg.contains("sudo apt install -y gstreamer1.0-rpicamsrc"));
    }
}
