// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend selection
//!
//! Exactly two camera stacks are supported and they are mutually exclusive
//! on a given system. Availability is decided by the GStreamer registry:
//! a stack is usable when its source element is registered.
//!
//! ```text
//!   ┌──────────────┐  found   ┌─────────────────────┐
//!   │ libcamerasrc │ ───────▶ │ libcamera pipeline  │
//!   └──────┬───────┘          └─────────────────────┘
//!          │ missing
//!          ▼
//!   ┌──────────────┐  found   ┌─────────────────────┐
//!   │  rpicamsrc   │ ───────▶ │ legacy pipeline     │
//!   └──────┬───────┘          └─────────────────────┘
//!          │ missing
//!          ▼
//!   BackendError::NoBackend (exit 2)
//! ```

pub mod legacy;
pub mod libcamera;
pub mod sink;
pub mod types;

pub use types::*;

use crate::config::PreviewConfig;
use crate::window::PreviewWindow;
use tracing::{debug, info};

/// A built preview that has not been started yet
#[derive(Debug)]
pub struct PreviewPipeline {
    pub pipeline: gstreamer::Pipeline,
    /// Window the sink renders into. `None` for the legacy stack, which
    /// draws on the GPU overlay.
    pub window: Option<PreviewWindow>,
}

/// Source of truth for which GStreamer elements exist
pub trait ElementRegistry {
    /// Check whether an element factory is registered
    fn has_element(&self, name: &str) -> bool;
}

/// The process-wide GStreamer registry
#[derive(Debug)]
pub struct GstRegistry {
    _private: (),
}

impl GstRegistry {
    /// Initialize GStreamer and give access to its registry
    pub fn init() -> BackendResult<Self> {
        debug!("Initializing GStreamer");
        gstreamer::init()?;
        let (major, minor, micro, _) = gstreamer::version();
        debug!(major, minor, micro, "GStreamer initialized");
        Ok(Self { _private: () })
    }
}

impl ElementRegistry for GstRegistry {
    fn has_element(&self, name: &str) -> bool {
        // Factory lookup only, nothing is instantiated (the camera stays free)
        gstreamer::ElementFactory::find(name).is_some()
    }
}

impl ElementRegistry for [&str] {
    fn has_element(&self, name: &str) -> bool {
        self.iter().any(|element| *element == name)
    }
}

impl CameraBackendType {
    /// Check if this backend is installed
    pub fn is_available<R: ElementRegistry + ?Sized>(&self, registry: &R) -> bool {
        registry.has_element(self.source_element())
    }

    /// Build the preview pipeline for this backend
    pub fn build_pipeline(&self, config: &PreviewConfig) -> BackendResult<PreviewPipeline> {
        match self {
            CameraBackendType::Libcamera => libcamera::build_pipeline(config),
            CameraBackendType::Legacy => legacy::build_pipeline(config),
        }
    }
}

/// Pick the first installed backend in preference order.
pub fn select_backend<R: ElementRegistry + ?Sized>(
    registry: &R,
) -> BackendResult<CameraBackendType> {
    for backend in CameraBackendType::PREFERENCE_ORDER {
        if backend.is_available(registry) {
            info!(
                backend = %backend,
                element = backend.source_element(),
                "Camera backend detected"
            );
            return Ok(backend);
        }
        info!(
            element = backend.source_element(),
            "{} not found, trying next backend", backend
        );
    }

    Err(BackendError::NoBackend)
}

/// Create a named element, reporting the factory name when it is missing
pub(crate) fn make_element(factory: &str, name: &str) -> BackendResult<gstreamer::Element> {
    gstreamer::ElementFactory::make(factory)
        .name(name)
        .build()
        .map_err(|_| BackendError::ElementMissing(factory.to_string()))
}
