// SPDX-License-Identifier: GPL-3.0-only

//! Video sink selection for the libcamera preview
//!
//! The GPU sink is preferred. When it is missing or cannot open the display
//! (no GL driver, no GLX/EGL context) the preview falls back to the XVideo
//! sink and finally to the plain X11 sink, which renders in software.

use super::types::{BackendError, BackendResult};
use crate::constants::elements;
use gstreamer::prelude::*;
use gstreamer_video::prelude::*;
use tracing::{debug, info, warn};

/// Video sinks the preview can render through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// OpenGL sink, frames stay on the GPU
    Gl,
    /// XVideo overlay sink
    Xv,
    /// Software X11 sink
    X,
}

impl SinkKind {
    /// Sinks in the order they are tried
    pub const FALLBACK_ORDER: [SinkKind; 3] = [SinkKind::Gl, SinkKind::Xv, SinkKind::X];

    pub fn element_name(&self) -> &'static str {
        match self {
            SinkKind::Gl => elements::GL_SINK,
            SinkKind::Xv => elements::XV_SINK,
            SinkKind::X => elements::X_SINK,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SinkKind::Gl => "OpenGL/GPU renderer",
            SinkKind::Xv => "XVideo renderer",
            SinkKind::X => "X11 software renderer",
        }
    }

    /// True for sinks that composite on the GPU
    pub fn is_accelerated(&self) -> bool {
        matches!(self, SinkKind::Gl)
    }
}

/// A created and configured sink element
#[derive(Debug, Clone)]
pub struct PreviewSink {
    pub element: gstreamer::Element,
    pub kind: SinkKind,
}

impl PreviewSink {
    /// Whether the sink can rotate frames itself (GL sink `rotate-method`)
    pub fn supports_rotation(&self) -> bool {
        self.element.find_property("rotate-method").is_some()
    }
}

/// Try each sink kind in fallback order, returning the first that works.
///
/// The error lists every candidate with the reason it was skipped.
fn first_usable<T>(
    mut attempt: impl FnMut(SinkKind) -> Result<T, String>,
) -> Result<(SinkKind, T), String> {
    let mut skipped = Vec::new();

    for kind in SinkKind::FALLBACK_ORDER {
        match attempt(kind) {
            Ok(value) => return Ok((kind, value)),
            Err(reason) => {
                debug!(sink = kind.element_name(), %reason, "Sink not usable");
                skipped.push(format!("{} ({})", kind.element_name(), reason));
            }
        }
    }

    Err(skipped.join(", "))
}

/// Bring a freshly created sink to READY on its own and back.
///
/// READY is where the sinks open the display: the GL sink sets up its GL
/// display and context, the XVideo sink claims an Xv port. A sink that is
/// installed but cannot render on this machine fails here instead of at
/// pipeline start.
fn check_usable(element: &gstreamer::Element) -> Result<(), String> {
    let ready = element.set_state(gstreamer::State::Ready);
    if let Err(e) = element.set_state(gstreamer::State::Null) {
        debug!(error = %e, "Failed to reset sink after usability check");
    }
    ready.map(|_| ()).map_err(|e| e.to_string())
}

/// Create the first usable sink and point it at the preview window.
pub fn create_preview_sink(window_handle: Option<usize>) -> BackendResult<PreviewSink> {
    let (kind, element) = first_usable(|kind| {
        let element = gstreamer::ElementFactory::make(kind.element_name())
            .name(elements::PREVIEW_SINK_NAME)
            .build()
            .map_err(|_| "not installed".to_string())?;
        check_usable(&element).map_err(|e| format!("cannot open display: {}", e))?;
        Ok(element)
    })
    .map_err(BackendError::ElementMissing)?;

    if kind.is_accelerated() {
        info!("Using {} ({})", kind.element_name(), kind.description());
    } else {
        warn!(
            "{} unusable, falling back to {} ({})",
            elements::GL_SINK,
            kind.element_name(),
            kind.description()
        );
    }

    let sink = PreviewSink { element, kind };
    apply_presentation(&sink, window_handle);
    Ok(sink)
}

/// Keep aspect ratio and render into the given window.
fn apply_presentation(sink: &PreviewSink, window_handle: Option<usize>) {
    let element = &sink.element;

    if element.find_property("force-aspect-ratio").is_some() {
        element.set_property("force-aspect-ratio", true);
    }

    let Some(handle) = window_handle else {
        return;
    };
    match element.dynamic_cast_ref::<gstreamer_video::VideoOverlay>() {
        Some(overlay) => {
            // SAFETY: the handle is a live X window owned by the session,
            // which outlives the pipeline.
            unsafe { overlay.set_window_handle(handle) };
            debug!(handle, sink = sink.kind.element_name(), "Sink bound to preview window");
        }
        None => warn!(
            sink = sink.kind.element_name(),
            "Sink cannot render into an external window"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_starts_with_gpu() {
        assert_eq!(SinkKind::FALLBACK_ORDER[0], SinkKind::Gl);
        assert!(SinkKind::Gl.is_accelerated());
        assert!(!SinkKind::X.is_accelerated());
    }

    #[test]
    fn test_unusable_gl_falls_back_to_xv() {
        let (kind, name) = first_usable(|kind| match kind {
            SinkKind::Gl => Err("no GL context".to_string()),
            other => Ok(other.element_name()),
        })
        .unwrap();

        assert_eq!(kind, SinkKind::Xv);
        assert_eq!(name, "xvimagesink");
    }

    #[test]
    fn test_software_sink_is_last_resort() {
        let (kind, _) = first_usable(|kind| match kind {
            SinkKind::X => Ok(()),
            _ => Err("no port".to_string()),
        })
        .unwrap();
        assert_eq!(kind, SinkKind::X);
    }

    #[test]
    fn test_no_usable_sink_lists_reasons() {
        let err = first_usable::<()>(|_| Err("not installed".to_string())).unwrap_err();
        for kind in SinkKind::FALLBACK_ORDER {
            assert!(err.contains(kind.element_name()));
        }
        assert!(err.contains("not installed"));
    }

    #[test]
    fn test_create_sink_or_missing() {
        if gstreamer::init().is_err() {
            return;
        }

        // Depends on installed plugins and a display; either outcome must be well-formed
        match create_preview_sink(None) {
            Ok(sink) => assert_eq!(sink.element.name(), elements::PREVIEW_SINK_NAME),
            Err(BackendError::ElementMissing(names)) => assert!(names.contains("glimagesink")),
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
}
