// SPDX-License-Identifier: GPL-3.0-only

//! Running preview session
//!
//! A [`PreviewSession`] owns the one active camera pipeline and its preview
//! window. Dropping it sets the pipeline to NULL, which releases the camera,
//! and then destroys the window, so every exit path (signal, window close,
//! error) cleans up.

use crate::backends::camera::{BackendError, BackendResult, CameraBackendType, PreviewPipeline};
use crate::config::PreviewConfig;
use crate::constants::{elements, timing};
use crate::shutdown::ShutdownSignal;
use crate::window::PreviewWindow;
use gstreamer::prelude::*;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Why the run loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewExit {
    /// SIGINT/SIGTERM received
    Signalled,
    /// The user closed the preview window
    WindowClosed,
    /// The requested deadline passed (benchmark runs)
    DeadlineReached,
}

/// The active camera preview
pub struct PreviewSession {
    backend: CameraBackendType,
    pipeline: gstreamer::Pipeline,
    // Dropped after the pipeline is stopped (fields drop after `Drop::drop`)
    window: Option<PreviewWindow>,
}

impl PreviewSession {
    /// Build the backend's pipeline and set it playing.
    pub fn start(backend: CameraBackendType, config: &PreviewConfig) -> BackendResult<Self> {
        info!(backend = %backend, config = %config, "Starting preview");

        let preview = backend.build_pipeline(config)?;
        Self::play(backend, preview)
    }

    /// Take ownership of a built pipeline and set it playing.
    pub(crate) fn play(backend: CameraBackendType, preview: PreviewPipeline) -> BackendResult<Self> {
        // Owned from here on: a failed state change still reaches Drop
        let session = Self {
            backend,
            pipeline: preview.pipeline,
            window: preview.window,
        };

        session
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| {
                error!(backend = %backend, error = %e, "Failed to start pipeline");
                BackendError::StateChange(format!("{} pipeline refused to play: {}", backend, e))
            })?;

        Ok(session)
    }

    /// Sink element terminating the pipeline
    pub fn sink(&self) -> Option<gstreamer::Element> {
        self.pipeline.by_name(elements::PREVIEW_SINK_NAME)
    }

    /// Present the preview until shutdown, window close, or `deadline`.
    ///
    /// Bus errors and an unexpected end of stream are returned as errors.
    pub fn run_until(
        &self,
        shutdown: &ShutdownSignal,
        deadline: Option<Instant>,
    ) -> BackendResult<PreviewExit> {
        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| BackendError::InitializationFailed("Pipeline has no bus".to_string()))?;

        let poll = gstreamer::ClockTime::from_mseconds(timing::BUS_POLL_INTERVAL_MS);

        loop {
            if shutdown.is_triggered() {
                return Ok(PreviewExit::Signalled);
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Ok(PreviewExit::DeadlineReached);
            }
            if let Some(window) = &self.window
                && window.poll_closed()?
            {
                info!("Preview window closed");
                return Ok(PreviewExit::WindowClosed);
            }

            let Some(msg) = bus.timed_pop_filtered(
                poll,
                &[
                    gstreamer::MessageType::Error,
                    gstreamer::MessageType::Warning,
                    gstreamer::MessageType::Eos,
                    gstreamer::MessageType::StateChanged,
                ],
            ) else {
                continue;
            };

            match msg.view() {
                gstreamer::MessageView::Error(err) => {
                    let source = msg.src().map(|s| s.name().to_string());

                    if is_window_closed(source.as_deref(), &err.error()) {
                        info!("Preview window closed");
                        return Ok(PreviewExit::WindowClosed);
                    }

                    error!(
                        error = %err.error(),
                        debug = ?err.debug(),
                        source = ?source,
                        "GStreamer error during preview"
                    );
                    return Err(BackendError::Pipeline(format!(
                        "{} (from {})",
                        err.error(),
                        source.unwrap_or_else(|| "unknown element".to_string())
                    )));
                }
                gstreamer::MessageView::Warning(w) => {
                    warn!(
                        warning = %w.error(),
                        debug = ?w.debug(),
                        source = ?msg.src().map(|s| s.name()),
                        "GStreamer warning during preview"
                    );
                }
                gstreamer::MessageView::Eos(_) => {
                    return Err(BackendError::Pipeline(
                        "Camera stream ended unexpectedly".to_string(),
                    ));
                }
                gstreamer::MessageView::StateChanged(change) => {
                    let from_pipeline = msg
                        .src()
                        .is_some_and(|s| s.name() == self.pipeline.name());
                    if from_pipeline && change.current() == gstreamer::State::Playing {
                        info!(backend = %self.backend, "Preview running. Press Ctrl-C to stop.");
                    }
                }
                _ => {}
            }
        }
    }
}

impl Drop for PreviewSession {
    fn drop(&mut self) {
        debug!(backend = %self.backend, "Stopping preview pipeline");
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to stop pipeline cleanly");
        }
        info!(backend = %self.backend, "Preview stopped");
    }
}

impl std::fmt::Debug for PreviewSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewSession")
            .field("backend", &self.backend)
            .field("pipeline", &self.pipeline.name())
            .field("window", &self.window)
            .finish()
    }
}

/// Sinks rendering into their own window report it closed as a resource
/// "not found" error
fn is_window_closed(source: Option<&str>, error: &gstreamer::glib::Error) -> bool {
    source == Some(elements::PREVIEW_SINK_NAME)
        && error.matches(gstreamer::ResourceError::NotFound)
}
