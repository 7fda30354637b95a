// SPDX-License-Identifier: GPL-3.0-only

//! libcamera preview pipeline
//!
//! ```text
//! libcamerasrc ! video/x-raw,width=W,height=H,framerate=F/1 ! queue [! videoconvert] [! videoflip] ! sink
//! ```
//!
//! Rotation is done by the GL sink when it is in use, so frames never leave
//! the GPU. Software sinks get a `videoconvert` (so any camera format can
//! reach them) and, when rotating, a `videoflip` in front of them instead.

use super::sink::create_preview_sink;
use super::types::BackendResult;
use super::{PreviewPipeline, make_element};
use crate::config::{PreviewConfig, Rotation};
use crate::constants::elements;
use crate::constants::pipeline::QUEUE_MAX_BUFFERS;
use crate::window::PreviewWindow;
use gstreamer::prelude::*;
use tracing::{debug, info};

/// Where the configured rotation is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStage {
    /// No rotation requested
    None,
    /// The sink's `rotate-method` property
    Sink,
    /// A `videoflip` element ahead of the sink
    Videoflip,
}

/// Decide where to rotate, given whether the sink can rotate by itself
pub fn rotation_stage(rotation: Rotation, sink_rotates: bool) -> RotationStage {
    match (rotation, sink_rotates) {
        (Rotation::None, _) => RotationStage::None,
        (_, true) => RotationStage::Sink,
        (_, false) => RotationStage::Videoflip,
    }
}

/// Raw video caps requested from the camera
pub fn camera_caps(config: &PreviewConfig) -> gstreamer::Caps {
    gstreamer::Caps::builder("video/x-raw")
        .field("width", config.width() as i32)
        .field("height", config.height() as i32)
        .field(
            "framerate",
            gstreamer::Fraction::new(config.framerate() as i32, 1),
        )
        .build()
}

/// Build (but do not start) the libcamera preview pipeline
pub fn build_pipeline(config: &PreviewConfig) -> BackendResult<PreviewPipeline> {
    info!(
        width = config.width(),
        height = config.height(),
        framerate = config.framerate(),
        "Building libcamera preview pipeline"
    );

    let pipeline = gstreamer::Pipeline::with_name("picamviewer-libcamera");

    let source = make_element(elements::LIBCAMERA_SRC, elements::CAMERA_SOURCE_NAME)?;

    let caps = camera_caps(config);
    debug!(%caps, "Requested camera caps");

    let capsfilter = make_element("capsfilter", "camera-caps")?;
    capsfilter.set_property("caps", &caps);

    // Only ever hold the newest frames; a slow sink drops instead of lagging
    let queue = make_element("queue", "preview-queue")?;
    queue.set_property("max-size-buffers", QUEUE_MAX_BUFFERS);
    queue.set_property("max-size-bytes", 0u32);
    queue.set_property("max-size-time", 0u64);
    queue.set_property_from_str("leaky", "downstream");

    let window = PreviewWindow::open(config)?;
    debug!(geometry = ?window.geometry(), "Preview window ready");
    let sink = create_preview_sink(Some(window.handle()))?;

    let mut chain = vec![source, capsfilter, queue];

    // GL sinks upload and convert on the GPU themselves
    if !sink.kind.is_accelerated() {
        chain.push(make_element("videoconvert", "preview-convert")?);
    }

    let rotation = config.rotation();
    match rotation_stage(rotation, sink.supports_rotation()) {
        RotationStage::None => {}
        RotationStage::Sink => {
            sink.element
                .set_property("rotate-method", rotation.orientation_method());
            debug!(%rotation, "Rotation applied by sink");
        }
        RotationStage::Videoflip => {
            let flip = make_element("videoflip", "preview-rotation")?;
            flip.set_property("video-direction", rotation.orientation_method());
            debug!(%rotation, "Rotation applied by videoflip");
            chain.push(flip);
        }
    }

    chain.push(sink.element.clone());

    pipeline.add_many(&chain)?;
    gstreamer::Element::link_many(&chain)?;

    Ok(PreviewPipeline {
        pipeline,
        window: Some(window),
    })
}
