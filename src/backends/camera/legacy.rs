// SPDX-License-Identifier: GPL-3.0-only

//! Legacy rpicam preview pipeline
//!
//! `rpicamsrc` draws its preview straight onto the GPU overlay (dispmanx),
//! independent of the X server's compositing. The encoded stream it also
//! produces is discarded, so no frame data passes through this process:
//!
//! ```text
//! rpicamsrc preview=true ! video/x-h264,width=W,height=H,framerate=F/1 ! fakesink
//! ```

use super::{PreviewPipeline, make_element};
use super::types::BackendResult;
use crate::config::PreviewConfig;
use crate::constants::elements;
use gstreamer::prelude::*;
use tracing::{debug, info};

/// Build (but do not start) the legacy preview pipeline
pub fn build_pipeline(config: &PreviewConfig) -> BackendResult<PreviewPipeline> {
    info!(
        width = config.width(),
        height = config.height(),
        framerate = config.framerate(),
        "Building legacy rpicam preview pipeline"
    );

    let pipeline = gstreamer::Pipeline::with_name("picamviewer-legacy");

    let source = make_element(elements::LEGACY_SRC, elements::CAMERA_SOURCE_NAME)?;
    source.set_property("preview", true);
    source.set_property("fullscreen", config.fullscreen());
    source.set_property("rotation", config.rotation().degrees() as i32);

    // The overlay window is ignored when fullscreen is set
    if !config.fullscreen() {
        source.set_property("preview-x", 0i32);
        source.set_property("preview-y", 0i32);
        source.set_property("preview-w", config.width() as i32);
        source.set_property("preview-h", config.height() as i32);
        debug!("Legacy preview windowed at 0,0");
    }

    let caps = gstreamer::Caps::builder("video/x-h264")
        .field("width", config.width() as i32)
        .field("height", config.height() as i32)
        .field(
            "framerate",
            gstreamer::Fraction::new(config.framerate() as i32, 1),
        )
        .build();

    let capsfilter = make_element("capsfilter", "camera-caps")?;
    capsfilter.set_property("caps", &caps);

    let sink = make_element("fakesink", elements::PREVIEW_SINK_NAME)?;
    sink.set_property("sync", false);

    let chain = [source, capsfilter, sink];
    pipeline.add_many(&chain)?;
    gstreamer::Element::link_many(&chain)?;

    Ok(PreviewPipeline {
        pipeline,
        window: None,
    })
}
