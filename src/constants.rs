// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Defaults applied when an option is not given on the command line
pub mod defaults {
    /// Preview width in pixels
    pub const WIDTH: u32 = 1920;

    /// Preview height in pixels
    pub const HEIGHT: u32 = 1080;

    /// Capture/display framerate
    pub const FRAMERATE: u32 = 30;

    /// Display used when neither `--display` nor `DISPLAY` is set
    pub const DISPLAY: &str = ":0";

    /// Environment variable holding the X11 display identifier
    pub const DISPLAY_ENV: &str = "DISPLAY";
}

/// Process exit codes
///
/// `NO_DISPLAY` and `NO_BACKEND` are relied upon by the systemd units and
/// the launcher script, do not renumber them.
pub mod exit_codes {
    /// Preview stopped by a signal or by closing the window
    pub const SUCCESS: u8 = 0;

    /// The display target could not be reached
    pub const NO_DISPLAY: u8 = 1;

    /// Neither camera stack is installed
    pub const NO_BACKEND: u8 = 2;

    /// Pipeline construction or streaming failure
    pub const RUNTIME_FAILURE: u8 = 3;

    /// Invalid command line (sysexits EX_USAGE)
    pub const USAGE: u8 = 64;
}

/// GStreamer element names
pub mod elements {
    /// libcamera camera source (modern stack)
    pub const LIBCAMERA_SRC: &str = "libcamerasrc";

    /// MMAL camera source with built-in GPU overlay preview (legacy stack)
    pub const LEGACY_SRC: &str = "rpicamsrc";

    /// OpenGL video sink
    pub const GL_SINK: &str = "glimagesink";

    /// XVideo sink
    pub const XV_SINK: &str = "xvimagesink";

    /// Plain X11 sink
    pub const X_SINK: &str = "ximagesink";

    /// Name given to whichever sink terminates the preview pipeline
    pub const PREVIEW_SINK_NAME: &str = "preview-sink";

    /// Name given to the camera source element
    pub const CAMERA_SOURCE_NAME: &str = "camera-source";
}

/// Package names offered as install remedies
pub mod install {
    /// Debian package providing `libcamerasrc` (Bullseye/Bookworm)
    pub const LIBCAMERA_PACKAGE: &str = "gstreamer1.0-libcamera";

    /// Debian package providing `rpicamsrc` (Buster and older)
    pub const LEGACY_PACKAGE: &str = "gstreamer1.0-rpicamsrc";
}

/// GStreamer pipeline constants
pub mod pipeline {
    /// Buffers queued between camera and sink.
    ///
    /// Two is enough for display and keeps latency at a single frame.
    pub const QUEUE_MAX_BUFFERS: u32 = 2;
}

/// Timing constants
pub mod timing {
    /// Interval at which the run loop polls the bus and the stop flag.
    ///
    /// Bounds the delay between a SIGTERM and the start of teardown.
    pub const BUS_POLL_INTERVAL_MS: u64 = 100;

    /// Timeout for reaching a remote X server over TCP
    pub const DISPLAY_CONNECT_TIMEOUT_SECS: u64 = 2;
}

/// X11 addressing
pub mod x11 {
    /// Directory holding the local X server sockets (`X0`, `X1`, ...)
    pub const SOCKET_DIR: &str = "/tmp/.X11-unix";

    /// TCP port of display `:0` on a remote host
    pub const TCP_PORT_BASE: u16 = 6000;
}

/// Preview window
pub mod window {
    /// Window title (`WM_NAME` / `_NET_WM_NAME`)
    pub const TITLE: &str = "PiCamViewer";

    /// `_MOTIF_WM_HINTS` flag: the decorations field is set
    pub const MOTIF_HINTS_DECORATIONS: u32 = 1 << 1;
}

/// Benchmark defaults
pub mod bench {
    /// Number of measurement runs
    pub const RUNS: u32 = 5;

    /// Warm-up seconds before measuring each run
    pub const WARMUP_SECS: u64 = 10;

    /// Measured seconds per run
    pub const DURATION_SECS: u64 = 30;

    /// Upper bound for `--runs`
    pub const MAX_RUNS: u32 = 1000;

    /// Upper bound for `--warmup` and `--duration` (one day)
    pub const MAX_SECS: u64 = 86_400;
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes = [
            exit_codes::SUCCESS,
            exit_codes::NO_DISPLAY,
            exit_codes::NO_BACKEND,
            exit_codes::RUNTIME_FAILURE,
            exit_codes::USAGE,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_version_not_empty() {
        assert!(!app_info::version().is_empty());
    }
}
