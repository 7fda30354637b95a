// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the startup sequence
//!
//! A Unix listener in a temporary directory stands in for the X server and a
//! list of element names stands in for the GStreamer registry, so none of
//! these tests need a camera, a display or GStreamer plugins.

use picamviewer::backends::camera::{BackendError, CameraBackendType};
use picamviewer::display::DisplayProbe;
use picamviewer::errors::{AppError, DisplayError};
use picamviewer::launcher;
use picamviewer::shutdown::ShutdownSignal;
use picamviewer::{PreviewConfig, Rotation};
use std::os::unix::net::UnixListener;

struct FakeDisplay {
    dir: tempfile::TempDir,
    _listener: UnixListener,
}

impl FakeDisplay {
    fn new(number: u16) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let listener = UnixListener::bind(dir.path().join(format!("X{}", number))).unwrap();
        Self {
            dir,
            _listener: listener,
        }
    }

    /// The fake server never answers, so only the socket is checked
    fn probe(&self) -> DisplayProbe {
        DisplayProbe::default()
            .with_socket_dir(self.dir.path())
            .with_connection_setup(false)
    }
}

fn config_on(display: &str) -> PreviewConfig {
    PreviewConfig::new(1280, 720, 60, true, Rotation::Rotate90, display).unwrap()
}

#[test]
fn test_no_backend_exits_2() {
    let display = FakeDisplay::new(3);
    let registry: &[&str] = &[];

    let err = launcher::launch(
        &config_on(":3"),
        &display.probe(),
        registry,
        &ShutdownSignal::new(),
    )
    .unwrap_err();

    assert!(matches!(err, AppError::Backend(BackendError::NoBackend)));
    assert_eq!(err.exit_code(), 2);

    let msg = err.to_string();
    assert!(msg.contains("gstreamer1.0-libcamera"));
    assert!(msg.contains("gstreamer1.0-rpicamsrc"));
}

#[test]
fn test_no_backend_regardless_of_config() {
    let display = FakeDisplay::new(4);
    let registry: &[&str] = &["glimagesink"];

    for (width, height, fps, fullscreen, rotation) in [
        (1920, 1080, 30, true, Rotation::None),
        (640, 480, 90, false, Rotation::Rotate270),
    ] {
        let config = PreviewConfig::new(width, height, fps, fullscreen, rotation, ":4").unwrap();
        let err = launcher::prepare(&config, &display.probe(), registry).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

#[test]
fn test_unreachable_display_exits_1() {
    let empty_dir = tempfile::tempdir().unwrap();
    let probe = DisplayProbe::default().with_socket_dir(empty_dir.path());
    let registry: &[&str] = &["libcamerasrc"];

    let err = launcher::launch(&config_on(":0"), &probe, registry, &ShutdownSignal::new())
        .unwrap_err();

    match &err {
        AppError::Display(DisplayError::Unreachable { display, .. }) => assert_eq!(display, ":0"),
        other => panic!("expected unreachable display, got {:?}", other),
    }
    assert_eq!(err.exit_code(), 1);
    assert!(err.to_string().contains(":0"));
}

#[test]
fn test_display_checked_before_backends() {
    // Neither a display nor a backend: the display error wins
    let empty_dir = tempfile::tempdir().unwrap();
    let probe = DisplayProbe::default().with_socket_dir(empty_dir.path());
    let registry: &[&str] = &[];

    let err = launcher::prepare(&config_on(":0"), &probe, registry).unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_invalid_display_name_exits_1() {
    let display = FakeDisplay::new(5);
    let registry: &[&str] = &["libcamerasrc"];

    let err = launcher::prepare(&config_on("not-a-display"), &display.probe(), registry)
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Display(DisplayError::InvalidName(_))
    ));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn test_modern_backend_always_preferred() {
    let display = FakeDisplay::new(6);

    for registry in [
        &["libcamerasrc", "rpicamsrc"][..],
        &["rpicamsrc", "libcamerasrc"][..],
    ] {
        let backend = launcher::prepare(&config_on(":6"), &display.probe(), registry).unwrap();
        assert_eq!(backend, CameraBackendType::Libcamera);
    }
}

#[test]
fn test_legacy_backend_when_alone() {
    let display = FakeDisplay::new(8);
    let registry: &[&str] = &["rpicamsrc"];

    let backend = launcher::prepare(&config_on(":8"), &display.probe(), registry).unwrap();
    assert_eq!(backend, CameraBackendType::Legacy);
}

#[test]
fn test_server_refusing_setup_exits_1() {
    // Socket accepts but the server hangs up during the X11 handshake,
    // as it does for a client without a valid Xauthority cookie
    let dir = tempfile::tempdir().unwrap();
    let listener = UnixListener::bind(dir.path().join("X2")).unwrap();
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            drop(stream);
        }
    });

    let probe = DisplayProbe::default().with_socket_dir(dir.path());
    let registry: &[&str] = &["libcamerasrc"];

    let err = launcher::prepare(&config_on(":2"), &probe, registry).unwrap_err();
    assert!(matches!(
        err,
        AppError::Display(DisplayError::Unreachable { .. })
    ));
    assert_eq!(err.exit_code(), 1);
}
