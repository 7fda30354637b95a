// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use picamviewer::constants::{defaults, elements, exit_codes};

#[test]
fn test_documented_exit_codes() {
    // The launcher script and systemd units depend on these values
    assert_eq!(exit_codes::SUCCESS, 0);
    assert_eq!(exit_codes::NO_DISPLAY, 1);
    assert_eq!(exit_codes::NO_BACKEND, 2);
}

#[test]
fn test_defaults() {
    assert_eq!(defaults::WIDTH, 1920);
    assert_eq!(defaults::HEIGHT, 1080);
    assert_eq!(defaults::FRAMERATE, 30);
    assert_eq!(defaults::DISPLAY, ":0");
}

#[test]
fn test_camera_sources_differ() {
    assert_ne!(elements::LIBCAMERA_SRC, elements::LEGACY_SRC);
}
