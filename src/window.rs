// SPDX-License-Identifier: GPL-3.0-only

//! X11 preview window
//!
//! The libcamera preview renders into a window created here instead of a
//! window owned by the video sink, so full-screen presentation works with
//! every sink in the fallback chain. A full-screen window covers the whole
//! screen, requests `_NET_WM_STATE_FULLSCREEN` and `_NET_WM_STATE_ABOVE`
//! and asks the window manager for no decorations. A windowed preview is an
//! ordinary titled window at the top-left corner.

use crate::backends::camera::{BackendError, BackendResult};
use crate::config::PreviewConfig;
use crate::constants::window::{MOTIF_HINTS_DECORATIONS, TITLE};
use tracing::{debug, info};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::{
    AtomEnum, ConnectionExt as _, CreateWindowAux, EventMask, PropMode, Window, WindowClass,
};
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

x11rb::atom_manager! {
    Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_FULLSCREEN,
        _NET_WM_STATE_ABOVE,
        _MOTIF_WM_HINTS,
        UTF8_STRING,
    }
}

/// Position, size and mode requested for the preview window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i16,
    pub y: i16,
    pub width: u16,
    pub height: u16,
    pub fullscreen: bool,
}

impl WindowGeometry {
    /// Geometry for `config` on a screen of the given size.
    ///
    /// A windowed preview shows the rotated frame, so 90° and 270° swap the
    /// window's width and height.
    pub fn for_config(config: &PreviewConfig, screen_width: u16, screen_height: u16) -> Self {
        if config.fullscreen() {
            return Self {
                x: 0,
                y: 0,
                width: screen_width,
                height: screen_height,
                fullscreen: true,
            };
        }

        let (width, height) = if config.rotation().swaps_dimensions() {
            (config.height(), config.width())
        } else {
            (config.width(), config.height())
        };

        Self {
            x: 0,
            y: 0,
            width: clamp_dimension(width),
            height: clamp_dimension(height),
            fullscreen: false,
        }
    }
}

/// X11 sizes are 16 bit
fn clamp_dimension(value: u32) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn window_error(err: impl std::fmt::Display) -> BackendError {
    BackendError::InitializationFailed(format!("Preview window: {}", err))
}

/// A mapped X11 window the video sink draws into
pub struct PreviewWindow {
    conn: RustConnection,
    window: Window,
    atoms: Atoms,
    geometry: WindowGeometry,
}

impl PreviewWindow {
    /// Create and map the preview window on the configured display.
    pub fn open(config: &PreviewConfig) -> BackendResult<Self> {
        let (conn, screen_num) = x11rb::connect(Some(config.display())).map_err(window_error)?;

        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| window_error(format!("screen {} does not exist", screen_num)))?;
        let geometry =
            WindowGeometry::for_config(config, screen.width_in_pixels, screen.height_in_pixels);
        let root = screen.root;
        let background = screen.black_pixel;

        let atoms = Atoms::new(&conn)
            .map_err(window_error)?
            .reply()
            .map_err(window_error)?;
        let window = conn.generate_id().map_err(window_error)?;

        let aux = CreateWindowAux::new()
            .background_pixel(background)
            .event_mask(EventMask::STRUCTURE_NOTIFY);
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            window,
            root,
            geometry.x,
            geometry.y,
            geometry.width,
            geometry.height,
            0,
            WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &aux,
        )
        .map_err(window_error)?;

        let title = TITLE.as_bytes();
        conn.change_property8(PropMode::REPLACE, window, AtomEnum::WM_NAME, AtomEnum::STRING, title)
            .map_err(window_error)?;
        conn.change_property8(
            PropMode::REPLACE,
            window,
            atoms._NET_WM_NAME,
            atoms.UTF8_STRING,
            title,
        )
        .map_err(window_error)?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[atoms.WM_DELETE_WINDOW],
        )
        .map_err(window_error)?;

        // Initial state must be set before mapping (EWMH)
        if geometry.fullscreen {
            conn.change_property32(
                PropMode::REPLACE,
                window,
                atoms._NET_WM_STATE,
                AtomEnum::ATOM,
                &[atoms._NET_WM_STATE_FULLSCREEN, atoms._NET_WM_STATE_ABOVE],
            )
            .map_err(window_error)?;
            conn.change_property32(
                PropMode::REPLACE,
                window,
                atoms._MOTIF_WM_HINTS,
                atoms._MOTIF_WM_HINTS,
                &[MOTIF_HINTS_DECORATIONS, 0, 0, 0, 0],
            )
            .map_err(window_error)?;
        }

        conn.map_window(window).map_err(window_error)?;
        conn.flush().map_err(window_error)?;

        info!(
            window,
            width = geometry.width,
            height = geometry.height,
            fullscreen = geometry.fullscreen,
            "Preview window mapped"
        );

        Ok(Self {
            conn,
            window,
            atoms,
            geometry,
        })
    }

    /// Native window handle for `VideoOverlay::set_window_handle`
    pub fn handle(&self) -> usize {
        self.window as usize
    }

    pub fn geometry(&self) -> WindowGeometry {
        self.geometry
    }

    /// Drain pending X events. True once the window was closed or destroyed.
    pub fn poll_closed(&self) -> BackendResult<bool> {
        while let Some(event) = self.conn.poll_for_event().map_err(window_error)? {
            match event {
                Event::ClientMessage(msg)
                    if msg.window == self.window
                        && msg.format == 32
                        && msg.data.as_data32()[0] == self.atoms.WM_DELETE_WINDOW =>
                {
                    return Ok(true);
                }
                Event::DestroyNotify(ev) if ev.window == self.window => return Ok(true),
                _ => {}
            }
        }
        Ok(false)
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        if let Err(e) = self.conn.destroy_window(self.window) {
            debug!(error = %e, "Failed to destroy preview window");
        }
        if let Err(e) = self.conn.flush() {
            debug!(error = %e, "Failed to flush X connection");
        }
    }
}

impl std::fmt::Debug for PreviewWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewWindow")
            .field("window", &self.window)
            .field("geometry", &self.geometry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rotation;

    #[test]
    fn test_fullscreen_covers_screen() {
        let config = PreviewConfig::new(1280, 720, 60, true, Rotation::Rotate90, ":0").unwrap();
        let geometry = WindowGeometry::for_config(&config, 1920, 1080);

        assert_eq!(
            geometry,
            WindowGeometry {
                x: 0,
                y: 0,
                width: 1920,
                height: 1080,
                fullscreen: true,
            }
        );
    }

    #[test]
    fn test_windowed_uses_configured_size() {
        let config = PreviewConfig::new(1280, 720, 30, false, Rotation::None, ":0").unwrap();
        let geometry = WindowGeometry::for_config(&config, 1920, 1080);

        assert!(!geometry.fullscreen);
        assert_eq!((geometry.x, geometry.y), (0, 0));
        assert_eq!((geometry.width, geometry.height), (1280, 720));
    }

    #[test]
    fn test_windowed_rotation_swaps_size() {
        let config = PreviewConfig::new(1280, 720, 30, false, Rotation::Rotate270, ":0").unwrap();
        let geometry = WindowGeometry::for_config(&config, 1920, 1080);
        assert_eq!((geometry.width, geometry.height), (720, 1280));

        let config = PreviewConfig::new(1280, 720, 30, false, Rotation::Rotate180, ":0").unwrap();
        let geometry = WindowGeometry::for_config(&config, 1920, 1080);
        assert_eq!((geometry.width, geometry.height), (1280, 720));
    }

    #[test]
    fn test_oversized_window_clamped() {
        let config = PreviewConfig::new(100_000, 480, 30, false, Rotation::None, ":0").unwrap();
        let geometry = WindowGeometry::for_config(&config, 1920, 1080);
        assert_eq!(geometry.width, u16::MAX);
    }
}
