// SPDX-License-Identifier: GPL-3.0-only

//! Display target resolution and reachability
//!
//! The display identifier is resolved once at startup with the precedence
//! `--display` flag, `DISPLAY` environment variable, built-in `:0`, and then
//! frozen. Before any camera resource is touched, [`DisplayProbe`] checks
//! that an X server accepts connections at that identifier and completes
//! the X11 connection setup (including authorization) with this client.

use crate::constants::{defaults, timing, x11};
use crate::errors::DisplayError;
use std::net::{TcpStream, ToSocketAddrs};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};
use x11rb::connection::Connection;

/// Parsed X11 display identifier (`[host]:display[.screen]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName {
    /// Remote host, `None` for the local machine
    pub host: Option<String>,
    /// Display number
    pub number: u16,
    /// Screen number, if given
    pub screen: Option<u16>,
}

impl DisplayName {
    /// True when the display lives on this machine (Unix socket transport)
    pub fn is_local(&self) -> bool {
        self.host.is_none()
    }

    /// Socket file of a local display inside `socket_dir`
    pub fn socket_path(&self, socket_dir: &Path) -> PathBuf {
        socket_dir.join(format!("X{}", self.number))
    }

    /// TCP port of a remote display
    pub fn tcp_port(&self) -> Option<u16> {
        x11::TCP_PORT_BASE.checked_add(self.number)
    }
}

impl FromStr for DisplayName {
    type Err = DisplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DisplayError::InvalidName(s.to_string());

        let (host, rest) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        let host = match host {
            "" | "unix" => None,
            other => Some(other.to_string()),
        };

        let (number, screen) = match rest.split_once('.') {
            Some((number, screen)) => (number, Some(screen)),
            None => (rest, None),
        };

        let number = number.parse::<u16>().map_err(|_| invalid())?;
        let screen = screen
            .map(|screen| screen.parse::<u16>().map_err(|_| invalid()))
            .transpose()?;

        Ok(Self {
            host,
            number,
            screen,
        })
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(host) = &self.host {
            write!(f, "{}", host)?;
        }
        write!(f, ":{}", self.number)?;
        if let Some(screen) = self.screen {
            write!(f, ".{}", screen)?;
        }
        Ok(())
    }
}

/// Compute the effective display identifier.
///
/// Empty values are treated as unset, so `DISPLAY=` in a unit file falls
/// through to the default instead of producing an unusable identifier.
pub fn resolve_display(flag: Option<&str>, env_value: Option<&str>) -> String {
    let non_empty = |v: &&str| !v.trim().is_empty();

    if let Some(flag) = flag.filter(non_empty) {
        debug!(display = flag, "Display taken from --display");
        return flag.trim().to_string();
    }
    if let Some(env) = env_value.filter(non_empty) {
        debug!(display = env, "Display taken from environment");
        return env.trim().to_string();
    }

    debug!(display = defaults::DISPLAY, "Display falls back to default");
    defaults::DISPLAY.to_string()
}

/// Make the resolved display visible to the video sinks.
///
/// Must be called before any other thread is started (signal handler,
/// GStreamer streaming threads).
pub fn export_display(display: &str) {
    // SAFETY: called from `main` while the process is still single-threaded.
    unsafe {
        std::env::set_var(defaults::DISPLAY_ENV, display);
    }
}

/// Checks that an X server accepts connections for a display identifier
#[derive(Debug, Clone)]
pub struct DisplayProbe {
    socket_dir: PathBuf,
    connect_timeout: Duration,
    connection_setup: bool,
}

impl Default for DisplayProbe {
    fn default() -> Self {
        Self {
            socket_dir: PathBuf::from(x11::SOCKET_DIR),
            connect_timeout: Duration::from_secs(timing::DISPLAY_CONNECT_TIMEOUT_SECS),
            connection_setup: true,
        }
    }
}

impl DisplayProbe {
    /// Probe local displays in a different socket directory
    pub fn with_socket_dir(mut self, socket_dir: impl Into<PathBuf>) -> Self {
        self.socket_dir = socket_dir.into();
        self
    }

    /// Enable or disable the X11 connection setup after the transport
    /// connect. Without it only the socket is checked.
    pub fn with_connection_setup(mut self, enabled: bool) -> Self {
        self.connection_setup = enabled;
        self
    }

    /// Verify the display is reachable and accepts this client.
    ///
    /// The probe connections are closed immediately; the preview window
    /// opens its own.
    pub fn check(&self, display: &str) -> Result<DisplayName, DisplayError> {
        let name: DisplayName = display.parse()?;

        let unreachable = |reason: String| DisplayError::Unreachable {
            display: display.to_string(),
            reason,
        };

        if name.is_local() {
            self.connect_local(&name).map_err(unreachable)?;
        } else {
            self.connect_remote(&name).map_err(unreachable)?;
        }

        if self.connection_setup {
            self.setup_connection(display, &name).map_err(unreachable)?;
        }

        info!(display = %name, "Using display");
        Ok(name)
    }

    fn connect_local(&self, name: &DisplayName) -> Result<(), String> {
        let path = name.socket_path(&self.socket_dir);
        debug!(path = %path.display(), "Connecting to local X socket");

        match UnixStream::connect(&path) {
            Ok(_) => Ok(()),
            Err(path_err) => {
                // Xorg also listens on the abstract namespace, which survives
                // a wiped /tmp.
                #[cfg(target_os = "linux")]
                {
                    use std::os::linux::net::SocketAddrExt;
                    use std::os::unix::net::SocketAddr;

                    let abstract_name = path.to_string_lossy().into_owned();
                    if let Ok(addr) = SocketAddr::from_abstract_name(abstract_name.as_bytes())
                        && UnixStream::connect_addr(&addr).is_ok()
                    {
                        debug!("Connected through abstract X socket");
                        return Ok(());
                    }
                }
                Err(format!("{}: {}", path.display(), path_err))
            }
        }
    }

    /// Full X11 handshake. A server that refuses the client (missing
    /// `XAUTHORITY`, stale socket) fails here even though the socket
    /// accepted the connection.
    fn setup_connection(&self, display: &str, name: &DisplayName) -> Result<(), String> {
        // Sockets outside the system directory are addressed by path; x11rb
        // resolves everything else (abstract sockets, TCP, Xauthority).
        let target = if name.is_local() && self.socket_dir != Path::new(x11::SOCKET_DIR) {
            name.socket_path(&self.socket_dir)
                .to_string_lossy()
                .into_owned()
        } else {
            display.to_string()
        };

        let (conn, screen_num) = x11rb::connect(Some(&target))
            .map_err(|e| format!("X11 connection setup failed: {}", e))?;

        let screen = conn
            .setup()
            .roots
            .get(screen_num)
            .ok_or_else(|| format!("screen {} does not exist", screen_num))?;
        debug!(
            screen = screen_num,
            width = screen.width_in_pixels,
            height = screen.height_in_pixels,
            "X11 connection established"
        );
        Ok(())
    }

    fn connect_remote(&self, name: &DisplayName) -> Result<(), String> {
        let host = name.host.as_deref().unwrap_or("localhost");
        let port = name
            .tcp_port()
            .ok_or_else(|| format!("display number {} out of range", name.number))?;

        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| format!("cannot resolve {}: {}", host, e))?;

        let mut last_error = format!("{} did not resolve to any address", host);
        for addr in addrs {
            debug!(%addr, "Connecting to remote X server");
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(_) => return Ok(()),
                Err(e) => last_error = format!("{}: {}", addr, e),
            }
        }
        Err(last_error)
    }
}
