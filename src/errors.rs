// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the preview launcher
//!
//! Every error that reaches `main` is terminal. [`AppError::exit_code`] maps
//! it to the documented process exit status.

use crate::backends::camera::BackendError;
use crate::constants::exit_codes;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug, Clone)]
pub enum AppError {
    /// Invalid configuration value
    Config(ConfigError),
    /// Display target missing or unreachable
    Display(DisplayError),
    /// Camera backend errors
    Backend(BackendError),
    /// Filesystem errors (benchmark reports)
    Io(String),
    /// Generic error with message
    Other(String),
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is not an integer at all
    NotAnInteger { field: &'static str, value: String },
    /// Value is zero or negative
    NonPositive { field: &'static str, value: i64 },
    /// Value does not fit the range GStreamer accepts
    OutOfRange {
        field: &'static str,
        value: i64,
        max: i64,
    },
    /// Rotation other than 0, 90, 180 or 270
    InvalidRotation(String),
}

/// Display target errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayError {
    /// Identifier is not of the form `[host]:display[.screen]`
    InvalidName(String),
    /// No display server answered at the identifier
    Unreachable { display: String, reason: String },
}

impl AppError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) => exit_codes::USAGE,
            AppError::Display(_) => exit_codes::NO_DISPLAY,
            AppError::Backend(BackendError::NoBackend) => exit_codes::NO_BACKEND,
            AppError::Backend(_) | AppError::Io(_) | AppError::Other(_) => {
                exit_codes::RUNTIME_FAILURE
            }
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Invalid configuration: {}", e),
            AppError::Display(e) => write!(f, "{}", e),
            AppError::Backend(e) => write!(f, "{}", e),
            AppError::Io(msg) => write!(f, "I/O error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NotAnInteger { field, value } => {
                write!(f, "{} must be a positive integer, got '{}'", field, value)
            }
            ConfigError::NonPositive { field, value } => {
                write!(f, "{} must be a positive integer, got {}", field, value)
            }
            ConfigError::OutOfRange { field, value, max } => {
                write!(f, "{} must be at most {}, got {}", field, max, value)
            }
            ConfigError::InvalidRotation(value) => {
                write!(f, "rotation must be one of 0, 90, 180, 270, got '{}'", value)
            }
        }
    }
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InvalidName(name) => write!(
                f,
                "Invalid display identifier '{}'. Pass --display :0 or set DISPLAY.",
                name
            ),
            DisplayError::Unreachable { display, reason } => write!(
                f,
                "No display server reachable at '{}' ({}). \
                 Run under X11 or pass --display :0, \
                 make sure XAUTHORITY points at the session's cookie, \
                 or delay the start until the desktop session is ready.",
                display, reason
            ),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for DisplayError {}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<DisplayError> for AppError {
    fn from(err: DisplayError) -> Self {
        AppError::Display(err)
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<ctrlc::Error> for AppError {
    fn from(err: ctrlc::Error) -> Self {
        AppError::Other(format!("Failed to install signal handler: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let display = AppError::Display(DisplayError::Unreachable {
            display: ":0".to_string(),
            reason: "connection refused".to_string(),
        });
        assert_eq!(display.exit_code(), 1);
        assert_eq!(AppError::Backend(BackendError::NoBackend).exit_code(), 2);
        assert_eq!(
            AppError::Backend(BackendError::Pipeline("boom".to_string())).exit_code(),
            3
        );
        assert_eq!(
            AppError::Config(ConfigError::InvalidRotation("45".to_string())).exit_code(),
            64
        );
    }

    #[test]
    fn test_unreachable_message_names_display() {
        let err = DisplayError::Unreachable {
            display: ":0".to_string(),
            reason: "no such file".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("':0'"));
        assert!(msg.contains("--display"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::NonPositive {
            field: "width",
            value: -3,
        };
        assert!(err.to_string().contains("width"));
        assert!(err.to_string().contains("-3"));
    }
}
