// SPDX-License-Identifier: GPL-3.0-only

//! Signal-driven shutdown
//!
//! SIGINT and SIGTERM (systemd stop) set a shared flag. The preview run loop
//! polls it and tears the pipeline down from the main thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Shared stop request
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// Create a signal that is only triggered manually
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signal triggered by SIGINT/SIGTERM.
    ///
    /// Can only be called once per process.
    pub fn install() -> Result<Self, ctrlc::Error> {
        let signal = Self::new();
        let handler_signal = signal.clone();

        ctrlc::set_handler(move || {
            if !handler_signal.is_triggered() {
                info!("Received termination signal, shutting down");
            }
            handler_signal.trigger();
        })?;

        Ok(signal)
    }

    /// Request shutdown
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Check if shutdown was requested
    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
