// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer
//!
//! - [`camera`]: camera stack detection and preview pipeline construction

pub mod camera;
