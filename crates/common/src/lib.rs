// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
// SPDX-License-Identifier: AGPL-3.0
//! rpclens common utilities
//!
//! Shared functionality used by the rpclens CLI and the proxy crate:
//! on-disk configuration, logging setup, and string encoding conversions.

/// On-disk JSON configuration store and the settings it holds
pub mod config;
/// Text encoding conversions (hex, binary, base64) for the encode/decode commands
pub mod encoding;
/// Logging setup and utilities for consistent logging across rpclens binaries
pub mod logging;

pub use config::*;
pub use encoding::*;
pub use logging::*;
