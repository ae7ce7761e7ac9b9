// rpclens - inspecting reverse proxy for Ethereum JSON-RPC
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Logging setup shared by all rpclens binaries.
//!
//! Diagnostics go through `tracing`; the proxy's traffic log is a separate
//! concern (see the proxy crate's log sink) and is not routed here.

use std::{
    fs,
    path::PathBuf,
    sync::OnceLock,
};

use eyre::{eyre, Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Keeps the non-blocking writer alive for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initializes console logging honoring `RUST_LOG`, defaulting to `info`.
pub fn init_logging(program: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_target(true))
        .try_init()
        .map_err(|e| eyre!("failed to initialize logging for {program}: {e}"))
}

/// Initializes file-only logging and returns the log file path.
///
/// Used by commands whose stdout belongs to the user (e.g. `encode`); the log
/// file lands in `~/.rpclens/logs`.
pub fn init_file_only_logging(program: &str) -> Result<PathBuf> {
    let dir = log_dir()?;
    fs::create_dir_all(&dir).wrap_err_with(|| format!("failed to create {}", dir.display()))?;

    let file_name = format!("{program}-{}.log", chrono::Local::now().format("%Y%m%d-%H%M%S"));
    let path = dir.join(&file_name);

    let file = fs::File::create(&path)
        .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = FILE_GUARD.set(guard);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| eyre!("failed to initialize logging for {program}: {e}"))?;

    Ok(path)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn log_dir() -> Result<PathBuf> {
    dirs_next::home_dir()
        .map(|home| home.join(".rpclens").join("logs"))
        .ok_or_else(|| eyre!("could not determine home directory"))
}
