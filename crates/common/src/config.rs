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

//! On-disk JSON configuration store.
//!
//! Settings live in a single JSON file (`rpclens.config.json` by default).
//! A missing file is recreated from defaults; a corrupt file is backed up to
//! `<path>.bak` and reset rather than aborting the command that read it.

use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Environment variable prefix used to seed per-chain fork URLs,
/// e.g. `FORK_URL_1=https://eth.llamarpc.com`.
pub const FORK_URL_ENV_PREFIX: &str = "FORK_URL_";

/// Persisted rpclens settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Upstream RPC URLs keyed by chain id, used as fork sources for `rpclens node`.
    pub rpc_urls: BTreeMap<u64, String>,
    /// Target host the proxy forwards to (and the node binds to).
    pub host: String,
    /// Target port the proxy forwards to (and the node listens on).
    pub port: u16,
    /// Port the proxy itself listens on.
    pub proxy_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_urls: BTreeMap::new(),
            host: "127.0.0.1".to_string(),
            port: 8545,
            proxy_port: 8546,
        }
    }
}

impl Config {
    /// Default config seeded with `FORK_URL_<chainId>` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for (key, value) in env::vars() {
            let Some(chain_id) = key.strip_prefix(FORK_URL_ENV_PREFIX) else { continue };
            if value.is_empty() {
                continue;
            }
            if let Ok(chain_id) = chain_id.parse::<u64>() {
                config.rpc_urls.insert(chain_id, value);
            }
        }
        config
    }
}

/// A JSON file for persisting [`Config`] data.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    defaults: Config,
}

impl ConfigFile {
    /// Default file name, created in the working directory unless overridden.
    pub const DEFAULT_NAME: &'static str = "rpclens.config.json";

    /// Creates a config file handle at `path` with explicit defaults.
    pub fn new(path: impl Into<PathBuf>, defaults: Config) -> Self {
        Self { path: path.into(), defaults }
    }

    /// Creates a config file handle at `<dir>/rpclens.config.json` with
    /// env-seeded defaults.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::DEFAULT_NAME), Config::from_env())
    }

    /// The path to the config file, including the file name.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The defaults the file is created with and reset to.
    pub fn defaults(&self) -> &Config {
        &self.defaults
    }

    /// Reads the config file.
    ///
    /// A missing file is created from the defaults. An unparsable file is
    /// backed up at `<path>.bak` and replaced with the defaults; the read
    /// itself never fails because of file contents.
    pub fn read(&self) -> Config {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) => {
                debug!("Config file {} not readable ({e}), resetting to defaults", self.path.display());
                let _ = self.reset();
                return self.defaults.clone();
            }
        };

        match serde_json::from_str(&json) {
            Ok(config) => config,
            Err(e) => {
                let backup_path = self.path.with_extension("json.bak");
                let _ = fs::write(&backup_path, &json);
                let _ = self.reset();
                error!(
                    "Failed to parse config from {} ({e}). The file has been backed up at {} \
                     and recreated with default values.",
                    self.path.display(),
                    backup_path.display()
                );
                self.defaults.clone()
            }
        }
    }

    /// Writes `config` to disk, creating parent directories as needed.
    pub fn write(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, json)
            .wrap_err_with(|| format!("failed to write {}", self.path.display()))
    }

    /// Resets the config file to the defaults and returns them.
    pub fn reset(&self) -> Result<Config> {
        self.write(&self.defaults)?;
        Ok(self.defaults.clone())
    }

    /// Deletes the config file. Missing files are not an error.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).wrap_err_with(|| format!("failed to remove {}", self.path.display())),
        }
    }
}
