//! `rpclens config` - CRUD over the persisted configuration.

use clap::{Subcommand, ValueEnum};
use eyre::{eyre, Context, Result};
use rpclens_common::{Config, ConfigFile};
use serde_json::Value;

/// Subcommands for inspecting and editing the config file
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Get a config setting
    Get {
        /// The setting to read
        #[arg(value_enum)]
        setting: Setting,

        /// Chain id, when reading a single rpc-urls entry
        #[arg(short, long)]
        chain: Option<u64>,
    },
    /// Set a config setting
    Set {
        /// The setting to write
        #[arg(value_enum)]
        setting: Setting,

        /// The value to set the setting to
        value: String,

        /// Chain id, required when setting an rpc-urls entry
        #[arg(short, long)]
        chain: Option<u64>,
    },
    /// List all config settings
    List,
    /// Reset a setting (or a single rpc-urls entry) to its default
    Delete {
        /// The setting to reset
        #[arg(value_enum)]
        setting: Setting,

        /// Chain id, when deleting a single rpc-urls entry
        #[arg(short, long)]
        chain: Option<u64>,
    },
    /// Reset the whole config to defaults
    Reset,
    /// Print the path of the config file
    Path,
    /// Delete the config file
    Remove,
}

/// The settings persisted in the config file
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Setting {
    /// Per-chain fork RPC URLs
    RpcUrls,
    /// Target host for the proxy and the node
    Host,
    /// Target port for the proxy and the node
    Port,
    /// Listen port of the proxy
    ProxyPort,
}

/// Run a config subcommand
pub fn run(command: ConfigCommand, config_file: &ConfigFile) -> Result<()> {
    match command {
        ConfigCommand::Get { setting, chain } => {
            let config = config_file.read();
            match setting_value(&config, setting, chain) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => println!("No value set"),
            }
        }

        ConfigCommand::Set { setting, value, chain } => {
            let mut config = config_file.read();
            match setting {
                Setting::RpcUrls => {
                    let chain =
                        chain.ok_or_else(|| eyre!("--chain is required when setting rpc-urls"))?;
                    if !value.starts_with("http://") && !value.starts_with("https://") {
                        eyre::bail!("RPC URL must start with http:// or https://");
                    }
                    config.rpc_urls.insert(chain, value.trim().to_string());
                }
                Setting::Host => config.host = value.trim().to_string(),
                Setting::Port => {
                    config.port = value.trim().parse().wrap_err("port must be a number")?;
                }
                Setting::ProxyPort => {
                    config.proxy_port =
                        value.trim().parse().wrap_err("proxy-port must be a number")?;
                }
            }
            config_file.write(&config)?;
            println!("Set {} to: {}", setting_name(setting), value.trim());
        }

        ConfigCommand::List => {
            let config = config_file.read();
            println!("{}", serde_json::to_string_pretty(&config)?);
        }

        ConfigCommand::Delete { setting, chain } => {
            let mut config = config_file.read();
            let defaults = config_file.defaults();
            match (setting, chain) {
                (Setting::RpcUrls, Some(chain)) => {
                    if config.rpc_urls.remove(&chain).is_none() {
                        println!("No value set for chain {chain}");
                    }
                }
                (Setting::RpcUrls, None) => config.rpc_urls = defaults.rpc_urls.clone(),
                (Setting::Host, _) => config.host = defaults.host.clone(),
                (Setting::Port, _) => config.port = defaults.port,
                (Setting::ProxyPort, _) => config.proxy_port = defaults.proxy_port,
            }
            config_file.write(&config)?;
        }

        ConfigCommand::Reset => {
            config_file.reset()?;
            println!("Config reset to defaults");
        }

        ConfigCommand::Path => println!("{}", config_file.path().display()),

        ConfigCommand::Remove => config_file.remove()?,
    }

    Ok(())
}

fn setting_value(config: &Config, setting: Setting, chain: Option<u64>) -> Option<Value> {
    match setting {
        Setting::RpcUrls => match chain {
            Some(chain) => config.rpc_urls.get(&chain).map(|url| Value::String(url.clone())),
            None => serde_json::to_value(&config.rpc_urls).ok(),
        },
        Setting::Host => Some(Value::String(config.host.clone())),
        Setting::Port => Some(Value::from(config.port)),
        Setting::ProxyPort => Some(Value::from(config.proxy_port)),
    }
}

fn setting_name(setting: Setting) -> &'static str {
    match setting {
        Setting::RpcUrls => "rpc-urls",
        Setting::Host => "host",
        Setting::Port => "port",
        Setting::ProxyPort => "proxy-port",
    }
}
