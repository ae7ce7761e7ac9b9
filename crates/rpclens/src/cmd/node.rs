//! `rpclens node` - spawn an anvil node, optionally forking a configured
//! upstream.

use std::process::Command;

use clap::Parser;
use eyre::{Context, Result};
use rpclens_common::ConfigFile;
use tracing::{info, warn};

/// Arguments for the node command
#[derive(Debug, Parser)]
pub struct NodeArgs {
    /// Chain id to fork; its RPC URL is looked up in the config `rpcUrls`
    #[arg(short, long)]
    chain: Option<u64>,

    /// The host to run the node on (default: config `host`)
    #[arg(long)]
    host: Option<String>,

    /// The port to run the node on (default: config `port`)
    #[arg(short, long)]
    port: Option<u16>,
}

/// Spawn anvil with inherited stdio and wait for it to exit
pub fn run(args: NodeArgs, config_file: &ConfigFile) -> Result<()> {
    let config = config_file.read();

    let mut anvil_args: Vec<String> = Vec::new();

    if let Some(chain) = args.chain {
        match config.rpc_urls.get(&chain) {
            Some(fork_url) => anvil_args.push(format!("--fork-url={fork_url}")),
            None => warn!("No fork URL configured for chain {chain}, starting a fresh chain"),
        }
    }

    anvil_args.push(format!("--host={}", args.host.unwrap_or(config.host)));
    anvil_args.push(format!("--port={}", args.port.unwrap_or(config.port)));

    info!("Spawning anvil {}", anvil_args.join(" "));

    let status = Command::new("anvil")
        .args(&anvil_args)
        .status()
        .wrap_err("failed to spawn anvil; is it installed and on PATH?")?;

    if !status.success() {
        eyre::bail!("anvil exited with {status}");
    }

    Ok(())
}
