//! rpclens - Web3 dev CLI
//!
//! An inspecting reverse proxy for Ethereum JSON-RPC traffic, plus the
//! surrounding developer tooling: a forking node runner, a persisted config
//! store, and string encoding conversions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::Result;
use rpclens_common::{Config, ConfigFile};

mod cmd;

use cmd::{config, encode, node, proxy};

/// Command-line interface for rpclens
#[derive(Debug, Parser)]
#[command(name = "rpclens")]
#[command(about = "Web3 dev CLI - inspecting JSON-RPC proxy, node runner, and encoding tools")]
#[command(version)]
pub struct Cli {
    /// Path to the config file (default: ./rpclens.config.json)
    #[arg(long, global = true, env = "RPCLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (repeat for more: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a reverse proxy server to log requests and responses
    Proxy(proxy::ProxyArgs),
    /// Start an anvil node, forking a configured RPC URL
    Node(node::NodeArgs),
    /// Inspect and edit the persisted configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
    /// Encode an input string
    Encode(encode::EncodeArgs),
    /// Decode an input string
    Decode(encode::DecodeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Set RUST_LOG based on verbosity
    if std::env::var("RUST_LOG").is_err() {
        let level = match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    rpclens_common::init_logging("rpclens")?;

    let config_file = match &cli.config {
        Some(path) => ConfigFile::new(path.clone(), Config::from_env()),
        None => ConfigFile::in_dir("."),
    };

    match cli.command {
        Commands::Proxy(args) => proxy::run(args, &config_file).await,
        Commands::Node(args) => node::run(args, &config_file),
        Commands::Config(command) => config::run(command, &config_file),
        Commands::Encode(args) => encode::run_encode(&args),
        Commands::Decode(args) => encode::run_decode(&args),
    }
}
