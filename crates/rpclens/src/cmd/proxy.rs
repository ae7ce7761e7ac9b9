//! `rpclens proxy` - start the inspecting reverse proxy.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use eyre::Result;
use rpclens_common::ConfigFile;
use rpclens_proxy::proxy::ProxyServerBuilder;
use tracing::info;

/// Arguments for the proxy command
#[derive(Debug, Parser)]
pub struct ProxyArgs {
    /// The target host to proxy requests to (default: config `host`)
    #[arg(long)]
    host: Option<String>,

    /// The target port to proxy requests to (default: config `port`)
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// The port to listen on (default: config `proxyPort`)
    #[arg(short = 'P', long)]
    proxy_port: Option<u16>,

    /// Body decoder used for the traffic log
    #[arg(long, value_enum, default_value = "eth")]
    decoder: DecoderArg,

    /// Save logs to a file
    #[arg(short = 'l', long, action = clap::ArgAction::Set, default_value = "true")]
    save_logs: bool,

    /// The directory to save logs to
    #[arg(short = 'd', long, default_value = "logs")]
    logs_dir: PathBuf,

    /// The file to save logs to
    #[arg(short = 'f', long, default_value = "requests.log")]
    logs_file: String,

    /// Clear the log file before starting the server
    #[arg(short = 'c', long)]
    clear: bool,
}

/// Registered body decoder variants
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DecoderArg {
    /// Ethereum JSON-RPC aware decoding
    Eth,
    /// Plain JSON parsing
    Json,
    /// URL-encoded key/value pairs
    Urlencoded,
}

impl DecoderArg {
    fn name(self) -> &'static str {
        match self {
            Self::Eth => "eth",
            Self::Json => "json",
            Self::Urlencoded => "urlencoded",
        }
    }
}

/// Run the inspecting proxy until interrupted
pub async fn run(args: ProxyArgs, config_file: &ConfigFile) -> Result<()> {
    let config = config_file.read();
    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);
    let proxy_port = args.proxy_port.unwrap_or(config.proxy_port);

    let mut builder = ProxyServerBuilder::new()
        .upstream_host(&host)
        .upstream_port(port)
        .decoder(args.decoder.name())
        .clear_log(args.clear);

    if args.save_logs {
        builder = builder.log_file(args.logs_dir.join(&args.logs_file));
    }

    let proxy = builder.build().await?;

    let addr = SocketAddr::from(([127, 0, 0, 1], proxy_port));
    println!("Proxy server running at: http://127.0.0.1:{proxy_port} -> {}", proxy.upstream());

    tokio::select! {
        result = proxy.serve(addr) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    Ok(())
}
