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

//! rpclens proxy server
//!
//! Standalone inspecting reverse proxy: forwards JSON-RPC traffic to an
//! upstream node byte-for-byte while logging a decoded rendition of every
//! request and response.

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use clap::Parser;
use eyre::Result;
use rpclens_common::init_logging;
use rpclens_proxy::proxy::ProxyServerBuilder;
use tracing::info;

/// rpclens inspecting proxy server
#[derive(Parser, Debug)]
#[command(name = "rpclens-proxy")]
#[command(about = "Inspecting reverse proxy for Ethereum JSON-RPC traffic")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    listen_host: String,

    /// Port to listen on
    #[arg(long, default_value = "8546")]
    listen_port: u16,

    /// Host to forward requests to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to forward requests to
    #[arg(long, default_value = "8545")]
    port: u16,

    /// Body decoder used for the traffic log (eth, json, urlencoded)
    #[arg(long, default_value = "eth")]
    decoder: String,

    /// Traffic log file (appended unless --clear is given)
    #[arg(long)]
    log_file: Option<String>,

    /// Truncate the traffic log file at startup
    #[arg(long)]
    clear: bool,

    /// Verbosity level (repeat for more: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set RUST_LOG based on verbosity
    if std::env::var("RUST_LOG").is_err() {
        let level = match args.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    init_logging("rpclens-proxy")?;

    let mut builder = ProxyServerBuilder::new()
        .upstream_host(&args.host)
        .upstream_port(args.port)
        .decoder(&args.decoder)
        .clear_log(args.clear);

    if let Some(log_file) = &args.log_file {
        builder = builder.log_file(log_file);
    }

    let proxy = builder.build().await?;

    let ip = IpAddr::from_str(&args.listen_host)?;
    let addr = SocketAddr::from((ip, args.listen_port));

    info!("Forwarding to {}", proxy.upstream());

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
