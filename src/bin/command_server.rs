//! CP Command Server Binary
//!
//! Answers `status` and `print` commands until the link fails.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use cproto::config::COMMAND_SERVER_PORT;
use cproto::transport::UdpLink;
use cproto::{BuiltinHandler, CommandServer, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// CP Command Server
#[derive(Parser, Debug)]
#[command(name = "cp-command-server")]
#[command(about = "Executes CP commands and returns checksummed responses")]
#[command(version)]
struct Args {
    /// Listen host
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// Listen port
    #[arg(short, long, default_value_t = COMMAND_SERVER_PORT)]
    port: u16,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cproto=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();
    let listen = SocketAddr::new(args.host, args.port);

    tracing::info!("CP Command Server v{}", cproto::VERSION);

    let link = match UdpLink::bind(listen) {
        Ok(link) => link,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", listen, e);
            std::process::exit(1);
        }
    };

    let server = match CommandServer::new(link, BuiltinHandler, &Config::default()) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start command server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
