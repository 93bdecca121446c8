//! CP Cookie Server Binary
//!
//! Issues session cookies until the link fails.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use cproto::config::COOKIE_SERVER_PORT;
use cproto::transport::UdpLink;
use cproto::{Config, CookieServer};
use tracing_subscriber::{fmt, EnvFilter};

/// CP Cookie Server
#[derive(Parser, Debug)]
#[command(name = "cp-cookie-server")]
#[command(about = "Issues and tracks per-client CP session cookies")]
#[command(version)]
struct Args {
    /// Listen host
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    host: IpAddr,

    /// Listen port
    #[arg(short, long, default_value_t = COOKIE_SERVER_PORT)]
    port: u16,

    /// Maximum number of distinct clients holding a cookie
    #[arg(short, long, default_value = "20")]
    capacity: usize,
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

    tracing::info!("CP Cookie Server v{}", cproto::VERSION);
    tracing::info!("Session capacity: {}", args.capacity);

    let config = Config::builder().session_capacity(args.capacity).build();

    let link = match UdpLink::bind(listen) {
        Ok(link) => link,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", listen, e);
            std::process::exit(1);
        }
    };

    let server = match CookieServer::new(link, &config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start cookie server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
