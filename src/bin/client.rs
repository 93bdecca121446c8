//! CP Client Binary
//!
//! Reads commands from stdin and prints the server's responses.

use std::io::{self, BufRead, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;
use cproto::config::{COMMAND_SERVER_PORT, COOKIE_SERVER_PORT};
use cproto::transport::UdpLink;
use cproto::{Client, Config, CpError};
use tracing_subscriber::{fmt, EnvFilter};

/// CP Client
#[derive(Parser, Debug)]
#[command(name = "cp-client")]
#[command(about = "Send status / print commands to a CP command server")]
#[command(version)]
struct Args {
    /// Address identifier of this client (its link port)
    #[arg(value_parser = clap::value_parser!(u16).range(5000..=65534))]
    id: u16,

    /// Host running the cookie and command servers
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    server_host: IpAddr,

    /// Command server port
    #[arg(long, default_value_t = COMMAND_SERVER_PORT)]
    command_port: u16,

    /// Cookie server port
    #[arg(long, default_value_t = COOKIE_SERVER_PORT)]
    cookie_port: u16,

    /// Per-attempt receive timeout in milliseconds
    #[arg(long, default_value = "2000")]
    timeout_ms: u64,
}

fn main() {
    // Logs go to stderr so they do not interleave with responses
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .command_server_addr(SocketAddr::new(args.server_host, args.command_port))
        .cookie_server_addr(SocketAddr::new(args.server_host, args.cookie_port))
        .receive_timeout_ms(args.timeout_ms)
        .build();

    let link = match UdpLink::bind(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), args.id)) {
        Ok(link) => link,
        Err(e) => {
            eprintln!("Failed to bind link on port {}: {}", args.id, e);
            std::process::exit(1);
        }
    };

    let mut client = match Client::new(link, &config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = repl(&mut client) {
        eprintln!("Fatal: {}", e);
        std::process::exit(1);
    }
}

fn repl(client: &mut Client<UdpLink>) -> cproto::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("Command: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;
        let line = line.trim();

        if !(line == "status" || line.starts_with("print")) {
            println!("Only these two commands are supported: status, print \"text\"");
            continue;
        }

        match client.execute(line) {
            Ok(response) if response.payload.is_empty() => {
                println!("Command executed successfully.")
            }
            Ok(response) => println!("Response: {}", response.payload),
            Err(e @ (CpError::Io(_) | CpError::Transport(_))) => return Err(e),
            Err(e) => {
                println!("Command not accepted by server ... try again ({})", e)
            }
        }
    }
}
