// src/main.rs
use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::info;

mod config;
mod ports;
mod server;

use crate::{
    config::{AddressFamily, Config},
    server::Supervisor,
};

/// Diagnostic TCP/UDP port listener: binds every requested port, logs
/// whatever arrives, and answers each line or datagram with a fixed
/// acknowledgement.
#[derive(Parser, Debug)]
#[command(name = "rust-port-listener", version, about)]
struct Cli {
    /// Ports to listen on (single, list, or range: e.g. 80,443,8000-8010)
    #[arg(long, value_name = "SPEC")]
    port: Option<String>,

    /// Bind to all IPv4 addresses
    #[arg(long)]
    ipv4: bool,

    /// Bind to all IPv6 addresses
    #[arg(long)]
    ipv6: bool,

    /// Bind to a specific local address instead of the wildcard
    #[arg(long, value_name = "ADDR")]
    bind: Option<IpAddr>,

    /// Auto close after N minutes in non-interactive mode (default 15, 0 = never)
    #[arg(long, value_name = "MINUTES")]
    autoclose: Option<u64>,

    /// Optional YAML or JSON config file; flags take precedence over it
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("rust_port_listener=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Some(config::load_config(path).await?)
        }
        None => None,
    };

    let mut config = merge(cli, file_config);

    // No ports from flags or file means interactive mode: prompt for them
    // and stay up until the operator interrupts.
    let interactive = config.ports.trim().is_empty();
    if interactive {
        config.ports = prompt_for_ports()?;
        config.auto_close_minutes = 0;
    }

    config.validate()?;
    let port_set = ports::resolve(&config.ports)?;

    let mut supervisor = Supervisor::new(config, port_set);
    supervisor.start();

    let handle = supervisor.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        handle.shutdown();
    });

    supervisor.run().await
}

/// CLI flags take precedence over the config file; anything neither
/// supplies falls back to the defaults.
fn merge(cli: Cli, file_config: Option<Config>) -> Config {
    let base = file_config.unwrap_or_default();

    Config {
        ports: cli.port.unwrap_or(base.ports),
        bind_address: cli.bind.or(base.bind_address),
        family: if cli.ipv4 || cli.ipv6 {
            AddressFamily::from_flags(cli.ipv4, cli.ipv6)
        } else {
            base.family
        },
        auto_close_minutes: cli.autoclose.unwrap_or(base.auto_close_minutes),
    }
}

fn prompt_for_ports() -> Result<String> {
    println!("===================================");
    println!("  rust-port-listener v{}", env!("CARGO_PKG_VERSION"));
    println!("===================================");
    println!();
    println!("CTRL + C to close");
    print!("Enter ports: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
