//! Warden server binary.
//!
//! # Usage
//!
//! ```bash
//! # Five resources, defaults for everything else
//! warden-server --bind 0.0.0.0:4733
//!
//! # Small pool with an aggressive hold timeout and a visible status block
//! warden-server --resources 2 --max-hold-secs 10 --status-interval-secs 1
//! ```

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use warden_core::SweeperConfig;
use warden_server::{Server, ServerRuntimeConfig};

/// Warden mutual-exclusion arbiter server
#[derive(Parser, Debug)]
#[command(name = "warden-server")]
#[command(about = "Centralized resource arbiter with signed grants")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:4733")]
    bind: String,

    /// Resource pool size
    #[arg(short, long, default_value = "5")]
    resources: u32,

    /// Hold timeout before forced eviction, in seconds
    #[arg(long, default_value = "30")]
    max_hold_secs: u64,

    /// Sweep tick interval, in milliseconds
    #[arg(long, default_value = "500")]
    sweep_interval_ms: u64,

    /// Log the status block every N seconds (disabled when omitted)
    #[arg(long)]
    status_interval_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("warden server starting");
    tracing::info!(
        "pool of {} resources, {}s hold timeout, {}ms sweep interval",
        args.resources,
        args.max_hold_secs,
        args.sweep_interval_ms
    );

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        resources: args.resources,
        sweeper: SweeperConfig {
            max_hold: Duration::from_secs(args.max_hold_secs),
            interval: Duration::from_millis(args.sweep_interval_ms),
        },
        status_interval: args.status_interval_secs.map(Duration::from_secs),
    };

    let server = Server::bind(config).await?;

    tracing::info!("listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
