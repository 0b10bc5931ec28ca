//! Order Inventory Sync server
//!
//! Listens for order lifecycle webhooks and keeps inventory in step.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use order_inventory_sync::config::ServiceConfig;
use order_inventory_sync::inventory::ShopifyClient;
use order_inventory_sync::tracking::InMemoryOrderTracker;
use order_inventory_sync::{server, AppState};

/// Order Inventory Sync server
#[derive(Parser, Debug)]
#[command(name = "inventory-sync")]
#[command(version)]
#[command(about = "Adjusts Shopify inventory from order lifecycle webhooks")]
struct Args {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: IpAddr,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Skip loading a .env file from the working directory
    #[arg(long)]
    no_dotenv: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if !args.no_dotenv {
        dotenvy::dotenv().ok();
    }

    // Initialize tracing
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = ServiceConfig::from_env().context("Invalid configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }

    tracing::info!(
        shop = %config.shop_domain,
        api_version = %config.api_version,
        location_strategy = ?config.location_strategy,
        max_retries = config.retry.max_retries,
        "Order inventory sync starting"
    );

    let platform = Arc::new(ShopifyClient::new(&config).context("Failed to build API client")?);
    let addr = SocketAddr::new(args.host, config.port);
    let state = AppState::new(config, platform, Arc::new(InMemoryOrderTracker::new()));

    server::serve(addr, server::build_router(Arc::new(state)))
        .await
        .context("Server error")?;

    tracing::info!("Order inventory sync stopped");
    Ok(())
}
