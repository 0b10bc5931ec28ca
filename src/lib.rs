//! Order Inventory Sync - Shopify inventory adjustments driven by order webhooks
//!
//! The platform can deduct inventory itself when an order is fulfilled, on
//! top of the deduction this service makes when the order is created. The
//! service therefore remembers which orders it has deducted for and, when
//! the order is later cancelled or fulfilled, puts the stock back exactly
//! once.
//!
//! # Architecture
//!
//! ```text
//! Platform ──▶ Webhook Dispatcher ──▶ Signature Verifier
//!                     │
//!                     ▼
//!            Lifecycle Processor ◀──▶ Order Tracker (+ per-order locks)
//!                     │
//!                     ▼ one call per line item
//!            Inventory Platform (variant → item → location → adjust)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use order_inventory_sync::config::ServiceConfig;
//! use order_inventory_sync::inventory::ShopifyClient;
//! use order_inventory_sync::tracking::InMemoryOrderTracker;
//! use order_inventory_sync::{server, AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServiceConfig::from_env()?;
//!     let platform = Arc::new(ShopifyClient::new(&config)?);
//!     let addr = ([0, 0, 0, 0], config.port).into();
//!     let state = AppState::new(config, platform, Arc::new(InMemoryOrderTracker::new()));
//!     server::serve(addr, server::build_router(Arc::new(state))).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod inventory;
pub mod processor;
pub mod server;
pub mod state;
pub mod tracking;
pub mod webhook;

// Re-exports for convenience
pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use processor::{Decision, LifecycleProcessor, ProcessingReport};
pub use state::AppState;
pub use webhook::{LineItem, Order, OrderEventKind, OrderId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
