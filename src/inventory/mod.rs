//! Inventory API client
//!
//! Translates a `(variant, signed delta)` pair into a platform inventory
//! mutation:
//!
//! ```text
//! variant ──▶ inventory item ──▶ inventory levels ──▶ location ──▶ adjust
//!  (GET)          (GET)              (strategy)         (POST)
//! ```
//!
//! The [`InventoryPlatform`] trait is the seam the lifecycle processor
//! depends on; [`ShopifyClient`] is the production implementation.

pub mod client;
pub mod error;
pub mod retry;
pub mod types;

use async_trait::async_trait;

pub use client::ShopifyClient;
pub use error::{ApiError, InventoryError, ResolutionTarget};
pub use retry::RetryPolicy;
pub use types::{AdjustmentReceipt, InventoryLevel, LocationStrategy, ShopInfo};

/// Operations the service needs from the commerce platform
#[async_trait]
pub trait InventoryPlatform: Send + Sync + 'static {
    /// Apply `delta` to the stock of `variant_id` at the selected location.
    ///
    /// Performs two reads and exactly one mutating call when it succeeds.
    async fn adjust(&self, variant_id: u64, delta: i64) -> Result<AdjustmentReceipt, InventoryError>;

    /// Fetch shop identity, used to check credentials and connectivity.
    async fn shop_info(&self) -> Result<ShopInfo, ApiError>;
}
