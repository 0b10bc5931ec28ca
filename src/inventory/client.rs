//! Shopify admin REST client
//!
//! Every request carries the `X-Shopify-Access-Token` header and is wrapped
//! in the configured [`RetryPolicy`]. Only the `adjust` call mutates state;
//! the variant and inventory-level lookups are reads.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::ServiceConfig;
use crate::inventory::types::{
    AdjustEnvelope, AdjustRequest, InventoryLevel, InventoryLevelsEnvelope, ShopEnvelope,
    VariantEnvelope,
};
use crate::inventory::{
    AdjustmentReceipt, ApiError, InventoryError, InventoryPlatform, LocationStrategy,
    ResolutionTarget, RetryPolicy, ShopInfo,
};

/// Header carrying the admin API access token
pub const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// Admin REST API client for inventory adjustments
#[derive(Clone)]
pub struct ShopifyClient {
    http: Client,
    base_url: Url,
    api_version: String,
    access_token: String,
    retry: RetryPolicy,
    location_strategy: LocationStrategy,
}

impl std::fmt::Debug for ShopifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_version", &self.api_version)
            .field("access_token", &"<redacted>")
            .field("retry", &self.retry)
            .field("location_strategy", &self.location_strategy)
            .finish()
    }
}

impl ShopifyClient {
    /// Build a client from service configuration
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the underlying HTTP client cannot be
    /// constructed (e.g. TLS backend initialisation fails).
    pub fn new(config: &ServiceConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            api_version: config.api_version.clone(),
            access_token: config.access_token.clone(),
            retry: config.retry,
            location_strategy: config.location_strategy,
        })
    }

    /// Location strategy used by [`InventoryPlatform::adjust`]
    pub fn location_strategy(&self) -> LocationStrategy {
        self.location_strategy
    }

    fn endpoint(&self, resource: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(&format!("admin/api/{}/{}", self.api_version, resource))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let response = self
            .http
            .get(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .http
            .post(url)
            .header(ACCESS_TOKEN_HEADER, &self.access_token)
            .json(body)
            .send()
            .await?;
        Self::read_json(response).await
    }

    /// Resolve a variant to the inventory item that tracks its stock.
    pub async fn inventory_item_id(&self, variant_id: u64) -> Result<u64, InventoryError> {
        let resolution = |source| InventoryError::Resolution {
            target: ResolutionTarget::Variant,
            id: variant_id,
            source,
        };

        let url = self
            .endpoint(&format!("variants/{variant_id}.json"))
            .map_err(resolution)?;
        let envelope: VariantEnvelope = self
            .retry
            .run("variant lookup", || self.get_json(url.clone()))
            .await
            .map_err(resolution)?;

        envelope.variant.inventory_item_id.ok_or_else(|| {
            resolution(ApiError::Decode(format!(
                "variant {variant_id} has no inventory item"
            )))
        })
    }

    /// List the per-location inventory levels of an inventory item.
    pub async fn inventory_levels(
        &self,
        inventory_item_id: u64,
    ) -> Result<Vec<InventoryLevel>, InventoryError> {
        let resolution = |source| InventoryError::Resolution {
            target: ResolutionTarget::InventoryLevels,
            id: inventory_item_id,
            source,
        };

        let mut url = self.endpoint("inventory_levels.json").map_err(resolution)?;
        url.query_pairs_mut()
            .append_pair("inventory_item_ids", &inventory_item_id.to_string());

        let envelope: InventoryLevelsEnvelope = self
            .retry
            .run("inventory level lookup", || self.get_json(url.clone()))
            .await
            .map_err(resolution)?;

        Ok(envelope.inventory_levels)
    }

    /// Apply a signed adjustment to one (item, location) level.
    pub async fn adjust_level(
        &self,
        location_id: u64,
        inventory_item_id: u64,
        delta: i64,
    ) -> Result<InventoryLevel, InventoryError> {
        let adjustment = |source| InventoryError::Adjustment {
            inventory_item_id,
            location_id,
            source,
        };

        let url = self
            .endpoint("inventory_levels/adjust.json")
            .map_err(adjustment)?;
        let body = AdjustRequest {
            location_id,
            inventory_item_id,
            available_adjustment: delta,
        };

        let envelope: AdjustEnvelope = self
            .retry
            .run_when("inventory adjustment", ApiError::is_unapplied, || {
                self.post_json(url.clone(), &body)
            })
            .await
            .map_err(adjustment)?;

        Ok(envelope.inventory_level)
    }
}

#[async_trait]
impl InventoryPlatform for ShopifyClient {
    #[instrument(skip(self))]
    async fn adjust(&self, variant_id: u64, delta: i64) -> Result<AdjustmentReceipt, InventoryError> {
        let inventory_item_id = self.inventory_item_id(variant_id).await?;
        debug!(inventory_item_id, "Resolved variant");

        let levels = self.inventory_levels(inventory_item_id).await?;
        if levels.is_empty() {
            return Err(InventoryError::NoInventoryLevel { inventory_item_id });
        }

        let level = self.location_strategy.select(&levels).ok_or(match self.location_strategy {
            LocationStrategy::Primary(location_id) => InventoryError::LocationNotStocked {
                inventory_item_id,
                location_id,
            },
            LocationStrategy::FirstReturned => InventoryError::NoInventoryLevel { inventory_item_id },
        })?;
        let location_id = level.location_id;

        let updated = self.adjust_level(location_id, inventory_item_id, delta).await?;

        info!(
            inventory_item_id,
            location_id,
            available = ?updated.available,
            "Inventory adjusted"
        );

        Ok(AdjustmentReceipt {
            variant_id,
            inventory_item_id,
            location_id,
            delta,
            available: updated.available,
        })
    }

    #[instrument(skip(self))]
    async fn shop_info(&self) -> Result<ShopInfo, ApiError> {
        let url = self.endpoint("shop.json")?;
        let envelope: ShopEnvelope = self
            .retry
            .run("shop lookup", || self.get_json(url.clone()))
            .await?;
        Ok(envelope.shop)
    }
}
