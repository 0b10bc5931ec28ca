//! Admin REST API payloads

use serde::{Deserialize, Serialize};

/// `GET variants/{id}.json` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct VariantEnvelope {
    /// The requested variant
    pub variant: Variant,
}

/// Product variant, reduced to the fields inventory sync needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variant {
    /// Variant id
    pub id: u64,
    /// Null for variants whose inventory is not tracked
    #[serde(default)]
    pub inventory_item_id: Option<u64>,
    /// Stock keeping unit, if set
    #[serde(default)]
    pub sku: Option<String>,
}

/// `GET inventory_levels.json` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryLevelsEnvelope {
    /// One entry per location stocking the item
    #[serde(default)]
    pub inventory_levels: Vec<InventoryLevel>,
}

/// Stock of one inventory item at one location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLevel {
    /// Inventory item the level belongs to
    pub inventory_item_id: u64,
    /// Location holding the stock
    pub location_id: u64,
    /// Units available, when the platform tracks them
    #[serde(default)]
    pub available: Option<i64>,
}

/// `POST inventory_levels/adjust.json` request body
#[derive(Debug, Clone, Serialize)]
pub struct AdjustRequest {
    /// Location to adjust
    pub location_id: u64,
    /// Inventory item to adjust
    pub inventory_item_id: u64,
    /// Signed change to the available quantity
    pub available_adjustment: i64,
}

/// `POST inventory_levels/adjust.json` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustEnvelope {
    /// Level after the adjustment
    pub inventory_level: InventoryLevel,
}

/// `GET shop.json` response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ShopEnvelope {
    /// The shop behind the access token
    pub shop: ShopInfo,
}

/// Shop identity, used to verify credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopInfo {
    /// Shop display name
    pub name: String,
    /// Primary domain
    pub domain: String,
    /// Platform-assigned `*.myshopify.com` domain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub myshopify_domain: Option<String>,
}

/// Result of a successful `adjust(variant, delta)` sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustmentReceipt {
    /// Variant the caller asked to adjust
    pub variant_id: u64,
    /// Inventory item the variant resolved to
    pub inventory_item_id: u64,
    /// Location that was adjusted
    pub location_id: u64,
    /// Signed change applied
    pub delta: i64,
    /// Available quantity after the adjustment, when the platform reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

/// How to choose the inventory level to adjust when an item is stocked at
/// several locations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocationStrategy {
    /// Use whichever level the platform lists first
    #[default]
    FirstReturned,
    /// Always use this location
    Primary(u64),
}

impl LocationStrategy {
    /// Pick the level to adjust, or `None` when no level matches.
    pub fn select<'a>(&self, levels: &'a [InventoryLevel]) -> Option<&'a InventoryLevel> {
        match self {
            LocationStrategy::FirstReturned => levels.first(),
            LocationStrategy::Primary(location_id) => {
                levels.iter().find(|level| level.location_id == *location_id)
            }
        }
    }
}
