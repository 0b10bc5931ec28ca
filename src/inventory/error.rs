//! Inventory API error types

use std::fmt;

use thiserror::Error;

/// Failure of a single call against the platform admin API
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The connection could not be established; the request was never sent
    #[error("Connection failed: {0}")]
    Connect(String),

    /// Timeout or I/O failure after the request may have reached the platform
    #[error("Request failed: {0}")]
    Transport(String),

    /// The platform answered with a non-success status
    #[error("HTTP error {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, as returned by the platform
        body: String,
    },

    /// The response body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A request URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether retrying the same call may succeed.
    ///
    /// Transport failures, rate limiting (429) and server errors (5xx) are
    /// transient; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Connect(_) | ApiError::Transport(_) => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            ApiError::Decode(_) | ApiError::InvalidUrl(_) => false,
        }
    }

    /// Whether the platform certainly did not act on the request.
    ///
    /// Only these failures are safe to resend for a mutating call: a failed
    /// connection, or a 429 from the rate limiter.
    pub fn is_unapplied(&self) -> bool {
        matches!(
            self,
            ApiError::Connect(_) | ApiError::Status { status: 429, .. }
        )
    }

    /// Whether the platform reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if err.is_connect() {
            ApiError::Connect(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// What a failed resolution step was looking up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionTarget {
    /// Variant → inventory item lookup
    Variant,
    /// Inventory item → inventory levels lookup
    InventoryLevels,
}

impl fmt::Display for ResolutionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionTarget::Variant => f.write_str("variant"),
            ResolutionTarget::InventoryLevels => f.write_str("inventory levels for item"),
        }
    }
}

/// Failure of one `adjust(variant, delta)` sequence
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// A lookup step failed or the looked-up resource does not exist
    #[error("Failed to resolve {target} {id}: {source}")]
    Resolution {
        /// Which lookup failed
        target: ResolutionTarget,
        /// Identifier that was being resolved
        id: u64,
        /// Underlying API failure
        source: ApiError,
    },

    /// The inventory item has no inventory level at any location
    #[error("No inventory levels found for inventory item {inventory_item_id}")]
    NoInventoryLevel {
        /// Inventory item that has no levels
        inventory_item_id: u64,
    },

    /// The configured primary location does not stock the inventory item
    #[error("Location {location_id} has no inventory level for inventory item {inventory_item_id}")]
    LocationNotStocked {
        /// Inventory item being adjusted
        inventory_item_id: u64,
        /// Configured primary location
        location_id: u64,
    },

    /// The adjustment call itself was rejected
    #[error("Failed to adjust inventory item {inventory_item_id} at location {location_id}: {source}")]
    Adjustment {
        /// Inventory item being adjusted
        inventory_item_id: u64,
        /// Location the adjustment targeted
        location_id: u64,
        /// Underlying API failure
        source: ApiError,
    },
}

impl InventoryError {
    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            InventoryError::Resolution { .. } => "resolution",
            InventoryError::NoInventoryLevel { .. } | InventoryError::LocationNotStocked { .. } => {
                "no_inventory_level"
            }
            InventoryError::Adjustment { .. } => "adjustment",
        }
    }
}
