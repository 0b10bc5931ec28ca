//! Order webhook payloads
//!
//! Only the fields inventory sync needs are modelled; everything else in the
//! platform's order JSON is ignored.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// Order lifecycle events the service reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEventKind {
    /// `orders/create`
    Created,
    /// `orders/cancelled`
    Cancelled,
    /// `orders/fulfilled`
    Fulfilled,
}

impl OrderEventKind {
    /// Platform webhook topic for this event
    pub fn topic(&self) -> &'static str {
        match self {
            Self::Created => "orders/create",
            Self::Cancelled => "orders/cancelled",
            Self::Fulfilled => "orders/fulfilled",
        }
    }

    /// Route segment under `/webhooks/`
    pub fn route_name(&self) -> &'static str {
        match self {
            Self::Created => "order-created",
            Self::Cancelled => "order-cancelled",
            Self::Fulfilled => "order-fulfilled",
        }
    }

    /// Whether this event ends the order's tracked lifetime
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Created)
    }
}

impl FromStr for OrderEventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "orders/create" | "order-created" => Ok(Self::Created),
            "orders/cancelled" | "order-cancelled" => Ok(Self::Cancelled),
            "orders/fulfilled" | "order-fulfilled" => Ok(Self::Fulfilled),
            other => Err(Error::validation(format!("Unknown order event: {other}"))),
        }
    }
}

impl fmt::Display for OrderEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route_name())
    }
}

impl Serialize for OrderEventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.route_name())
    }
}

/// Platform-assigned order identifier.
///
/// Arrives as a JSON number or string and is normalised to its decimal
/// string form, so `1001` and `"1001"` name the same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OrderId(String);

impl OrderId {
    /// The identifier as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<u64> for OrderId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for OrderId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for OrderId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct OrderIdVisitor;

        impl Visitor<'_> for OrderIdVisitor {
            type Value = OrderId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an order id as a non-negative integer or non-empty string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<OrderId, E> {
                Ok(OrderId(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<OrderId, E> {
                u64::try_from(v)
                    .map(OrderId::from)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<OrderId, E> {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    return Err(E::invalid_value(de::Unexpected::Str(v), &self));
                }
                Ok(OrderId(trimmed.to_owned()))
            }
        }

        deserializer.deserialize_any(OrderIdVisitor)
    }
}

/// One line of an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Null for custom line items that are not backed by a product variant
    #[serde(default, alias = "variantId")]
    pub variant_id: Option<u64>,
    /// Units ordered
    pub quantity: u32,
    /// Product title at order time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Stock keeping unit at order time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl LineItem {
    /// Line item for `variant_id` with `quantity` units
    pub fn new(variant_id: u64, quantity: u32) -> Self {
        Self {
            variant_id: Some(variant_id),
            quantity,
            title: None,
            sku: None,
        }
    }
}

/// Order as delivered in a lifecycle webhook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Platform order id
    pub id: OrderId,
    /// Human-facing order name, e.g. `#1001`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Ordered lines
    #[serde(default)]
    pub line_items: Vec<LineItem>,
}

impl Order {
    /// Order with the given id and line items
    pub fn new(id: impl Into<OrderId>, line_items: Vec<LineItem>) -> Self {
        Self {
            id: id.into(),
            name: None,
            line_items,
        }
    }

    /// Parse from raw webhook body bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::unexpected(format!("Invalid order payload: {e}")))
    }
}
