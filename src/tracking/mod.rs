//! Order State Tracker
//!
//! Remembers which orders this service has deducted inventory for and is
//! still waiting on a terminal event (cancellation or fulfillment). The
//! lifecycle processor only talks to the [`OrderTracker`] trait, so the
//! in-memory store can be replaced by a persistent one.
//!
//! [`OrderLocks`] serialises all work on a single order id so that
//! check-then-act sequences over the tracker are atomic per order.

pub mod locks;

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

pub use locks::{OrderGuard, OrderLocks};

/// Tracking store errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackingError {
    /// The backing store could not be read or written
    #[error("Tracking store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for tracking operations
pub type TrackingResult<T> = std::result::Result<T, TrackingError>;

/// Store of order ids awaiting a terminal lifecycle event
#[async_trait]
pub trait OrderTracker: Send + Sync + 'static {
    /// Record that inventory was deducted for `order_id`.
    async fn mark_tracked(&self, order_id: &str) -> TrackingResult<()>;

    /// Whether `order_id` is currently tracked.
    async fn is_tracked(&self, order_id: &str) -> TrackingResult<bool>;

    /// Forget `order_id`. Returns whether it was tracked.
    async fn unmark(&self, order_id: &str) -> TrackingResult<bool>;

    /// Number of tracked orders.
    async fn len(&self) -> TrackingResult<usize>;
}

/// Process-lifetime tracker backed by a set.
///
/// Not persisted: every restart begins with nothing tracked. Not bounded:
/// orders that never receive a terminal event stay tracked until restart.
#[derive(Debug, Default)]
pub struct InMemoryOrderTracker {
    orders: RwLock<HashSet<String>>,
}

impl InMemoryOrderTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderTracker for InMemoryOrderTracker {
    async fn mark_tracked(&self, order_id: &str) -> TrackingResult<()> {
        self.orders.write().insert(order_id.to_owned());
        Ok(())
    }

    async fn is_tracked(&self, order_id: &str) -> TrackingResult<bool> {
        Ok(self.orders.read().contains(order_id))
    }

    async fn unmark(&self, order_id: &str) -> TrackingResult<bool> {
        Ok(self.orders.write().remove(order_id))
    }

    async fn len(&self) -> TrackingResult<usize> {
        Ok(self.orders.read().len())
    }
}
