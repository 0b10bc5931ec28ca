//! Per-order mutual exclusion
//!
//! A lock table keyed by order id. Slots are created on first use and
//! dropped again once the last holder or waiter releases them, so the table
//! only ever contains orders with in-flight work.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slot = Arc<AsyncMutex<()>>;

/// Keyed lock table for order ids
#[derive(Debug, Default)]
pub struct OrderLocks {
    slots: Mutex<HashMap<String, Slot>>,
}

impl OrderLocks {
    /// Create an empty lock table
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `order_id`.
    pub async fn acquire(&self, order_id: &str) -> OrderGuard<'_> {
        let slot = self
            .slots
            .lock()
            .entry(order_id.to_owned())
            .or_default()
            .clone();

        let guard = Arc::clone(&slot).lock_owned().await;

        OrderGuard {
            locks: self,
            order_id: order_id.to_owned(),
            slot,
            guard: Some(guard),
        }
    }

    /// Number of orders with a live slot
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no order currently holds or awaits a slot
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }
}

/// Exclusive access to one order id; released on drop.
#[derive(Debug)]
pub struct OrderGuard<'a> {
    locks: &'a OrderLocks,
    order_id: String,
    slot: Slot,
    guard: Option<OwnedMutexGuard<()>>,
}

impl OrderGuard<'_> {
    /// The order id this guard holds
    pub fn order_id(&self) -> &str {
        &self.order_id
    }
}

impl Drop for OrderGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut slots = self.locks.slots.lock();
        // one reference in the table, one here: nobody else is waiting
        if Arc::strong_count(&self.slot) == 2 {
            slots.remove(&self.order_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_slot_removed_after_release() {
        let locks = OrderLocks::new();
        {
            let guard = locks.acquire("1001").await;
            assert_eq!(guard.order_id(), "1001");
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_distinct_orders_do_not_block() {
        let locks = OrderLocks::new();
        let _a = locks.acquire("1001").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("2002")).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_same_order_is_serialised() {
        let locks = Arc::new(OrderLocks::new());
        let inside = Arc::new(AtomicU32::new(0));
        let max_inside = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = Arc::clone(&locks);
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            handles.push(tokio::spawn(async move {
                let _guard = locks.acquire("1001").await;
                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                max_inside.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                inside.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.expect("task panicked");
        }

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }
}
