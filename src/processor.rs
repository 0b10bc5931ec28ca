//! Lifecycle Event Processor
//!
//! Decides, for each verified order event, whether to deduct, restore,
//! compensate or do nothing, and drives the inventory platform once per line
//! item.
//!
//! # State machine
//!
//! ```text
//!                order-created (deduct)
//!   Untracked ─────────────────────────▶ Tracked
//!       ▲                                   │
//!       │  order-cancelled (restore)        │
//!       └───────────────────────────────────┘
//!          order-fulfilled (compensate)
//! ```
//!
//! `order-created` on an already tracked order is a duplicate delivery and
//! is ignored. Terminal events on an untracked order are ignored.
//!
//! Line items are processed independently: one failed adjustment is logged
//! and reported, and the remaining line items are still attempted. The
//! state transition is applied once the loop has run, whatever the per-line
//! outcomes. All of this happens under the order's lock, so concurrent
//! deliveries for the same order cannot interleave.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn, Instrument};

use crate::error::{Error, Result};
use crate::inventory::{AdjustmentReceipt, InventoryPlatform};
use crate::tracking::{OrderLocks, OrderTracker};
use crate::webhook::events::{LineItem, Order, OrderEventKind, OrderId};

/// Direction of an inventory change relative to the order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Remove ordered units from stock
    Deduct,
    /// Put ordered units back into stock
    Return,
}

impl Direction {
    fn delta(self, quantity: u32) -> i64 {
        let units = i64::from(quantity);
        match self {
            Direction::Deduct => -units,
            Direction::Return => units,
        }
    }
}

/// What the processor decided to do with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Stock deducted and the order is now tracked
    Deducted,
    /// Stock returned after a cancellation
    Restored,
    /// Stock returned to offset the platform's own fulfillment deduction
    Compensated,
    /// Stock deducted without touching tracking state
    DeductedUntracked,
    /// `order-created` for an order that is already tracked
    SkippedDuplicate,
    /// Terminal event for an order this service never deducted
    SkippedUntracked,
}

impl Decision {
    /// Whether any inventory call was made
    pub fn touched_inventory(&self) -> bool {
        !matches!(self, Decision::SkippedDuplicate | Decision::SkippedUntracked)
    }
}

/// Outcome of a single line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LineStatus {
    /// Adjustment applied
    Applied {
        /// Inventory item that was adjusted
        inventory_item_id: u64,
        /// Location that was adjusted
        location_id: u64,
    },
    /// Nothing to adjust for this line
    Skipped {
        /// Why the line was skipped
        reason: String,
    },
    /// Adjustment failed; siblings were still attempted
    Failed {
        /// Error class, e.g. `resolution`
        kind: String,
        /// Error message
        error: String,
    },
}

/// Per-line-item entry of a [`ProcessingReport`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineOutcome {
    /// Variant of the line, if any
    pub variant_id: Option<u64>,
    /// Units on the line
    pub quantity: u32,
    /// Signed change requested for the line
    pub delta: i64,
    /// What happened
    #[serde(flatten)]
    pub status: LineStatus,
}

/// Everything the processor did for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingReport {
    /// Order the event belongs to
    pub order_id: OrderId,
    /// Event that was processed
    pub event: OrderEventKind,
    /// What the processor decided to do
    pub decision: Decision,
    /// One entry per line item, in order; empty when skipped
    pub lines: Vec<LineOutcome>,
}

impl ProcessingReport {
    fn skipped(order: &Order, event: OrderEventKind, decision: Decision) -> Self {
        Self {
            order_id: order.id.clone(),
            event,
            decision,
            lines: Vec::new(),
        }
    }

    /// Number of line items whose adjustment was applied
    pub fn applied_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line.status, LineStatus::Applied { .. }))
            .count()
    }

    /// Number of line items whose adjustment failed
    pub fn failed_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line.status, LineStatus::Failed { .. }))
            .count()
    }
}

/// Orchestrates tracking state and inventory adjustments per order event
pub struct LifecycleProcessor {
    inner: Arc<Lifecycle>,
}

impl LifecycleProcessor {
    /// Create a processor over a platform client and a tracking store
    pub fn new(platform: Arc<dyn InventoryPlatform>, tracker: Arc<dyn OrderTracker>) -> Self {
        Self {
            inner: Arc::new(Lifecycle {
                platform,
                tracker,
                locks: OrderLocks::new(),
            }),
        }
    }

    /// The tracking store this processor mutates
    pub fn tracker(&self) -> &Arc<dyn OrderTracker> {
        &self.inner.tracker
    }

    /// Handle one verified lifecycle event.
    ///
    /// The lock, the adjustment loop and the state transition run on a
    /// spawned task that completes even if the returned future is dropped.
    ///
    /// # Errors
    ///
    /// Only tracking-store failures are returned; adjustment failures are
    /// recorded per line in the report.
    #[instrument(skip_all, fields(order_id = %order.id, event = %event))]
    pub async fn handle(&self, event: OrderEventKind, order: &Order) -> Result<ProcessingReport> {
        let inner = Arc::clone(&self.inner);
        let order = order.clone();
        let task = tokio::spawn(
            async move { inner.handle(event, &order).await }.in_current_span(),
        );

        task.await
            .map_err(|e| Error::unexpected(format!("Order processing task failed: {e}")))?
    }

    /// Deduct stock for every line item without recording the order.
    #[instrument(skip_all, fields(order_id = %order.id))]
    pub async fn process_untracked(&self, order: &Order) -> ProcessingReport {
        self.inner.process_untracked(order).await
    }
}

/// Shared state behind [`LifecycleProcessor`]
struct Lifecycle {
    platform: Arc<dyn InventoryPlatform>,
    tracker: Arc<dyn OrderTracker>,
    locks: OrderLocks,
}

impl Lifecycle {
    async fn handle(&self, event: OrderEventKind, order: &Order) -> Result<ProcessingReport> {
        let _guard = self.locks.acquire(order.id.as_str()).await;
        let tracked = self.tracker.is_tracked(order.id.as_str()).await?;

        let report = match (event.is_terminal(), tracked) {
            (false, true) => {
                info!("Order already tracked, ignoring duplicate creation");
                ProcessingReport::skipped(order, event, Decision::SkippedDuplicate)
            }
            (false, false) => {
                let lines = self.apply_line_items(order, Direction::Deduct).await;
                self.tracker.mark_tracked(order.id.as_str()).await?;
                ProcessingReport {
                    order_id: order.id.clone(),
                    event,
                    decision: Decision::Deducted,
                    lines,
                }
            }
            (true, false) => {
                info!("Order not tracked, no inventory change");
                ProcessingReport::skipped(order, event, Decision::SkippedUntracked)
            }
            (true, true) => {
                let lines = self.apply_line_items(order, Direction::Return).await;
                self.tracker.unmark(order.id.as_str()).await?;
                let decision = if event == OrderEventKind::Cancelled {
                    Decision::Restored
                } else {
                    Decision::Compensated
                };
                ProcessingReport {
                    order_id: order.id.clone(),
                    event,
                    decision,
                    lines,
                }
            }
        };

        info!(
            decision = ?report.decision,
            applied = report.applied_count(),
            failed = report.failed_count(),
            "Order event processed"
        );
        Ok(report)
    }

    async fn process_untracked(&self, order: &Order) -> ProcessingReport {
        let lines = self.apply_line_items(order, Direction::Deduct).await;
        ProcessingReport {
            order_id: order.id.clone(),
            event: OrderEventKind::Created,
            decision: Decision::DeductedUntracked,
            lines,
        }
    }

    async fn apply_line_items(&self, order: &Order, direction: Direction) -> Vec<LineOutcome> {
        let mut outcomes = Vec::with_capacity(order.line_items.len());
        for item in &order.line_items {
            outcomes.push(self.apply_line_item(item, direction).await);
        }
        outcomes
    }

    async fn apply_line_item(&self, item: &LineItem, direction: Direction) -> LineOutcome {
        let delta = direction.delta(item.quantity);
        let outcome = |status| LineOutcome {
            variant_id: item.variant_id,
            quantity: item.quantity,
            delta,
            status,
        };

        let Some(variant_id) = item.variant_id else {
            warn!(title = ?item.title, "Line item has no variant, skipping");
            return outcome(LineStatus::Skipped {
                reason: "line item has no variant".to_string(),
            });
        };
        if item.quantity == 0 {
            debug!(variant_id, "Line item has zero quantity, skipping");
            return outcome(LineStatus::Skipped {
                reason: "zero quantity".to_string(),
            });
        }

        match self.platform.adjust(variant_id, delta).await {
            Ok(AdjustmentReceipt {
                inventory_item_id,
                location_id,
                ..
            }) => {
                metrics::counter!("inventory_adjustments_total", "outcome" => "applied")
                    .increment(1);
                outcome(LineStatus::Applied {
                    inventory_item_id,
                    location_id,
                })
            }
            Err(err) => {
                warn!(variant_id, delta, error = %err, "Inventory adjustment failed");
                metrics::counter!(
                    "inventory_adjustments_total",
                    "outcome" => "failed",
                    "kind" => err.kind()
                )
                .increment(1);
                outcome(LineStatus::Failed {
                    kind: err.kind().to_string(),
                    error: err.to_string(),
                })
            }
        }
    }
}
