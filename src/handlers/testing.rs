//! Unsigned test routes
//!
//! `POST /test/process-order` deducts stock for a hand-written order without
//! recording it as tracked. It bypasses signature checks and is mounted only
//! when `ENABLE_TEST_ENDPOINTS` is on.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::processor::ProcessingReport;
use crate::state::AppState;
use crate::webhook::events::{LineItem, Order, OrderId};

/// Body of `POST /test/process-order`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestOrderRequest {
    /// Order to attribute the adjustments to
    #[serde(default)]
    pub order_id: Option<OrderId>,
    /// Lines to deduct; may be empty
    #[serde(default)]
    pub line_items: Option<Vec<LineItem>>,
}

impl TestOrderRequest {
    /// Turn the request into an order, rejecting missing fields.
    pub fn into_order(self) -> Result<Order> {
        let order_id = self
            .order_id
            .ok_or_else(|| Error::validation("orderId is required"))?;
        let line_items = self
            .line_items
            .ok_or_else(|| Error::validation("lineItems is required"))?;
        Ok(Order::new(order_id, line_items))
    }
}

/// `POST /test/process-order` response body
#[derive(Debug, Clone, Serialize)]
pub struct TestOrderResponse {
    /// True when at least one line applied or none failed
    pub success: bool,
    /// Per-line outcomes
    pub report: ProcessingReport,
}

/// Deduct stock for an ad-hoc order.
///
/// # Response
/// - `200 OK` with the per-line report
/// - `400` if the body is not JSON or lacks `orderId`/`lineItems`
/// - `500` if every adjustable line item failed
#[instrument(skip_all)]
pub async fn process_order_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TestOrderResponse>> {
    let request: TestOrderRequest = serde_json::from_slice(&body)
        .map_err(|e| Error::validation(format!("Invalid request body: {e}")))?;
    let order = request.into_order()?;

    info!(order_id = %order.id, line_items = order.line_items.len(), "Processing test order");
    let report = state.processor.process_untracked(&order).await;
    state.stats.record_report(&report);

    if report.failed_count() > 0 && report.applied_count() == 0 {
        return Err(Error::unexpected(format!(
            "All {} inventory adjustments for order {} failed",
            report.failed_count(),
            order.id
        )));
    }

    Ok(Json(TestOrderResponse {
        success: true,
        report,
    }))
}

/// Routes: `POST /test/process-order`
pub fn testing_router() -> Router<Arc<AppState>> {
    Router::new().route("/test/process-order", post(process_order_handler))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_into_order() {
        let request: TestOrderRequest = serde_json::from_str(
            r#"{"orderId": 1001, "lineItems": [{"variant_id": 55, "quantity": 2}]}"#,
        )
        .unwrap();
        let order = request.into_order().unwrap();
        assert_eq!(order.id.as_str(), "1001");
        assert_eq!(order.line_items, vec![LineItem::new(55, 2)]);
    }

    #[test]
    fn test_missing_fields_are_validation_errors() {
        let request: TestOrderRequest =
            serde_json::from_str(r#"{"lineItems": []}"#).unwrap();
        assert!(matches!(request.into_order(), Err(Error::Validation(_))));

        let request: TestOrderRequest = serde_json::from_str(r#"{"orderId": "7"}"#).unwrap();
        assert!(matches!(request.into_order(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_empty_line_items_accepted() {
        let request: TestOrderRequest =
            serde_json::from_str(r#"{"orderId": "7", "lineItems": []}"#).unwrap();
        assert!(request.into_order().unwrap().line_items.is_empty());
    }
}
