//! Webhook dispatcher
//!
//! One route per lifecycle event. Each route verifies the signature on the
//! raw body, parses the order and hands it to the lifecycle processor. The
//! response is `200 OK` once the event has been dispatched, whatever the
//! individual line-item outcomes were.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::post;
use axum::Router;
use tracing::{debug, instrument, warn};

use crate::error::Result;
use crate::state::AppState;
use crate::webhook::events::{Order, OrderEventKind};
use crate::webhook::signature::SIGNATURE_HEADER;

/// Header naming the webhook topic, e.g. `orders/create`
pub const TOPIC_HEADER: &str = "x-shopify-topic";

/// Header carrying the platform's delivery id
pub const WEBHOOK_ID_HEADER: &str = "x-shopify-webhook-id";

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Verify, parse and process one delivery.
///
/// # Errors
///
/// - `Error::Authentication` for a missing or mismatched signature
/// - `Error::Unexpected` for a body that is not an order
/// - `Error::Tracking` if the tracking store fails
#[instrument(
    skip_all,
    fields(event = %event, webhook_id = tracing::field::Empty)
)]
pub async fn dispatch(
    state: &AppState,
    event: OrderEventKind,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<&'static str> {
    state.stats.record_webhook();

    let webhook_id = header(headers, WEBHOOK_ID_HEADER)
        .map(str::to_owned)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    tracing::Span::current().record("webhook_id", webhook_id.as_str());

    if let Err(err) = state
        .verifier
        .check(body, header(headers, SIGNATURE_HEADER))
    {
        state.stats.record_signature_rejection();
        warn!(error = %err, "Rejected webhook delivery");
        return Err(err);
    }

    if let Some(topic) = header(headers, TOPIC_HEADER) {
        match topic.parse::<OrderEventKind>() {
            Ok(kind) if kind == event => {}
            Ok(_) => warn!(
                topic,
                expected = event.topic(),
                "Webhook topic does not match route"
            ),
            Err(_) => warn!(topic, "Unknown webhook topic"),
        }
    }

    let order = Order::from_bytes(body)?;
    debug!(order_id = %order.id, line_items = order.line_items.len(), "Webhook verified");

    let report = state.processor.handle(event, &order).await?;
    state.stats.record_report(&report);

    Ok("OK")
}

async fn order_created(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str> {
    dispatch(&state, OrderEventKind::Created, &headers, &body).await
}

async fn order_cancelled(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str> {
    dispatch(&state, OrderEventKind::Cancelled, &headers, &body).await
}

async fn order_fulfilled(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str> {
    dispatch(&state, OrderEventKind::Fulfilled, &headers, &body).await
}

/// Routes: `POST /webhooks/order-created`, `/webhooks/order-cancelled`,
/// `/webhooks/order-fulfilled`
pub fn webhook_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/webhooks/order-created", post(order_created))
        .route("/webhooks/order-cancelled", post(order_cancelled))
        .route("/webhooks/order-fulfilled", post(order_fulfilled))
}
