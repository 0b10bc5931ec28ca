//! Status and health check handlers.
//!
//! - `/health` - Simple liveness check for load balancers
//! - `/status` - Uptime, tracked order count and processing counters
//! - `/test-connection` - Verifies platform credentials by fetching shop info
//!
//! # Example Response
//!
//! ```json
//! {
//!   "status": "healthy",
//!   "service": "order-inventory-sync",
//!   "timestamp": "2026-01-01T12:00:00+00:00"
//! }
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::inventory::ShopInfo;
use crate::processor::ProcessingReport;
use crate::state::AppState;

/// Server version from Cargo.toml
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Service name reported by `/health`
pub const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Response Types
// ============================================================================

/// Health check response for liveness checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (always "healthy" if responding)
    pub status: String,
    /// Service name
    pub service: String,
    /// RFC 3339 timestamp of the check
    pub timestamp: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Detailed service status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Crate version
    pub version: String,
    /// Service name
    pub name: String,
    /// Always "running" when answering
    pub status: String,
    /// Seconds since startup
    pub uptime_seconds: u64,
    /// Orders deducted and awaiting cancellation or fulfillment
    pub tracked_orders: usize,
    /// Webhook deliveries received, valid or not
    pub webhooks_received: u64,
    /// Deliveries rejected for a missing or bad signature
    pub signature_rejections: u64,
    /// Line-item adjustments the platform accepted
    pub adjustments_applied: u64,
    /// Line-item adjustments that failed
    pub adjustment_failures: u64,
    /// RFC 3339 timestamp of the response
    pub timestamp: String,
}

/// `/test-connection` success body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionResponse {
    /// Always true; failures answer with an error body
    pub success: bool,
    /// Shop the access token belongs to
    pub shop: ShopInfo,
}

// ============================================================================
// Service Stats
// ============================================================================

/// Process-wide counters for the status endpoint.
///
/// All counters are atomics and can be updated from concurrent handlers.
#[derive(Debug)]
pub struct ServiceStats {
    start_time: Instant,
    webhooks_received: AtomicU64,
    signature_rejections: AtomicU64,
    adjustments_applied: AtomicU64,
    adjustment_failures: AtomicU64,
}

impl ServiceStats {
    /// Create zeroed counters starting now.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            webhooks_received: AtomicU64::new(0),
            signature_rejections: AtomicU64::new(0),
            adjustments_applied: AtomicU64::new(0),
            adjustment_failures: AtomicU64::new(0),
        }
    }

    /// Get the service uptime in seconds.
    #[inline]
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Count an inbound webhook delivery.
    #[inline]
    pub fn record_webhook(&self) -> u64 {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Count a delivery rejected for its signature.
    #[inline]
    pub fn record_signature_rejection(&self) -> u64 {
        self.signature_rejections.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Add a report's per-line outcomes to the adjustment counters.
    pub fn record_report(&self, report: &ProcessingReport) {
        self.adjustments_applied
            .fetch_add(report.applied_count() as u64, Ordering::Relaxed);
        self.adjustment_failures
            .fetch_add(report.failed_count() as u64, Ordering::Relaxed);
    }

    /// Webhook deliveries received so far.
    #[inline]
    pub fn webhooks_received(&self) -> u64 {
        self.webhooks_received.load(Ordering::Relaxed)
    }

    /// Deliveries rejected for their signature.
    #[inline]
    pub fn signature_rejections(&self) -> u64 {
        self.signature_rejections.load(Ordering::Relaxed)
    }

    /// Line-item adjustments applied so far.
    #[inline]
    pub fn adjustments_applied(&self) -> u64 {
        self.adjustments_applied.load(Ordering::Relaxed)
    }

    /// Line-item adjustments that failed so far.
    #[inline]
    pub fn adjustment_failures(&self) -> u64 {
        self.adjustment_failures.load(Ordering::Relaxed)
    }
}

impl Default for ServiceStats {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// HTTP Handlers
// ============================================================================

/// Health check endpoint handler.
///
/// # Route
/// `GET /health`
///
/// # Response
/// - `200 OK` - Always, if the server is running
#[instrument(skip_all)]
pub async fn health_handler() -> impl IntoResponse {
    debug!("Health check requested");
    (StatusCode::OK, Json(HealthResponse::default()))
}

/// Detailed status endpoint handler.
///
/// # Route
/// `GET /status`
///
/// # Response
/// - `200 OK` with JSON [`StatusResponse`]
/// - `500` if the tracking store cannot be read
#[instrument(skip_all)]
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>> {
    debug!("Status check requested");

    let tracked_orders = state.processor.tracker().len().await?;
    let stats = &state.stats;

    Ok(Json(StatusResponse {
        version: SERVER_VERSION.to_string(),
        name: SERVICE_NAME.to_string(),
        status: "running".to_string(),
        uptime_seconds: stats.uptime_seconds(),
        tracked_orders,
        webhooks_received: stats.webhooks_received(),
        signature_rejections: stats.signature_rejections(),
        adjustments_applied: stats.adjustments_applied(),
        adjustment_failures: stats.adjustment_failures(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Platform connectivity check.
///
/// # Route
/// `GET /test-connection`
///
/// # Response
/// - `200 OK` with shop name and domain
/// - `500` with `{"error": ...}` if the shop lookup fails
#[instrument(skip_all)]
pub async fn test_connection_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ConnectionResponse>> {
    let shop = state.platform.shop_info().await?;
    info!(shop = %shop.name, domain = %shop.domain, "Platform connection verified");
    Ok(Json(ConnectionResponse {
        success: true,
        shop,
    }))
}

// ============================================================================
// Router Setup
// ============================================================================

/// Routes: `GET /health`, `GET /status`, `GET /test-connection`
pub fn status_router() -> axum::Router<Arc<AppState>> {
    use axum::routing::get;

    axum::Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/test-connection", get(test_connection_handler))
}

// ============================================================================
// Tests
// ============================================================================
