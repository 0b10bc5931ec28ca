//! Order Webhook Handling
//!
//! Receives signed order lifecycle deliveries and hands them to the
//! lifecycle processor.
//!
//! # Architecture
//!
//! ```text
//! Request -> Signature Verify -> Parse Order -> Lifecycle Processor -> 200 "OK"
//!                  |                  |                 |
//!                  v                  v                 v
//!                 401                500         per-line adjustments
//! ```
//!
//! # Security
//!
//! - Webhook secret loaded from the environment, never logged
//! - Constant-time signature comparison
//! - Signature checked on the raw body before any JSON parsing

pub mod events;
pub mod handler;
pub mod signature;

pub use events::{LineItem, Order, OrderEventKind, OrderId};
pub use handler::{dispatch, webhook_router};
pub use signature::{SignatureVerifier, SIGNATURE_HEADER};
