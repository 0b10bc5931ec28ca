//! HTTP handlers outside the signed webhook routes
//!
//! Health, status and connectivity checks, plus the unsigned test routes
//! used to exercise inventory adjustments by hand.

pub mod status;
pub mod testing;

pub use status::{
    health_handler, status_handler, status_router, test_connection_handler, HealthResponse,
    ServiceStats, StatusResponse,
};
pub use testing::{process_order_handler, testing_router, TestOrderRequest};
