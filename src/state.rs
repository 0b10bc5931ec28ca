//! Shared application state handed to every axum handler

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::handlers::ServiceStats;
use crate::inventory::InventoryPlatform;
use crate::processor::LifecycleProcessor;
use crate::tracking::OrderTracker;
use crate::webhook::SignatureVerifier;

/// Everything a request handler may need
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<ServiceConfig>,
    /// Checks webhook signatures
    pub verifier: SignatureVerifier,
    /// Applies lifecycle events
    pub processor: LifecycleProcessor,
    /// Platform client, also used for connection checks
    pub platform: Arc<dyn InventoryPlatform>,
    /// Counters reported by `/status`
    pub stats: ServiceStats,
}

impl AppState {
    /// Wire up state from configuration and the two injectable collaborators
    pub fn new(
        config: ServiceConfig,
        platform: Arc<dyn InventoryPlatform>,
        tracker: Arc<dyn OrderTracker>,
    ) -> Self {
        Self {
            verifier: SignatureVerifier::new(&config.webhook_secret),
            processor: LifecycleProcessor::new(Arc::clone(&platform), tracker),
            platform,
            config: Arc::new(config),
            stats: ServiceStats::new(),
        }
    }
}
