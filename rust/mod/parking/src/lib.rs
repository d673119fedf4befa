pub mod api;
pub mod error;
pub mod fee;
pub mod model;
pub mod pin;
pub mod registry;
pub mod store;
pub mod store_impls;

use std::sync::Arc;

use axum::Router;
use parking_core::Module;

pub use error::SlotError;
pub use registry::{RegistryConfig, SlotRegistry};

/// The parking module: a fixed pool of slots with occupancy and billing.
pub struct ParkingModule {
    registry: Arc<SlotRegistry>,
}

impl ParkingModule {
    pub fn new(registry: SlotRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn registry(&self) -> &Arc<SlotRegistry> {
        &self.registry
    }
}

impl Module for ParkingModule {
    fn name(&self) -> &str {
        "parking"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.registry))
    }
}
