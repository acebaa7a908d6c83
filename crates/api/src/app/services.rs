//! Service wiring: which record store and search index the API runs on.

use std::sync::Arc;

use bookstock_core::Pageable;
use bookstock_infra::{InMemoryRecordStore, InMemorySearchIndex, InventoryService, ServiceConfig};

pub type AppInventoryService = InventoryService<Arc<InMemoryRecordStore>, Arc<InMemorySearchIndex>>;

/// Shared application services, handed to handlers through an `Extension`.
#[derive(Debug)]
pub struct AppServices {
    inventory: AppInventoryService,
    default_page_size: u64,
}

impl AppServices {
    pub fn new(inventory: AppInventoryService, default_page_size: u64) -> Self {
        Self {
            inventory,
            default_page_size,
        }
    }

    pub fn inventory(&self) -> &AppInventoryService {
        &self.inventory
    }

    /// Page request from optional query parameters, using the configured default size.
    pub fn pageable(&self, page: Option<u64>, size: Option<u64>) -> Pageable {
        Pageable::new(page, size, self.default_page_size)
    }
}

/// In-memory wiring (dev/test): record store + search index + service.
pub fn build_in_memory_services(service_config: ServiceConfig, default_page_size: u64) -> AppServices {
    let store = Arc::new(InMemoryRecordStore::new());
    let index = Arc::new(InMemorySearchIndex::new());
    let inventory = InventoryService::with_config(store, index, service_config);
    AppServices::new(inventory, default_page_size)
}
