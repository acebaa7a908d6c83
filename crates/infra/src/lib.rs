//! Infrastructure layer: record store, search index, and the inventory
//! service that keeps them consistent.

pub mod inventory_service;
pub mod record_store;
pub mod search_index;


pub use inventory_service::{InventoryService, ServiceConfig, ServiceError};
pub use record_store::{InMemoryRecordStore, RecordStore, StoreError};
pub use search_index::{InMemorySearchIndex, IndexError, SearchIndex};
