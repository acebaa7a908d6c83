//! Record store boundary.
//!
//! The authoritative, versioned storage for stock records. The inventory
//! service treats a successful `save` here as the commit point of a write.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryRecordStore;
pub use r#trait::{RecordStore, StoreError};
