use std::sync::Arc;

use thiserror::Error;

use bookstock_core::{ExpectedVersion, Page, Pageable, StockId};
use bookstock_inventory::StockRecord;

/// Record store operation error.
///
/// These are **infrastructure errors** (storage, concurrency) as opposed to
/// domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored version did not match the caller's expectation; nothing was written.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// An update targeted an id the store does not hold.
    #[error("stock {0} not found")]
    NotFound(StockId),

    #[error("record store backend failure: {0}")]
    Backend(String),
}

/// Authoritative, keyed storage for stock records.
///
/// The record store is the system of record and the commit point of every
/// write. It owns id assignment and lost-update prevention: a save with
/// `ExpectedVersion::Exact(v)` must fail with [`StoreError::Concurrency`] (and
/// write nothing) unless the stored record is still at version `v`.
pub trait RecordStore: Send + Sync {
    /// Insert (no id) or update (id present) a record.
    ///
    /// Returns the persisted record with its id and new version.
    fn save(&self, record: StockRecord, expected: ExpectedVersion) -> Result<StockRecord, StoreError>;

    fn find_by_id(&self, id: StockId) -> Result<Option<StockRecord>, StoreError>;

    /// List records in id order.
    fn find_all(&self, pageable: &Pageable) -> Result<Page<StockRecord>, StoreError>;

    /// Remove a record. Deleting an unknown id is a no-op.
    fn delete_by_id(&self, id: StockId) -> Result<(), StoreError>;

    fn count(&self) -> Result<u64, StoreError>;
}

impl<S> RecordStore for Arc<S>
where
    S: RecordStore + ?Sized,
{
    fn save(&self, record: StockRecord, expected: ExpectedVersion) -> Result<StockRecord, StoreError> {
        (**self).save(record, expected)
    }

    fn find_by_id(&self, id: StockId) -> Result<Option<StockRecord>, StoreError> {
        (**self).find_by_id(id)
    }

    fn find_all(&self, pageable: &Pageable) -> Result<Page<StockRecord>, StoreError> {
        (**self).find_all(pageable)
    }

    fn delete_by_id(&self, id: StockId) -> Result<(), StoreError> {
        (**self).delete_by_id(id)
    }

    fn count(&self) -> Result<u64, StoreError> {
        (**self).count()
    }
}
