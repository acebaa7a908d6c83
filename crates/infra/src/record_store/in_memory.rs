use std::collections::BTreeMap;
use std::sync::RwLock;

use bookstock_core::{ExpectedVersion, Page, Pageable, StockId};
use bookstock_inventory::StockRecord;

use super::r#trait::{RecordStore, StoreError};

/// In-memory record store.
///
/// Intended for tests/dev. A single `RwLock` serializes writers, and every
/// save re-checks the stored version under the write lock, so concurrent
/// borrows against the same id cannot both commit from the same snapshot.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<BTreeMap<StockId, StockRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Backend("lock poisoned".to_string())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn save(&self, mut record: StockRecord, expected: ExpectedVersion) -> Result<StockRecord, StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;

        let current = match record.id {
            Some(id) => records.get(&id).ok_or(StoreError::NotFound(id))?.version,
            None => 0,
        };

        expected
            .check(current)
            .map_err(|e| StoreError::Concurrency(e.to_string()))?;

        let id = match record.id {
            Some(id) => id,
            None => {
                let mut id = StockId::new();
                while records.contains_key(&id) {
                    id = StockId::new();
                }
                id
            }
        };

        record.id = Some(id);
        record.version = current + 1;
        records.insert(id, record.clone());
        Ok(record)
    }

    fn find_by_id(&self, id: StockId) -> Result<Option<StockRecord>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.get(&id).cloned())
    }

    fn find_all(&self, pageable: &Pageable) -> Result<Page<StockRecord>, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(pageable.paginate(records.values().cloned().collect()))
    }

    fn delete_by_id(&self, id: StockId) -> Result<(), StoreError> {
        let mut records = self.records.write().map_err(|_| Self::poisoned())?;
        records.remove(&id);
        Ok(())
    }

    fn count(&self) -> Result<u64, StoreError> {
        let records = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(records.len() as u64)
    }
}
