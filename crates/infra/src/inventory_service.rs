//! Inventory service: the borrow/return state machine wired to storage.
//!
//! Every write follows the same order:
//!
//! ```text
//! load from RecordStore
//!   ↓
//! run the pure transition (bookstock_inventory::transition)
//!   ↓
//! save to RecordStore          <- commit point, version-checked
//!   ↓
//! save to SearchIndex          <- best effort, failures logged + counted
//! ```
//!
//! The record store is authoritative. An index failure after a successful
//! commit never fails the operation; the index is allowed to drift and is
//! repaired by re-saving (see [`InventoryService::reindex_all`]).

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

use bookstock_core::{DomainError, ExpectedVersion, Page, Pageable, StockId};
use bookstock_inventory::{StockOutcome, StockRecord, Trigger};

use crate::record_store::{RecordStore, StoreError};
use crate::search_index::{IndexError, SearchIndex};

/// Page size used when walking the whole store during a reindex.
const REINDEX_BATCH: u64 = 500;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The record failed validation; nothing was written.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Concurrent writers kept invalidating our snapshot; nothing was written.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record store failed; the operation was aborted.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The search index failed while serving a read or listing ids for a reindex.
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Extra load-compute-save attempts after a concurrency conflict.
    pub max_conflict_retries: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: 3,
        }
    }
}

/// Orchestrates stock records across the record store and the search index.
#[derive(Debug)]
pub struct InventoryService<S, I> {
    store: S,
    index: I,
    config: ServiceConfig,
    index_failures: AtomicU64,
}

impl<S, I> InventoryService<S, I> {
    pub fn new(store: S, index: I) -> Self {
        Self::with_config(store, index, ServiceConfig::default())
    }

    pub fn with_config(store: S, index: I, config: ServiceConfig) -> Self {
        Self {
            store,
            index,
            config,
            index_failures: AtomicU64::new(0),
        }
    }

    /// Number of index writes/deletes that failed after a successful commit.
    pub fn index_failures(&self) -> u64 {
        self.index_failures.load(Ordering::Relaxed)
    }
}

impl<S, I> InventoryService<S, I>
where
    S: RecordStore,
    I: SearchIndex,
{
    /// Save a stock record (insert without id, full update with id).
    ///
    /// Administrative saves are last-writer-wins and are the only way to set or
    /// clear `OUT_OF_BORROW`.
    pub fn save(&self, record: StockRecord) -> Result<StockRecord, ServiceError> {
        tracing::debug!(?record, "request to save stock");
        record.validate()?;
        self.persist(record, ExpectedVersion::Any)
    }

    pub fn find_all(&self, pageable: &Pageable) -> Result<Page<StockRecord>, ServiceError> {
        tracing::debug!(page = pageable.page, size = pageable.size, "request to get all stocks");
        Ok(self.store.find_all(pageable)?)
    }

    pub fn find_one(&self, id: StockId) -> Result<Option<StockRecord>, ServiceError> {
        tracing::debug!(stock_id = %id, "request to get stock");
        Ok(self.store.find_by_id(id)?)
    }

    /// Delete from the record store, then from the index. Both steps are idempotent.
    pub fn delete(&self, id: StockId) -> Result<(), ServiceError> {
        tracing::debug!(stock_id = %id, "request to delete stock");
        self.store.delete_by_id(id)?;
        if let Err(e) = self.index.delete_by_id(id) {
            self.record_index_failure(id, "delete", &e);
        }
        Ok(())
    }

    pub fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<StockRecord>, ServiceError> {
        tracing::debug!(query, "request to search for a page of stocks");
        Ok(self.index.search(query, pageable)?)
    }

    /// Lend one copy. See [`bookstock_inventory::transition`] for the rules.
    pub fn borrow_book(&self, id: StockId) -> Result<StockOutcome, ServiceError> {
        tracing::debug!(stock_id = %id, "request to borrow book");
        self.apply(id, Trigger::Borrow)
    }

    /// Take one copy back. Never reports `OUT_OF_STOCK`.
    pub fn return_book(&self, id: StockId) -> Result<StockOutcome, ServiceError> {
        tracing::debug!(stock_id = %id, "request to return book");
        self.apply(id, Trigger::Return)
    }

    /// Re-save every stored record into the search index, then drop indexed
    /// documents whose id the store no longer holds.
    ///
    /// Returns how many records were indexed; failures are counted and skipped.
    pub fn reindex_all(&self) -> Result<u64, ServiceError> {
        tracing::info!("reindexing all stocks");
        let mut indexed = 0u64;
        let mut pageable = Pageable::of(0, REINDEX_BATCH);
        loop {
            let page = self.store.find_all(&pageable)?;
            for record in &page.content {
                match self.index.save(record) {
                    Ok(()) => indexed += 1,
                    Err(e) => {
                        if let Some(id) = record.id {
                            self.record_index_failure(id, "reindex", &e);
                        }
                    }
                }
            }
            if !page.has_next() {
                break;
            }
            pageable.page += 1;
        }

        let mut pruned = 0u64;
        for id in self.index.ids()? {
            if self.store.find_by_id(id)?.is_some() {
                continue;
            }
            match self.index.delete_by_id(id) {
                Ok(()) => pruned += 1,
                Err(e) => self.record_index_failure(id, "prune", &e),
            }
        }
        tracing::info!(indexed, pruned, "reindex finished");
        Ok(indexed)
    }

    fn apply(&self, id: StockId, trigger: Trigger) -> Result<StockOutcome, ServiceError> {
        let mut attempt = 0u32;
        loop {
            let Some(mut record) = self.store.find_by_id(id)? else {
                return Ok(StockOutcome::NotFound);
            };

            let expected = ExpectedVersion::Exact(record.version);
            let outcome = record.apply(trigger);
            if !outcome.is_accepted() {
                return Ok(outcome);
            }

            match self.persist(record, expected) {
                Ok(_) => return Ok(outcome),
                Err(ServiceError::Store(StoreError::Concurrency(msg)))
                    if attempt < self.config.max_conflict_retries =>
                {
                    attempt += 1;
                    tracing::warn!(stock_id = %id, ?trigger, attempt, "concurrent update, retrying: {msg}");
                }
                Err(ServiceError::Store(StoreError::Concurrency(msg))) => {
                    return Err(ServiceError::Conflict(msg));
                }
                // Deleted between load and save.
                Err(ServiceError::Store(StoreError::NotFound(_))) => return Ok(StockOutcome::NotFound),
                Err(e) => return Err(e),
            }
        }
    }

    fn persist(&self, record: StockRecord, expected: ExpectedVersion) -> Result<StockRecord, ServiceError> {
        let saved = self.store.save(record, expected)?;
        if let Err(e) = self.index.save(&saved) {
            if let Some(id) = saved.id {
                self.record_index_failure(id, "save", &e);
            }
        }
        Ok(saved)
    }

    fn record_index_failure(&self, id: StockId, op: &'static str, err: &IndexError) {
        self.index_failures.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(stock_id = %id, op, "search index write failed, index may drift: {err}");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use super::*;
    use bookstock_inventory::StockStatus;

    use crate::record_store::InMemoryRecordStore;
    use crate::search_index::InMemorySearchIndex;

    type TestService = InventoryService<Arc<InMemoryRecordStore>, Arc<InMemorySearchIndex>>;

    fn setup() -> (TestService, Arc<InMemoryRecordStore>, Arc<InMemorySearchIndex>) {
        let store = Arc::new(InMemoryRecordStore::new());
        let index = Arc::new(InMemorySearchIndex::new());
        (InventoryService::new(store.clone(), index.clone()), store, index)
    }

    fn seed(service: &TestService, quantity: i64, status: StockStatus) -> StockId {
        service
            .save(StockRecord::named("Dune", quantity, status))
            .unwrap()
            .id
            .unwrap()
    }

    fn state(store: &InMemoryRecordStore, id: StockId) -> (i64, StockStatus) {
        let rec = store.find_by_id(id).unwrap().unwrap();
        (rec.quantity, rec.status)
    }

    /// Index that can be switched into failure mode.
    #[derive(Debug, Default)]
    struct FlakyIndex {
        inner: InMemorySearchIndex,
        failing: AtomicBool,
    }

    impl FlakyIndex {
        fn fail(&self, on: bool) {
            self.failing.store(on, Ordering::SeqCst);
        }

        fn check(&self) -> Result<(), IndexError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(IndexError::Backend("index unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl SearchIndex for FlakyIndex {
        fn save(&self, record: &StockRecord) -> Result<(), IndexError> {
            self.check()?;
            self.inner.save(record)
        }

        fn delete_by_id(&self, id: StockId) -> Result<(), IndexError> {
            self.check()?;
            self.inner.delete_by_id(id)
        }

        fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<StockRecord>, IndexError> {
            self.check()?;
            self.inner.search(query, pageable)
        }

        fn ids(&self) -> Result<Vec<StockId>, IndexError> {
            self.check()?;
            self.inner.ids()
        }
    }

    /// Store whose writes always fail.
    #[derive(Debug, Default)]
    struct BrokenWrites {
        inner: InMemoryRecordStore,
        broken: AtomicBool,
    }

    impl RecordStore for BrokenWrites {
        fn save(&self, record: StockRecord, expected: ExpectedVersion) -> Result<StockRecord, StoreError> {
            if self.broken.load(Ordering::SeqCst) {
                return Err(StoreError::Backend("disk full".to_string()));
            }
            self.inner.save(record, expected)
        }

        fn find_by_id(&self, id: StockId) -> Result<Option<StockRecord>, StoreError> {
            self.inner.find_by_id(id)
        }

        fn find_all(&self, pageable: &Pageable) -> Result<Page<StockRecord>, StoreError> {
            self.inner.find_all(pageable)
        }

        fn delete_by_id(&self, id: StockId) -> Result<(), StoreError> {
            self.inner.delete_by_id(id)
        }

        fn count(&self) -> Result<u64, StoreError> {
            self.inner.count()
        }
    }

    /// Store that reports a conflict on the first `conflicts` versioned saves.
    #[derive(Debug, Default)]
    struct ContendedStore {
        inner: InMemoryRecordStore,
        conflicts: AtomicU64,
    }

    impl RecordStore for ContendedStore {
        fn save(&self, record: StockRecord, expected: ExpectedVersion) -> Result<StockRecord, StoreError> {
            if matches!(expected, ExpectedVersion::Exact(_))
                && self
                    .conflicts
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok()
            {
                return Err(StoreError::Concurrency("simulated".to_string()));
            }
            self.inner.save(record, expected)
        }

        fn find_by_id(&self, id: StockId) -> Result<Option<StockRecord>, StoreError> {
            self.inner.find_by_id(id)
        }

        fn find_all(&self, pageable: &Pageable) -> Result<Page<StockRecord>, StoreError> {
            self.inner.find_all(pageable)
        }

        fn delete_by_id(&self, id: StockId) -> Result<(), StoreError> {
            self.inner.delete_by_id(id)
        }

        fn count(&self) -> Result<u64, StoreError> {
            self.inner.count()
        }
    }

    #[test]
    fn save_persists_to_store_and_index() {
        let (service, store, index) = setup();
        let saved = service.save(StockRecord::named("Dune", 2, StockStatus::Available)).unwrap();
        let id = saved.id.unwrap();

        assert_eq!(store.find_by_id(id).unwrap(), Some(saved.clone()));
        assert_eq!(index.get(id).unwrap(), Some(saved));
    }

    #[test]
    fn save_rejects_invalid_name_without_writing() {
        let (service, store, index) = setup();
        let err = service.save(StockRecord::named("D", 2, StockStatus::Available)).unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.count().unwrap(), 0);
        assert!(index.is_empty().unwrap());
    }

    #[test]
    fn full_save_can_set_and_clear_out_of_borrow() {
        let (service, store, _) = setup();
        let mut rec = service.save(StockRecord::named("Dune", 2, StockStatus::Available)).unwrap();
        let id = rec.id.unwrap();

        rec.status = StockStatus::OutOfBorrow;
        rec = service.save(rec).unwrap();
        assert_eq!(state(&store, id), (2, StockStatus::OutOfBorrow));

        rec.status = StockStatus::Available;
        service.save(rec).unwrap();
        assert_eq!(state(&store, id), (2, StockStatus::Available));
    }

    #[test]
    fn update_of_unknown_id_surfaces_store_not_found() {
        let (service, _, _) = setup();
        let mut rec = StockRecord::named("Dune", 2, StockStatus::Available);
        rec.id = Some(StockId::new());

        let err = service.save(rec).unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::NotFound(_))));
    }

    #[test]
    fn borrow_with_copies_left() {
        let (service, store, _) = setup();
        let id = seed(&service, 2, StockStatus::Available);

        assert_eq!(service.borrow_book(id).unwrap(), StockOutcome::Available);
        assert_eq!(state(&store, id), (1, StockStatus::Available));
    }

    #[test]
    fn borrow_last_copy() {
        let (service, store, _) = setup();
        let id = seed(&service, 1, StockStatus::Available);

        assert_eq!(service.borrow_book(id).unwrap(), StockOutcome::Available);
        assert_eq!(state(&store, id), (0, StockStatus::OutOfStock));
    }

    #[test]
    fn borrow_out_of_stock_is_refused_and_unchanged() {
        let (service, store, _) = setup();
        let id = seed(&service, 0, StockStatus::OutOfStock);
        let before = store.find_by_id(id).unwrap();

        assert_eq!(service.borrow_book(id).unwrap(), StockOutcome::OutOfStock);
        assert_eq!(store.find_by_id(id).unwrap(), before);
    }

    #[test]
    fn return_first_copy() {
        let (service, store, _) = setup();
        let id = seed(&service, 0, StockStatus::OutOfStock);

        assert_eq!(service.return_book(id).unwrap(), StockOutcome::Available);
        assert_eq!(state(&store, id), (1, StockStatus::Available));
    }

    #[test]
    fn return_after_negative_stock_stays_out_of_stock() {
        let (service, store, _) = setup();
        let id = seed(&service, -1, StockStatus::OutOfStock);

        assert_eq!(service.return_book(id).unwrap(), StockOutcome::Available);
        assert_eq!(state(&store, id), (0, StockStatus::OutOfStock));
    }

    #[test]
    fn out_of_borrow_refuses_borrow_and_return() {
        let (service, store, _) = setup();
        let id = seed(&service, 5, StockStatus::OutOfBorrow);
        let before = store.find_by_id(id).unwrap();

        assert_eq!(service.borrow_book(id).unwrap(), StockOutcome::OutOfBorrow);
        assert_eq!(service.return_book(id).unwrap(), StockOutcome::OutOfBorrow);
        assert_eq!(store.find_by_id(id).unwrap(), before);
    }

    #[test]
    fn unknown_id_is_not_found() {
        let (service, _, _) = setup();
        assert_eq!(service.borrow_book(StockId::new()).unwrap(), StockOutcome::NotFound);
        assert_eq!(service.return_book(StockId::new()).unwrap(), StockOutcome::NotFound);
    }

    #[test]
    fn borrow_then_return_restores_last_copy() {
        let (service, store, _) = setup();
        let id = seed(&service, 1, StockStatus::Available);

        service.borrow_book(id).unwrap();
        assert_eq!(state(&store, id), (0, StockStatus::OutOfStock));
        service.return_book(id).unwrap();
        assert_eq!(state(&store, id), (1, StockStatus::Available));
    }

    #[test]
    fn transitions_are_mirrored_into_the_index() {
        let (service, store, index) = setup();
        let id = seed(&service, 1, StockStatus::Available);

        service.borrow_book(id).unwrap();
        assert_eq!(index.get(id).unwrap(), store.find_by_id(id).unwrap());
        let hits = service.search("status:out_of_stock", &Pageable::default()).unwrap();
        assert_eq!(hits.total_elements, 1);
    }

    #[test]
    fn index_failure_does_not_fail_the_write() {
        let store = Arc::new(InMemoryRecordStore::new());
        let index = Arc::new(FlakyIndex::default());
        let service = InventoryService::new(store.clone(), index.clone());
        let id = service
            .save(StockRecord::named("Dune", 2, StockStatus::Available))
            .unwrap()
            .id
            .unwrap();

        index.fail(true);
        assert_eq!(service.borrow_book(id).unwrap(), StockOutcome::Available);
        assert_eq!(state(&store, id), (1, StockStatus::Available));
        assert_eq!(service.index_failures(), 1);

        // The index still holds the stale copy until a re-save.
        index.fail(false);
        assert_eq!(index.inner.get(id).unwrap().unwrap().quantity, 2);
        assert_eq!(service.reindex_all().unwrap(), 1);
        assert_eq!(index.inner.get(id).unwrap().unwrap().quantity, 1);
    }

    #[test]
    fn delete_removes_from_both_and_tolerates_index_failure() {
        let store = Arc::new(InMemoryRecordStore::new());
        let index = Arc::new(FlakyIndex::default());
        let service = InventoryService::new(store.clone(), index.clone());
        let keep = seed_flaky(&service);
        let gone = seed_flaky(&service);

        service.delete(keep).unwrap();
        assert_eq!(store.find_by_id(keep).unwrap(), None);
        assert_eq!(index.inner.get(keep).unwrap(), None);

        index.fail(true);
        service.delete(gone).unwrap();
        assert_eq!(store.find_by_id(gone).unwrap(), None);
        assert!(index.inner.get(gone).unwrap().is_some());
        assert_eq!(service.index_failures(), 1);

        // Deleting again is a no-op.
        index.fail(false);
        service.delete(gone).unwrap();
        service.delete(gone).unwrap();
        assert_eq!(index.inner.get(gone).unwrap(), None);
    }

    #[test]
    fn reindex_prunes_documents_deleted_while_the_index_was_down() {
        let store = Arc::new(InMemoryRecordStore::new());
        let index = Arc::new(FlakyIndex::default());
        let service = InventoryService::new(store.clone(), index.clone());
        let keep = seed_flaky(&service);
        let gone = seed_flaky(&service);

        index.fail(true);
        service.delete(gone).unwrap();
        assert_eq!(service.index_failures(), 1);
        index.fail(false);
        assert_eq!(service.search("dune", &Pageable::default()).unwrap().total_elements, 2);

        assert_eq!(service.reindex_all().unwrap(), 1);
        let hits = service.search("dune", &Pageable::default()).unwrap();
        assert_eq!(hits.content.iter().map(|r| r.id).collect::<Vec<_>>(), vec![Some(keep)]);
        assert_eq!(index.inner.get(gone).unwrap(), None);
    }

    #[test]
    fn reindex_fails_when_index_cannot_list_ids() {
        let index = Arc::new(FlakyIndex::default());
        let service = InventoryService::new(InMemoryRecordStore::new(), index.clone());
        index.fail(true);

        let err = service.reindex_all().unwrap_err();
        assert!(matches!(err, ServiceError::Index(IndexError::Backend(_))));
    }

    fn seed_flaky(service: &InventoryService<Arc<InMemoryRecordStore>, Arc<FlakyIndex>>) -> StockId {
        service
            .save(StockRecord::named("Dune", 1, StockStatus::Available))
            .unwrap()
            .id
            .unwrap()
    }

    #[test]
    fn search_failure_is_an_error() {
        let index = Arc::new(FlakyIndex::default());
        let service = InventoryService::new(InMemoryRecordStore::new(), index.clone());
        index.fail(true);

        let err = service.search("dune", &Pageable::default()).unwrap_err();
        assert!(matches!(err, ServiceError::Index(IndexError::Backend(_))));
    }

    #[test]
    fn store_failure_aborts_without_mutation() {
        let store = Arc::new(BrokenWrites::default());
        let index = Arc::new(InMemorySearchIndex::new());
        let service = InventoryService::new(store.clone(), index.clone());
        let id = service
            .save(StockRecord::named("Dune", 2, StockStatus::Available))
            .unwrap()
            .id
            .unwrap();

        store.broken.store(true, Ordering::SeqCst);
        let err = service.borrow_book(id).unwrap_err();
        assert!(matches!(err, ServiceError::Store(StoreError::Backend(_))));

        let rec = store.find_by_id(id).unwrap().unwrap();
        assert_eq!((rec.quantity, rec.status), (2, StockStatus::Available));
        assert_eq!(index.get(id).unwrap().unwrap().quantity, 2);
    }

    #[test]
    fn conflicts_are_retried() {
        let store = Arc::new(ContendedStore::default());
        let service = InventoryService::new(store.clone(), InMemorySearchIndex::new());
        let id = service
            .save(StockRecord::named("Dune", 2, StockStatus::Available))
            .unwrap()
            .id
            .unwrap();

        store.conflicts.store(2, Ordering::SeqCst);
        assert_eq!(service.borrow_book(id).unwrap(), StockOutcome::Available);
        assert_eq!(store.find_by_id(id).unwrap().unwrap().quantity, 1);
    }

    #[test]
    fn conflicts_beyond_retry_budget_fail_without_mutation() {
        let store = Arc::new(ContendedStore::default());
        let service = InventoryService::with_config(
            store.clone(),
            InMemorySearchIndex::new(),
            ServiceConfig {
                max_conflict_retries: 1,
            },
        );
        let id = service
            .save(StockRecord::named("Dune", 2, StockStatus::Available))
            .unwrap()
            .id
            .unwrap();

        store.conflicts.store(2, Ordering::SeqCst);
        let err = service.return_book(id).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(store.find_by_id(id).unwrap().unwrap().quantity, 2);
    }

    #[test]
    fn reindex_walks_every_page() {
        let (service, store, index) = setup();
        for i in 0..(REINDEX_BATCH + 3) {
            store
                .save(
                    StockRecord::named(format!("Volume {i}"), 1, StockStatus::Available),
                    ExpectedVersion::Any,
                )
                .unwrap();
        }
        assert!(index.is_empty().unwrap());

        assert_eq!(service.reindex_all().unwrap(), REINDEX_BATCH + 3);
        assert_eq!(index.len().unwrap() as u64, REINDEX_BATCH + 3);
    }
}
