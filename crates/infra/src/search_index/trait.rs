use std::sync::Arc;

use thiserror::Error;

use bookstock_core::{Page, Pageable, StockId};
use bookstock_inventory::StockRecord;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("invalid search query: {0}")]
    InvalidQuery(String),

    #[error("search index backend failure: {0}")]
    Backend(String),
}

/// Secondary, text-searchable copy of stock records.
///
/// The index is eventually consistent with the record store: writes happen
/// after the store commits and may fail independently, or land out of order.
/// Implementations must keep the highest `version` seen per id, and
/// re-saving a record must bring its indexed copy back in line.
pub trait SearchIndex: Send + Sync {
    /// Index (or re-index) a persisted record. Records without an id are rejected;
    /// a record older than the indexed copy is ignored.
    fn save(&self, record: &StockRecord) -> Result<(), IndexError>;

    /// Remove a record from the index. Deleting an unknown id is a no-op.
    fn delete_by_id(&self, id: StockId) -> Result<(), IndexError>;

    fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<StockRecord>, IndexError>;

    /// Ids of every indexed document, used to prune entries the store no longer holds.
    fn ids(&self) -> Result<Vec<StockId>, IndexError>;
}

impl<I> SearchIndex for Arc<I>
where
    I: SearchIndex + ?Sized,
{
    fn save(&self, record: &StockRecord) -> Result<(), IndexError> {
        (**self).save(record)
    }

    fn delete_by_id(&self, id: StockId) -> Result<(), IndexError> {
        (**self).delete_by_id(id)
    }

    fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<StockRecord>, IndexError> {
        (**self).search(query, pageable)
    }

    fn ids(&self) -> Result<Vec<StockId>, IndexError> {
        (**self).ids()
    }
}
