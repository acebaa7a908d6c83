use std::collections::BTreeMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use bookstock_core::{Page, Pageable, StockId};
use bookstock_inventory::StockRecord;

use super::query::{SearchQuery, INDEXED_FIELDS};
use super::r#trait::{IndexError, SearchIndex};

/// Indexed copy of a record: the record itself plus its serialized fields.
#[derive(Debug, Clone)]
struct Document {
    record: StockRecord,
    fields: Vec<(&'static str, String)>,
}

impl Document {
    fn from_record(record: &StockRecord) -> Result<Self, IndexError> {
        let json = serde_json::to_value(record).map_err(|e| IndexError::Backend(e.to_string()))?;
        let JsonValue::Object(map) = json else {
            return Err(IndexError::Backend("record did not serialize to an object".to_string()));
        };

        let fields = INDEXED_FIELDS
            .iter()
            .filter_map(|field| {
                let value = match map.get(*field)? {
                    JsonValue::Null => return None,
                    JsonValue::String(s) => s.to_lowercase(),
                    other => other.to_string().to_lowercase(),
                };
                Some((*field, value))
            })
            .collect();

        Ok(Self {
            record: record.clone(),
            fields,
        })
    }
}

/// In-memory search index.
///
/// Intended for tests/dev. Matching works on the serialized form of each
/// record, not on domain semantics (see [`SearchQuery`]).
#[derive(Debug, Default)]
pub struct InMemorySearchIndex {
    documents: RwLock<BTreeMap<StockId, Document>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents.
    pub fn len(&self) -> Result<usize, IndexError> {
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        Ok(documents.len())
    }

    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }

    /// Indexed copy of one record, if any.
    pub fn get(&self, id: StockId) -> Result<Option<StockRecord>, IndexError> {
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        Ok(documents.get(&id).map(|d| d.record.clone()))
    }

    fn poisoned() -> IndexError {
        IndexError::Backend("lock poisoned".to_string())
    }
}

impl SearchIndex for InMemorySearchIndex {
    fn save(&self, record: &StockRecord) -> Result<(), IndexError> {
        let id = record
            .id
            .ok_or_else(|| IndexError::Backend("cannot index a record without an id".to_string()))?;
        let document = Document::from_record(record)?;

        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        if let Some(indexed) = documents.get(&id) {
            if indexed.record.version > record.version {
                tracing::debug!(
                    stock_id = %id,
                    indexed = indexed.record.version,
                    incoming = record.version,
                    "ignoring out-of-order index write"
                );
                return Ok(());
            }
        }
        documents.insert(id, document);
        Ok(())
    }

    fn delete_by_id(&self, id: StockId) -> Result<(), IndexError> {
        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        documents.remove(&id);
        Ok(())
    }

    fn search(&self, query: &str, pageable: &Pageable) -> Result<Page<StockRecord>, IndexError> {
        let query = SearchQuery::parse(query)?;
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;

        let hits = documents
            .values()
            .filter(|d| query.matches(&d.fields))
            .map(|d| d.record.clone())
            .collect();
        Ok(pageable.paginate(hits))
    }

    fn ids(&self) -> Result<Vec<StockId>, IndexError> {
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        Ok(documents.keys().copied().collect())
    }
}
