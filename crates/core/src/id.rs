//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a stock record.
///
/// Assigned by the record store on first save and immutable afterwards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockId(Uuid);

impl StockId {
    /// Create a new identifier.
    ///
    /// Uses UUIDv7 (time-ordered), so ordering by id follows creation order.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for StockId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for StockId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for StockId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("StockId: {e}")))?;
        Ok(Self(uuid))
    }
}
