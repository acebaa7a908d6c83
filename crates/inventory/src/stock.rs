use serde::{Deserialize, Serialize};

use bookstock_core::{DomainError, StockId};

use crate::transition::{self, StockOutcome, Transition, Trigger};

/// Allowed length (in characters) of a stock name, when one is set.
pub const NAME_MIN_LEN: usize = 2;
pub const NAME_MAX_LEN: usize = 50;

/// Availability status of a stock record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockStatus {
    /// Copies can be borrowed.
    Available,
    /// No copies left; borrowing is refused until a return brings quantity above zero.
    OutOfStock,
    /// Administratively blocked. Only a full save may set or clear this.
    OutOfBorrow,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Available => "AVAILABLE",
            StockStatus::OutOfStock => "OUT_OF_STOCK",
            StockStatus::OutOfBorrow => "OUT_OF_BORROW",
        }
    }
}

impl core::fmt::Display for StockStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stock of one book: how many copies are on the shelf and whether they can be lent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    /// `None` until the record store persists the record.
    #[serde(default)]
    pub id: Option<StockId>,
    #[serde(default)]
    pub name: Option<String>,
    /// Copies available to borrow. May be zero or negative; never clamped.
    pub quantity: i64,
    pub status: StockStatus,
    /// Optimistic concurrency token, managed by the record store.
    #[serde(default)]
    pub version: u64,
}

impl StockRecord {
    /// A not-yet-persisted record.
    pub fn new(name: Option<String>, quantity: i64, status: StockStatus) -> Self {
        Self {
            id: None,
            name,
            quantity,
            status,
            version: 0,
        }
    }

    pub fn named(name: impl Into<String>, quantity: i64, status: StockStatus) -> Self {
        Self::new(Some(name.into()), quantity, status)
    }

    /// Check field constraints that hold regardless of how the record is written.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            let len = name.chars().count();
            if !(NAME_MIN_LEN..=NAME_MAX_LEN).contains(&len) {
                return Err(DomainError::validation(format!(
                    "name must be between {NAME_MIN_LEN} and {NAME_MAX_LEN} characters (got {len})"
                )));
            }
        }
        Ok(())
    }

    /// Run the borrow/return state machine against this record.
    ///
    /// Accepted transitions update `quantity` and `status` in place; refused ones
    /// leave the record untouched. Returns the classification of the attempt.
    pub fn apply(&mut self, trigger: Trigger) -> StockOutcome {
        let Transition {
            status,
            quantity,
            outcome,
        } = transition::transition(self.status, self.quantity, trigger);
        if outcome.is_accepted() {
            self.status = status;
            self.quantity = quantity;
        }
        outcome
    }
}
