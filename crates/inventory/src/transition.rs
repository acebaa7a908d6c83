//! Borrow/return state machine.
//!
//! Pure functions over `(status, quantity)`: no storage, no IO. The inventory
//! service loads a record, runs [`transition`], and persists the result only
//! when the transition was accepted.

use serde::{Deserialize, Serialize};

use crate::stock::StockStatus;

/// What happened to a copy of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Borrow,
    Return,
}

/// Classification of a borrow/return attempt, as reported to callers.
///
/// `Available` means the attempt was accepted; the resulting stock level is a
/// side effect and may itself be `OUT_OF_STOCK`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockOutcome {
    /// No record with the requested id.
    NotFound,
    /// Accepted.
    Available,
    /// Borrow refused: no copies left.
    OutOfStock,
    /// Refused: the record is administratively blocked.
    OutOfBorrow,
}

impl StockOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, StockOutcome::Available)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StockOutcome::NotFound => "NOT_FOUND",
            StockOutcome::Available => "AVAILABLE",
            StockOutcome::OutOfStock => "OUT_OF_STOCK",
            StockOutcome::OutOfBorrow => "OUT_OF_BORROW",
        }
    }
}

impl core::fmt::Display for StockOutcome {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one trigger against a `(status, quantity)` pair.
///
/// For refused attempts `status` and `quantity` equal the inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: StockStatus,
    pub quantity: i64,
    pub outcome: StockOutcome,
}

impl Transition {
    fn refused(status: StockStatus, quantity: i64, outcome: StockOutcome) -> Self {
        Self {
            status,
            quantity,
            outcome,
        }
    }

    fn accepted(status: StockStatus, quantity: i64) -> Self {
        Self {
            status,
            quantity,
            outcome: StockOutcome::Available,
        }
    }
}

pub fn transition(status: StockStatus, quantity: i64, trigger: Trigger) -> Transition {
    match trigger {
        Trigger::Borrow => borrow(status, quantity),
        Trigger::Return => give_back(status, quantity),
    }
}

fn borrow(status: StockStatus, quantity: i64) -> Transition {
    match status {
        StockStatus::OutOfBorrow => Transition::refused(status, quantity, StockOutcome::OutOfBorrow),
        StockStatus::OutOfStock => Transition::refused(status, quantity, StockOutcome::OutOfStock),
        StockStatus::Available => {
            let quantity = quantity.saturating_sub(1);
            let status = if quantity < 1 {
                StockStatus::OutOfStock
            } else {
                StockStatus::Available
            };
            Transition::accepted(status, quantity)
        }
    }
}

fn give_back(status: StockStatus, quantity: i64) -> Transition {
    if status == StockStatus::OutOfBorrow {
        return Transition::refused(status, quantity, StockOutcome::OutOfBorrow);
    }
    let quantity = quantity.saturating_add(1);
    // Non-positive result keeps the current status, whatever it is.
    let status = if quantity > 0 { StockStatus::Available } else { status };
    Transition::accepted(status, quantity)
}
