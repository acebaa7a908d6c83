//! Book stock domain module.
//!
//! This crate contains the stock record and the borrow/return rules,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod stock;
pub mod transition;

pub use stock::{StockRecord, StockStatus, NAME_MAX_LEN, NAME_MIN_LEN};
pub use transition::{transition, StockOutcome, Transition, Trigger};
