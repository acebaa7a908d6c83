//! `bookstock-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod page;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::StockId;
pub use page::{Page, Pageable};
pub use version::ExpectedVersion;
