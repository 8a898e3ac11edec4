//! Core types and trait definitions for the Crumb daily inventory ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies. It
//! holds the per-day stock record and its arithmetic, the movement and
//! wastage types, the storage abstraction, and the interfaces of the
//! collaborators the ledger consumes (catalog, identity, sales feed, clock).

pub mod error;
pub mod external;
pub mod movement;
pub mod record;
pub mod store;
pub mod wastage;

pub use error::{Error, Result};
pub use record::{DailyRecord, ProductId, RecordKey, RecordStatus, Stock};
