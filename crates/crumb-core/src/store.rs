//! The `LedgerStore` trait and supporting write types.
//!
//! The trait is implemented by storage backends (e.g. `crumb-store-sqlite`).
//! The ledger engines depend on this abstraction, not on any concrete
//! backend.
//!
//! Records carry a version. A [`WriteBatch`] commits only if every record it
//! writes still has the version the caller read, so a read-validate-write
//! cycle either applies atomically or is reported as a conflict and leaves
//! the store untouched.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  movement::StockMovement,
  record::{DailyRecord, ProductId, RecordKey},
  wastage::WastageRecord,
};

// ─── Write types ─────────────────────────────────────────────────────────────

/// A value together with the store version it was read at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
  pub value:   T,
  /// Starts at 1 on insert and increases by one per committed write.
  pub version: u64,
}

/// One record write guarded by the version the caller read.
#[derive(Debug, Clone)]
pub struct RecordWrite {
  pub record:           DailyRecord,
  /// `0` means the record must not exist yet.
  pub expected_version: u64,
}

impl RecordWrite {
  pub fn insert(record: DailyRecord) -> Self {
    Self { record, expected_version: 0 }
  }

  pub fn update(record: DailyRecord, expected_version: u64) -> Self {
    Self { record, expected_version }
  }
}

/// A set of writes applied all-or-nothing.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
  pub records:        Vec<RecordWrite>,
  pub insert_wastage: Vec<WastageRecord>,
  /// Each must still exist, otherwise the batch conflicts.
  pub delete_wastage: Vec<Uuid>,
}

impl WriteBatch {
  pub fn record(mut self, write: RecordWrite) -> Self {
    self.records.push(write);
    self
  }

  pub fn insert_wastage(mut self, wastage: WastageRecord) -> Self {
    self.insert_wastage.push(wastage);
    self
  }

  pub fn delete_wastage(mut self, wastage_id: Uuid) -> Self {
    self.delete_wastage.push(wastage_id);
    self
  }
}

/// Result of [`LedgerStore::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
  Committed,
  /// Something changed since it was read; nothing was written.
  Conflict,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Crumb ledger store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Daily records ─────────────────────────────────────────────────────

  /// Read one record with its version. Returns `None` if it does not exist.
  fn get_record(
    &self,
    key: RecordKey,
  ) -> impl Future<Output = Result<Option<Versioned<DailyRecord>>, Self::Error>>
  + Send
  + '_;

  /// All records for one day, ordered by product id.
  fn list_records(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Versioned<DailyRecord>>, Self::Error>>
  + Send
  + '_;

  /// Apply `batch` atomically if none of its guards are stale.
  fn commit(
    &self,
    batch: WriteBatch,
  ) -> impl Future<Output = Result<CommitOutcome, Self::Error>> + Send + '_;

  // ── Movements (append-only) ───────────────────────────────────────────

  fn append_movement(
    &self,
    movement: StockMovement,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Movements for one product and day, most recent first.
  fn movements(
    &self,
    product_id: ProductId,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<StockMovement>, Self::Error>> + Send + '_;

  // ── Wastage ───────────────────────────────────────────────────────────

  fn get_wastage(
    &self,
    wastage_id: Uuid,
  ) -> impl Future<Output = Result<Option<WastageRecord>, Self::Error>> + Send + '_;

  /// Wastage recorded on one day, oldest first.
  fn list_wastage(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Vec<WastageRecord>, Self::Error>> + Send + '_;
}
