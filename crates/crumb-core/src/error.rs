//! Error types for `crumb-core`.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  /// Bad input: non-positive quantity, missing identifier, closed record.
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("insufficient stock: requested {requested}, available {available}")]
  InsufficientStock { requested: i64, available: i64 },

  #[error("not found: {0}")]
  RecordNotFound(String),

  #[error("concurrent modification: gave up after {attempts} attempts")]
  ConcurrentModification { attempts: u32 },

  #[error("wastage {wastage_id} recorded on {date} can no longer be reversed")]
  ReversalNotAllowed { wastage_id: Uuid, date: NaiveDate },

  #[error("a variance of {variance} requires remarks")]
  VarianceRemarksRequired { variance: i64 },

  /// A derived quantity went negative or a total drifted from its parts.
  /// This always indicates a bug, never a normal state.
  #[error("ledger invariant violated: {0}")]
  InvariantViolation(String),

  #[error("unknown {kind} value: {value:?}")]
  UnknownValue { kind: &'static str, value: String },
}

impl Error {
  /// Short machine-readable name, used in API error bodies.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Validation(_) => "validation",
      Self::InsufficientStock { .. } => "insufficient_stock",
      Self::RecordNotFound(_) => "record_not_found",
      Self::ConcurrentModification { .. } => "concurrent_modification",
      Self::ReversalNotAllowed { .. } => "reversal_not_allowed",
      Self::VarianceRemarksRequired { .. } => "variance_remarks_required",
      Self::InvariantViolation(_) => "invariant_violation",
      Self::UnknownValue { .. } => "unknown_value",
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
