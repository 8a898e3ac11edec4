//! Stock movements: the append-only audit trail.
//!
//! A movement is an immutable, signed record of one quantity change. Entries
//! are never updated or deleted; a correction is a new, compensating entry.
//! The sign is the effect on sellable stock: production, carryover,
//! unreserve and restore are positive; reserve, sale and wastage negative.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

use crate::record::{ProductId, RecordKey};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MovementType {
  Production,
  Carryover,
  Reserve,
  Sale,
  Unreserve,
  Adjustment,
  Wastage,
  Restore,
  Reconcile,
  HistoricalEdit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
  pub movement_id: Uuid,
  pub product_id:  ProductId,
  pub date:        NaiveDate,
  #[serde(rename = "type")]
  pub kind:        MovementType,
  /// Signed effect on sellable stock.
  pub qty:         i64,
  pub note:        String,
  /// Id of the actor the change is attributed to.
  pub actor:       String,
  /// Order id, wastage id, or similar handle for cross-referencing.
  pub reference:   Option<String>,
  /// Server-assigned; never changes after creation.
  pub recorded_at: DateTime<Utc>,
}

/// Input to the movement log. The id and timestamp are assigned on append.
#[derive(Debug, Clone)]
pub struct NewMovement {
  pub key:       RecordKey,
  pub kind:      MovementType,
  pub qty:       i64,
  pub note:      String,
  pub reference: Option<String>,
}

impl NewMovement {
  pub fn new(key: RecordKey, kind: MovementType, qty: i64) -> Self {
    Self { key, kind, qty, note: String::new(), reference: None }
  }

  pub fn note(mut self, note: impl Into<String>) -> Self {
    self.note = note.into();
    self
  }

  pub fn reference(mut self, reference: impl Into<String>) -> Self {
    self.reference = Some(reference.into());
    self
  }
}
