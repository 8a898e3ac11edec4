//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar days as `YYYY-MM-DD`,
//! money as decimal strings, enums as their snake_case names. UUIDs are
//! stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use crumb_core::{
  DailyRecord, ProductId, RecordStatus,
  movement::{MovementType, StockMovement},
  record::HistoricalEdit,
  store::Versioned,
  wastage::{ReasonCategory, SourceAction, WastageReason, WastageRecord},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn decode_decimal(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

/// Parse a strum-backed enum column.
fn decode_enum<T: FromStr>(kind: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| {
    Error::Core(crumb_core::Error::UnknownValue { kind, value: s.to_owned() })
  })
}

// ─── Daily records ───────────────────────────────────────────────────────────

/// Raw column values of a `daily_records` row.
pub struct RawRecord {
  pub date:               String,
  pub product_id:         String,
  pub carryover_qty:      i64,
  pub new_production_qty: i64,
  pub total_available:    i64,
  pub reserved_qty:       i64,
  pub sold_qty:           i64,
  pub cancelled_qty:      i64,
  pub actual_remaining:   Option<i64>,
  pub variance:           Option<i64>,
  pub variance_remarks:   Option<String>,
  pub status:             String,
  pub historical_edit:    Option<String>,
  pub carried_over:       bool,
  pub carryover_settled:  bool,
  pub updated_at:         String,
  pub version:            i64,
}

/// Column list shared by every `daily_records` SELECT, in [`RawRecord`]
/// field order.
pub const RECORD_COLUMNS: &str = "date, product_id, carryover_qty, \
  new_production_qty, total_available, reserved_qty, sold_qty, cancelled_qty, \
  actual_remaining, variance, variance_remarks, status, historical_edit, \
  carried_over, carryover_settled, updated_at, version";

impl RawRecord {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:               row.get(0)?,
      product_id:         row.get(1)?,
      carryover_qty:      row.get(2)?,
      new_production_qty: row.get(3)?,
      total_available:    row.get(4)?,
      reserved_qty:       row.get(5)?,
      sold_qty:           row.get(6)?,
      cancelled_qty:      row.get(7)?,
      actual_remaining:   row.get(8)?,
      variance:           row.get(9)?,
      variance_remarks:   row.get(10)?,
      status:             row.get(11)?,
      historical_edit:    row.get(12)?,
      carried_over:       row.get(13)?,
      carryover_settled:  row.get(14)?,
      updated_at:         row.get(15)?,
      version:            row.get(16)?,
    })
  }

  /// Encode a record for writing at `version`.
  pub fn encode(record: &DailyRecord, version: u64) -> Result<Self> {
    let historical_edit = record
      .historical_edit
      .as_ref()
      .map(serde_json::to_string)
      .transpose()?;

    Ok(Self {
      date: encode_date(record.date),
      product_id: record.product_id.as_str().to_owned(),
      carryover_qty: record.carryover_qty,
      new_production_qty: record.new_production_qty,
      total_available: record.total_available,
      reserved_qty: record.reserved_qty,
      sold_qty: record.sold_qty,
      cancelled_qty: record.cancelled_qty,
      actual_remaining: record.actual_remaining,
      variance: record.variance,
      variance_remarks: record.variance_remarks.clone(),
      status: record.status.as_ref().to_owned(),
      historical_edit,
      carried_over: record.carried_over,
      carryover_settled: record.carryover_settled,
      updated_at: encode_dt(record.updated_at),
      version: version as i64,
    })
  }

  pub fn into_versioned(self) -> Result<Versioned<DailyRecord>> {
    let status: RecordStatus = decode_enum("record status", &self.status)?;
    let historical_edit: Option<HistoricalEdit> = self
      .historical_edit
      .as_deref()
      .map(serde_json::from_str)
      .transpose()?;

    let record = DailyRecord {
      date: decode_date(&self.date)?,
      product_id: ProductId::new(self.product_id),
      carryover_qty: self.carryover_qty,
      new_production_qty: self.new_production_qty,
      total_available: self.total_available,
      reserved_qty: self.reserved_qty,
      sold_qty: self.sold_qty,
      cancelled_qty: self.cancelled_qty,
      actual_remaining: self.actual_remaining,
      variance: self.variance,
      variance_remarks: self.variance_remarks,
      status,
      historical_edit,
      carried_over: self.carried_over,
      carryover_settled: self.carryover_settled,
      updated_at: decode_dt(&self.updated_at)?,
    };

    Ok(Versioned { value: record, version: self.version as u64 })
  }
}

// ─── Movements ───────────────────────────────────────────────────────────────

pub struct RawMovement {
  pub movement_id:   String,
  pub product_id:    String,
  pub date:          String,
  pub movement_type: String,
  pub qty:           i64,
  pub note:          String,
  pub actor:         String,
  pub reference:     Option<String>,
  pub recorded_at:   String,
}

pub const MOVEMENT_COLUMNS: &str = "movement_id, product_id, date, \
  movement_type, qty, note, actor, reference, recorded_at";

impl RawMovement {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      movement_id:   row.get(0)?,
      product_id:    row.get(1)?,
      date:          row.get(2)?,
      movement_type: row.get(3)?,
      qty:           row.get(4)?,
      note:          row.get(5)?,
      actor:         row.get(6)?,
      reference:     row.get(7)?,
      recorded_at:   row.get(8)?,
    })
  }

  pub fn encode(m: &StockMovement) -> Self {
    Self {
      movement_id:   encode_uuid(m.movement_id),
      product_id:    m.product_id.as_str().to_owned(),
      date:          encode_date(m.date),
      movement_type: m.kind.as_ref().to_owned(),
      qty:           m.qty,
      note:          m.note.clone(),
      actor:         m.actor.clone(),
      reference:     m.reference.clone(),
      recorded_at:   encode_dt(m.recorded_at),
    }
  }

  pub fn into_movement(self) -> Result<StockMovement> {
    let kind: MovementType = decode_enum("movement type", &self.movement_type)?;
    Ok(StockMovement {
      movement_id: decode_uuid(&self.movement_id)?,
      product_id: ProductId::new(self.product_id),
      date: decode_date(&self.date)?,
      kind,
      qty: self.qty,
      note: self.note,
      actor: self.actor,
      reference: self.reference,
      recorded_at: decode_dt(&self.recorded_at)?,
    })
  }
}

// ─── Wastage ─────────────────────────────────────────────────────────────────

pub struct RawWastage {
  pub wastage_id:      String,
  pub product_id:      String,
  pub date:            String,
  pub qty:             i64,
  pub reason:          String,
  pub reason_category: String,
  pub unit_cost:       String,
  pub total_cost:      String,
  pub source_action:   String,
  pub from_production: i64,
  pub actor:           String,
  pub created_at:      String,
}

pub const WASTAGE_COLUMNS: &str = "wastage_id, product_id, date, qty, reason, \
  reason_category, unit_cost, total_cost, source_action, from_production, \
  actor, created_at";

impl RawWastage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      wastage_id:      row.get(0)?,
      product_id:      row.get(1)?,
      date:            row.get(2)?,
      qty:             row.get(3)?,
      reason:          row.get(4)?,
      reason_category: row.get(5)?,
      unit_cost:       row.get(6)?,
      total_cost:      row.get(7)?,
      source_action:   row.get(8)?,
      from_production: row.get(9)?,
      actor:           row.get(10)?,
      created_at:      row.get(11)?,
    })
  }

  pub fn encode(w: &WastageRecord) -> Self {
    Self {
      wastage_id:      encode_uuid(w.wastage_id),
      product_id:      w.product_id.as_str().to_owned(),
      date:            encode_date(w.date),
      qty:             w.qty,
      reason:          w.reason.as_ref().to_owned(),
      reason_category: w.reason_category.as_ref().to_owned(),
      unit_cost:       w.unit_cost.to_string(),
      total_cost:      w.total_cost.to_string(),
      source_action:   w.source_action.as_ref().to_owned(),
      from_production: w.from_production,
      actor:           w.actor.clone(),
      created_at:      encode_dt(w.created_at),
    }
  }

  pub fn into_wastage(self) -> Result<WastageRecord> {
    let reason: WastageReason = decode_enum("wastage reason", &self.reason)?;
    // The stored category is authoritative; it is never re-derived.
    let reason_category: ReasonCategory =
      decode_enum("reason category", &self.reason_category)?;
    let source_action: SourceAction =
      decode_enum("source action", &self.source_action)?;

    Ok(WastageRecord {
      wastage_id: decode_uuid(&self.wastage_id)?,
      product_id: ProductId::new(self.product_id),
      date: decode_date(&self.date)?,
      qty: self.qty,
      reason,
      reason_category,
      unit_cost: decode_decimal(&self.unit_cost)?,
      total_cost: decode_decimal(&self.total_cost)?,
      source_action,
      from_production: self.from_production,
      actor: self.actor,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
