//! The daily inventory record: one per `(date, product)`.
//!
//! Every quantity-changing operation on a record is expressed here as a pure
//! method that validates its preconditions and mutates the record in place.
//! Storage, retries and audit logging live in higher layers; those layers
//! call [`DailyRecord::stock`] after each mutation to assert the invariants
//! before anything is committed.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

// ─── Keys ────────────────────────────────────────────────────────────────────

/// Catalog identifier of a finished product (e.g. `"pandesal"`).
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  /// Reject blank identifiers before they reach the store.
  pub fn validate(&self) -> Result<()> {
    if self.0.trim().is_empty() {
      return Err(Error::Validation("product id must not be empty".into()));
    }
    Ok(())
  }
}

impl fmt::Display for ProductId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for ProductId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

/// Composite primary key of a [`DailyRecord`].
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct RecordKey {
  pub date:       NaiveDate,
  pub product_id: ProductId,
}

impl RecordKey {
  pub fn new(date: NaiveDate, product_id: ProductId) -> Self {
    Self { date, product_id }
  }
}

impl fmt::Display for RecordKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} on {}", self.product_id, self.date)
  }
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordStatus {
  #[default]
  Open,
  /// An end-of-day count has been recorded and awaits approval.
  PendingApproval,
  Closed,
}

/// Audit stamp left on a record rewritten after its day had passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalEdit {
  pub reason:    String,
  pub actor:     String,
  pub edited_at: DateTime<Utc>,
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRecord {
  pub date:               NaiveDate,
  pub product_id:         ProductId,
  pub carryover_qty:      i64,
  pub new_production_qty: i64,
  /// Always `carryover_qty + new_production_qty`.
  pub total_available:    i64,
  pub reserved_qty:       i64,
  pub sold_qty:           i64,
  pub cancelled_qty:      i64,
  pub actual_remaining:   Option<i64>,
  pub variance:           Option<i64>,
  pub variance_remarks:   Option<String>,
  pub status:             RecordStatus,
  pub historical_edit:    Option<HistoricalEdit>,
  /// This record has received the previous day's leftover.
  pub carried_over:       bool,
  /// This day's leftover has been carried forward or disposed.
  pub carryover_settled:  bool,
  pub updated_at:         DateTime<Utc>,
}

/// Quantities derived from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
  /// Available to promise to a new buyer.
  pub sellable:           i64,
  /// What a physical count should find at the end of the day.
  pub expected_remaining: i64,
}

/// Field overrides for a historical edit. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPatch {
  pub carryover_qty:      Option<i64>,
  pub new_production_qty: Option<i64>,
  pub reserved_qty:       Option<i64>,
  pub sold_qty:           Option<i64>,
  pub cancelled_qty:      Option<i64>,
  pub actual_remaining:   Option<i64>,
  pub variance_remarks:   Option<String>,
  pub status:             Option<RecordStatus>,
}

impl RecordPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

fn positive(qty: i64) -> Result<()> {
  if qty <= 0 {
    return Err(Error::Validation(format!(
      "quantity must be positive, got {qty}"
    )));
  }
  Ok(())
}

/// Quantities come straight from requests, so sums are checked.
fn checked_sum(a: i64, b: i64, what: &str) -> Result<i64> {
  a.checked_add(b)
    .ok_or_else(|| Error::Validation(format!("{what} would overflow")))
}

impl DailyRecord {
  /// A zeroed, open record.
  pub fn new(key: RecordKey, now: DateTime<Utc>) -> Self {
    Self {
      date:               key.date,
      product_id:         key.product_id,
      carryover_qty:      0,
      new_production_qty: 0,
      total_available:    0,
      reserved_qty:       0,
      sold_qty:           0,
      cancelled_qty:      0,
      actual_remaining:   None,
      variance:           None,
      variance_remarks:   None,
      status:             RecordStatus::Open,
      historical_edit:    None,
      carried_over:       false,
      carryover_settled:  false,
      updated_at:         now,
    }
  }

  pub fn key(&self) -> RecordKey {
    RecordKey::new(self.date, self.product_id.clone())
  }

  /// Derive sellable and expected-remaining quantities, failing if any
  /// invariant does not hold. Negative values are never clamped.
  pub fn stock(&self) -> Result<Stock> {
    let parts = [
      ("carryover_qty", self.carryover_qty),
      ("new_production_qty", self.new_production_qty),
      ("reserved_qty", self.reserved_qty),
      ("sold_qty", self.sold_qty),
      ("cancelled_qty", self.cancelled_qty),
    ];
    if let Some((name, value)) = parts.iter().find(|(_, v)| *v < 0) {
      return Err(Error::InvariantViolation(format!(
        "{name} is negative ({value}) for {}",
        self.key()
      )));
    }

    if self.carryover_qty.checked_add(self.new_production_qty)
      != Some(self.total_available)
    {
      return Err(Error::InvariantViolation(format!(
        "total_available {} != carryover {} + production {} for {}",
        self.total_available,
        self.carryover_qty,
        self.new_production_qty,
        self.key()
      )));
    }

    if self.cancelled_qty > self.sold_qty {
      return Err(Error::InvariantViolation(format!(
        "cancelled {} exceeds sold {} for {}",
        self.cancelled_qty,
        self.sold_qty,
        self.key()
      )));
    }

    let expected_remaining =
      self.total_available - (self.sold_qty - self.cancelled_qty);
    if expected_remaining < 0 {
      return Err(Error::InvariantViolation(format!(
        "expected remaining is negative ({expected_remaining}) for {}",
        self.key()
      )));
    }

    let sellable = expected_remaining - self.reserved_qty;
    if sellable < 0 {
      return Err(Error::InvariantViolation(format!(
        "sellable is negative ({sellable}) for {}",
        self.key()
      )));
    }

    Ok(Stock { sellable, expected_remaining })
  }

  pub fn is_closed(&self) -> bool { self.status == RecordStatus::Closed }

  /// Ordinary same-day mutations are refused once the day is closed.
  pub fn ensure_open(&self) -> Result<()> {
    if self.is_closed() {
      return Err(Error::Validation(format!("{} is closed", self.key())));
    }
    Ok(())
  }

  fn recompute_total(&mut self) -> Result<()> {
    self.total_available =
      checked_sum(self.carryover_qty, self.new_production_qty, "total_available")?;
    Ok(())
  }

  // ── Production & carryover ────────────────────────────────────────────

  pub fn add_production(&mut self, qty: i64) -> Result<()> {
    positive(qty)?;
    self.ensure_open()?;
    let production = checked_sum(self.new_production_qty, qty, "new_production_qty")?;
    checked_sum(self.carryover_qty, production, "total_available")?;
    self.new_production_qty = production;
    self.recompute_total()
  }

  /// Merge the previous day's leftover into this record.
  pub fn apply_carryover(&mut self, qty: i64) -> Result<()> {
    positive(qty)?;
    self.ensure_open()?;
    if self.carried_over {
      return Err(Error::Validation(format!(
        "{} already received its carryover",
        self.key()
      )));
    }
    let carryover = checked_sum(self.carryover_qty, qty, "carryover_qty")?;
    checked_sum(carryover, self.new_production_qty, "total_available")?;
    self.carryover_qty = carryover;
    self.carried_over = true;
    self.recompute_total()
  }

  // ── Reservations & sales ──────────────────────────────────────────────

  pub fn reserve(&mut self, qty: i64) -> Result<()> {
    positive(qty)?;
    self.ensure_open()?;
    let Stock { sellable, .. } = self.stock()?;
    if sellable < qty {
      return Err(Error::InsufficientStock { requested: qty, available: sellable });
    }
    self.reserved_qty = checked_sum(self.reserved_qty, qty, "reserved_qty")?;
    Ok(())
  }

  /// Convert part of an existing reservation into a sale.
  pub fn complete_reserved_sale(&mut self, qty: i64) -> Result<()> {
    positive(qty)?;
    self.ensure_open()?;
    if self.reserved_qty < qty {
      return Err(Error::InsufficientStock {
        requested: qty,
        available: self.reserved_qty,
      });
    }
    let sold = checked_sum(self.sold_qty, qty, "sold_qty")?;
    self.reserved_qty -= qty;
    self.sold_qty = sold;
    Ok(())
  }

  /// Sell directly from sellable stock, bypassing reservation.
  pub fn complete_walk_in_sale(&mut self, qty: i64) -> Result<()> {
    positive(qty)?;
    self.ensure_open()?;
    let Stock { sellable, .. } = self.stock()?;
    if sellable < qty {
      return Err(Error::InsufficientStock { requested: qty, available: sellable });
    }
    self.sold_qty = checked_sum(self.sold_qty, qty, "sold_qty")?;
    Ok(())
  }

  /// Release a hold. Returns the quantity actually released, which is less
  /// than `qty` only when fewer units were reserved.
  pub fn release_reservation(&mut self, qty: i64) -> Result<i64> {
    positive(qty)?;
    self.ensure_open()?;
    let released = qty.min(self.reserved_qty);
    self.reserved_qty -= released;
    Ok(released)
  }

  /// Void part of a completed sale, returning the units to stock.
  pub fn void_sale(&mut self, qty: i64) -> Result<()> {
    positive(qty)?;
    self.ensure_open()?;
    let cancelled = checked_sum(self.cancelled_qty, qty, "cancelled_qty")?;
    if cancelled > self.sold_qty {
      return Err(Error::Validation(format!(
        "cannot void {qty}: only {} sold and not yet voided",
        self.sold_qty - self.cancelled_qty
      )));
    }
    self.cancelled_qty = cancelled;
    Ok(())
  }

  // ── Wastage ───────────────────────────────────────────────────────────

  /// Take `qty` out of sellable stock, oldest (carried-over) units first.
  /// Returns how much came out of today's production.
  pub fn remove_stock(&mut self, qty: i64) -> Result<i64> {
    positive(qty)?;
    self.ensure_open()?;
    let Stock { sellable, .. } = self.stock()?;
    if sellable < qty {
      return Err(Error::InsufficientStock { requested: qty, available: sellable });
    }
    let from_carryover = qty.min(self.carryover_qty);
    let from_production = qty - from_carryover;
    self.carryover_qty -= from_carryover;
    self.new_production_qty -= from_production;
    self.recompute_total()?;
    Ok(from_production)
  }

  /// Inverse of [`Self::remove_stock`].
  pub fn return_stock(&mut self, qty: i64, from_production: i64) -> Result<()> {
    positive(qty)?;
    if !(0..=qty).contains(&from_production) {
      return Err(Error::Validation(format!(
        "production share {from_production} outside 0..={qty}"
      )));
    }
    self.ensure_open()?;
    let carryover =
      checked_sum(self.carryover_qty, qty - from_production, "carryover_qty")?;
    let production =
      checked_sum(self.new_production_qty, from_production, "new_production_qty")?;
    checked_sum(carryover, production, "total_available")?;
    self.carryover_qty = carryover;
    self.new_production_qty = production;
    self.recompute_total()
  }

  // ── Reconciliation ────────────────────────────────────────────────────

  /// Record a physical end-of-day count. Returns the adjustment to log: the
  /// variance itself on a first count, the change in variance on a recount.
  pub fn record_count(
    &mut self,
    actual_remaining: i64,
    remarks: Option<&str>,
  ) -> Result<i64> {
    if actual_remaining < 0 {
      return Err(Error::Validation(format!(
        "actual remaining must not be negative, got {actual_remaining}"
      )));
    }
    self.ensure_open()?;
    let Stock { expected_remaining, .. } = self.stock()?;
    let variance = actual_remaining - expected_remaining;
    let remarks = remarks.map(str::trim).filter(|r| !r.is_empty());
    if variance != 0 && remarks.is_none() {
      return Err(Error::VarianceRemarksRequired { variance });
    }

    let previous = self.variance.unwrap_or(0);
    let adjustment = variance.checked_sub(previous).ok_or_else(|| {
      Error::Validation(format!("count {actual_remaining} would overflow"))
    })?;
    self.actual_remaining = Some(actual_remaining);
    self.variance = Some(variance);
    self.variance_remarks = remarks.map(str::to_owned);
    self.status = RecordStatus::PendingApproval;
    Ok(adjustment)
  }

  pub fn approve(&mut self) -> Result<()> {
    if self.status != RecordStatus::PendingApproval {
      return Err(Error::Validation(format!(
        "{} is {}, not pending approval",
        self.key(),
        self.status
      )));
    }
    self.status = RecordStatus::Closed;
    Ok(())
  }

  /// Overwrite the sold quantity with an authoritative external value.
  /// Returns `fed - previous`.
  pub fn overwrite_sold(&mut self, fed: i64) -> Result<i64> {
    if fed < 0 {
      return Err(Error::Validation(format!(
        "fed sold quantity must not be negative, got {fed}"
      )));
    }
    self.ensure_open()?;
    let delta = fed - self.sold_qty;
    self.sold_qty = fed;
    Ok(delta)
  }

  /// Rewrite fields of a past day's record. Closed records may be edited;
  /// that is the point of the operation.
  pub fn apply_patch(&mut self, patch: &RecordPatch) -> Result<()> {
    if patch.is_empty() {
      return Err(Error::Validation("historical edit changes nothing".into()));
    }
    let quantities = [
      patch.carryover_qty,
      patch.new_production_qty,
      patch.reserved_qty,
      patch.sold_qty,
      patch.cancelled_qty,
      patch.actual_remaining,
    ];
    if let Some(bad) = quantities.iter().flatten().find(|q| **q < 0) {
      return Err(Error::Validation(format!(
        "quantities must not be negative, got {bad}"
      )));
    }

    if let Some(q) = patch.carryover_qty {
      self.carryover_qty = q;
    }
    if let Some(q) = patch.new_production_qty {
      self.new_production_qty = q;
    }
    if let Some(q) = patch.reserved_qty {
      self.reserved_qty = q;
    }
    if let Some(q) = patch.sold_qty {
      self.sold_qty = q;
    }
    if let Some(q) = patch.cancelled_qty {
      self.cancelled_qty = q;
    }
    self.recompute_total()?;

    if let Some(actual) = patch.actual_remaining {
      self.actual_remaining = Some(actual);
    }
    if let Some(remarks) = &patch.variance_remarks {
      let trimmed = remarks.trim();
      self.variance_remarks =
        (!trimmed.is_empty()).then(|| trimmed.to_owned());
    }
    if let Some(status) = patch.status {
      self.status = status;
    }

    // Keep the stored variance consistent with the rewritten quantities.
    if let Some(actual) = self.actual_remaining {
      let Stock { expected_remaining, .. } = self.stock()?;
      self.variance = Some(actual - expected_remaining);
    }
    Ok(())
  }
}
