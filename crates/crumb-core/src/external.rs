//! Interfaces of the collaborators the ledger consumes but does not own.

use std::{collections::BTreeMap, future::Future, sync::RwLock};

use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::record::ProductId;

// ─── Catalog ─────────────────────────────────────────────────────────────────

/// Product metadata owned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub product_id: ProductId,
  pub name:       String,
  pub category:   String,
  pub unit_cost:  Decimal,
}

pub trait Catalog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up a product. Returns `None` if the catalog does not know it.
  fn get_product(
    &self,
    product_id: ProductId,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;
}

// ─── Identity ────────────────────────────────────────────────────────────────

/// Whoever a change is attributed to in the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub id:           String,
  pub display_name: String,
}

impl Actor {
  pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
    Self { id: id.into(), display_name: display_name.into() }
  }
}

pub trait Identity {
  fn current_actor(&self) -> Actor;
}

impl Identity for Actor {
  fn current_actor(&self) -> Actor { self.clone() }
}

// ─── Sales feed ──────────────────────────────────────────────────────────────

/// An external point-of-sale system that is authoritative for sold counts.
pub trait SalesFeed: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn daily_sold_quantities(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<BTreeMap<ProductId, i64>, Self::Error>>
  + Send
  + '_;
}

// ─── Clock ───────────────────────────────────────────────────────────────────

/// Source of timestamps and of the current operating day.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;

  fn today(&self) -> NaiveDate;
}

/// Wall clock; the operating day follows the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }

  fn today(&self) -> NaiveDate { Local::now().date_naive() }
}

/// A manually advanced clock, for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
  now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
  pub fn new(now: DateTime<Utc>) -> Self { Self { now: RwLock::new(now) } }

  pub fn set(&self, now: DateTime<Utc>) {
    *self.now.write().unwrap_or_else(|e| e.into_inner()) = now;
  }

  /// Move to the next operating day.
  pub fn advance_day(&self) {
    let mut now = self.now.write().unwrap_or_else(|e| e.into_inner());
    *now = *now + Days::new(1);
  }
}

impl Clock for FixedClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.read().unwrap_or_else(|e| e.into_inner())
  }

  fn today(&self) -> NaiveDate { self.now().date_naive() }
}
