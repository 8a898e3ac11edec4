//! Stock queries and production entry.

use chrono::NaiveDate;
use crumb_core::{
  DailyRecord, ProductId, RecordKey,
  external::{Actor, Catalog},
  movement::{MovementType, NewMovement},
  store::LedgerStore,
};
use serde::{Deserialize, Serialize};

use crate::{Ledger, Result};

/// Stock position of one product on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
  pub product_id:      ProductId,
  pub date:            NaiveDate,
  pub sellable:        i64,
  pub reserved:        i64,
  pub total_available: i64,
  pub has_carryover:   bool,
}

impl ProductStock {
  pub fn of(record: &DailyRecord) -> Result<Self> {
    let stock = record.stock()?;
    Ok(Self {
      product_id:      record.product_id.clone(),
      date:            record.date,
      sellable:        stock.sellable,
      reserved:        record.reserved_qty,
      total_available: record.total_available,
      has_carryover:   record.carryover_qty > 0,
    })
  }
}

impl<S: LedgerStore, C: Catalog> Ledger<S, C> {
  /// Stock of one product. A day without a record is `RecordNotFound`.
  pub async fn product_stock(
    &self,
    product_id: ProductId,
    date: NaiveDate,
  ) -> Result<ProductStock> {
    let record = self.records.require(RecordKey::new(date, product_id)).await?;
    ProductStock::of(&record)
  }

  /// Stock of every product with a record on `date`. Each record is read
  /// independently; the list is not a consistent snapshot across products.
  pub async fn all_product_stock(&self, date: NaiveDate) -> Result<Vec<ProductStock>> {
    self.records.list(date).await?.iter().map(ProductStock::of).collect()
  }

  /// Add freshly baked units to today's record, creating it if needed.
  pub async fn record_production(
    &self,
    product_id: ProductId,
    qty: i64,
    actor: &Actor,
  ) -> Result<DailyRecord> {
    let key = RecordKey::new(self.today(), product_id);
    let (record, ()) = self
      .records
      .update(key.clone(), true, |r| r.add_production(qty))
      .await?;

    tracing::info!(%key, qty, "recorded production");
    self
      .movements
      .record_committed(NewMovement::new(key, MovementType::Production, qty), actor)
      .await?;
    Ok(record)
  }
}
