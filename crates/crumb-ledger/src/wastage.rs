//! [`WastageTracker`]: loss and give-away accounting.
//!
//! A wastage record is priced from the catalog at creation and classified by
//! the fixed reason table. Stock removals are committed in the same batch as
//! the reduction of today's record, and a same-day restore deletes the
//! wastage record in the same batch that puts the units back.

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDate;
use crumb_core::{
  DailyRecord, ProductId,
  external::{Actor, Catalog},
  movement::{MovementType, NewMovement},
  store::{LedgerStore, WriteBatch},
  wastage::{
    CategoryTotal, NewWastage, ReasonCategory, SourceAction, WastageReason,
    WastageRecord,
  },
};
use rust_decimal::Decimal;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::{DailyRecords, Error, MovementLog, Result};

pub struct WastageTracker<S, C> {
  records:   DailyRecords<S>,
  movements: MovementLog<S>,
  catalog:   Arc<C>,
}

impl<S, C> Clone for WastageTracker<S, C> {
  fn clone(&self) -> Self {
    Self {
      records:   self.records.clone(),
      movements: self.movements.clone(),
      catalog:   Arc::clone(&self.catalog),
    }
  }
}

impl<S: LedgerStore, C: Catalog> WastageTracker<S, C> {
  pub(crate) fn new(
    records: DailyRecords<S>,
    movements: MovementLog<S>,
    catalog: Arc<C>,
  ) -> Self {
    Self { records, movements, catalog }
  }

  /// Record units lost or given away today.
  pub async fn create_wastage_record(
    &self,
    new: NewWastage,
    actor: &Actor,
  ) -> Result<WastageRecord> {
    let NewWastage { product_id, qty, reason, source_action } = new;
    if qty <= 0 {
      return Err(
        crumb_core::Error::Validation(format!(
          "wastage quantity must be positive, got {qty}"
        ))
        .into(),
      );
    }
    product_id.validate()?;

    let unit_cost = self.unit_cost(&product_id).await?;
    let date = self.records.today();
    let draft = self.build(
      product_id, date, qty, reason, source_action, unit_cost, actor,
    );

    let wastage = match source_action {
      SourceAction::StockRemoval => {
        let (_, wastage) = self
          .records
          .transact(draft.key(), false, |record, batch| {
            let mut wastage = draft.clone();
            wastage.from_production = record.remove_stock(qty)?;
            batch.insert_wastage.push(wastage.clone());
            Ok(wastage)
          })
          .await?;
        wastage
      }
      SourceAction::CarryoverDisposal => {
        let batch = WriteBatch::default().insert_wastage(draft.clone());
        // A fresh id cannot collide, so the batch never conflicts.
        if !self.records.commit(batch).await? {
          return Err(self.records.gave_up());
        }
        draft
      }
    };

    self.log_created(&wastage, actor).await?;
    Ok(wastage)
  }

  /// Reverse a wastage record created today, putting its units back.
  pub async fn restore_from_wastage(
    &self,
    wastage_id: Uuid,
    actor: &Actor,
  ) -> Result<WastageRecord> {
    let today = self.records.today();

    for attempt in 1..=self.records.max_attempts() {
      let wastage = self.get(wastage_id).await?.ok_or_else(|| {
        crumb_core::Error::RecordNotFound(format!("wastage {wastage_id}"))
      })?;
      if wastage.date != today {
        return Err(
          crumb_core::Error::ReversalNotAllowed { wastage_id, date: wastage.date }
            .into(),
        );
      }

      let key = wastage.key();
      let mut plan = |record: &mut DailyRecord,
                      batch: &mut WriteBatch|
       -> Result<()> {
        record.return_stock(wastage.qty, wastage.from_production)?;
        batch.delete_wastage.push(wastage.wastage_id);
        Ok(())
      };
      if self.records.attempt(&key, true, &mut plan).await?.is_some() {
        tracing::info!(%key, %wastage_id, qty = wastage.qty, "restored wastage");
        self
          .movements
          .record_committed(
            NewMovement::new(key, MovementType::Restore, wastage.qty)
              .note(wastage.reason.as_ref())
              .reference(wastage_id.to_string()),
            actor,
          )
          .await?;
        return Ok(wastage);
      }
      self.records.pause(&key, attempt).await;
    }
    Err(self.records.gave_up())
  }

  pub async fn get(&self, wastage_id: Uuid) -> Result<Option<WastageRecord>> {
    self
      .records
      .store()
      .get_wastage(wastage_id)
      .await
      .map_err(Error::store)
  }

  pub async fn list_wastage(&self, date: NaiveDate) -> Result<Vec<WastageRecord>> {
    self.records.store().list_wastage(date).await.map_err(Error::store)
  }

  /// Quantity and cost per reason category. Every category is present.
  pub async fn wastage_summary(
    &self,
    date: NaiveDate,
  ) -> Result<BTreeMap<ReasonCategory, CategoryTotal>> {
    let mut summary: BTreeMap<_, _> = ReasonCategory::iter()
      .map(|category| (category, CategoryTotal::default()))
      .collect();
    for wastage in self.list_wastage(date).await? {
      let total = summary.entry(wastage.reason_category).or_default();
      total.qty += wastage.qty;
      total.total_cost += wastage.total_cost;
    }
    Ok(summary)
  }

  // ── Shared with carryover ──────────────────────────────────────────────

  pub(crate) async fn unit_cost(&self, product_id: &ProductId) -> Result<Decimal> {
    let product = self
      .catalog
      .get_product(product_id.clone())
      .await
      .map_err(Error::catalog)?
      .ok_or_else(|| {
        crumb_core::Error::Validation(format!("unknown product {product_id}"))
      })?;
    Ok(product.unit_cost)
  }

  #[allow(clippy::too_many_arguments)]
  pub(crate) fn build(
    &self,
    product_id: ProductId,
    date: NaiveDate,
    qty: i64,
    reason: WastageReason,
    source_action: SourceAction,
    unit_cost: Decimal,
    actor: &Actor,
  ) -> WastageRecord {
    WastageRecord {
      wastage_id: Uuid::new_v4(),
      product_id,
      date,
      qty,
      reason,
      reason_category: reason.category(),
      unit_cost,
      total_cost: unit_cost * Decimal::from(qty),
      source_action,
      from_production: 0,
      actor: actor.id.clone(),
      created_at: self.records.now(),
    }
  }

  pub(crate) async fn log_created(
    &self,
    wastage: &WastageRecord,
    actor: &Actor,
  ) -> Result<()> {
    let key = wastage.key();
    tracing::info!(
      %key,
      wastage_id = %wastage.wastage_id,
      qty = wastage.qty,
      reason = %wastage.reason,
      source = %wastage.source_action,
      "recorded wastage"
    );
    self
      .movements
      .record_committed(
        NewMovement::new(key, MovementType::Wastage, -wastage.qty)
          .note(format!("{} ({})", wastage.reason, wastage.source_action))
          .reference(wastage.wastage_id.to_string()),
        actor,
      )
      .await?;
    Ok(())
  }
}
