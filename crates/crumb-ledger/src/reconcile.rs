//! [`ReconciliationEngine`]: end-of-day counts, the external sales feed, and
//! audited edits of past days.

use chrono::NaiveDate;
use crumb_core::{
  DailyRecord, ProductId, RecordKey,
  external::{Actor, SalesFeed},
  movement::{MovementType, NewMovement},
  record::{HistoricalEdit, RecordPatch},
  store::LedgerStore,
};
use serde::{Deserialize, Serialize};

use crate::{DailyRecords, Error, MovementLog, Result};

/// A sold quantity the feed changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedChange {
  pub product_id: ProductId,
  pub previous:   i64,
  pub fed:        i64,
}

/// A fed quantity that was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedRejection {
  pub product_id: ProductId,
  pub fed:        i64,
  pub reason:     String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedReport {
  pub date:      NaiveDate,
  pub applied:   Vec<FeedChange>,
  pub unchanged: Vec<ProductId>,
  pub rejected:  Vec<FeedRejection>,
}

pub struct ReconciliationEngine<S> {
  records:   DailyRecords<S>,
  movements: MovementLog<S>,
}

impl<S> Clone for ReconciliationEngine<S> {
  fn clone(&self) -> Self {
    Self { records: self.records.clone(), movements: self.movements.clone() }
  }
}

impl<S: LedgerStore> ReconciliationEngine<S> {
  pub(crate) fn new(records: DailyRecords<S>, movements: MovementLog<S>) -> Self {
    Self { records, movements }
  }

  /// Record a physical count and leave the record pending approval.
  ///
  /// A non-zero variance needs remarks. The logged adjustment is the
  /// variance on a first count and the change in variance on a recount.
  pub async fn record_count(
    &self,
    date: NaiveDate,
    product_id: ProductId,
    actual_remaining: i64,
    remarks: Option<&str>,
    actor: &Actor,
  ) -> Result<DailyRecord> {
    let key = RecordKey::new(date, product_id);
    let (record, (adjustment, changed)) = self
      .records
      .update(key.clone(), false, |r| {
        let before = r.clone();
        let adjustment = r.record_count(actual_remaining, remarks)?;
        Ok((adjustment, *r != before))
      })
      .await?;
    if !changed {
      tracing::debug!(%key, actual_remaining, "recount matches the stored count");
      return Ok(record);
    }

    tracing::info!(
      %key,
      actual_remaining,
      variance = record.variance,
      adjustment,
      "recorded end-of-day count"
    );
    self
      .movements
      .record_committed(
        NewMovement::new(key, MovementType::Adjustment, adjustment)
          .note(record.variance_remarks.clone().unwrap_or_default()),
        actor,
      )
      .await?;
    Ok(record)
  }

  /// Close a counted record.
  pub async fn approve_count(
    &self,
    date: NaiveDate,
    product_id: ProductId,
    actor: &Actor,
  ) -> Result<DailyRecord> {
    let key = RecordKey::new(date, product_id);
    let (record, ()) =
      self.records.update(key.clone(), false, DailyRecord::approve).await?;
    tracing::info!(%key, approver = %actor.id, "count approved, record closed");
    Ok(record)
  }

  /// Overwrite each product's sold quantity with the feed's value.
  ///
  /// Running the same feed twice changes nothing the second time. A sale
  /// committed between the feed read and the overwrite is lost.
  pub async fn reconcile_with_feed<F: SalesFeed>(
    &self,
    date: NaiveDate,
    feed: &F,
    actor: &Actor,
  ) -> Result<FeedReport> {
    let quantities =
      feed.daily_sold_quantities(date).await.map_err(Error::feed)?;

    let mut report = FeedReport {
      date,
      applied: Vec::new(),
      unchanged: Vec::new(),
      rejected: Vec::new(),
    };
    for (product_id, fed) in quantities {
      let key = RecordKey::new(date, product_id.clone());
      let outcome = self
        .records
        .update(key.clone(), false, |r| r.overwrite_sold(fed))
        .await;

      match outcome {
        Ok((_, 0)) => report.unchanged.push(product_id),
        Ok((_, delta)) => {
          tracing::info!(%key, fed, delta, "sold quantity overwritten from feed");
          self
            .movements
            .record_committed(
              NewMovement::new(key, MovementType::Reconcile, -delta)
                .note(format!("feed sold {fed}")),
              actor,
            )
            .await?;
          report.applied.push(FeedChange {
            product_id,
            previous: fed - delta,
            fed,
          });
        }
        Err(Error::Core(
          e @ (crumb_core::Error::Validation(_)
          | crumb_core::Error::InvariantViolation(_)
          | crumb_core::Error::RecordNotFound(_)),
        )) => {
          tracing::warn!(%key, fed, error = %e, "feed row rejected");
          report.rejected.push(FeedRejection {
            product_id,
            fed,
            reason: e.to_string(),
          });
        }
        Err(e) => return Err(e),
      }
    }
    Ok(report)
  }

  /// Rewrite a past day's record, stamping who did it and why.
  pub async fn historical_edit(
    &self,
    date: NaiveDate,
    product_id: ProductId,
    patch: &RecordPatch,
    reason: &str,
    actor: &Actor,
  ) -> Result<DailyRecord> {
    let today = self.records.today();
    if date >= today {
      return Err(
        crumb_core::Error::Validation(format!(
          "historical edits are for past days; {date} is not before {today}"
        ))
        .into(),
      );
    }
    let reason = reason.trim();
    if reason.is_empty() {
      return Err(
        crumb_core::Error::Validation("historical edit needs a reason".into())
          .into(),
      );
    }

    let stamp = HistoricalEdit {
      reason:    reason.to_owned(),
      actor:     actor.id.clone(),
      edited_at: self.records.now(),
    };
    let key = RecordKey::new(date, product_id);
    let (record, delta) = self
      .records
      .update(key.clone(), false, |r| {
        let before = r.stock()?.expected_remaining;
        r.apply_patch(patch)?;
        r.historical_edit = Some(stamp.clone());
        Ok(r.stock()?.expected_remaining - before)
      })
      .await?;

    tracing::info!(%key, editor = %actor.id, delta, reason, "historical edit applied");
    self
      .movements
      .record_committed(
        NewMovement::new(key, MovementType::HistoricalEdit, delta).note(reason),
        actor,
      )
      .await?;
    Ok(record)
  }
}
