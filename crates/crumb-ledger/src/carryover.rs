//! [`CarryoverProcessor`]: rolls a finished day's leftover into the next.
//!
//! Each product's leftover is settled exactly once. Settling marks the source
//! record and, in the same atomic batch, either merges the quantity into the
//! next day's record or books it as carryover-disposal wastage. A second run
//! over the same day therefore finds nothing left to do.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use crumb_core::{
  DailyRecord, ProductId, RecordKey,
  external::{Actor, Catalog},
  movement::{MovementType, NewMovement},
  store::{LedgerStore, RecordWrite, Versioned, WriteBatch},
  wastage::{SourceAction, WastageReason, WastageRecord},
};
use serde::{Deserialize, Serialize};

use crate::{DailyRecords, Error, MovementLog, Result, WastageTracker};

/// A product with leftover stock that has not been settled yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverCandidate {
  pub product_id: ProductId,
  pub qty:        i64,
}

/// What to do with one product's leftover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CarryoverDecision {
  #[default]
  Carry,
  Dispose { reason: WastageReason },
}

/// Operator decisions for a run. Products without a decision are carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverPlan {
  #[serde(default)]
  pub decisions: BTreeMap<ProductId, CarryoverDecision>,
}

impl CarryoverPlan {
  pub fn carry_all() -> Self { Self::default() }

  pub fn dispose(mut self, product_id: ProductId, reason: WastageReason) -> Self {
    self
      .decisions
      .insert(product_id, CarryoverDecision::Dispose { reason });
    self
  }

  pub fn decision(&self, product_id: &ProductId) -> CarryoverDecision {
    self.decisions.get(product_id).copied().unwrap_or_default()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryoverReport {
  pub from_date: NaiveDate,
  pub to_date:   NaiveDate,
  pub carried:   Vec<CarryoverCandidate>,
  pub disposed:  Vec<WastageRecord>,
  /// Settled concurrently, or the target day refused the carryover.
  pub skipped:   Vec<ProductId>,
}

enum Settled {
  Carried(CarryoverCandidate),
  Disposed(WastageRecord),
  Skipped,
}

pub struct CarryoverProcessor<S, C> {
  records:   DailyRecords<S>,
  movements: MovementLog<S>,
  wastage:   WastageTracker<S, C>,
}

impl<S, C> Clone for CarryoverProcessor<S, C> {
  fn clone(&self) -> Self {
    Self {
      records:   self.records.clone(),
      movements: self.movements.clone(),
      wastage:   self.wastage.clone(),
    }
  }
}

impl<S: LedgerStore, C: Catalog> CarryoverProcessor<S, C> {
  pub(crate) fn new(
    records: DailyRecords<S>,
    movements: MovementLog<S>,
    wastage: WastageTracker<S, C>,
  ) -> Self {
    Self { records, movements, wastage }
  }

  /// Leftover that a run over `from_date` would settle.
  pub async fn preview(&self, from_date: NaiveDate) -> Result<Vec<CarryoverCandidate>> {
    let mut candidates = Vec::new();
    for record in self.records.list(from_date).await? {
      if let Some(qty) = leftover(&record)? {
        candidates.push(CarryoverCandidate { product_id: record.product_id, qty });
      }
    }
    Ok(candidates)
  }

  /// Settle every unsettled leftover of `from_date` into the following day.
  pub async fn run(
    &self,
    from_date: NaiveDate,
    plan: &CarryoverPlan,
    actor: &Actor,
  ) -> Result<CarryoverReport> {
    let today = self.records.today();
    if from_date >= today {
      return Err(
        crumb_core::Error::Validation(format!(
          "cannot carry over from {from_date}: the day is not finished"
        ))
        .into(),
      );
    }
    let to_date = from_date.succ_opt().ok_or_else(|| {
      crumb_core::Error::Validation(format!("no day follows {from_date}"))
    })?;

    let mut report = CarryoverReport {
      from_date,
      to_date,
      carried: Vec::new(),
      disposed: Vec::new(),
      skipped: Vec::new(),
    };
    for CarryoverCandidate { product_id, .. } in self.preview(from_date).await? {
      let key = RecordKey::new(from_date, product_id.clone());
      let settled = match plan.decision(&product_id) {
        CarryoverDecision::Carry => self.carry(&key, to_date, actor).await,
        CarryoverDecision::Dispose { reason } => {
          self.dispose(&key, to_date, reason, actor).await
        }
      };

      match settled {
        Ok(Settled::Carried(candidate)) => report.carried.push(candidate),
        Ok(Settled::Disposed(wastage)) => report.disposed.push(wastage),
        Ok(Settled::Skipped) => report.skipped.push(product_id),
        Err(Error::Core(crumb_core::Error::Validation(reason))) => {
          tracing::warn!(%key, %reason, "carryover refused");
          report.skipped.push(product_id);
        }
        Err(e) => return Err(e),
      }
    }

    tracing::info!(
      %from_date,
      carried = report.carried.len(),
      disposed = report.disposed.len(),
      skipped = report.skipped.len(),
      "carryover run finished"
    );
    Ok(report)
  }

  async fn carry(
    &self,
    from: &RecordKey,
    to_date: NaiveDate,
    actor: &Actor,
  ) -> Result<Settled> {
    let to = RecordKey::new(to_date, from.product_id.clone());

    for attempt in 1..=self.records.max_attempts() {
      let Some((source, qty)) = self.unsettled(from).await? else {
        return Ok(Settled::Skipped);
      };

      let (mut target, target_version) =
        match self.records.get_versioned(to.clone()).await? {
          Some(Versioned { value, .. }) if value.carried_over => {
            return Ok(Settled::Skipped);
          }
          Some(Versioned { value, version }) => (value, version),
          None => (DailyRecord::new(to.clone(), self.records.now()), 0),
        };
      target.apply_carryover(qty)?;
      target.stock()?;
      target.updated_at = self.records.now();

      let batch = WriteBatch::default()
        .record(settle(source, self.records.now()))
        .record(RecordWrite::update(target, target_version));
      if self.records.commit(batch).await? {
        tracing::info!(%from, %to, qty, "carried over");
        self
          .movements
          .record_committed(
            NewMovement::new(to, MovementType::Carryover, qty)
              .reference(from.date.to_string()),
            actor,
          )
          .await?;
        return Ok(Settled::Carried(CarryoverCandidate {
          product_id: from.product_id.clone(),
          qty,
        }));
      }
      self.records.pause(from, attempt).await;
    }
    Err(self.records.gave_up())
  }

  async fn dispose(
    &self,
    from: &RecordKey,
    to_date: NaiveDate,
    reason: WastageReason,
    actor: &Actor,
  ) -> Result<Settled> {
    let unit_cost = self.wastage.unit_cost(&from.product_id).await?;

    for attempt in 1..=self.records.max_attempts() {
      let Some((source, qty)) = self.unsettled(from).await? else {
        return Ok(Settled::Skipped);
      };

      let wastage = self.wastage.build(
        from.product_id.clone(),
        to_date,
        qty,
        reason,
        SourceAction::CarryoverDisposal,
        unit_cost,
        actor,
      );
      let batch = WriteBatch::default()
        .record(settle(source, self.records.now()))
        .insert_wastage(wastage.clone());
      if self.records.commit(batch).await? {
        self.wastage.log_created(&wastage, actor).await?;
        return Ok(Settled::Disposed(wastage));
      }
      self.records.pause(from, attempt).await;
    }
    Err(self.records.gave_up())
  }

  /// Fresh read of the source record, if it still has leftover to settle.
  async fn unsettled(
    &self,
    from: &RecordKey,
  ) -> Result<Option<(Versioned<DailyRecord>, i64)>> {
    let Some(source) = self.records.get_versioned(from.clone()).await? else {
      return Ok(None);
    };
    Ok(leftover(&source.value)?.map(|qty| (source, qty)))
  }
}

/// Leftover quantity of an unsettled record, if any.
fn leftover(record: &DailyRecord) -> Result<Option<i64>> {
  if record.carryover_settled {
    return Ok(None);
  }
  let qty = record.stock()?.expected_remaining;
  Ok((qty > 0).then_some(qty))
}

fn settle(source: Versioned<DailyRecord>, now: DateTime<Utc>) -> RecordWrite {
  let Versioned { mut value, version } = source;
  value.carryover_settled = true;
  value.updated_at = now;
  RecordWrite::update(value, version)
}
