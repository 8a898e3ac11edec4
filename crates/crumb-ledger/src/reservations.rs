//! [`ReservationEngine`]: holds, sales and cancellations against today's
//! record.

use crumb_core::{
  DailyRecord, ProductId, RecordKey,
  external::Actor,
  movement::{MovementType, NewMovement},
  store::LedgerStore,
};

use crate::{DailyRecords, MovementLog, Result};

pub struct ReservationEngine<S> {
  records:   DailyRecords<S>,
  movements: MovementLog<S>,
}

impl<S> Clone for ReservationEngine<S> {
  fn clone(&self) -> Self {
    Self { records: self.records.clone(), movements: self.movements.clone() }
  }
}

impl<S: LedgerStore> ReservationEngine<S> {
  pub(crate) fn new(records: DailyRecords<S>, movements: MovementLog<S>) -> Self {
    Self { records, movements }
  }

  fn today_key(&self, product_id: ProductId) -> RecordKey {
    RecordKey::new(self.records.today(), product_id)
  }

  /// Hold `qty` units for an order. Fails with `InsufficientStock` without
  /// writing anything when fewer units are sellable.
  pub async fn reserve_stock(
    &self,
    product_id: ProductId,
    qty: i64,
    order_id: &str,
    actor: &Actor,
  ) -> Result<DailyRecord> {
    let key = self.today_key(product_id);
    let (record, ()) =
      self.records.update(key.clone(), false, |r| r.reserve(qty)).await?;

    tracing::info!(%key, qty, order_id, "reserved stock");
    self
      .movements
      .record_committed(
        NewMovement::new(key, MovementType::Reserve, -qty).reference(order_id),
        actor,
      )
      .await?;
    Ok(record)
  }

  /// Complete a sale. An online order converts its reservation; a walk-in
  /// sale draws on sellable stock directly.
  pub async fn complete_sale(
    &self,
    product_id: ProductId,
    qty: i64,
    order_id: &str,
    is_online_order: bool,
    actor: &Actor,
  ) -> Result<DailyRecord> {
    let key = self.today_key(product_id);
    let (record, ()) = self
      .records
      .update(key.clone(), false, |r| {
        if is_online_order {
          r.complete_reserved_sale(qty)
        } else {
          r.complete_walk_in_sale(qty)
        }
      })
      .await?;

    let channel = if is_online_order { "online" } else { "walk-in" };
    tracing::info!(%key, qty, order_id, channel, "completed sale");
    self
      .movements
      .record_committed(
        NewMovement::new(key, MovementType::Sale, -qty)
          .note(channel)
          .reference(order_id),
        actor,
      )
      .await?;
    Ok(record)
  }

  /// Release a hold. Releasing more than is reserved releases what there is.
  pub async fn cancel_reservation(
    &self,
    product_id: ProductId,
    qty: i64,
    order_id: &str,
    actor: &Actor,
  ) -> Result<DailyRecord> {
    let key = self.today_key(product_id);
    let (record, released) = self
      .records
      .update(key.clone(), false, |r| r.release_reservation(qty))
      .await?;

    if released < qty {
      tracing::warn!(
        %key,
        requested = qty,
        released,
        order_id,
        "cancelled more than was reserved"
      );
    }
    if released == 0 {
      return Ok(record);
    }

    tracing::info!(%key, released, order_id, "released reservation");
    self
      .movements
      .record_committed(
        NewMovement::new(key, MovementType::Unreserve, released)
          .reference(order_id),
        actor,
      )
      .await?;
    Ok(record)
  }

  /// Void part of a completed sale, putting the units back on the shelf.
  pub async fn cancel_sale(
    &self,
    product_id: ProductId,
    qty: i64,
    order_id: &str,
    actor: &Actor,
  ) -> Result<DailyRecord> {
    let key = self.today_key(product_id);
    let (record, ()) =
      self.records.update(key.clone(), false, |r| r.void_sale(qty)).await?;

    tracing::info!(%key, qty, order_id, "voided sale");
    self
      .movements
      .record_committed(
        NewMovement::new(key, MovementType::Sale, qty)
          .note("void")
          .reference(order_id),
        actor,
      )
      .await?;
    Ok(record)
  }
}
