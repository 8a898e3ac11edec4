//! [`MovementLog`]: append-only audit trail of quantity changes.

use std::sync::Arc;

use chrono::NaiveDate;
use crumb_core::{
  ProductId,
  external::Actor,
  movement::{NewMovement, StockMovement},
  store::LedgerStore,
};
use uuid::Uuid;

use crate::{Error, Result, Shared};

pub struct MovementLog<S> {
  shared: Arc<Shared<S>>,
}

impl<S> Clone for MovementLog<S> {
  fn clone(&self) -> Self { Self { shared: Arc::clone(&self.shared) } }
}

impl<S: LedgerStore> MovementLog<S> {
  pub(crate) fn new(shared: Arc<Shared<S>>) -> Self { Self { shared } }

  /// Append one immutable entry. The id and timestamp are assigned here.
  pub async fn append(
    &self,
    movement: NewMovement,
    actor: &Actor,
  ) -> Result<StockMovement> {
    let entry = StockMovement {
      movement_id: Uuid::new_v4(),
      product_id:  movement.key.product_id,
      date:        movement.key.date,
      kind:        movement.kind,
      qty:         movement.qty,
      note:        movement.note,
      actor:       actor.id.clone(),
      reference:   movement.reference,
      recorded_at: self.shared.clock.now(),
    };

    self
      .shared
      .store
      .append_movement(entry.clone())
      .await
      .map_err(Error::store)?;
    Ok(entry)
  }

  /// Append the movement for a change that has already been committed.
  ///
  /// The record write and the append are separate; if the append fails the
  /// caller gets [`Error::AuditAppend`] even though the change stands.
  pub(crate) async fn record_committed(
    &self,
    movement: NewMovement,
    actor: &Actor,
  ) -> Result<StockMovement> {
    let key = movement.key.to_string();
    let kind = movement.kind;

    self.append(movement, actor).await.map_err(|e| {
      tracing::error!(%key, %kind, error = %e, "change committed but movement append failed");
      let source: Box<dyn std::error::Error + Send + Sync> = match e {
        Error::Store(source) => source,
        other => Box::new(other),
      };
      Error::AuditAppend { key, kind, source }
    })
  }

  /// Entries for one product and day, most recent first.
  pub async fn query(
    &self,
    product_id: ProductId,
    date: NaiveDate,
  ) -> Result<Vec<StockMovement>> {
    self
      .shared
      .store
      .movements(product_id, date)
      .await
      .map_err(Error::store)
  }
}
