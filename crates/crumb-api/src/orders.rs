//! Handlers for reservations and sales on today's stock.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/reservations` | Body: [`OrderLine`]; 409 when not enough is sellable |
//! | `POST` | `/reservations/cancel` | Body: [`OrderLine`] |
//! | `POST` | `/sales` | Body: [`SaleBody`]; `online` converts a reservation |
//! | `POST` | `/sales/cancel` | Body: [`OrderLine`]; voids a completed sale |

use axum::{Json, extract::State};
use crumb_core::{
  DailyRecord, ProductId,
  external::{Catalog, Identity},
  store::LedgerStore,
};
use serde::Deserialize;

use crate::{AppState, actor::RequestActor, error::ApiResult};

#[derive(Debug, Deserialize)]
pub struct OrderLine {
  pub product_id: ProductId,
  pub qty:        i64,
  pub order_id:   String,
}

#[derive(Debug, Deserialize)]
pub struct SaleBody {
  #[serde(flatten)]
  pub line:   OrderLine,
  /// An online order completes its reservation; otherwise a walk-in sale.
  #[serde(default)]
  pub online: bool,
}

/// `POST /reservations`
pub async fn reserve<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Json(line): Json<OrderLine>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore,
  C: Catalog,
{
  let record = state
    .ledger
    .reservations
    .reserve_stock(line.product_id, line.qty, &line.order_id, &who.current_actor())
    .await?;
  Ok(Json(record))
}

/// `POST /reservations/cancel`
pub async fn cancel_reservation<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Json(line): Json<OrderLine>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore,
  C: Catalog,
{
  let record = state
    .ledger
    .reservations
    .cancel_reservation(
      line.product_id,
      line.qty,
      &line.order_id,
      &who.current_actor(),
    )
    .await?;
  Ok(Json(record))
}

/// `POST /sales`
pub async fn sell<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Json(body): Json<SaleBody>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore,
  C: Catalog,
{
  let SaleBody { line, online } = body;
  let record = state
    .ledger
    .reservations
    .complete_sale(
      line.product_id,
      line.qty,
      &line.order_id,
      online,
      &who.current_actor(),
    )
    .await?;
  Ok(Json(record))
}

/// `POST /sales/cancel`
pub async fn cancel_sale<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Json(line): Json<OrderLine>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore,
  C: Catalog,
{
  let record = state
    .ledger
    .reservations
    .cancel_sale(line.product_id, line.qty, &line.order_id, &who.current_actor())
    .await?;
  Ok(Json(record))
}
