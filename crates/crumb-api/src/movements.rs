//! `GET /movements?product_id=...[&date=...]`: the audit trail of one
//! product and day, most recent first.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use crumb_core::{
  ProductId,
  external::Catalog,
  movement::StockMovement,
  store::LedgerStore,
};
use serde::Deserialize;

use crate::{AppState, error::ApiResult};

#[derive(Debug, Deserialize)]
pub struct MovementParams {
  pub product_id: ProductId,
  pub date:       Option<NaiveDate>,
}

pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<MovementParams>,
) -> ApiResult<Json<Vec<StockMovement>>>
where
  S: LedgerStore,
  C: Catalog,
{
  let date = state.day(params.date);
  let log = state.ledger.movements.query(params.product_id, date).await?;
  Ok(Json(log))
}
