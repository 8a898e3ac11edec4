//! Handlers for stock queries, record reads and production entry.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/stock` | Optional `?date=`; defaults to today |
//! | `GET`  | `/stock/{product_id}` | Optional `?date=`; 404 without a record |
//! | `GET`  | `/records/{date}/{product_id}` | The full daily record |
//! | `POST` | `/production` | Body: [`ProductionBody`]; returns the record |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::NaiveDate;
use crumb_core::{
  DailyRecord, ProductId, RecordKey,
  external::{Catalog, Identity},
  store::LedgerStore,
};
use crumb_ledger::ProductStock;
use serde::Deserialize;

use crate::{AppState, actor::RequestActor, error::ApiResult};

#[derive(Debug, Deserialize)]
pub struct DateParams {
  pub date: Option<NaiveDate>,
}

/// `GET /stock[?date=YYYY-MM-DD]`
pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<DateParams>,
) -> ApiResult<Json<Vec<ProductStock>>>
where
  S: LedgerStore,
  C: Catalog,
{
  let date = state.day(params.date);
  Ok(Json(state.ledger.all_product_stock(date).await?))
}

/// `GET /stock/{product_id}[?date=YYYY-MM-DD]`
pub async fn get_one<S, C>(
  State(state): State<AppState<S, C>>,
  Path(product_id): Path<ProductId>,
  Query(params): Query<DateParams>,
) -> ApiResult<Json<ProductStock>>
where
  S: LedgerStore,
  C: Catalog,
{
  let date = state.day(params.date);
  Ok(Json(state.ledger.product_stock(product_id, date).await?))
}

/// `GET /records/{date}/{product_id}`
pub async fn record<S, C>(
  State(state): State<AppState<S, C>>,
  Path((date, product_id)): Path<(NaiveDate, ProductId)>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore,
  C: Catalog,
{
  let record = state
    .ledger
    .records
    .require(RecordKey::new(date, product_id))
    .await?;
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ProductionBody {
  pub product_id: ProductId,
  pub qty:        i64,
}

/// `POST /production`: adds to today's record, creating it if needed.
pub async fn production<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Json(body): Json<ProductionBody>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore,
  C: Catalog,
{
  let record = state
    .ledger
    .record_production(body.product_id, body.qty, &who.current_actor())
    .await?;
  Ok(Json(record))
}
