//! Handlers for end-of-day counts and supervisor corrections.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/counts` | Body: [`CountBody`]; 422 if a variance lacks remarks |
//! | `POST` | `/counts/approve` | Supervisor only |
//! | `POST` | `/reconcile/feed` | Supervisor only; body: [`FeedBody`] |
//! | `POST` | `/records/historical` | Supervisor only; past days only |

use axum::{Json, extract::State};
use chrono::NaiveDate;
use crumb_core::{
  DailyRecord, ProductId,
  external::{Catalog, Identity},
  record::RecordPatch,
  store::LedgerStore,
};
use crumb_ledger::{FeedSnapshot, reconcile::FeedReport};
use serde::Deserialize;

use crate::{
  AppState,
  actor::{RequestActor, Supervisor},
  error::ApiResult,
};

#[derive(Debug, Deserialize)]
pub struct CountBody {
  pub date:             Option<NaiveDate>,
  pub product_id:       ProductId,
  pub actual_remaining: i64,
  pub remarks:          Option<String>,
}

/// `POST /counts`
pub async fn count<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Json(body): Json<CountBody>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore,
  C: Catalog,
{
  let date = state.day(body.date);
  let record = state
    .ledger
    .reconciliation
    .record_count(
      date,
      body.product_id,
      body.actual_remaining,
      body.remarks.as_deref(),
      &who.current_actor(),
    )
    .await?;
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
  pub date:       Option<NaiveDate>,
  pub product_id: ProductId,
}

/// `POST /counts/approve`
pub async fn approve<S, C>(
  State(state): State<AppState<S, C>>,
  who: Supervisor,
  Json(body): Json<ApproveBody>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore + 'static,
  C: Catalog + 'static,
{
  let date = state.day(body.date);
  let record = state
    .ledger
    .reconciliation
    .approve_count(date, body.product_id, &who.current_actor())
    .await?;
  Ok(Json(record))
}

/// Sold quantities exported by the point-of-sale system for one day.
#[derive(Debug, Deserialize)]
pub struct FeedBody {
  pub date: Option<NaiveDate>,
  pub sold: FeedSnapshot,
}

/// `POST /reconcile/feed`
pub async fn feed<S, C>(
  State(state): State<AppState<S, C>>,
  who: Supervisor,
  Json(body): Json<FeedBody>,
) -> ApiResult<Json<FeedReport>>
where
  S: LedgerStore + 'static,
  C: Catalog + 'static,
{
  let date = state.day(body.date);
  let report = state
    .ledger
    .reconciliation
    .reconcile_with_feed(date, &body.sold, &who.current_actor())
    .await?;
  Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct HistoricalBody {
  pub date:       NaiveDate,
  pub product_id: ProductId,
  pub patch:      RecordPatch,
  pub reason:     String,
}

/// `POST /records/historical`
pub async fn historical<S, C>(
  State(state): State<AppState<S, C>>,
  who: Supervisor,
  Json(body): Json<HistoricalBody>,
) -> ApiResult<Json<DailyRecord>>
where
  S: LedgerStore + 'static,
  C: Catalog + 'static,
{
  let record = state
    .ledger
    .reconciliation
    .historical_edit(
      body.date,
      body.product_id,
      &body.patch,
      &body.reason,
      &who.current_actor(),
    )
    .await?;
  Ok(Json(record))
}
