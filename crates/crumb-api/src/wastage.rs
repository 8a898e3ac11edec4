//! Handlers for `/wastage` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/wastage` | Optional `?date=` |
//! | `POST` | `/wastage` | Body: `{"product_id","qty","reason","source_action"?}`; returns 201 |
//! | `GET`  | `/wastage/summary` | Quantity and cost per category; optional `?date=` |
//! | `POST` | `/wastage/{id}/restore` | Same day only; 409 afterwards |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use crumb_core::{
  external::{Catalog, Identity},
  store::LedgerStore,
  wastage::{CategoryTotal, NewWastage, ReasonCategory, WastageRecord},
};
use uuid::Uuid;

use crate::{AppState, actor::RequestActor, error::ApiResult, stock::DateParams};

/// `GET /wastage[?date=YYYY-MM-DD]`
pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<DateParams>,
) -> ApiResult<Json<Vec<WastageRecord>>>
where
  S: LedgerStore,
  C: Catalog,
{
  let date = state.day(params.date);
  Ok(Json(state.ledger.wastage.list_wastage(date).await?))
}

/// `POST /wastage`
pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Json(body): Json<NewWastage>,
) -> ApiResult<impl IntoResponse>
where
  S: LedgerStore,
  C: Catalog,
{
  let wastage = state
    .ledger
    .wastage
    .create_wastage_record(body, &who.current_actor())
    .await?;
  Ok((StatusCode::CREATED, Json(wastage)))
}

/// `GET /wastage/summary[?date=YYYY-MM-DD]`
pub async fn summary<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<DateParams>,
) -> ApiResult<Json<BTreeMap<ReasonCategory, CategoryTotal>>>
where
  S: LedgerStore,
  C: Catalog,
{
  let date = state.day(params.date);
  Ok(Json(state.ledger.wastage.wastage_summary(date).await?))
}

/// `POST /wastage/{id}/restore`
pub async fn restore<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Path(id): Path<Uuid>,
) -> ApiResult<Json<WastageRecord>>
where
  S: LedgerStore,
  C: Catalog,
{
  let restored = state
    .ledger
    .wastage
    .restore_from_wastage(id, &who.current_actor())
    .await?;
  Ok(Json(restored))
}
