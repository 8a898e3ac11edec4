//! Handlers for `/carryover`.
//!
//! `GET` previews what a run would settle; `POST` runs it. Both default to
//! yesterday. The run body carries per-product decisions, e.g.
//! `{"decisions": {"ube_roll": {"action": "dispose", "reason": "donation"}}}`;
//! products without one are carried.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use crumb_core::{
  external::{Catalog, Identity},
  store::LedgerStore,
};
use crumb_ledger::carryover::{CarryoverCandidate, CarryoverPlan, CarryoverReport};
use serde::Deserialize;

use crate::{AppState, actor::RequestActor, error::{ApiError, ApiResult}};

#[derive(Debug, Deserialize)]
pub struct FromParams {
  pub from: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RunBody {
  pub from: Option<NaiveDate>,
  #[serde(flatten)]
  pub plan: CarryoverPlan,
}

fn from_date<S: LedgerStore, C: Catalog>(
  state: &AppState<S, C>,
  from: Option<NaiveDate>,
) -> ApiResult<NaiveDate> {
  match from {
    Some(date) => Ok(date),
    None => state
      .ledger
      .today()
      .pred_opt()
      .ok_or_else(|| ApiError::BadRequest("no day precedes today".into())),
  }
}

/// `GET /carryover[?from=YYYY-MM-DD]`
pub async fn preview<S, C>(
  State(state): State<AppState<S, C>>,
  Query(params): Query<FromParams>,
) -> ApiResult<Json<Vec<CarryoverCandidate>>>
where
  S: LedgerStore,
  C: Catalog,
{
  let from = from_date(&state, params.from)?;
  Ok(Json(state.ledger.carryover.preview(from).await?))
}

/// `POST /carryover`
pub async fn run<S, C>(
  State(state): State<AppState<S, C>>,
  who: RequestActor,
  Json(body): Json<RunBody>,
) -> ApiResult<Json<CarryoverReport>>
where
  S: LedgerStore,
  C: Catalog,
{
  let from = from_date(&state, body.from)?;
  let report = state
    .ledger
    .carryover
    .run(from, &body.plan, &who.current_actor())
    .await?;
  Ok(Json(report))
}
