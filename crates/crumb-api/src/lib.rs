//! JSON REST API for the Crumb inventory ledger.
//!
//! Exposes an axum [`Router`] backed by a [`Ledger`] over any
//! [`LedgerStore`] and [`Catalog`]. Requests are attributed to the actor
//! named in the `x-actor-id` header; a few routes additionally require that
//! actor to be a configured supervisor. TLS and authentication are the
//! caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", crumb_api::api_router(state))
//! ```

pub mod actor;
pub mod carryover;
pub mod error;
pub mod movements;
pub mod orders;
pub mod reconcile;
pub mod stock;
pub mod wastage;

use std::{collections::HashSet, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use chrono::NaiveDate;
use crumb_core::{external::Catalog, store::LedgerStore};
use crumb_ledger::Ledger;

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<S, C> {
  pub ledger:      Arc<Ledger<S, C>>,
  /// Actor ids allowed to approve counts, overwrite from the sales feed
  /// and edit past days.
  pub supervisors: Arc<HashSet<String>>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      ledger:      Arc::clone(&self.ledger),
      supervisors: Arc::clone(&self.supervisors),
    }
  }
}

impl<S: LedgerStore, C: Catalog> AppState<S, C> {
  pub fn new(
    ledger: Ledger<S, C>,
    supervisors: impl IntoIterator<Item = String>,
  ) -> Self {
    Self {
      ledger:      Arc::new(ledger),
      supervisors: Arc::new(supervisors.into_iter().collect()),
    }
  }

  /// `date`, or the current operating day when absent.
  pub(crate) fn day(&self, date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| self.ledger.today())
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, C>(state: AppState<S, C>) -> Router<()>
where
  S: LedgerStore + 'static,
  C: Catalog + 'static,
{
  Router::new()
    // Stock and records
    .route("/stock", get(stock::list::<S, C>))
    .route("/stock/{product_id}", get(stock::get_one::<S, C>))
    .route("/records/{date}/{product_id}", get(stock::record::<S, C>))
    .route("/production", post(stock::production::<S, C>))
    // Orders
    .route("/reservations", post(orders::reserve::<S, C>))
    .route("/reservations/cancel", post(orders::cancel_reservation::<S, C>))
    .route("/sales", post(orders::sell::<S, C>))
    .route("/sales/cancel", post(orders::cancel_sale::<S, C>))
    // Audit trail
    .route("/movements", get(movements::list::<S, C>))
    // Wastage
    .route("/wastage", get(wastage::list::<S, C>).post(wastage::create::<S, C>))
    .route("/wastage/summary", get(wastage::summary::<S, C>))
    .route("/wastage/{id}/restore", post(wastage::restore::<S, C>))
    // Carryover
    .route(
      "/carryover",
      get(carryover::preview::<S, C>).post(carryover::run::<S, C>),
    )
    // Reconciliation
    .route("/counts", post(reconcile::count::<S, C>))
    .route("/counts/approve", post(reconcile::approve::<S, C>))
    .route("/reconcile/feed", post(reconcile::feed::<S, C>))
    .route("/records/historical", post(reconcile::historical::<S, C>))
    .with_state(state)
}
