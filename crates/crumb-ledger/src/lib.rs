//! The Crumb daily inventory ledger.
//!
//! Engines that keep per-product, per-day stock records consistent under
//! concurrent access, generic over any [`LedgerStore`] backend:
//!
//! - [`MovementLog`]: the append-only audit trail.
//! - [`DailyRecords`]: reads and the version-guarded read-modify-write loop.
//! - [`ReservationEngine`]: reserve, sell, cancel without overselling.
//! - [`WastageTracker`]: loss and give-away accounting, same-day reversal.
//! - [`CarryoverProcessor`]: rolls a day's leftover into the next day.
//! - [`ReconciliationEngine`]: end-of-day counts, sales-feed overwrite,
//!   historical edits.
//!
//! Every quantity change follows the same shape: read the versioned record,
//! apply a pure mutation from `crumb_core`, assert the invariants, commit
//! guarded by the read version, retry on conflict, then append a movement.

pub mod carryover;
pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod movements;
pub mod reconcile;
pub mod records;
pub mod reservations;
pub mod stock;
pub mod wastage;

use std::sync::Arc;

use crumb_core::{external::{Catalog, Clock}, store::LedgerStore};

pub use carryover::CarryoverProcessor;
pub use catalog::StaticCatalog;
pub use config::LedgerConfig;
pub use error::{Error, Result};
pub use feed::FeedSnapshot;
pub use movements::MovementLog;
pub use reconcile::ReconciliationEngine;
pub use records::DailyRecords;
pub use reservations::ReservationEngine;
pub use stock::ProductStock;
pub use wastage::WastageTracker;

/// State shared by every engine of one ledger.
pub(crate) struct Shared<S> {
  pub store:  S,
  pub clock:  Arc<dyn Clock>,
  pub config: LedgerConfig,
}

/// All ledger engines wired to one store, catalog and clock.
pub struct Ledger<S, C> {
  pub movements:      MovementLog<S>,
  pub records:        DailyRecords<S>,
  pub reservations:   ReservationEngine<S>,
  pub wastage:        WastageTracker<S, C>,
  pub carryover:      CarryoverProcessor<S, C>,
  pub reconciliation: ReconciliationEngine<S>,
}

impl<S, C> Ledger<S, C>
where
  S: LedgerStore,
  C: Catalog,
{
  pub fn new(
    store: S,
    catalog: C,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
  ) -> Self {
    let shared = Arc::new(Shared { store, clock, config });
    let catalog = Arc::new(catalog);

    let movements = MovementLog::new(Arc::clone(&shared));
    let records = DailyRecords::new(Arc::clone(&shared));
    let wastage = WastageTracker::new(
      records.clone(),
      movements.clone(),
      Arc::clone(&catalog),
    );

    Self {
      reservations: ReservationEngine::new(records.clone(), movements.clone()),
      carryover: CarryoverProcessor::new(
        records.clone(),
        movements.clone(),
        wastage.clone(),
      ),
      reconciliation: ReconciliationEngine::new(
        records.clone(),
        movements.clone(),
      ),
      wastage,
      movements,
      records,
    }
  }

  /// The current operating day.
  pub fn today(&self) -> chrono::NaiveDate { self.records.today() }
}

#[cfg(test)]
mod tests;
