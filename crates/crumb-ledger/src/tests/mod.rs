//! Ledger tests against an in-memory SQLite store and a fixed clock.

mod reconcile;
mod scenarios;
mod wastage;

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use crumb_core::{
  DailyRecord, ProductId, RecordKey,
  external::{Actor, FixedClock, Product},
};
use crumb_store_sqlite::SqliteStore;
use rust_decimal::Decimal;

use self::flaky::{Faults, FlakyStore};
use crate::{Ledger, LedgerConfig, StaticCatalog};

pub(crate) type TestLedger = Ledger<FlakyStore, StaticCatalog>;

pub(crate) struct Harness {
  pub ledger: Arc<TestLedger>,
  pub clock:  Arc<FixedClock>,
  pub faults: Arc<Faults>,
  pub actor:  Actor,
}

impl Harness {
  pub async fn new() -> Self { Self::with_config(LedgerConfig::default()).await }

  pub async fn with_config(config: LedgerConfig) -> Self {
    let store = SqliteStore::open_in_memory()
      .await
      .expect("in-memory store");
    let clock = Arc::new(FixedClock::new(
      Utc.with_ymd_and_hms(2024, 5, 1, 6, 0, 0).unwrap(),
    ));
    let faults = Arc::new(Faults::default());
    let store = FlakyStore::new(store, faults.clone());
    let ledger = Ledger::new(store, catalog(), clock.clone(), config);
    Self {
      ledger: Arc::new(ledger),
      clock,
      faults,
      actor: Actor::new("baker-1", "Baker One"),
    }
  }

  pub fn today(&self) -> NaiveDate { self.ledger.today() }

  pub fn key(&self, product: &str) -> RecordKey {
    RecordKey::new(self.today(), product.into())
  }

  /// Today's record, which must exist.
  pub async fn record(&self, product: &str) -> DailyRecord {
    self
      .ledger
      .records
      .get(self.key(product))
      .await
      .unwrap()
      .expect("record exists")
  }

  pub async fn produce(&self, product: &str, qty: i64) -> DailyRecord {
    self
      .ledger
      .record_production(product.into(), qty, &self.actor)
      .await
      .unwrap()
  }

  pub async fn sellable(&self, product: &str) -> i64 {
    self
      .ledger
      .product_stock(product.into(), self.today())
      .await
      .unwrap()
      .sellable
  }
}

pub(crate) fn catalog() -> StaticCatalog {
  let product = |id: &str, name: &str, cost: i64| Product {
    product_id: ProductId::from(id),
    name:       name.into(),
    category:   "bread".into(),
    unit_cost:  Decimal::new(cost, 2),
  };
  StaticCatalog::new([
    product("pandesal", "Pandesal", 250),
    product("ensaymada", "Ensaymada", 1200),
    product("ube_roll", "Ube Roll", 875),
    product("p3", "Product Three", 200),
  ])
}

pub(crate) fn core_err(e: crate::Error) -> crumb_core::Error {
  match e {
    crate::Error::Core(e) => e,
    other => panic!("expected a domain error, got {other:?}"),
  }
}

// ─── Records & stock ─────────────────────────────────────────────────────────

#[tokio::test]
async fn production_creates_and_grows_the_record() {
  let h = Harness::new().await;
  h.produce("pandesal", 30).await;
  let record = h.produce("pandesal", 20).await;

  assert_eq!(record.new_production_qty, 50);
  assert_eq!(record.total_available, 50);
  assert_eq!(h.sellable("pandesal").await, 50);

  let log = h
    .ledger
    .movements
    .query("pandesal".into(), h.today())
    .await
    .unwrap();
  assert_eq!(log.len(), 2);
  assert!(log.iter().all(|m| m.kind == crumb_core::movement::MovementType::Production));
  assert_eq!(log[0].qty, 20);
  assert_eq!(log[0].actor, "baker-1");
}

#[tokio::test]
async fn stock_of_missing_record_is_not_found() {
  let h = Harness::new().await;
  let err = h
    .ledger
    .product_stock("pandesal".into(), h.today())
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), crumb_core::Error::RecordNotFound(_)));
}

#[tokio::test]
async fn all_product_stock_lists_every_record_of_the_day() {
  let h = Harness::new().await;
  h.produce("pandesal", 10).await;
  h.produce("ensaymada", 4).await;

  let all = h.ledger.all_product_stock(h.today()).await.unwrap();
  let ids: Vec<_> = all.iter().map(|s| s.product_id.as_str()).collect();
  assert_eq!(ids, ["ensaymada", "pandesal"]);
  assert!(all.iter().all(|s| !s.has_carryover));
  assert_eq!(all[1].total_available, 10);
}

#[tokio::test]
async fn ensure_returns_the_existing_record() {
  let h = Harness::new().await;
  let created = h.ledger.records.ensure(h.key("monay")).await.unwrap();
  assert_eq!(created.total_available, 0);

  h.produce("monay", 3).await;
  let again = h.ledger.records.ensure(h.key("monay")).await.unwrap();
  assert_eq!(again.new_production_qty, 3);
}

#[tokio::test]
async fn blank_product_id_is_rejected() {
  let h = Harness::new().await;
  let err = h
    .ledger
    .record_production("  ".into(), 5, &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), crumb_core::Error::Validation(_)));
}

#[tokio::test]
async fn set_fields_recomputes_total() {
  let h = Harness::new().await;
  h.produce("pandesal", 10).await;
  let record = h
    .ledger
    .records
    .set_fields(
      h.key("pandesal"),
      &crumb_core::record::RecordPatch {
        carryover_qty: Some(4),
        ..Default::default()
      },
    )
    .await
    .unwrap();
  assert_eq!(record.total_available, 14);
}

// ─── Store failures ──────────────────────────────────────────────────────────

#[tokio::test]
async fn persistent_conflicts_end_in_concurrent_modification() {
  let h = Harness::new().await;
  h.produce("pandesal", 10).await;
  let before = h.ledger.records.get_versioned(h.key("pandesal")).await.unwrap();

  h.faults.conflict_next(LedgerConfig::default().max_commit_attempts);
  let err = h
    .ledger
    .reservations
    .reserve_stock("pandesal".into(), 3, "O1", &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(err),
    crumb_core::Error::ConcurrentModification { attempts: 8 }
  ));
  let after = h.ledger.records.get_versioned(h.key("pandesal")).await.unwrap();
  assert_eq!(after, before);

  // One conflict fewer than the limit still commits on the last attempt.
  h.faults.conflict_next(LedgerConfig::default().max_commit_attempts - 1);
  h.ledger
    .reservations
    .reserve_stock("pandesal".into(), 3, "O1", &h.actor)
    .await
    .unwrap();
  assert_eq!(h.record("pandesal").await.reserved_qty, 3);
}

#[tokio::test]
async fn failed_append_surfaces_after_the_change_commits() {
  let h = Harness::new().await;
  h.produce("pandesal", 10).await;

  h.faults.refuse_appends(true);
  let err = h
    .ledger
    .record_production("pandesal".into(), 5, &h.actor)
    .await
    .unwrap_err();
  match err {
    crate::Error::AuditAppend { key, kind, .. } => {
      assert_eq!(key, h.key("pandesal").to_string());
      assert_eq!(kind, crumb_core::movement::MovementType::Production);
    }
    other => panic!("expected an audit gap, got {other:?}"),
  }
  h.faults.refuse_appends(false);

  assert_eq!(h.record("pandesal").await.new_production_qty, 15);
  let log = h.ledger.movements.query("pandesal".into(), h.today()).await.unwrap();
  assert_eq!(log.len(), 1);
}
