//! Day-in-the-life walkthroughs.

use crumb_core::{
  Error, RecordKey, RecordStatus,
  wastage::{NewWastage, SourceAction, WastageReason},
};
use rust_decimal::Decimal;

use super::{Harness, core_err};
use crate::carryover::CarryoverPlan;

#[tokio::test]
async fn online_order_reserved_then_sold() {
  let h = Harness::new().await;
  let record = h.produce("pandesal", 50).await;
  assert_eq!(record.carryover_qty, 0);
  assert_eq!(record.total_available, 50);

  h.ledger
    .reservations
    .reserve_stock("pandesal".into(), 10, "O1", &h.actor)
    .await
    .unwrap();
  assert_eq!(h.sellable("pandesal").await, 40);

  let record = h
    .ledger
    .reservations
    .complete_sale("pandesal".into(), 10, "O1", true, &h.actor)
    .await
    .unwrap();
  assert_eq!(record.reserved_qty, 0);
  assert_eq!(record.sold_qty, 10);
  assert_eq!(h.sellable("pandesal").await, 40);
}

#[tokio::test]
async fn competing_reservations_for_the_last_units() {
  let h = Harness::new().await;
  h.produce("pandesal", 5).await;

  let (o2, o3) = tokio::join!(
    h.ledger
      .reservations
      .reserve_stock("pandesal".into(), 4, "O2", &h.actor),
    h.ledger
      .reservations
      .reserve_stock("pandesal".into(), 3, "O3", &h.actor),
  );

  // Exactly one of them fits.
  let record = h.record("pandesal").await;
  match (o2, o3) {
    (Ok(_), Err(e)) => {
      assert!(matches!(core_err(e), Error::InsufficientStock { requested: 3, available: 1 }));
      assert_eq!(record.reserved_qty, 4);
      assert_eq!(h.sellable("pandesal").await, 1);
    }
    (Err(e), Ok(_)) => {
      assert!(matches!(core_err(e), Error::InsufficientStock { requested: 4, available: 2 }));
      assert_eq!(record.reserved_qty, 3);
      assert_eq!(h.sellable("pandesal").await, 2);
    }
    other => panic!("expected exactly one reservation to succeed: {other:?}"),
  }
}

#[tokio::test]
async fn yesterdays_leftover_carried_once() {
  let h = Harness::new().await;
  h.produce("p2", 20).await;
  h.ledger
    .reservations
    .complete_sale("p2".into(), 14, "till", false, &h.actor)
    .await
    .unwrap();
  let yesterday = h.today();
  let left = h.ledger.records.get(RecordKey::new(yesterday, "p2".into())).await.unwrap().unwrap();
  assert_eq!(left.stock().unwrap().expected_remaining, 6);

  h.clock.advance_day();
  let first = h
    .ledger
    .carryover
    .run(yesterday, &CarryoverPlan::carry_all(), &h.actor)
    .await
    .unwrap();
  assert_eq!(first.carried.len(), 1);
  let today = h.record("p2").await;
  assert_eq!(today.carryover_qty, 6);
  assert_eq!(today.total_available, 6);

  let second = h
    .ledger
    .carryover
    .run(yesterday, &CarryoverPlan::carry_all(), &h.actor)
    .await
    .unwrap();
  assert!(second.carried.is_empty());
  assert!(second.disposed.is_empty());
  assert_eq!(h.record("p2").await, today);
}

#[tokio::test]
async fn wastage_restored_the_same_day() {
  let h = Harness::new().await;
  h.produce("p3", 5).await;
  let yesterday = h.today();
  h.clock.advance_day();
  h.ledger
    .carryover
    .run(yesterday, &CarryoverPlan::carry_all(), &h.actor)
    .await
    .unwrap();
  let before = h.record("p3").await;
  assert_eq!(before.carryover_qty, 5);

  let wastage = h
    .ledger
    .wastage
    .create_wastage_record(
      NewWastage {
        product_id:    "p3".into(),
        qty:           3,
        reason:        WastageReason::StaleDiscarded,
        source_action: SourceAction::StockRemoval,
      },
      &h.actor,
    )
    .await
    .unwrap();
  assert_eq!(wastage.unit_cost, Decimal::from(2));
  assert_eq!(wastage.total_cost, Decimal::from(6));
  assert_eq!(h.record("p3").await.carryover_qty, 2);

  h.ledger
    .wastage
    .restore_from_wastage(wastage.wastage_id, &h.actor)
    .await
    .unwrap();
  let after = h.record("p3").await;
  assert_eq!(after.carryover_qty, 5);
  assert_eq!(after.total_available, before.total_available);
  assert!(h.ledger.wastage.list_wastage(h.today()).await.unwrap().is_empty());
}

#[tokio::test]
async fn count_with_variance_needs_remarks() {
  let h = Harness::new().await;
  h.produce("pandesal", 6).await;

  let err = h
    .ledger
    .reconciliation
    .record_count(h.today(), "pandesal".into(), 4, None, &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::VarianceRemarksRequired { variance: -2 }));
  assert_eq!(h.record("pandesal").await.status, RecordStatus::Open);

  let record = h
    .ledger
    .reconciliation
    .record_count(h.today(), "pandesal".into(), 4, Some("two dropped"), &h.actor)
    .await
    .unwrap();
  assert_eq!(record.variance, Some(-2));
  assert_eq!(record.status, RecordStatus::PendingApproval);
}
