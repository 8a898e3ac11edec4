use crumb_core::{
  Error,
  movement::MovementType,
  wastage::{NewWastage, ReasonCategory, SourceAction, WastageReason},
};
use rust_decimal::Decimal;

use super::{Harness, core_err};

fn removal(product: &str, qty: i64, reason: WastageReason) -> NewWastage {
  NewWastage {
    product_id: product.into(),
    qty,
    reason,
    source_action: SourceAction::StockRemoval,
  }
}

#[tokio::test]
async fn stock_removal_reduces_today_and_is_priced() {
  let h = Harness::new().await;
  h.produce("ensaymada", 10).await;

  let wastage = h
    .ledger
    .wastage
    .create_wastage_record(removal("ensaymada", 2, WastageReason::Damaged), &h.actor)
    .await
    .unwrap();
  assert_eq!(wastage.reason_category, ReasonCategory::Wastage);
  assert_eq!(wastage.unit_cost, Decimal::new(1200, 2));
  assert_eq!(wastage.total_cost, Decimal::new(2400, 2));
  assert_eq!(wastage.from_production, 2);

  let record = h.record("ensaymada").await;
  assert_eq!(record.new_production_qty, 8);
  assert_eq!(record.total_available, 8);

  let log = h.ledger.movements.query("ensaymada".into(), h.today()).await.unwrap();
  assert_eq!(log[0].kind, MovementType::Wastage);
  assert_eq!(log[0].qty, -2);
  assert_eq!(log[0].reference, Some(wastage.wastage_id.to_string()));
}

#[tokio::test]
async fn removal_beyond_sellable_is_refused() {
  let h = Harness::new().await;
  h.produce("pandesal", 4).await;
  h.ledger
    .reservations
    .reserve_stock("pandesal".into(), 3, "o-1", &h.actor)
    .await
    .unwrap();

  let err = h
    .ledger
    .wastage
    .create_wastage_record(removal("pandesal", 2, WastageReason::Sample), &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(
    core_err(err),
    Error::InsufficientStock { requested: 2, available: 1 }
  ));
  assert!(h.ledger.wastage.list_wastage(h.today()).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_product_and_bad_quantity_are_validation_errors() {
  let h = Harness::new().await;
  let err = h
    .ledger
    .wastage
    .create_wastage_record(removal("croissant", 1, WastageReason::Damaged), &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::Validation(_)));

  let err = h
    .ledger
    .wastage
    .create_wastage_record(removal("pandesal", 0, WastageReason::Damaged), &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::Validation(_)));
}

#[tokio::test]
async fn carryover_disposal_leaves_the_record_alone() {
  let h = Harness::new().await;
  h.produce("pandesal", 10).await;

  h.ledger
    .wastage
    .create_wastage_record(
      NewWastage {
        product_id:    "pandesal".into(),
        qty:           4,
        reason:        WastageReason::Donation,
        source_action: SourceAction::CarryoverDisposal,
      },
      &h.actor,
    )
    .await
    .unwrap();

  assert_eq!(h.record("pandesal").await.total_available, 10);
  let summary = h.ledger.wastage.wastage_summary(h.today()).await.unwrap();
  assert_eq!(summary[&ReasonCategory::Giveaway].qty, 4);
  assert_eq!(summary[&ReasonCategory::Giveaway].total_cost, Decimal::new(1000, 2));
  assert_eq!(summary[&ReasonCategory::Recycled].qty, 0);
}

#[tokio::test]
async fn restore_puts_units_back_where_they_came_from() {
  let h = Harness::new().await;
  h.produce("ube_roll", 10).await;
  h.ledger
    .records
    .set_fields(
      h.key("ube_roll"),
      &crumb_core::record::RecordPatch { carryover_qty: Some(2), ..Default::default() },
    )
    .await
    .unwrap();

  let wastage = h
    .ledger
    .wastage
    .create_wastage_record(
      removal("ube_roll", 5, WastageReason::RecycledVariantA),
      &h.actor,
    )
    .await
    .unwrap();
  assert_eq!(wastage.from_production, 3);
  let record = h.record("ube_roll").await;
  assert_eq!((record.carryover_qty, record.new_production_qty), (0, 7));

  h.ledger
    .wastage
    .restore_from_wastage(wastage.wastage_id, &h.actor)
    .await
    .unwrap();
  let record = h.record("ube_roll").await;
  assert_eq!((record.carryover_qty, record.new_production_qty), (2, 10));
  assert_eq!(record.total_available, 12);
  assert!(h.ledger.wastage.get(wastage.wastage_id).await.unwrap().is_none());

  let log = h.ledger.movements.query("ube_roll".into(), h.today()).await.unwrap();
  assert_eq!(log[0].kind, MovementType::Restore);
  assert_eq!(log[0].qty, 5);
  assert_eq!(log[0].reference, Some(wastage.wastage_id.to_string()));

  // A second restore finds nothing to restore.
  let err = h
    .ledger
    .wastage
    .restore_from_wastage(wastage.wastage_id, &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::RecordNotFound(_)));
}

#[tokio::test]
async fn restore_on_a_later_day_is_not_allowed() {
  let h = Harness::new().await;
  h.produce("pandesal", 6).await;
  let wastage = h
    .ledger
    .wastage
    .create_wastage_record(removal("pandesal", 1, WastageReason::StaleDiscarded), &h.actor)
    .await
    .unwrap();

  h.clock.advance_day();
  let err = h
    .ledger
    .wastage
    .restore_from_wastage(wastage.wastage_id, &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::ReversalNotAllowed { .. }));
  assert!(h.ledger.wastage.get(wastage.wastage_id).await.unwrap().is_some());
}
