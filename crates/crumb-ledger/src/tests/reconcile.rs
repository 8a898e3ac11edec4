use crumb_core::{Error, ProductId, RecordKey, RecordStatus, movement::MovementType, record::RecordPatch};

use super::{Harness, core_err};
use crate::FeedSnapshot;

#[tokio::test]
async fn recount_logs_only_the_change_in_variance() {
  let h = Harness::new().await;
  h.produce("pandesal", 10).await;

  h.ledger
    .reconciliation
    .record_count(h.today(), "pandesal".into(), 7, Some("three missing"), &h.actor)
    .await
    .unwrap();
  let record = h
    .ledger
    .reconciliation
    .record_count(h.today(), "pandesal".into(), 9, Some("found two"), &h.actor)
    .await
    .unwrap();
  assert_eq!(record.variance, Some(-1));
  assert_eq!(record.status, RecordStatus::PendingApproval);

  let log = h.ledger.movements.query("pandesal".into(), h.today()).await.unwrap();
  assert_eq!((log[0].kind, log[0].qty), (MovementType::Adjustment, 2));
  assert_eq!((log[1].kind, log[1].qty), (MovementType::Adjustment, -3));
}

#[tokio::test]
async fn identical_recount_logs_nothing() {
  let h = Harness::new().await;
  h.produce("pandesal", 10).await;

  for _ in 0..2 {
    h.ledger
      .reconciliation
      .record_count(h.today(), "pandesal".into(), 8, Some("two dropped"), &h.actor)
      .await
      .unwrap();
  }

  let log = h.ledger.movements.query("pandesal".into(), h.today()).await.unwrap();
  let adjustments: Vec<_> = log
    .iter()
    .filter(|m| m.kind == MovementType::Adjustment)
    .map(|m| m.qty)
    .collect();
  assert_eq!(adjustments, [-2]);
}

#[tokio::test]
async fn approval_closes_the_record() {
  let h = Harness::new().await;
  h.produce("pandesal", 5).await;

  let err = h
    .ledger
    .reconciliation
    .approve_count(h.today(), "pandesal".into(), &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::Validation(_)));

  h.ledger
    .reconciliation
    .record_count(h.today(), "pandesal".into(), 5, None, &h.actor)
    .await
    .unwrap();
  let record = h
    .ledger
    .reconciliation
    .approve_count(h.today(), "pandesal".into(), &h.actor)
    .await
    .unwrap();
  assert_eq!(record.status, RecordStatus::Closed);

  let err = h
    .ledger
    .reconciliation
    .record_count(h.today(), "pandesal".into(), 4, Some("late"), &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::Validation(_)));
}

#[tokio::test]
async fn feed_overwrites_sold_and_is_idempotent() {
  let h = Harness::new().await;
  h.produce("pandesal", 30).await;
  h.produce("ensaymada", 4).await;
  h.ledger
    .reservations
    .complete_sale("pandesal".into(), 10, "till", false, &h.actor)
    .await
    .unwrap();

  let feed: FeedSnapshot = [
    (ProductId::from("pandesal"), 12),
    (ProductId::from("ensaymada"), 9),
    (ProductId::from("croissant"), 1),
  ]
  .into_iter()
  .collect();

  let report = h
    .ledger
    .reconciliation
    .reconcile_with_feed(h.today(), &feed, &h.actor)
    .await
    .unwrap();
  assert_eq!(report.applied.len(), 1);
  assert_eq!(report.applied[0].previous, 10);
  assert_eq!(report.applied[0].fed, 12);
  // Selling 9 of 4 would leave negative stock; an unknown product has no record.
  let rejected: Vec<_> =
    report.rejected.iter().map(|r| r.product_id.as_str()).collect();
  assert_eq!(rejected, ["croissant", "ensaymada"]);

  assert_eq!(h.record("pandesal").await.sold_qty, 12);
  assert_eq!(h.record("ensaymada").await.sold_qty, 0);
  let log = h.ledger.movements.query("pandesal".into(), h.today()).await.unwrap();
  assert_eq!((log[0].kind, log[0].qty), (MovementType::Reconcile, -2));

  let again = h
    .ledger
    .reconciliation
    .reconcile_with_feed(h.today(), &feed, &h.actor)
    .await
    .unwrap();
  assert!(again.applied.is_empty());
  assert_eq!(again.unchanged, vec![ProductId::from("pandesal")]);
  let log_again = h.ledger.movements.query("pandesal".into(), h.today()).await.unwrap();
  assert_eq!(log_again.len(), log.len());
}

#[tokio::test]
async fn feed_below_voided_sales_is_rejected() {
  let h = Harness::new().await;
  h.produce("pandesal", 5).await;
  h.ledger
    .reservations
    .complete_sale("pandesal".into(), 2, "till", false, &h.actor)
    .await
    .unwrap();
  h.ledger
    .reservations
    .cancel_sale("pandesal".into(), 2, "till", &h.actor)
    .await
    .unwrap();

  let feed: FeedSnapshot = [(ProductId::from("pandesal"), 0)].into_iter().collect();
  let report = h
    .ledger
    .reconciliation
    .reconcile_with_feed(h.today(), &feed, &h.actor)
    .await
    .unwrap();
  assert!(report.applied.is_empty());
  assert_eq!(report.rejected.len(), 1);
  assert_eq!(report.rejected[0].product_id, ProductId::from("pandesal"));

  let record = h.record("pandesal").await;
  assert_eq!((record.sold_qty, record.cancelled_qty), (2, 2));
  assert_eq!(h.sellable("pandesal").await, 5);

  let err = h
    .ledger
    .reservations
    .reserve_stock("pandesal".into(), 7, "O9", &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::InsufficientStock { available: 5, .. }));
}

#[tokio::test]
async fn historical_edit_cannot_void_more_than_was_sold() {
  let h = Harness::new().await;
  h.produce("pandesal", 5).await;
  let day = h.today();
  h.clock.advance_day();

  let patch = RecordPatch { cancelled_qty: Some(3), ..Default::default() };
  let err = h
    .ledger
    .reconciliation
    .historical_edit(day, "pandesal".into(), &patch, "typo", &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::InvariantViolation(_)));
}

#[tokio::test]
async fn historical_edit_applies_to_past_days_only() {
  let h = Harness::new().await;
  h.produce("ube_roll", 10).await;
  h.ledger
    .reconciliation
    .record_count(h.today(), "ube_roll".into(), 10, None, &h.actor)
    .await
    .unwrap();
  h.ledger
    .reconciliation
    .approve_count(h.today(), "ube_roll".into(), &h.actor)
    .await
    .unwrap();
  let day = h.today();
  let patch = RecordPatch { sold_qty: Some(4), ..Default::default() };

  let err = h
    .ledger
    .reconciliation
    .historical_edit(day, "ube_roll".into(), &patch, "pos import late", &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::Validation(_)));

  h.clock.advance_day();
  let err = h
    .ledger
    .reconciliation
    .historical_edit(day, "ube_roll".into(), &patch, "  ", &h.actor)
    .await
    .unwrap_err();
  assert!(matches!(core_err(err), Error::Validation(_)));

  let record = h
    .ledger
    .reconciliation
    .historical_edit(day, "ube_roll".into(), &patch, "pos import late", &h.actor)
    .await
    .unwrap();
  assert_eq!(record.sold_qty, 4);
  assert_eq!(record.variance, Some(4));
  assert_eq!(record.status, RecordStatus::Closed);
  let stamp = record.historical_edit.as_ref().expect("edit stamp");
  assert_eq!(stamp.actor, "baker-1");
  assert_eq!(stamp.reason, "pos import late");

  let log = h.ledger.movements.query("ube_roll".into(), day).await.unwrap();
  assert_eq!((log[0].kind, log[0].qty), (MovementType::HistoricalEdit, -4));

  let stored = h
    .ledger
    .records
    .get(RecordKey::new(day, "ube_roll".into()))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(stored, record);
}
