mod common;

use assert_matches::assert_matches;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use common::TestApp;
use mainstay_api::{
    entities::stock_transaction::TransactionKind,
    errors::ServiceError,
    services::stock_ledger::{AdjustOptions, TransactionFilter},
};

fn opts() -> AdjustOptions {
    AdjustOptions {
        user_id: Uuid::new_v4(),
        ..Default::default()
    }
}

fn opts_with_cost(unit_cost: Decimal) -> AdjustOptions {
    AdjustOptions {
        unit_cost: Some(unit_cost),
        user_id: Uuid::new_v4(),
        ..Default::default()
    }
}

#[tokio::test]
async fn receipt_creates_record_lazily() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let transaction = ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(5)),
        )
        .await
        .expect("receipt failed");

    assert_eq!(transaction.quantity, 10);
    assert_eq!(transaction.previous_on_hand, 0);
    assert_eq!(transaction.new_on_hand, 10);
    assert_eq!(transaction.kind, "receipt");
    assert_eq!(transaction.total_cost, dec!(50));

    let stock = ledger
        .get_stock(company, part, location)
        .await
        .unwrap()
        .expect("record should exist after first mutation");
    assert_eq!(stock.on_hand, 10);
    assert_eq!(stock.reserved, 0);
    assert_eq!(stock.available, 10);
    assert_eq!(stock.average_cost, dec!(5));
}

#[tokio::test]
async fn weighted_average_cost_on_receipt() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(5)),
        )
        .await
        .unwrap();
    ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(7)),
        )
        .await
        .unwrap();

    let stock = ledger
        .get_stock(company, part, location)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.on_hand, 20);
    assert_eq!(stock.average_cost, dec!(6));
}

#[tokio::test]
async fn receipt_without_cost_keeps_average() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(5)),
        )
        .await
        .unwrap();
    ledger
        .adjust(company, part, location, 5, TransactionKind::Receipt, opts())
        .await
        .unwrap();

    let stock = ledger
        .get_stock(company, part, location)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.on_hand, 15);
    assert_eq!(stock.average_cost, dec!(5));
}

#[tokio::test]
async fn issue_beyond_on_hand_fails_and_leaves_record_unchanged() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            5,
            TransactionKind::Receipt,
            opts_with_cost(dec!(2)),
        )
        .await
        .unwrap();

    let result = ledger
        .adjust(company, part, location, 8, TransactionKind::Issue, opts())
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    let stock = ledger
        .get_stock(company, part, location)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.on_hand, 5);
    assert_eq!(stock.available, 5);

    // No ledger row for the failed issue.
    let transactions = ledger
        .list_transactions(
            company,
            TransactionFilter {
                part_id: Some(part),
                location_id: Some(location),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn issue_is_costed_at_average() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(4)),
        )
        .await
        .unwrap();

    let issue = ledger
        .adjust(company, part, location, 3, TransactionKind::Issue, opts())
        .await
        .unwrap();

    assert_eq!(issue.quantity, -3);
    assert_eq!(issue.unit_cost, dec!(4));
    assert_eq!(issue.total_cost, dec!(-12));

    let stock = ledger
        .get_stock(company, part, location)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.on_hand, 7);
    // Subtractive movements never move the average.
    assert_eq!(stock.average_cost, dec!(4));
}

#[tokio::test]
async fn adjustment_takes_signed_delta() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(5)),
        )
        .await
        .unwrap();

    let down = ledger
        .adjust(
            company,
            part,
            location,
            -2,
            TransactionKind::Adjustment,
            opts(),
        )
        .await
        .unwrap();
    assert_eq!(down.quantity, -2);

    let zero = ledger
        .adjust(
            company,
            part,
            location,
            0,
            TransactionKind::Adjustment,
            opts(),
        )
        .await;
    assert_matches!(zero, Err(ServiceError::ValidationError(_)));

    // A positive adjustment with a cost participates in the moving average
    // exactly like a receipt: 8 @ 5.00 + 12 @ 7.50 = 6.50.
    ledger
        .adjust(
            company,
            part,
            location,
            12,
            TransactionKind::Adjustment,
            opts_with_cost(dec!(7.50)),
        )
        .await
        .unwrap();

    let stock = ledger
        .get_stock(company, part, location)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.on_hand, 20);
    assert_eq!(stock.average_cost, dec!(6.50));
}

#[tokio::test]
async fn transfer_kinds_are_rejected_by_adjust() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let result = ledger
        .adjust(
            company,
            part,
            location,
            5,
            TransactionKind::TransferOut,
            opts(),
        )
        .await;
    assert_matches!(result, Err(ServiceError::InvalidTransactionType(_)));
}

#[tokio::test]
async fn transfer_moves_quantity_and_pairs_legs() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part) = (Uuid::new_v4(), Uuid::new_v4());
    let (location_a, location_b) = (Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location_a,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(5)),
        )
        .await
        .unwrap();

    let (out_leg, in_leg) = ledger
        .transfer(company, part, location_a, location_b, 4, opts())
        .await
        .expect("transfer failed");

    assert_eq!(out_leg.kind, "transfer_out");
    assert_eq!(out_leg.quantity, -4);
    assert_eq!(in_leg.kind, "transfer_in");
    assert_eq!(in_leg.quantity, 4);
    assert!(out_leg.related_id.is_some());
    assert_eq!(out_leg.related_id, in_leg.related_id);
    assert_eq!(out_leg.from_location_id, Some(location_a));
    assert_eq!(in_leg.to_location_id, Some(location_b));

    let source = ledger
        .get_stock(company, part, location_a)
        .await
        .unwrap()
        .unwrap();
    let destination = ledger
        .get_stock(company, part, location_b)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(source.on_hand, 6);
    assert_eq!(destination.on_hand, 4);
    // Quantity is conserved across the pair.
    assert_eq!(source.on_hand + destination.on_hand, 10);
    // Destination absorbs the units at the source's average cost.
    assert_eq!(destination.average_cost, dec!(5));
}

#[tokio::test]
async fn transfer_to_same_location_fails() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let result = ledger
        .transfer(company, part, location, location, 1, opts())
        .await;
    assert_matches!(result, Err(ServiceError::SameLocation(_)));
}

#[tokio::test]
async fn transfer_respects_reserved_quantity() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part) = (Uuid::new_v4(), Uuid::new_v4());
    let (location_a, location_b) = (Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location_a,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(3)),
        )
        .await
        .unwrap();
    ledger
        .reserve(company, part, location_a, 8, opts())
        .await
        .unwrap();

    // Only 2 available; moving 5 must fail before any write.
    let result = ledger
        .transfer(company, part, location_a, location_b, 5, opts())
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientAvailable(_)));

    let source = ledger
        .get_stock(company, part, location_a)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(source.on_hand, 10);
    assert_eq!(source.reserved, 8);
    assert!(ledger
        .get_stock(company, part, location_b)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn reserve_release_round_trip() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(1)),
        )
        .await
        .unwrap();

    let reserved = ledger
        .reserve(company, part, location, 4, opts())
        .await
        .unwrap();
    assert_eq!(reserved.on_hand, 10);
    assert_eq!(reserved.reserved, 4);
    assert_eq!(reserved.available, 6);

    let released = ledger
        .release(company, part, location, 4, opts())
        .await
        .unwrap();
    assert_eq!(released.on_hand, 10);
    assert_eq!(released.reserved, 0);
    assert_eq!(released.available, 10);

    // Releasing more than is held floors at zero.
    let over_released = ledger
        .release(company, part, location, 5, opts())
        .await
        .unwrap();
    assert_eq!(over_released.reserved, 0);
    assert_eq!(over_released.available, 10);

    // Reservations are soft holds: no ledger rows were written.
    let transactions = ledger
        .list_transactions(
            company,
            TransactionFilter {
                part_id: Some(part),
                location_id: Some(location),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn reserve_beyond_available_fails() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(1)),
        )
        .await
        .unwrap();
    ledger
        .reserve(company, part, location, 7, opts())
        .await
        .unwrap();

    let result = ledger.reserve(company, part, location, 4, opts()).await;
    assert_matches!(result, Err(ServiceError::InsufficientAvailable(_)));

    let stock = ledger
        .get_stock(company, part, location)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.reserved, 7);
    assert_eq!(stock.available, 3);
}

#[tokio::test]
async fn issue_cannot_consume_reserved_units() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            10,
            TransactionKind::Receipt,
            opts_with_cost(dec!(1)),
        )
        .await
        .unwrap();
    ledger
        .reserve(company, part, location, 8, opts())
        .await
        .unwrap();

    // 5 issued would leave on hand below the 8 reserved.
    let result = ledger
        .adjust(company, part, location, 5, TransactionKind::Issue, opts())
        .await;
    assert_matches!(result, Err(ServiceError::InsufficientStock(_)));

    // Release-then-issue is the supported path.
    ledger
        .release(company, part, location, 5, opts())
        .await
        .unwrap();
    ledger
        .adjust(company, part, location, 5, TransactionKind::Issue, opts())
        .await
        .unwrap();

    let stock = ledger
        .get_stock(company, part, location)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stock.on_hand, 5);
    assert_eq!(stock.reserved, 3);
    assert_eq!(stock.available, 2);
}

#[tokio::test]
async fn count_writes_signed_adjustment() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let counter = Uuid::new_v4();

    ledger
        .adjust(
            company,
            part,
            location,
            15,
            TransactionKind::Receipt,
            opts_with_cost(dec!(2)),
        )
        .await
        .unwrap();

    let result = ledger
        .count(
            company,
            part,
            location,
            12,
            AdjustOptions {
                user_id: counter,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(result.adjustment, -3);
    assert_eq!(result.stock.on_hand, 12);
    assert_eq!(result.stock.available, 12);
    assert_eq!(result.stock.last_counted_by, Some(counter));
    assert!(result.stock.last_counted_at.is_some());

    let transactions = ledger
        .list_transactions(
            company,
            TransactionFilter {
                part_id: Some(part),
                location_id: Some(location),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let adjustment = transactions
        .iter()
        .find(|t| t.kind == "adjustment")
        .expect("count should write an adjustment row");
    assert_eq!(adjustment.quantity, -3);
    assert_eq!(adjustment.reason.as_deref(), Some("Physical Count"));
}

#[tokio::test]
async fn count_matching_on_hand_writes_no_transaction() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part, location) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location,
            5,
            TransactionKind::Receipt,
            opts_with_cost(dec!(2)),
        )
        .await
        .unwrap();

    let result = ledger
        .count(company, part, location, 5, opts())
        .await
        .unwrap();
    assert_eq!(result.adjustment, 0);
    assert!(result.stock.last_counted_at.is_some());

    let transactions = ledger
        .list_transactions(
            company,
            TransactionFilter {
                part_id: Some(part),
                location_id: Some(location),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(transactions.len(), 1);
}

#[tokio::test]
async fn ledger_replays_to_on_hand() {
    let app = TestApp::new().await;
    let ledger = &app.services.stock_ledger;
    let (company, part) = (Uuid::new_v4(), Uuid::new_v4());
    let (location_a, location_b) = (Uuid::new_v4(), Uuid::new_v4());

    ledger
        .adjust(
            company,
            part,
            location_a,
            20,
            TransactionKind::Receipt,
            opts_with_cost(dec!(3)),
        )
        .await
        .unwrap();
    ledger
        .adjust(company, part, location_a, 6, TransactionKind::Issue, opts())
        .await
        .unwrap();
    ledger
        .adjust(
            company,
            part,
            location_a,
            2,
            TransactionKind::Return,
            opts(),
        )
        .await
        .unwrap();
    ledger
        .transfer(company, part, location_a, location_b, 5, opts())
        .await
        .unwrap();
    ledger
        .count(company, part, location_b, 4, opts())
        .await
        .unwrap();

    for location in [location_a, location_b] {
        let stock = ledger
            .get_stock(company, part, location)
            .await
            .unwrap()
            .unwrap();
        let transactions = ledger
            .list_transactions(
                company,
                TransactionFilter {
                    part_id: Some(part),
                    location_id: Some(location),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let replayed: i32 = transactions.iter().map(|t| t.quantity).sum();
        assert_eq!(
            replayed, stock.on_hand,
            "ledger does not replay to on hand at location {}",
            location
        );
        assert_eq!(stock.available, stock.on_hand - stock.reserved);
    }
}
