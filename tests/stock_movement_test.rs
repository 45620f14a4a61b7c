mod common;

use assert_matches::assert_matches;
use common::{balance_of, movement, seed_item, seed_location, setup};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use stockledger_api::{
    entities::{
        stock_movement::{self, Entity as StockMovement, StockMovementType},
        StockBalance,
    },
    errors::ServiceError,
    services::stock_items::NewStockItem,
    services::stock_movements::MovementFilter,
};
use uuid::Uuid;

use StockMovementType::*;

async fn ledger_len(ctx: &common::TestCtx) -> u64 {
    StockMovement::find()
        .count(ctx.db.as_ref())
        .await
        .expect("count failed")
}

#[tokio::test]
async fn entry_transfer_exit_scenario() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "CABLE-CAT6").await;
    let a = seed_location(&ctx, scope, "Main Warehouse").await;
    let b = seed_location(&ctx, scope, "Field Van").await;

    // Entry purchase of 10 into A
    let detail = ctx
        .services
        .movements
        .create_movement(movement(scope, EntryPurchase, item.id, None, Some(a.id), 10))
        .await
        .expect("entry failed");
    assert_eq!(detail.movement.quantity, 10);
    assert_eq!(detail.item.sku, "CABLE-CAT6");
    assert_eq!(balance_of(&ctx, item.id, a.id).await, 10);

    // Transfer 4 from A to B conserves total
    ctx.services
        .movements
        .create_movement(movement(scope, Transfer, item.id, Some(a.id), Some(b.id), 4))
        .await
        .expect("transfer failed");
    assert_eq!(balance_of(&ctx, item.id, a.id).await, 6);
    assert_eq!(balance_of(&ctx, item.id, b.id).await, 4);

    // Over-draw fails with InsufficientStock and changes nothing
    let before = ledger_len(&ctx).await;
    let err = ctx
        .services
        .movements
        .create_movement(movement(scope, ExitConsumption, item.id, Some(a.id), None, 100))
        .await
        .expect_err("exit should fail");
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            available: 6,
            requested: 100
        }
    );
    assert_eq!(balance_of(&ctx, item.id, a.id).await, 6);
    assert_eq!(ledger_len(&ctx).await, before, "failed exit must not append");
}

#[tokio::test]
async fn transfer_to_same_location_is_rejected_before_any_write() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "ROUTER-X1").await;
    let a = seed_location(&ctx, scope, "Depot").await;

    let err = ctx
        .services
        .movements
        .create_movement(movement(scope, Transfer, item.id, Some(a.id), Some(a.id), 1))
        .await
        .expect_err("same-location transfer should fail");
    assert_matches!(err, ServiceError::TransferSameLocation);
    assert_eq!(ledger_len(&ctx).await, 0);
}

#[tokio::test]
async fn missing_references_are_not_found_with_no_side_effect() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "SWITCH-24P").await;
    let a = seed_location(&ctx, scope, "Depot").await;

    let err = ctx
        .services
        .movements
        .create_movement(movement(scope, EntryPurchase, Uuid::new_v4(), None, Some(a.id), 5))
        .await
        .expect_err("unknown item should fail");
    assert_matches!(err, ServiceError::NotFound(_));

    let err = ctx
        .services
        .movements
        .create_movement(movement(scope, EntryPurchase, item.id, None, Some(Uuid::new_v4()), 5))
        .await
        .expect_err("unknown location should fail");
    assert_matches!(err, ServiceError::NotFound(_));

    // Scope mismatch is indistinguishable from absence
    let err = ctx
        .services
        .movements
        .create_movement(movement(Uuid::new_v4(), EntryPurchase, item.id, None, Some(a.id), 5))
        .await
        .expect_err("foreign scope should fail");
    assert_matches!(err, ServiceError::NotFound(_));

    assert_eq!(ledger_len(&ctx).await, 0);
}

#[tokio::test]
async fn entry_overflow_is_rejected_without_wrapping() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "BULK-SAND").await;
    let a = seed_location(&ctx, scope, "Depot").await;

    ctx.services
        .movements
        .create_movement(movement(scope, EntryPurchase, item.id, None, Some(a.id), i64::MAX))
        .await
        .expect("entry failed");
    assert_eq!(balance_of(&ctx, item.id, a.id).await, i64::MAX);

    // A second strictly-positive entry would wrap the balance negative;
    // it must fail typed and leave ledger and balance untouched.
    let before = ledger_len(&ctx).await;
    let err = ctx
        .services
        .movements
        .create_movement(movement(scope, EntryPurchase, item.id, None, Some(a.id), 1))
        .await
        .expect_err("overflowing entry should fail");
    assert_matches!(
        err,
        ServiceError::BalanceOverflow {
            current: i64::MAX,
            requested: 1
        }
    );
    assert_eq!(balance_of(&ctx, item.id, a.id).await, i64::MAX);
    assert_eq!(ledger_len(&ctx).await, before, "failed entry must not append");
}

#[tokio::test]
async fn unit_cost_round_trips_through_the_ledger() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "COPPER-WIRE").await;
    let a = seed_location(&ctx, scope, "Depot").await;

    let mut req = movement(scope, EntryPurchase, item.id, None, Some(a.id), 3);
    req.unit_cost = Some(Decimal::new(125_000, 4)); // 12.5000

    let detail = ctx
        .services
        .movements
        .create_movement(req)
        .await
        .expect("entry failed");

    let fetched = ctx
        .services
        .movements
        .get_movement(detail.movement.id)
        .await
        .expect("get failed");
    assert_eq!(fetched.movement.unit_cost, Some(Decimal::new(125_000, 4)));
}

#[tokio::test]
async fn exit_from_empty_pair_is_insufficient_stock() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "PATCH-1M").await;
    let a = seed_location(&ctx, scope, "Depot").await;

    let err = ctx
        .services
        .movements
        .create_movement(movement(scope, ExitLoss, item.id, Some(a.id), None, 1))
        .await
        .expect_err("exit without balance should fail");
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            available: 0,
            requested: 1
        }
    );
}

#[tokio::test]
async fn inactive_item_is_refused() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "OLD-PART").await;
    let a = seed_location(&ctx, scope, "Depot").await;
    ctx.services
        .items
        .deactivate_item(item.id)
        .await
        .expect("deactivate failed");

    let err = ctx
        .services
        .movements
        .create_movement(movement(scope, EntryPurchase, item.id, None, Some(a.id), 1))
        .await
        .expect_err("inactive item should be refused");
    assert_matches!(err, ServiceError::ValidationError(_));
}

#[tokio::test]
async fn duplicate_sku_within_scope_conflicts() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    seed_item(&ctx, scope, "UNIQ-1").await;

    let err = ctx
        .services
        .items
        .create_item(NewStockItem {
            scope_id: scope,
            sku: "UNIQ-1".to_string(),
            name: "Duplicate".to_string(),
            unit: "EA".to_string(),
            min_quantity: 0,
            serial_tracked: false,
        })
        .await
        .expect_err("duplicate SKU should fail");
    assert_matches!(err, ServiceError::DuplicateSku(sku) if sku == "UNIQ-1");

    // Same SKU in another scope is fine
    seed_item(&ctx, Uuid::new_v4(), "UNIQ-1").await;
}

#[tokio::test]
async fn ledger_replay_matches_materialized_balances() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "FIBER-SC").await;
    let a = seed_location(&ctx, scope, "Warehouse A").await;
    let b = seed_location(&ctx, scope, "Warehouse B").await;

    for req in [
        movement(scope, EntryPurchase, item.id, None, Some(a.id), 50),
        movement(scope, EntryReturn, item.id, None, Some(a.id), 3),
        movement(scope, Transfer, item.id, Some(a.id), Some(b.id), 20),
        movement(scope, ExitConsumption, item.id, Some(b.id), None, 5),
        movement(scope, ExitLoss, item.id, Some(a.id), None, 2),
        movement(scope, InventoryAdjustment, item.id, None, Some(b.id), 7),
        movement(scope, InventoryAdjustment, item.id, Some(a.id), None, 1),
    ] {
        ctx.services
            .movements
            .create_movement(req)
            .await
            .expect("movement failed");
    }

    let movements = StockMovement::find()
        .filter(stock_movement::Column::ItemId.eq(item.id))
        .all(ctx.db.as_ref())
        .await
        .expect("listing failed");

    for loc in [a.id, b.id] {
        let replayed: i64 = movements
            .iter()
            .map(|m| {
                let mut signed = 0;
                if m.to_location_id == Some(loc) {
                    signed += m.quantity;
                }
                if m.from_location_id == Some(loc) {
                    signed -= m.quantity;
                }
                signed
            })
            .sum();
        assert_eq!(
            replayed,
            balance_of(&ctx, item.id, loc).await,
            "replay mismatch at location {loc}"
        );
    }

    // Every balance row stayed non-negative
    let balances = StockBalance::find()
        .all(ctx.db.as_ref())
        .await
        .expect("balance listing failed");
    assert!(balances.iter().all(|b| b.quantity >= 0));
}

#[tokio::test]
async fn listing_filters_by_type_and_location() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "JACK-RJ45").await;
    let a = seed_location(&ctx, scope, "Depot").await;
    let b = seed_location(&ctx, scope, "Van").await;

    ctx.services
        .movements
        .create_movement(movement(scope, EntryPurchase, item.id, None, Some(a.id), 8))
        .await
        .expect("entry failed");
    ctx.services
        .movements
        .create_movement(movement(scope, Transfer, item.id, Some(a.id), Some(b.id), 3))
        .await
        .expect("transfer failed");

    let (entries, total) = ctx
        .services
        .movements
        .list_movements(
            MovementFilter {
                scope_id: Some(scope),
                movement_type: Some(EntryPurchase),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .expect("listing failed");
    assert_eq!(total, 1);
    assert_eq!(entries[0].movement_type, "ENTRY_PURCHASE");

    // Location filter matches either side
    let (touching_b, total_b) = ctx
        .services
        .movements
        .list_movements(
            MovementFilter {
                location_id: Some(b.id),
                ..Default::default()
            },
            1,
            20,
        )
        .await
        .expect("listing failed");
    assert_eq!(total_b, 1);
    assert_eq!(touching_b[0].movement_type, "TRANSFER");

    let fetched = ctx
        .services
        .movements
        .get_movement(entries[0].id)
        .await
        .expect("get failed");
    assert_eq!(fetched.to_location.expect("to location").id, a.id);
}
