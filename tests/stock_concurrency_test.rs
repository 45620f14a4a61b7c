mod common;

use common::{balance_of, movement, seed_item, seed_location, setup};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use stockledger_api::{
    entities::{stock_balance, stock_movement::StockMovementType, StockBalance},
    errors::ServiceError,
    services::{stock_items::NewStockItem, stock_movements::NewStockMovement},
};
use uuid::Uuid;

use StockMovementType::*;

/// Two exits of the full balance racing each other: exactly one commits, the
/// other observes the post-commit value and fails with InsufficientStock.
#[tokio::test]
async fn concurrent_exits_never_overdraw() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "RACE-PART").await;
    let loc = seed_location(&ctx, scope, "Depot").await;

    ctx.services
        .movements
        .create_movement(movement(scope, EntryPurchase, item.id, None, Some(loc.id), 5))
        .await
        .expect("seed entry failed");

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let svc = ctx.services.movements.clone();
        let req: NewStockMovement =
            movement(scope, ExitConsumption, item.id, Some(loc.id), None, 5);
        tasks.push(tokio::spawn(async move { svc.create_movement(req).await }));
    }

    let mut successes = 0;
    let mut insufficient = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(ServiceError::InsufficientStock { .. }) => insufficient += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(successes, 1, "exactly one exit must commit");
    assert_eq!(insufficient, 1, "the loser must see insufficient stock");
    assert_eq!(balance_of(&ctx, item.id, loc.id).await, 0);
}

/// Many small exits against a finite balance: the number of successes equals
/// the seeded quantity and the balance ends at zero, never negative.
#[tokio::test]
async fn concurrent_unit_exits_drain_exactly_to_zero() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "DRAIN-PART").await;
    let loc = seed_location(&ctx, scope, "Depot").await;

    ctx.services
        .movements
        .create_movement(movement(scope, EntryPurchase, item.id, None, Some(loc.id), 10))
        .await
        .expect("seed entry failed");

    let mut tasks = Vec::new();
    for _ in 0..20 {
        let svc = ctx.services.movements.clone();
        let req = movement(scope, ExitConsumption, item.id, Some(loc.id), None, 1);
        tasks.push(tokio::spawn(async move { svc.create_movement(req).await }));
    }

    let mut successes = 0;
    for task in tasks {
        if task.await.expect("task panicked").is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 10, "exactly ten unit exits should succeed");
    assert_eq!(balance_of(&ctx, item.id, loc.id).await, 0);
}

/// First movements on an untouched pair race to create its balance row; both
/// must commit onto a single row holding their sum, with no unique-index
/// failure surfacing to either caller.
#[tokio::test]
async fn concurrent_first_entries_share_one_balance_row() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "FRESH-PART").await;
    let loc = seed_location(&ctx, scope, "Depot").await;

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let svc = ctx.services.movements.clone();
        let req = movement(scope, EntryPurchase, item.id, None, Some(loc.id), 5);
        tasks.push(tokio::spawn(async move { svc.create_movement(req).await }));
    }
    for task in tasks {
        task.await
            .expect("task panicked")
            .expect("first entry should commit");
    }

    assert_eq!(balance_of(&ctx, item.id, loc.id).await, 10);
    let rows = StockBalance::find()
        .filter(stock_balance::Column::ItemId.eq(item.id))
        .filter(stock_balance::Column::LocationId.eq(loc.id))
        .count(ctx.db.as_ref())
        .await
        .expect("count failed");
    assert_eq!(rows, 1, "the pair must hold exactly one balance row");
}

/// Racing duplicate item creates must resolve to one success and one
/// DuplicateSku conflict, never a bare database error.
#[tokio::test]
async fn concurrent_duplicate_item_creates_conflict() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();

    let mut tasks = Vec::new();
    for _ in 0..2 {
        let svc = ctx.services.items.clone();
        tasks.push(tokio::spawn(async move {
            svc.create_item(NewStockItem {
                scope_id: scope,
                sku: "RACE-SKU".to_string(),
                name: "Raced".to_string(),
                unit: "EA".to_string(),
                min_quantity: 0,
                serial_tracked: false,
            })
            .await
        }));
    }

    let mut successes = 0;
    let mut conflicts = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(_) => successes += 1,
            Err(ServiceError::DuplicateSku(sku)) => {
                assert_eq!(sku, "RACE-SKU");
                conflicts += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 1);
}

/// Opposing transfers between the same two locations must both complete
/// (deterministic lock order, no deadlock) and conserve total quantity.
#[tokio::test]
async fn opposing_transfers_conserve_and_complete() {
    let ctx = setup().await;
    let scope = Uuid::new_v4();
    let item = seed_item(&ctx, scope, "SWAP-PART").await;
    let a = seed_location(&ctx, scope, "Site A").await;
    let b = seed_location(&ctx, scope, "Site B").await;

    for loc in [a.id, b.id] {
        ctx.services
            .movements
            .create_movement(movement(scope, EntryPurchase, item.id, None, Some(loc), 10))
            .await
            .expect("seed entry failed");
    }

    let mut tasks = Vec::new();
    for (from, to) in [(a.id, b.id), (b.id, a.id)] {
        let svc = ctx.services.movements.clone();
        let req = movement(scope, Transfer, item.id, Some(from), Some(to), 3);
        tasks.push(tokio::spawn(async move { svc.create_movement(req).await }));
    }
    for task in tasks {
        task.await
            .expect("task panicked")
            .expect("transfer should commit");
    }

    let total =
        balance_of(&ctx, item.id, a.id).await + balance_of(&ctx, item.id, b.id).await;
    assert_eq!(total, 20, "transfers must conserve total quantity");
    assert_eq!(balance_of(&ctx, item.id, a.id).await, 10);
    assert_eq!(balance_of(&ctx, item.id, b.id).await, 10);
}
