#![allow(dead_code)]

use sea_orm::DatabaseConnection;
use std::sync::Arc;
use stockledger_api::{
    db::{establish_connection, run_migrations, DbConfig},
    entities::{
        stock_item,
        stock_location::{self, LocationKind},
        stock_movement::StockMovementType,
    },
    events::EventSender,
    services::{
        stock_items::NewStockItem, stock_locations::NewStockLocation,
        stock_movements::NewStockMovement,
    },
    AppServices,
};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Test harness over a private in-memory SQLite database.
///
/// A single pooled connection keeps every statement on one database and
/// serializes concurrent transactions the way a row lock would.
pub struct TestCtx {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    _event_rx: mpsc::Receiver<stockledger_api::events::Event>,
}

pub async fn setup() -> TestCtx {
    let config = DbConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
        min_connections: 1,
        ..Default::default()
    };
    let pool = establish_connection(&config)
        .await
        .expect("failed to open in-memory database");
    run_migrations(&pool).await.expect("migrations failed");

    let db = Arc::new(pool);
    let (tx, rx) = mpsc::channel(100);
    let event_sender = EventSender::new(tx);
    let services = AppServices::build(db.clone(), event_sender);

    TestCtx {
        db,
        services,
        _event_rx: rx,
    }
}

pub async fn seed_item(ctx: &TestCtx, scope_id: Uuid, sku: &str) -> stock_item::Model {
    ctx.services
        .items
        .create_item(NewStockItem {
            scope_id,
            sku: sku.to_string(),
            name: format!("Item {sku}"),
            unit: "EA".to_string(),
            min_quantity: 0,
            serial_tracked: false,
        })
        .await
        .expect("failed to seed item")
}

pub async fn seed_location(ctx: &TestCtx, scope_id: Uuid, name: &str) -> stock_location::Model {
    ctx.services
        .locations
        .create_location(NewStockLocation {
            scope_id,
            kind: LocationKind::Warehouse,
            name: name.to_string(),
        })
        .await
        .expect("failed to seed location")
}

/// Shorthand for a movement request with test defaults.
pub fn movement(
    scope_id: Uuid,
    movement_type: StockMovementType,
    item_id: Uuid,
    from: Option<Uuid>,
    to: Option<Uuid>,
    quantity: i64,
) -> NewStockMovement {
    NewStockMovement {
        scope_id,
        movement_type,
        item_id,
        from_location_id: from,
        to_location_id: to,
        ticket_id: None,
        quantity,
        unit_cost: None,
        notes: None,
        performed_by: "tester".to_string(),
        performed_at: None,
    }
}

pub async fn balance_of(ctx: &TestCtx, item_id: Uuid, location_id: Uuid) -> i64 {
    match ctx.services.balances.get_balance(item_id, location_id).await {
        Ok(b) => b.quantity,
        Err(_) => 0,
    }
}
