use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stock Ledger API",
        description = "Append-only stock movement ledger with materialized per-location balances",
        version = "0.1.0"
    ),
    paths(
        crate::handlers::stock_movements::create_movement,
        crate::handlers::stock_movements::get_movement,
        crate::handlers::stock_movements::list_movements,
        crate::handlers::stock_balances::get_balance,
        crate::handlers::stock_balances::list_balances,
        crate::handlers::inventory_counts::perform_count,
        crate::handlers::stock_items::create_item,
        crate::handlers::stock_items::get_item,
        crate::handlers::stock_items::update_item,
        crate::handlers::stock_items::deactivate_item,
        crate::handlers::stock_items::list_items,
        crate::handlers::stock_locations::create_location,
        crate::handlers::stock_locations::get_location,
        crate::handlers::stock_locations::rename_location,
        crate::handlers::stock_locations::deactivate_location,
        crate::handlers::stock_locations::list_locations,
        crate::handlers::health::health_check,
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::entities::stock_movement::StockMovementType,
        crate::entities::stock_location::LocationKind,
        crate::handlers::stock_movements::CreateMovementRequest,
        crate::handlers::stock_movements::MovementResponse,
        crate::handlers::stock_movements::LocationRef,
        crate::handlers::stock_balances::BalanceResponse,
        crate::handlers::inventory_counts::PerformCountRequest,
        crate::handlers::stock_items::CreateItemRequest,
        crate::handlers::stock_items::UpdateItemRequest,
        crate::handlers::stock_locations::CreateLocationRequest,
        crate::handlers::stock_locations::RenameLocationRequest,
        crate::services::stock_balances::BalanceView,
        crate::services::inventory_counts::InventoryCountOutcome,
    )),
    tags(
        (name = "stock-movements", description = "Append-only movement ledger"),
        (name = "stock-balances", description = "Materialized balances"),
        (name = "inventory-counts", description = "Physical count reconciliation"),
        (name = "stock-items", description = "Item catalog"),
        (name = "stock-locations", description = "Location registry"),
        (name = "health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
