pub mod inventory_counts;
pub mod stock_balances;
pub mod stock_items;
pub mod stock_locations;
pub mod stock_movements;

pub use inventory_counts::InventoryCountService;
pub use stock_balances::StockBalanceService;
pub use stock_items::StockItemService;
pub use stock_locations::StockLocationService;
pub use stock_movements::StockMovementService;
