pub mod health;
pub mod inventory_counts;
pub mod stock_balances;
pub mod stock_items;
pub mod stock_locations;
pub mod stock_movements;
