pub mod stock_balance;
pub mod stock_item;
pub mod stock_location;
pub mod stock_movement;

pub use stock_balance::Entity as StockBalance;
pub use stock_item::Entity as StockItem;
pub use stock_location::Entity as StockLocation;
pub use stock_movement::Entity as StockMovement;
