use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// One immutable ledger entry. Rows are append-only: no update or delete path
/// exists anywhere in the crate; corrections are new movements.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Uuid")]
    pub id: Uuid,
    pub scope_id: Uuid,
    pub movement_type: String,
    pub item_id: Uuid,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    pub quantity: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Closed set of movement types stored in the `movement_type` column.
///
/// The type determines which locations are required and which direction the
/// affected balances move: entries add to `to`, exits subtract from `from`,
/// transfers do both, adjustments are signed by whichever side is set.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StockMovementType {
    EntryPurchase,
    EntryReturn,
    Transfer,
    ExitConsumption,
    ExitLoss,
    InventoryAdjustment,
}

impl StockMovementType {
    pub fn requires_from(&self) -> bool {
        matches!(self, Self::ExitConsumption | Self::ExitLoss | Self::Transfer)
    }

    pub fn requires_to(&self) -> bool {
        matches!(self, Self::EntryPurchase | Self::EntryReturn | Self::Transfer)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_item::Entity",
        from = "Column::ItemId",
        to = "super::stock_item::Column::Id"
    )]
    StockItem,
}

impl Related<super::stock_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
