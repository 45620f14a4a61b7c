use crate::{
    entities::{
        stock_balance::{self, Entity as StockBalance},
        stock_item, stock_location,
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Display row for the balance listing: the materialized quantity joined with
/// item and location identity. Read-side convenience only; the core invariant
/// lives on the `stock_balances` row itself.
#[derive(Debug, Clone, Serialize, FromQueryResult, ToSchema)]
pub struct BalanceView {
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
    pub sku: String,
    pub item_name: String,
    pub unit: String,
    pub min_quantity: i64,
    pub location_name: String,
    pub location_kind: String,
}

/// Filters for the balance listing. Everything binds as a query parameter;
/// no SQL is built from strings.
#[derive(Debug, Clone, Default)]
pub struct BalanceFilter {
    pub scope_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    /// Substring match on item SKU or name.
    pub search: Option<String>,
    /// Only pairs at or below the item's minimum quantity.
    pub low_stock_only: bool,
}

/// Read-side access to materialized balances.
#[derive(Clone)]
pub struct StockBalanceService {
    db: Arc<DatabaseConnection>,
}

impl StockBalanceService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Current balance for one (item, location) pair.
    pub async fn get_balance(
        &self,
        item_id: Uuid,
        location_id: Uuid,
    ) -> Result<stock_balance::Model, ServiceError> {
        StockBalance::find()
            .filter(stock_balance::Column::ItemId.eq(item_id))
            .filter(stock_balance::Column::LocationId.eq(location_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "No balance for item {} at location {}",
                    item_id, location_id
                ))
            })
    }

    /// Lists balances joined with item/location display fields.
    pub async fn list_balances(
        &self,
        filter: BalanceFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<BalanceView>, u64), ServiceError> {
        let mut query = StockBalance::find()
            .select_only()
            .column(stock_balance::Column::ItemId)
            .column(stock_balance::Column::LocationId)
            .column(stock_balance::Column::Quantity)
            .column(stock_balance::Column::UpdatedAt)
            .column_as(stock_item::Column::Sku, "sku")
            .column_as(stock_item::Column::Name, "item_name")
            .column_as(stock_item::Column::Unit, "unit")
            .column_as(stock_item::Column::MinQuantity, "min_quantity")
            .column_as(stock_location::Column::Name, "location_name")
            .column_as(stock_location::Column::Kind, "location_kind")
            .join(JoinType::InnerJoin, stock_balance::Relation::StockItem.def())
            .join(
                JoinType::InnerJoin,
                stock_balance::Relation::StockLocation.def(),
            );

        if let Some(scope_id) = filter.scope_id {
            query = query.filter(stock_balance::Column::ScopeId.eq(scope_id));
        }
        if let Some(item_id) = filter.item_id {
            query = query.filter(stock_balance::Column::ItemId.eq(item_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(stock_balance::Column::LocationId.eq(location_id));
        }
        if let Some(search) = filter.search.as_deref() {
            query = query.filter(
                Condition::any()
                    .add(stock_item::Column::Sku.contains(search))
                    .add(stock_item::Column::Name.contains(search)),
            );
        }
        if filter.low_stock_only {
            query = query.filter(
                Expr::col((stock_balance::Entity, stock_balance::Column::Quantity)).lte(Expr::col(
                    (stock_item::Entity, stock_item::Column::MinQuantity),
                )),
            );
        }

        let paginator = query
            .order_by_asc(stock_item::Column::Sku)
            .into_model::<BalanceView>()
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((rows, total))
    }
}
