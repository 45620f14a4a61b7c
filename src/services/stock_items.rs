use crate::{
    entities::stock_item::{self, Entity as StockItem},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewStockItem {
    pub scope_id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit: String,
    pub min_quantity: i64,
    pub serial_tracked: bool,
}

/// Metadata edits only. SKU and scope are fixed once the item exists.
#[derive(Debug, Clone, Default)]
pub struct UpdateStockItem {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub min_quantity: Option<i64>,
    pub serial_tracked: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub scope_id: Option<Uuid>,
    pub search: Option<String>,
    pub active_only: bool,
}

/// Thin catalog CRUD over stock items. The ledger only reads from here.
#[derive(Clone)]
pub struct StockItemService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl StockItemService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, item), fields(sku = %item.sku))]
    pub async fn create_item(&self, item: NewStockItem) -> Result<stock_item::Model, ServiceError> {
        let existing = StockItem::find()
            .filter(stock_item::Column::ScopeId.eq(item.scope_id))
            .filter(stock_item::Column::Sku.eq(item.sku.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(ServiceError::DuplicateSku(item.sku));
        }

        let now = Utc::now();
        let sku = item.sku.clone();
        let inserted = stock_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            scope_id: Set(item.scope_id),
            sku: Set(item.sku),
            name: Set(item.name),
            unit: Set(item.unit),
            min_quantity: Set(item.min_quantity),
            serial_tracked: Set(item.serial_tracked),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await;

        // A concurrent create can slip past the pre-check; the unique index
        // on (scope_id, sku) is the arbiter.
        let created = match inserted {
            Ok(created) => created,
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                return Err(ServiceError::DuplicateSku(sku));
            }
            Err(e) => return Err(e.into()),
        };

        info!(item_id = %created.id, sku = %created.sku, "stock item created");
        if let Err(e) = self
            .event_sender
            .send(Event::StockItemCreated(created.id))
            .await
        {
            warn!(error = %e, "failed to emit item created event");
        }
        Ok(created)
    }

    pub async fn get_item(&self, id: Uuid) -> Result<stock_item::Model, ServiceError> {
        StockItem::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", id)))
    }

    pub async fn update_item(
        &self,
        id: Uuid,
        changes: UpdateStockItem,
    ) -> Result<stock_item::Model, ServiceError> {
        let item = self.get_item(id).await?;
        let mut active: stock_item::ActiveModel = item.into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(unit) = changes.unit {
            active.unit = Set(unit);
        }
        if let Some(min_quantity) = changes.min_quantity {
            active.min_quantity = Set(min_quantity);
        }
        if let Some(serial_tracked) = changes.serial_tracked {
            active.serial_tracked = Set(serial_tracked);
        }
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Soft delete. Movements referencing the item stay valid; new movements
    /// against it are refused by the coordinator.
    pub async fn deactivate_item(&self, id: Uuid) -> Result<stock_item::Model, ServiceError> {
        let item = self.get_item(id).await?;
        let mut active: stock_item::ActiveModel = item.into();
        active.active = Set(false);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db.as_ref()).await?;

        if let Err(e) = self
            .event_sender
            .send(Event::StockItemDeactivated(updated.id))
            .await
        {
            warn!(error = %e, "failed to emit item deactivated event");
        }
        Ok(updated)
    }

    pub async fn list_items(
        &self,
        filter: ItemFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_item::Model>, u64), ServiceError> {
        let mut query = StockItem::find();
        if let Some(scope_id) = filter.scope_id {
            query = query.filter(stock_item::Column::ScopeId.eq(scope_id));
        }
        if let Some(search) = filter.search.as_deref() {
            query = query.filter(
                Condition::any()
                    .add(stock_item::Column::Sku.contains(search))
                    .add(stock_item::Column::Name.contains(search)),
            );
        }
        if filter.active_only {
            query = query.filter(stock_item::Column::Active.eq(true));
        }

        let paginator = query
            .order_by_asc(stock_item::Column::Sku)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }
}
