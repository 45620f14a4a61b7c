use crate::{
    entities::stock_location::{self, Entity as StockLocation, LocationKind},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewStockLocation {
    pub scope_id: Uuid,
    pub kind: LocationKind,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    pub scope_id: Option<Uuid>,
    pub kind: Option<LocationKind>,
    pub active_only: bool,
}

/// Thin registry CRUD over storage locations.
#[derive(Clone)]
pub struct StockLocationService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl StockLocationService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, location), fields(name = %location.name))]
    pub async fn create_location(
        &self,
        location: NewStockLocation,
    ) -> Result<stock_location::Model, ServiceError> {
        let now = Utc::now();
        let created = stock_location::ActiveModel {
            id: Set(Uuid::new_v4()),
            scope_id: Set(location.scope_id),
            kind: Set(location.kind.as_ref().to_string()),
            name: Set(location.name),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(self.db.as_ref())
        .await?;

        info!(location_id = %created.id, "stock location created");
        if let Err(e) = self
            .event_sender
            .send(Event::StockLocationCreated(created.id))
            .await
        {
            warn!(error = %e, "failed to emit location created event");
        }
        Ok(created)
    }

    pub async fn get_location(&self, id: Uuid) -> Result<stock_location::Model, ServiceError> {
        StockLocation::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock location {} not found", id)))
    }

    pub async fn rename_location(
        &self,
        id: Uuid,
        name: String,
    ) -> Result<stock_location::Model, ServiceError> {
        let location = self.get_location(id).await?;
        let mut active: stock_location::ActiveModel = location.into();
        active.name = Set(name);
        active.updated_at = Set(Utc::now());
        Ok(active.update(self.db.as_ref()).await?)
    }

    /// Soft delete; balances at this location remain readable.
    pub async fn deactivate_location(
        &self,
        id: Uuid,
    ) -> Result<stock_location::Model, ServiceError> {
        let location = self.get_location(id).await?;
        let mut active: stock_location::ActiveModel = location.into();
        active.active = Set(false);
        active.updated_at = Set(Utc::now());
        let updated = active.update(self.db.as_ref()).await?;

        if let Err(e) = self
            .event_sender
            .send(Event::StockLocationDeactivated(updated.id))
            .await
        {
            warn!(error = %e, "failed to emit location deactivated event");
        }
        Ok(updated)
    }

    pub async fn list_locations(
        &self,
        filter: LocationFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_location::Model>, u64), ServiceError> {
        let mut query = StockLocation::find();
        if let Some(scope_id) = filter.scope_id {
            query = query.filter(stock_location::Column::ScopeId.eq(scope_id));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(stock_location::Column::Kind.eq(kind.as_ref()));
        }
        if filter.active_only {
            query = query.filter(stock_location::Column::Active.eq(true));
        }

        let paginator = query
            .order_by_asc(stock_location::Column::Name)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let locations = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((locations, total))
    }
}
