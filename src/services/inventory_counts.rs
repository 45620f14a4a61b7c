use crate::{
    entities::stock_balance::{self, Entity as StockBalance},
    entities::stock_item::{self, Entity as StockItem},
    entities::stock_location::{self, Entity as StockLocation},
    entities::stock_movement::StockMovementType,
    errors::ServiceError,
    events::{Event, EventSender},
    services::stock_movements::{NewStockMovement, StockMovementService},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// A physical count to reconcile against the materialized balance.
#[derive(Debug, Clone)]
pub struct InventoryCountRequest {
    pub scope_id: Uuid,
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub counted_quantity: i64,
    pub notes: Option<String>,
    pub performed_by: String,
}

/// Result of a reconciliation pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct InventoryCountOutcome {
    pub previous_quantity: i64,
    pub counted_quantity: i64,
    pub delta: i64,
    pub adjustment_made: bool,
    pub movement_id: Option<Uuid>,
}

/// Reconciles physical counts by synthesizing adjustment movements through
/// the movement coordinator. Holds no write logic of its own.
#[derive(Clone)]
pub struct InventoryCountService {
    db: Arc<DatabaseConnection>,
    movements: StockMovementService,
    event_sender: EventSender,
}

impl InventoryCountService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        movements: StockMovementService,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            movements,
            event_sender,
        }
    }

    /// Compares `counted_quantity` against the current balance and, when they
    /// differ, records an INVENTORY_ADJUSTMENT for the difference. An equal
    /// count creates no ledger row.
    #[instrument(skip(self, req), fields(item_id = %req.item_id, location_id = %req.location_id))]
    pub async fn perform_count(
        &self,
        req: InventoryCountRequest,
    ) -> Result<InventoryCountOutcome, ServiceError> {
        if req.counted_quantity < 0 {
            return Err(ServiceError::ValidationError(format!(
                "Counted quantity cannot be negative, got {}",
                req.counted_quantity
            )));
        }

        // A matching count skips the coordinator entirely, so reference
        // checks must happen here for the no-op path too.
        let db = self.db.as_ref();
        StockItem::find_by_id(req.item_id)
            .filter(stock_item::Column::ScopeId.eq(req.scope_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stock item {} not found", req.item_id))
            })?;
        StockLocation::find_by_id(req.location_id)
            .filter(stock_location::Column::ScopeId.eq(req.scope_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stock location {} not found", req.location_id))
            })?;

        // Absent balance row means nothing has ever moved here: quantity 0.
        let previous_quantity = StockBalance::find()
            .filter(stock_balance::Column::ItemId.eq(req.item_id))
            .filter(stock_balance::Column::LocationId.eq(req.location_id))
            .one(self.db.as_ref())
            .await?
            .map(|b| b.quantity)
            .unwrap_or(0);

        let delta = req.counted_quantity - previous_quantity;
        if delta == 0 {
            info!("count matches balance, no adjustment recorded");
            return Ok(InventoryCountOutcome {
                previous_quantity,
                counted_quantity: req.counted_quantity,
                delta: 0,
                adjustment_made: false,
                movement_id: None,
            });
        }

        // Positive delta adds stock at the location, negative removes it. The
        // coordinator revalidates under the row lock, so a negative delta that
        // races with a concurrent exit still fails with InsufficientStock.
        let (from_location_id, to_location_id) = if delta > 0 {
            (None, Some(req.location_id))
        } else {
            (Some(req.location_id), None)
        };

        let detail = self
            .movements
            .create_movement(NewStockMovement {
                scope_id: req.scope_id,
                movement_type: StockMovementType::InventoryAdjustment,
                item_id: req.item_id,
                from_location_id,
                to_location_id,
                ticket_id: None,
                quantity: delta.abs(),
                unit_cost: None,
                notes: req.notes,
                performed_by: req.performed_by,
                performed_at: None,
            })
            .await?;

        let outcome = InventoryCountOutcome {
            previous_quantity,
            counted_quantity: req.counted_quantity,
            delta,
            adjustment_made: true,
            movement_id: Some(detail.movement.id),
        };

        if let Err(e) = self
            .event_sender
            .send(Event::InventoryCountReconciled {
                scope_id: req.scope_id,
                item_id: req.item_id,
                location_id: req.location_id,
                previous_quantity,
                counted_quantity: req.counted_quantity,
                delta,
                movement_id: outcome.movement_id,
            })
            .await
        {
            warn!(error = %e, "failed to emit inventory count event");
        }

        Ok(outcome)
    }
}
