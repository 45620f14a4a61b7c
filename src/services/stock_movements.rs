use crate::{
    entities::{
        stock_balance::{self, Entity as StockBalance},
        stock_item::{self, Entity as StockItem},
        stock_location::{self, Entity as StockLocation},
        stock_movement::{self, Entity as StockMovement, StockMovementType},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionError, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// A requested movement, before validation.
#[derive(Debug, Clone)]
pub struct NewStockMovement {
    pub scope_id: Uuid,
    pub movement_type: StockMovementType,
    pub item_id: Uuid,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub performed_by: String,
    pub performed_at: Option<DateTime<Utc>>,
}

/// A committed movement with its relations resolved.
#[derive(Debug, Clone)]
pub struct StockMovementDetail {
    pub movement: stock_movement::Model,
    pub item: stock_item::Model,
    pub from_location: Option<stock_location::Model>,
    pub to_location: Option<stock_location::Model>,
}

/// Filters for the ledger listing.
#[derive(Debug, Clone, Default)]
pub struct MovementFilter {
    pub scope_id: Option<Uuid>,
    pub movement_type: Option<StockMovementType>,
    pub item_id: Option<Uuid>,
    /// Matches movements touching the location on either side.
    pub location_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    pub performed_after: Option<DateTime<Utc>>,
    pub performed_before: Option<DateTime<Utc>>,
}

/// Structural validation of a movement request. Runs before any lookup or
/// transaction; quantity is checked first.
pub fn validate_movement(
    movement_type: StockMovementType,
    from_location_id: Option<Uuid>,
    to_location_id: Option<Uuid>,
    quantity: i64,
) -> Result<(), ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::NonPositiveQuantity(quantity));
    }

    if movement_type.requires_from() && from_location_id.is_none() {
        return Err(ServiceError::MissingFromLocation(movement_type));
    }
    if movement_type.requires_to() && to_location_id.is_none() {
        return Err(ServiceError::MissingToLocation(movement_type));
    }
    match movement_type {
        StockMovementType::Transfer if from_location_id == to_location_id => {
            Err(ServiceError::TransferSameLocation)
        }
        // An adjustment is signed by whichever side is set; at least one must be.
        StockMovementType::InventoryAdjustment
            if from_location_id.is_none() && to_location_id.is_none() =>
        {
            Err(ServiceError::MissingToLocation(movement_type))
        }
        _ => Ok(()),
    }
}

/// Fetches the balance row for one (item, location) pair under an exclusive
/// row lock (`SELECT ... FOR UPDATE`). The lock is held until the surrounding
/// transaction ends, so a concurrent writer on the same pair blocks here and
/// observes the post-commit value.
async fn locked_balance(
    txn: &DatabaseTransaction,
    item_id: Uuid,
    location_id: Uuid,
) -> Result<Option<stock_balance::Model>, ServiceError> {
    StockBalance::find()
        .filter(stock_balance::Column::ItemId.eq(item_id))
        .filter(stock_balance::Column::LocationId.eq(location_id))
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(ServiceError::from)
}

/// Creates the balance row for a pair that has never moved. A locked read on
/// an absent row locks nothing, so two first movements can race to this
/// insert; the upsert makes it insert-or-increment and the unique index on
/// (item_id, location_id) arbitrates instead of failing the loser.
async fn upsert_balance(
    txn: &DatabaseTransaction,
    scope_id: Uuid,
    item_id: Uuid,
    location_id: Uuid,
    quantity: i64,
) -> Result<(), ServiceError> {
    let now = Utc::now();
    let row = stock_balance::ActiveModel {
        id: Set(Uuid::new_v4()),
        scope_id: Set(scope_id),
        item_id: Set(item_id),
        location_id: Set(location_id),
        quantity: Set(quantity),
        updated_at: Set(now),
    };
    StockBalance::insert(row)
        .on_conflict(
            OnConflict::columns([
                stock_balance::Column::ItemId,
                stock_balance::Column::LocationId,
            ])
            .value(
                stock_balance::Column::Quantity,
                Expr::col(stock_balance::Column::Quantity).add(quantity),
            )
            .value(stock_balance::Column::UpdatedAt, Expr::value(now))
            .to_owned(),
        )
        .exec(txn)
        .await?;
    Ok(())
}

async fn update_balance(
    txn: &DatabaseTransaction,
    balance: stock_balance::Model,
    new_quantity: i64,
) -> Result<(), ServiceError> {
    let mut active: stock_balance::ActiveModel = balance.into();
    active.quantity = Set(new_quantity);
    active.updated_at = Set(Utc::now());
    active.update(txn).await?;
    Ok(())
}

/// Credits `quantity` onto an already-locked balance (or creates the row).
/// An i64 overflow fails the transaction with a typed error rather than
/// wrapping the balance negative.
async fn credit_balance(
    txn: &DatabaseTransaction,
    scope_id: Uuid,
    item_id: Uuid,
    location_id: Uuid,
    quantity: i64,
    existing: Option<stock_balance::Model>,
) -> Result<(), ServiceError> {
    match existing {
        Some(balance) => {
            let new_quantity = balance.quantity.checked_add(quantity).ok_or(
                ServiceError::BalanceOverflow {
                    current: balance.quantity,
                    requested: quantity,
                },
            )?;
            update_balance(txn, balance, new_quantity).await
        }
        None => upsert_balance(txn, scope_id, item_id, location_id, quantity).await,
    }
}

/// Adds `quantity` to the pair's balance, creating the row lazily on first
/// movement.
async fn apply_increase(
    txn: &DatabaseTransaction,
    scope_id: Uuid,
    item_id: Uuid,
    location_id: Uuid,
    quantity: i64,
) -> Result<(), ServiceError> {
    let existing = locked_balance(txn, item_id, location_id).await?;
    credit_balance(txn, scope_id, item_id, location_id, quantity, existing).await
}

/// Subtracts `quantity` from the pair's balance. A missing row or a result
/// below zero fails with `InsufficientStock` and writes nothing.
async fn apply_decrease(
    txn: &DatabaseTransaction,
    item_id: Uuid,
    location_id: Uuid,
    quantity: i64,
) -> Result<(), ServiceError> {
    let balance =
        locked_balance(txn, item_id, location_id)
            .await?
            .ok_or(ServiceError::InsufficientStock {
                available: 0,
                requested: quantity,
            })?;

    let remaining = balance
        .quantity
        .checked_sub(quantity)
        .filter(|r| *r >= 0)
        .ok_or(ServiceError::InsufficientStock {
            available: balance.quantity,
            requested: quantity,
        })?;
    update_balance(txn, balance, remaining).await
}

/// Moves `quantity` between two pairs of the same item. Both rows are locked
/// in ascending location-id order so two opposing transfers between the same
/// locations acquire them in the same order and cannot deadlock; the decrease
/// is still validated before the increase is applied.
async fn apply_transfer(
    txn: &DatabaseTransaction,
    scope_id: Uuid,
    item_id: Uuid,
    from_location_id: Uuid,
    to_location_id: Uuid,
    quantity: i64,
) -> Result<(), ServiceError> {
    let (from_balance, to_balance) = if from_location_id < to_location_id {
        let from = locked_balance(txn, item_id, from_location_id).await?;
        let to = locked_balance(txn, item_id, to_location_id).await?;
        (from, to)
    } else {
        let to = locked_balance(txn, item_id, to_location_id).await?;
        let from = locked_balance(txn, item_id, from_location_id).await?;
        (from, to)
    };

    let from_balance = from_balance.ok_or(ServiceError::InsufficientStock {
        available: 0,
        requested: quantity,
    })?;
    let remaining = from_balance
        .quantity
        .checked_sub(quantity)
        .filter(|r| *r >= 0)
        .ok_or(ServiceError::InsufficientStock {
            available: from_balance.quantity,
            requested: quantity,
        })?;

    update_balance(txn, from_balance, remaining).await?;
    credit_balance(txn, scope_id, item_id, to_location_id, quantity, to_balance).await
}

/// The sole write path into the movement ledger.
///
/// Guarantees that the ledger append and the balance update(s) commit or roll
/// back together; no partial balance mutation or orphan ledger row is ever
/// observable.
#[derive(Clone)]
pub struct StockMovementService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl StockMovementService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Validates, locks, applies and appends one movement atomically.
    #[instrument(skip(self, req), fields(movement_type = %req.movement_type, item_id = %req.item_id))]
    pub async fn create_movement(
        &self,
        req: NewStockMovement,
    ) -> Result<StockMovementDetail, ServiceError> {
        validate_movement(
            req.movement_type,
            req.from_location_id,
            req.to_location_id,
            req.quantity,
        )?;

        // Existence checks happen before any lock is taken so doomed requests
        // never contend on balance rows.
        let db = self.db.as_ref();
        let item = self.resolve_item(db, req.scope_id, req.item_id).await?;
        let from_location = match req.from_location_id {
            Some(id) => Some(self.resolve_location(db, req.scope_id, id).await?),
            None => None,
        };
        let to_location = match req.to_location_id {
            Some(id) => Some(self.resolve_location(db, req.scope_id, id).await?),
            None => None,
        };

        let movement = db
            .transaction::<_, stock_movement::Model, ServiceError>(move |txn| {
                Box::pin(async move {
                    use StockMovementType::*;
                    match req.movement_type {
                        EntryPurchase | EntryReturn => {
                            let to = req
                                .to_location_id
                                .ok_or(ServiceError::MissingToLocation(req.movement_type))?;
                            apply_increase(txn, req.scope_id, req.item_id, to, req.quantity)
                                .await?;
                        }
                        ExitConsumption | ExitLoss => {
                            let from = req
                                .from_location_id
                                .ok_or(ServiceError::MissingFromLocation(req.movement_type))?;
                            apply_decrease(txn, req.item_id, from, req.quantity).await?;
                        }
                        Transfer => {
                            let from = req
                                .from_location_id
                                .ok_or(ServiceError::MissingFromLocation(req.movement_type))?;
                            let to = req
                                .to_location_id
                                .ok_or(ServiceError::MissingToLocation(req.movement_type))?;
                            apply_transfer(txn, req.scope_id, req.item_id, from, to, req.quantity)
                                .await?;
                        }
                        InventoryAdjustment => match req.to_location_id {
                            Some(to) => {
                                apply_increase(txn, req.scope_id, req.item_id, to, req.quantity)
                                    .await?
                            }
                            None => {
                                let from = req
                                    .from_location_id
                                    .ok_or(ServiceError::MissingFromLocation(req.movement_type))?;
                                apply_decrease(txn, req.item_id, from, req.quantity).await?
                            }
                        },
                    }

                    let now = Utc::now();
                    let movement = stock_movement::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        scope_id: Set(req.scope_id),
                        movement_type: Set(req.movement_type.as_ref().to_string()),
                        item_id: Set(req.item_id),
                        from_location_id: Set(req.from_location_id),
                        to_location_id: Set(req.to_location_id),
                        ticket_id: Set(req.ticket_id),
                        quantity: Set(req.quantity),
                        unit_cost: Set(req.unit_cost),
                        notes: Set(req.notes),
                        performed_by: Set(req.performed_by),
                        performed_at: Set(req.performed_at.unwrap_or(now)),
                        created_at: Set(now),
                    };
                    movement.insert(txn).await.map_err(ServiceError::from)
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
                TransactionError::Transaction(service_err) => service_err,
            })?;

        info!(
            movement_id = %movement.id,
            movement_type = %movement.movement_type,
            quantity = movement.quantity,
            "stock movement committed"
        );

        // Post-commit notification only; a send failure must not undo the
        // committed movement.
        if let Err(e) = self
            .event_sender
            .send(Event::StockMovementRecorded {
                movement_id: movement.id,
                scope_id: movement.scope_id,
                movement_type: movement.movement_type.clone(),
                item_id: movement.item_id,
                from_location_id: movement.from_location_id,
                to_location_id: movement.to_location_id,
                quantity: movement.quantity,
                performed_at: movement.performed_at,
            })
            .await
        {
            warn!(error = %e, "failed to emit stock movement event");
        }

        Ok(StockMovementDetail {
            movement,
            item,
            from_location,
            to_location,
        })
    }

    /// Fetches one committed movement with its relations.
    pub async fn get_movement(&self, id: Uuid) -> Result<StockMovementDetail, ServiceError> {
        let db = self.db.as_ref();
        let movement = StockMovement::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock movement {} not found", id)))?;

        let item = StockItem::find_by_id(movement.item_id)
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stock item {} not found", movement.item_id))
            })?;

        let from_location = match movement.from_location_id {
            Some(id) => StockLocation::find_by_id(id).one(db).await?,
            None => None,
        };
        let to_location = match movement.to_location_id {
            Some(id) => StockLocation::find_by_id(id).one(db).await?,
            None => None,
        };

        Ok(StockMovementDetail {
            movement,
            item,
            from_location,
            to_location,
        })
    }

    /// Lists ledger entries, newest first.
    pub async fn list_movements(
        &self,
        filter: MovementFilter,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<stock_movement::Model>, u64), ServiceError> {
        let mut query = StockMovement::find();

        if let Some(scope_id) = filter.scope_id {
            query = query.filter(stock_movement::Column::ScopeId.eq(scope_id));
        }
        if let Some(movement_type) = filter.movement_type {
            query = query.filter(
                stock_movement::Column::MovementType.eq(movement_type.as_ref().to_string()),
            );
        }
        if let Some(item_id) = filter.item_id {
            query = query.filter(stock_movement::Column::ItemId.eq(item_id));
        }
        if let Some(location_id) = filter.location_id {
            query = query.filter(
                Condition::any()
                    .add(stock_movement::Column::FromLocationId.eq(location_id))
                    .add(stock_movement::Column::ToLocationId.eq(location_id)),
            );
        }
        if let Some(ticket_id) = filter.ticket_id {
            query = query.filter(stock_movement::Column::TicketId.eq(ticket_id));
        }
        if let Some(after) = filter.performed_after {
            query = query.filter(stock_movement::Column::PerformedAt.gte(after));
        }
        if let Some(before) = filter.performed_before {
            query = query.filter(stock_movement::Column::PerformedAt.lte(before));
        }

        let paginator = query
            .order_by_desc(stock_movement::Column::PerformedAt)
            .paginate(self.db.as_ref(), limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    async fn resolve_item(
        &self,
        db: &DatabaseConnection,
        scope_id: Uuid,
        item_id: Uuid,
    ) -> Result<stock_item::Model, ServiceError> {
        let item = StockItem::find_by_id(item_id)
            .filter(stock_item::Column::ScopeId.eq(scope_id))
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock item {} not found", item_id)))?;
        if !item.active {
            return Err(ServiceError::ValidationError(format!(
                "Stock item {} is inactive",
                item.sku
            )));
        }
        Ok(item)
    }

    async fn resolve_location(
        &self,
        db: &DatabaseConnection,
        scope_id: Uuid,
        location_id: Uuid,
    ) -> Result<stock_location::Model, ServiceError> {
        let location = StockLocation::find_by_id(location_id)
            .filter(stock_location::Column::ScopeId.eq(scope_id))
            .one(db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Stock location {} not found", location_id))
            })?;
        if !location.active {
            return Err(ServiceError::ValidationError(format!(
                "Stock location {} is inactive",
                location.name
            )));
        }
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use StockMovementType::*;

    fn id() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn quantity_is_checked_before_locations() {
        assert_matches!(
            validate_movement(Transfer, None, None, 0),
            Err(ServiceError::NonPositiveQuantity(0))
        );
        assert_matches!(
            validate_movement(EntryPurchase, None, None, -3),
            Err(ServiceError::NonPositiveQuantity(-3))
        );
    }

    #[test]
    fn entries_require_to_location() {
        for t in [EntryPurchase, EntryReturn] {
            assert_matches!(
                validate_movement(t, Some(id()), None, 1),
                Err(ServiceError::MissingToLocation(_))
            );
            assert!(validate_movement(t, None, Some(id()), 1).is_ok());
        }
    }

    #[test]
    fn exits_require_from_location() {
        for t in [ExitConsumption, ExitLoss] {
            assert_matches!(
                validate_movement(t, None, Some(id()), 1),
                Err(ServiceError::MissingFromLocation(_))
            );
            assert!(validate_movement(t, Some(id()), None, 1).is_ok());
        }
    }

    #[test]
    fn transfer_requires_distinct_locations() {
        let a = id();
        let b = id();
        assert_matches!(
            validate_movement(Transfer, Some(a), Some(a), 1),
            Err(ServiceError::TransferSameLocation)
        );
        assert_matches!(
            validate_movement(Transfer, None, Some(b), 1),
            Err(ServiceError::MissingFromLocation(_))
        );
        assert_matches!(
            validate_movement(Transfer, Some(a), None, 1),
            Err(ServiceError::MissingToLocation(_))
        );
        assert!(validate_movement(Transfer, Some(a), Some(b), 1).is_ok());
    }

    #[test]
    fn adjustment_requires_at_least_one_location() {
        assert_matches!(
            validate_movement(InventoryAdjustment, None, None, 1),
            Err(ServiceError::MissingToLocation(_))
        );
        assert!(validate_movement(InventoryAdjustment, Some(id()), None, 1).is_ok());
        assert!(validate_movement(InventoryAdjustment, None, Some(id()), 1).is_ok());
    }

    #[test]
    fn movement_type_strings_round_trip() {
        use std::str::FromStr;
        for (s, t) in [
            ("ENTRY_PURCHASE", EntryPurchase),
            ("ENTRY_RETURN", EntryReturn),
            ("TRANSFER", Transfer),
            ("EXIT_CONSUMPTION", ExitConsumption),
            ("EXIT_LOSS", ExitLoss),
            ("INVENTORY_ADJUSTMENT", InventoryAdjustment),
        ] {
            assert_eq!(StockMovementType::from_str(s).unwrap(), t);
            assert_eq!(t.as_ref(), s);
        }
        assert!(StockMovementType::from_str("ENTRY_BOGUS").is_err());
    }
}
