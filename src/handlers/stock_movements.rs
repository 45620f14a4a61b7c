use crate::{
    entities::stock_movement::{self, StockMovementType},
    errors::ServiceError,
    services::stock_movements::{MovementFilter, NewStockMovement, StockMovementDetail},
    ApiResponse, AppState, Page,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMovementRequest {
    pub scope_id: Uuid,
    /// One of ENTRY_PURCHASE, ENTRY_RETURN, TRANSFER, EXIT_CONSUMPTION,
    /// EXIT_LOSS, INVENTORY_ADJUSTMENT
    pub movement_type: String,
    pub item_id: Uuid,
    pub from_location_id: Option<Uuid>,
    pub to_location_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub performed_by: String,
    pub performed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LocationRef {
    pub id: Uuid,
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MovementResponse {
    pub id: Uuid,
    pub scope_id: Uuid,
    pub movement_type: String,
    pub item_id: Uuid,
    pub item_sku: String,
    pub item_name: String,
    pub from_location: Option<LocationRef>,
    pub to_location: Option<LocationRef>,
    pub ticket_id: Option<Uuid>,
    pub quantity: i64,
    pub unit_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub performed_by: String,
    pub performed_at: DateTime<Utc>,
}

impl From<StockMovementDetail> for MovementResponse {
    fn from(detail: StockMovementDetail) -> Self {
        let loc_ref = |l: crate::entities::stock_location::Model| LocationRef {
            id: l.id,
            name: l.name,
            kind: l.kind,
        };
        Self {
            id: detail.movement.id,
            scope_id: detail.movement.scope_id,
            movement_type: detail.movement.movement_type,
            item_id: detail.movement.item_id,
            item_sku: detail.item.sku,
            item_name: detail.item.name,
            from_location: detail.from_location.map(loc_ref),
            to_location: detail.to_location.map(loc_ref),
            ticket_id: detail.movement.ticket_id,
            quantity: detail.movement.quantity,
            unit_cost: detail.movement.unit_cost,
            notes: detail.movement.notes,
            performed_by: detail.movement.performed_by,
            performed_at: detail.movement.performed_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct MovementListQuery {
    pub scope_id: Option<Uuid>,
    pub movement_type: Option<String>,
    pub item_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    pub performed_after: Option<DateTime<Utc>>,
    pub performed_before: Option<DateTime<Utc>>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_movement).get(list_movements))
        .route("/:id", get(get_movement))
}

/// Record a stock movement (entry, exit, transfer, or adjustment)
#[utoipa::path(
    post,
    path = "/api/v1/stock/movements",
    request_body = CreateMovementRequest,
    responses(
        (status = 201, description = "Movement committed", body = MovementResponse),
        (status = 400, description = "Structurally invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item or location not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-movements"
)]
pub async fn create_movement(
    State(state): State<AppState>,
    Json(req): Json<CreateMovementRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    req.validate()?;
    let movement_type = StockMovementType::from_str(&req.movement_type)
        .map_err(|_| ServiceError::InvalidMovementType(req.movement_type.clone()))?;

    let detail = state
        .services
        .movements
        .create_movement(NewStockMovement {
            scope_id: req.scope_id,
            movement_type,
            item_id: req.item_id,
            from_location_id: req.from_location_id,
            to_location_id: req.to_location_id,
            ticket_id: req.ticket_id,
            quantity: req.quantity,
            unit_cost: req.unit_cost,
            notes: req.notes,
            performed_by: req.performed_by,
            performed_at: req.performed_at,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        axum::Json(ApiResponse::ok(MovementResponse::from(detail))),
    ))
}

/// Fetch one ledger entry with relations resolved
#[utoipa::path(
    get,
    path = "/api/v1/stock/movements/{id}",
    responses(
        (status = 200, description = "Movement found", body = MovementResponse),
        (status = 404, description = "No such movement", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-movements"
)]
pub async fn get_movement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let detail = state.services.movements.get_movement(id).await?;
    Ok(axum::Json(ApiResponse::ok(MovementResponse::from(detail))))
}

/// List ledger entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/stock/movements",
    params(MovementListQuery),
    responses(
        (status = 200, description = "Ledger page returned"),
        (status = 400, description = "Invalid filter", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-movements"
)]
pub async fn list_movements(
    State(state): State<AppState>,
    Query(query): Query<MovementListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let movement_type = query
        .movement_type
        .as_deref()
        .map(|s| {
            StockMovementType::from_str(s)
                .map_err(|_| ServiceError::InvalidMovementType(s.to_string()))
        })
        .transpose()?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (items, total) = state
        .services
        .movements
        .list_movements(
            MovementFilter {
                scope_id: query.scope_id,
                movement_type,
                item_id: query.item_id,
                location_id: query.location_id,
                ticket_id: query.ticket_id,
                performed_after: query.performed_after,
                performed_before: query.performed_before,
            },
            page,
            limit,
        )
        .await?;

    Ok(axum::Json(ApiResponse::ok(Page::<stock_movement::Model> {
        items,
        total,
        page,
        limit,
    })))
}
