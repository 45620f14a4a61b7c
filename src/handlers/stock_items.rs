use crate::{
    entities::stock_item,
    errors::ServiceError,
    services::stock_items::{ItemFilter, NewStockItem, UpdateStockItem},
    ApiResponse, AppState, Page,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    pub scope_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub sku: String,
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(length(min = 1, max = 16))]
    pub unit: String,
    #[serde(default)]
    pub min_quantity: i64,
    #[serde(default)]
    pub serial_tracked: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub min_quantity: Option<i64>,
    pub serial_tracked: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct ItemListQuery {
    pub scope_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default)]
    pub active_only: bool,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/:id",
            get(get_item).put(update_item).delete(deactivate_item),
        )
}

/// Create a stock item
#[utoipa::path(
    post,
    path = "/api/v1/stock/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created"),
        (status = 409, description = "SKU already in use", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    req.validate()?;
    let item = state
        .services
        .items
        .create_item(NewStockItem {
            scope_id: req.scope_id,
            sku: req.sku,
            name: req.name,
            unit: req.unit,
            min_quantity: req.min_quantity,
            serial_tracked: req.serial_tracked,
        })
        .await?;
    Ok((StatusCode::CREATED, axum::Json(ApiResponse::ok(item))))
}

/// Fetch one stock item
#[utoipa::path(
    get,
    path = "/api/v1/stock/items/{id}",
    responses(
        (status = 200, description = "Item found"),
        (status = 404, description = "No such item", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.items.get_item(id).await?;
    Ok(axum::Json(ApiResponse::ok(item)))
}

/// Update item metadata (SKU and scope are immutable)
#[utoipa::path(
    put,
    path = "/api/v1/stock/items/{id}",
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated"),
        (status = 404, description = "No such item", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state
        .services
        .items
        .update_item(
            id,
            UpdateStockItem {
                name: req.name,
                unit: req.unit,
                min_quantity: req.min_quantity,
                serial_tracked: req.serial_tracked,
            },
        )
        .await?;
    Ok(axum::Json(ApiResponse::ok(item)))
}

/// Deactivate (soft-delete) an item
#[utoipa::path(
    delete,
    path = "/api/v1/stock/items/{id}",
    responses(
        (status = 200, description = "Item deactivated"),
        (status = 404, description = "No such item", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-items"
)]
pub async fn deactivate_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let item = state.services.items.deactivate_item(id).await?;
    Ok(axum::Json(ApiResponse::ok(item)))
}

/// List stock items
#[utoipa::path(
    get,
    path = "/api/v1/stock/items",
    params(ItemListQuery),
    responses((status = 200, description = "Item page returned")),
    tag = "stock-items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (items, total) = state
        .services
        .items
        .list_items(
            ItemFilter {
                scope_id: query.scope_id,
                search: query.search,
                active_only: query.active_only,
            },
            page,
            limit,
        )
        .await?;
    Ok(axum::Json(ApiResponse::ok(Page::<stock_item::Model> {
        items,
        total,
        page,
        limit,
    })))
}
