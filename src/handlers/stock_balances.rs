use crate::{
    errors::ServiceError,
    services::stock_balances::{BalanceFilter, BalanceView},
    ApiResponse, AppState, Page,
};
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct BalanceResponse {
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub quantity: i64,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct BalanceListQuery {
    pub scope_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default)]
    pub low_stock_only: bool,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_balances))
        .route("/:item_id/:location_id", get(get_balance))
}

/// Current quantity for one (item, location) pair
#[utoipa::path(
    get,
    path = "/api/v1/stock/balances/{item_id}/{location_id}",
    responses(
        (status = 200, description = "Balance found", body = BalanceResponse),
        (status = 404, description = "No balance for the pair", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-balances"
)]
pub async fn get_balance(
    State(state): State<AppState>,
    Path((item_id, location_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ServiceError> {
    let balance = state
        .services
        .balances
        .get_balance(item_id, location_id)
        .await?;
    Ok(Json(ApiResponse::ok(BalanceResponse {
        item_id: balance.item_id,
        location_id: balance.location_id,
        quantity: balance.quantity,
        updated_at: balance.updated_at,
    })))
}

/// List balances joined with item and location display fields
#[utoipa::path(
    get,
    path = "/api/v1/stock/balances",
    params(BalanceListQuery),
    responses(
        (status = 200, description = "Balance page returned")
    ),
    tag = "stock-balances"
)]
pub async fn list_balances(
    State(state): State<AppState>,
    Query(query): Query<BalanceListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (rows, total) = state
        .services
        .balances
        .list_balances(
            BalanceFilter {
                scope_id: query.scope_id,
                item_id: query.item_id,
                location_id: query.location_id,
                search: query.search,
                low_stock_only: query.low_stock_only,
            },
            page,
            limit,
        )
        .await?;

    Ok(Json(ApiResponse::ok(Page::<BalanceView> {
        items: rows,
        total,
        page,
        limit,
    })))
}
