use crate::{
    entities::stock_location::{self, LocationKind},
    errors::ServiceError,
    services::stock_locations::{LocationFilter, NewStockLocation},
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
pub struct CreateLocationRequest {
    pub scope_id: Uuid,
    pub kind: LocationKind,
    #[validate(length(min = 1))]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameLocationRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct LocationListQuery {
    pub scope_id: Option<Uuid>,
    pub kind: Option<LocationKind>,
    #[serde(default)]
    pub active_only: bool,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_locations).post(create_location))
        .route(
            "/:id",
            get(get_location)
                .put(rename_location)
                .delete(deactivate_location),
        )
}

/// Create a storage location
#[utoipa::path(
    post,
    path = "/api/v1/stock/locations",
    request_body = CreateLocationRequest,
    responses((status = 201, description = "Location created")),
    tag = "stock-locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(req): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    req.validate()?;
    let location = state
        .services
        .locations
        .create_location(NewStockLocation {
            scope_id: req.scope_id,
            kind: req.kind,
            name: req.name,
        })
        .await?;
    Ok((StatusCode::CREATED, axum::Json(ApiResponse::ok(location))))
}

/// Fetch one location
#[utoipa::path(
    get,
    path = "/api/v1/stock/locations/{id}",
    responses(
        (status = 200, description = "Location found"),
        (status = 404, description = "No such location", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state.services.locations.get_location(id).await?;
    Ok(axum::Json(ApiResponse::ok(location)))
}

/// Rename a location
#[utoipa::path(
    put,
    path = "/api/v1/stock/locations/{id}",
    request_body = RenameLocationRequest,
    responses(
        (status = 200, description = "Location renamed"),
        (status = 404, description = "No such location", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-locations"
)]
pub async fn rename_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<RenameLocationRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state
        .services
        .locations
        .rename_location(id, req.name)
        .await?;
    Ok(axum::Json(ApiResponse::ok(location)))
}

/// Deactivate (soft-delete) a location
#[utoipa::path(
    delete,
    path = "/api/v1/stock/locations/{id}",
    responses(
        (status = 200, description = "Location deactivated"),
        (status = 404, description = "No such location", body = crate::errors::ErrorResponse)
    ),
    tag = "stock-locations"
)]
pub async fn deactivate_location(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ServiceError> {
    let location = state.services.locations.deactivate_location(id).await?;
    Ok(axum::Json(ApiResponse::ok(location)))
}

/// List locations
#[utoipa::path(
    get,
    path = "/api/v1/stock/locations",
    params(LocationListQuery),
    responses((status = 200, description = "Location page returned")),
    tag = "stock-locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(query): Query<LocationListQuery>,
) -> Result<impl IntoResponse, ServiceError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (locations, total) = state
        .services
        .locations
        .list_locations(
            LocationFilter {
                scope_id: query.scope_id,
                kind: query.kind,
                active_only: query.active_only,
            },
            page,
            limit,
        )
        .await?;
    Ok(axum::Json(ApiResponse::ok(
        Page::<stock_location::Model> {
            items: locations,
            total,
            page,
            limit,
        },
    )))
}
