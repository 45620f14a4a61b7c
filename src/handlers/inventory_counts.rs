use crate::{
    errors::ServiceError,
    services::inventory_counts::{InventoryCountOutcome, InventoryCountRequest},
    ApiResponse, AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PerformCountRequest {
    pub scope_id: Uuid,
    pub item_id: Uuid,
    pub location_id: Uuid,
    pub counted_quantity: i64,
    pub notes: Option<String>,
    #[validate(length(min = 1))]
    pub performed_by: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(perform_count))
}

/// Reconcile a physical count against the materialized balance
#[utoipa::path(
    post,
    path = "/api/v1/stock/counts",
    request_body = PerformCountRequest,
    responses(
        (status = 200, description = "Count reconciled", body = InventoryCountOutcome),
        (status = 404, description = "Item or location not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Negative count races a concurrent exit", body = crate::errors::ErrorResponse)
    ),
    tag = "inventory-counts"
)]
pub async fn perform_count(
    State(state): State<AppState>,
    Json(req): Json<PerformCountRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    req.validate()?;
    let outcome: InventoryCountOutcome = state
        .services
        .counts
        .perform_count(InventoryCountRequest {
            scope_id: req.scope_id,
            item_id: req.item_id,
            location_id: req.location_id,
            counted_quantity: req.counted_quantity,
            notes: req.notes,
            performed_by: req.performed_by,
        })
        .await?;
    Ok(axum::Json(ApiResponse::ok(outcome)))
}
