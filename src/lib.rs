//! Stock Movement Ledger & Balance Engine
//!
//! Append-only journal of inventory movements with a materialized
//! current-quantity view per (item, location), updated transactionally.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: AppServices,
}

/// Service registry. The movement service is the only write path into the
/// ledger; the count service reconciles through it.
#[derive(Clone)]
pub struct AppServices {
    pub items: services::StockItemService,
    pub locations: services::StockLocationService,
    pub movements: services::StockMovementService,
    pub balances: services::StockBalanceService,
    pub counts: services::InventoryCountService,
}

impl AppServices {
    pub fn build(db: Arc<DatabaseConnection>, event_sender: events::EventSender) -> Self {
        let movements = services::StockMovementService::new(db.clone(), event_sender.clone());
        Self {
            items: services::StockItemService::new(db.clone(), event_sender.clone()),
            locations: services::StockLocationService::new(db.clone(), event_sender.clone()),
            balances: services::StockBalanceService::new(db.clone()),
            counts: services::InventoryCountService::new(
                db.clone(),
                movements.clone(),
                event_sender,
            ),
            movements,
        }
    }
}

/// Standard success envelope.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

/// One page of a list response.
#[derive(Serialize, ToSchema)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .nest("/stock/items", handlers::stock_items::router())
        .nest("/stock/locations", handlers::stock_locations::router())
        .nest("/stock/movements", handlers::stock_movements::router())
        .nest("/stock/balances", handlers::stock_balances::router())
        .nest("/stock/counts", handlers::inventory_counts::router());

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/v1", api)
        .merge(
            SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
        .with_state(state)
}
