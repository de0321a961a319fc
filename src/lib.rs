//! Marketbooth API Library
//!
//! Multi-brand food booth point-of-sale, inventory, and accounting
//! backend with realtime stock broadcasting over SSE.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod realtime;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::{IntoParams, ToSchema};

use crate::realtime::EventBroadcaster;

/// Shared application state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<auth::AuthService>,
    /// General realtime channel (stock updates, sales, low-stock alerts)
    pub events: Arc<EventBroadcaster>,
    /// Menu refresh channel, keyed by client id
    pub menu_events: Arc<EventBroadcaster>,
    pub services: services::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let auth_config = auth::AuthConfig::new(
            config.jwt_secret.clone(),
            std::time::Duration::from_secs(config.jwt_expiration),
        );
        let auth = Arc::new(auth::AuthService::new(auth_config, db.clone()));
        let events = Arc::new(EventBroadcaster::new());
        let menu_events = Arc::new(EventBroadcaster::new());
        let services = services::AppServices::new(db.clone(), events.clone(), menu_events.clone());

        Self {
            db,
            config,
            auth,
            events,
            menu_events,
            services,
        }
    }
}

/// Common query parameters for list endpoints
#[derive(Debug, Deserialize, ToSchema, IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Common response wrapper
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, query: &ListQuery) -> Self {
        let limit = query.limit.max(1);
        Self {
            items,
            total,
            page: query.page,
            limit,
            total_pages: total.div_ceil(limit),
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Full v1 API: a small public surface plus the authenticated routes.
pub fn api_v1_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .route("/auth/login", post(handlers::auth::login));

    let protected = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        // Brands (super-admin surface)
        .route(
            "/brands",
            get(handlers::brands::list_brands).post(handlers::brands::create_brand),
        )
        .route(
            "/brands/:id",
            get(handlers::brands::get_brand)
                .put(handlers::brands::update_brand)
                .delete(handlers::brands::delete_brand),
        )
        // Booths
        .route(
            "/booths",
            get(handlers::booths::list_booths).post(handlers::booths::create_booth),
        )
        .route(
            "/booths/:id",
            get(handlers::booths::get_booth)
                .put(handlers::booths::update_booth)
                .delete(handlers::booths::delete_booth),
        )
        .route("/booths/:id/menu", get(handlers::booths::booth_menu))
        .route("/booths/:id/stock", get(handlers::stock::list_booth_stock))
        .route(
            "/booths/:id/stock/allocate",
            post(handlers::stock::allocate_booth_stock),
        )
        // Ingredients
        .route(
            "/ingredients",
            get(handlers::ingredients::list_ingredients)
                .post(handlers::ingredients::create_ingredient),
        )
        .route(
            "/ingredients/low-stock",
            get(handlers::ingredients::low_stock_ingredients),
        )
        .route(
            "/ingredients/:id",
            get(handlers::ingredients::get_ingredient)
                .put(handlers::ingredients::update_ingredient)
                .delete(handlers::ingredients::delete_ingredient),
        )
        .route(
            "/ingredients/:id/purchase",
            post(handlers::ingredients::purchase_ingredient),
        )
        // Menu
        .route(
            "/menu-items",
            get(handlers::menu::list_menu_items).post(handlers::menu::create_menu_item),
        )
        .route(
            "/menu-items/:id",
            get(handlers::menu::get_menu_item)
                .put(handlers::menu::update_menu_item)
                .delete(handlers::menu::delete_menu_item),
        )
        // Sales
        .route(
            "/sales",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route(
            "/sales/:id",
            get(handlers::sales::get_sale)
                .put(handlers::sales::update_sale)
                .delete(handlers::sales::delete_sale),
        )
        // Ledgers
        .route(
            "/stock-movements",
            get(handlers::stock::list_stock_movements),
        )
        .route(
            "/accounting/transactions",
            get(handlers::accounting::list_transactions),
        )
        .route(
            "/accounting/summary",
            get(handlers::accounting::accounting_summary),
        )
        // Users
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        // Realtime streams
        .nest("/realtime", realtime::sse::realtime_routes())
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::auth_middleware,
        ));

    public.merge(protected)
}

async fn api_status() -> Json<ApiResponse<Value>> {
    let status_data = json!({
        "status": "ok",
        "service": "marketbooth-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });
    Json(ApiResponse::success(status_data))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "connected_clients": state.events.registry().client_count(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}
