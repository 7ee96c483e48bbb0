//! HTTP API Layer
//!
//! REST API for the share ledger, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: properties, investments, payment schedule and portfolio
//! - **Middleware**: request ids, JWT authentication and audit logging
//! - **DTOs**: request validation and the `{success, message, data}` envelope
//! - **Error Handling**: ledger errors mapped to status codes and stable error codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, Arc::new(SystemClock), config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use tower_http::cors::{CorsLayer, Any};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::Clock;
use domain_investment::{InvestmentService, LedgerStore, PaymentScheduleService};

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{health, investments, portfolio, properties};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub investments: Arc<InvestmentService>,
    pub schedules: Arc<PaymentScheduleService>,
    pub store: Arc<dyn LedgerStore>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the ledger services over one store and clock
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>, config: ApiConfig) -> Self {
        Self {
            investments: Arc::new(InvestmentService::new(store.clone(), clock.clone())),
            schedules: Arc::new(PaymentScheduleService::new(store.clone(), clock)),
            store,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let property_routes = Router::new()
        .route("/", post(properties::register_property))
        .route("/:id", get(properties::get_property))
        .route("/:id/terms", put(properties::update_terms))
        .route("/:id/status", put(properties::advance_status))
        .route("/:id/activate-schedules", post(properties::activate_schedules));

    let investment_routes = Router::new()
        .route("/", post(investments::create_investment).get(investments::list_investments))
        .route("/:id", get(investments::get_investment))
        .route("/:id/down-payment", post(investments::pay_down_payment))
        .route(
            "/:id/installments/:installment_id/pay",
            post(investments::pay_installment),
        )
        .route("/:id/cancel", post(investments::cancel_investment));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/properties", property_routes)
        .nest("/investments", investment_routes)
        .route("/payment-schedule", get(portfolio::get_schedule))
        .route("/portfolio", get(portfolio::get_portfolio))
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
