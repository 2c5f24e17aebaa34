//! HTTP API server with observability for the order fulfillment services.
//!
//! Provides REST endpoints for placing orders and driving them through their
//! lifecycle, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use saga::{
    Gateway, HttpCartService, HttpNotificationService, HttpRestaurantService, HttpSmsService,
    HttpTableService, HttpUserService, InMemoryCollaborators, SagaCoordinator,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route(
            "/orders",
            post(routes::orders::create::<S>).get(routes::orders::list::<S>),
        )
        .route("/orders/stats", get(routes::orders::stats::<S>))
        .route("/orders/{id}", get(routes::orders::get::<S>))
        .route(
            "/orders/{id}/status",
            patch(routes::orders::update_status::<S>),
        )
        .route(
            "/orders/{id}/payment",
            patch(routes::orders::update_payment::<S>),
        )
        .route("/orders/{id}/cancel", post(routes::orders::cancel::<S>))
        .route(
            "/orders/{id}/assign-delivery",
            patch(routes::orders::assign_delivery::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over `store` and `gateway`.
pub fn create_state<S: OrderStore + 'static>(store: S, gateway: Gateway) -> Arc<AppState<S>> {
    Arc::new(AppState {
        coordinator: SagaCoordinator::new(store, gateway),
    })
}

/// Creates the default application state with in-memory collaborators.
///
/// The collaborators are returned so callers can seed users, restaurants and
/// tables.
pub fn create_default_state<S: OrderStore + 'static>(
    store: S,
) -> (Arc<AppState<S>>, InMemoryCollaborators) {
    let collaborators = InMemoryCollaborators::new();
    let state = create_state(store, collaborators.gateway());
    (state, collaborators)
}

/// Builds an HTTP gateway when every required collaborator URL is set.
///
/// Returns `Ok(None)` when any required URL is missing.
pub fn http_gateway(config: &Config) -> Result<Option<Gateway>, reqwest::Error> {
    let urls = &config.services;
    let (Some(user), Some(restaurant), Some(table), Some(cart), Some(notification)) = (
        urls.user.as_deref(),
        urls.restaurant.as_deref(),
        urls.table.as_deref(),
        urls.cart.as_deref(),
        urls.notification.as_deref(),
    ) else {
        return Ok(None);
    };

    let http = reqwest::Client::builder()
        .timeout(config.collaborator_timeout)
        .build()?;
    let key = config.internal_api_key.clone();

    let mut gateway = Gateway::new(
        Arc::new(HttpUserService::new(http.clone(), user, key.clone())),
        Arc::new(HttpRestaurantService::new(
            http.clone(),
            restaurant,
            key.clone(),
        )),
        Arc::new(HttpTableService::new(http.clone(), table, key.clone())),
        Arc::new(HttpCartService::new(http.clone(), cart, key.clone())),
        Arc::new(HttpNotificationService::new(
            http.clone(),
            notification,
            key.clone(),
        )),
    )
    .with_timeout(config.collaborator_timeout);

    if let Some(sms) = urls.sms.as_deref() {
        gateway = gateway.with_sms(Arc::new(HttpSmsService::new(http, sms, key)));
    }

    Ok(Some(gateway))
}
