//! Order placement, lifecycle and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use common::{OrderId, RestaurantId, UserId};
use domain::{ChangeStatus, CreateOrder, Order, OrderStats, OrderStatus, OrderType, PaymentStatus};
use order_store::{OrderQuery, OrderStore};
use saga::{PlacedOrder, SagaCoordinator, UpdatedOrder};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentActor;
use crate::error::ApiError;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

/// Shared application state accessible from all handlers.
pub struct AppState<S: OrderStore> {
    pub coordinator: SagaCoordinator<S>,
}

// -- Request types --

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub user_id: Option<UserId>,
    pub restaurant_id: Option<RestaurantId>,
    pub delivery_person_id: Option<UserId>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub delivery_person_id: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentRequest {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignDeliveryRequest {
    pub delivery_person_id: UserId,
}

// -- Response types --

#[derive(Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<Order>,
    pub total: u64,
    pub page: usize,
    pub limit: usize,
    pub total_pages: u64,
}

impl ListOrdersParams {
    fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    fn into_query(self) -> OrderQuery {
        let (page, limit) = (self.page(), self.limit());
        let mut query = OrderQuery::new()
            .created_between(self.from, self.to)
            .page(page, limit);
        query.user_id = self.user_id;
        query.restaurant_id = self.restaurant_id;
        query.delivery_person_id = self.delivery_person_id;
        query.status = self.status;
        query.order_type = self.order_type;
        query
    }
}

// -- Handlers --

/// POST /orders: Place an order for the calling user.
#[tracing::instrument(skip(state, actor, cmd))]
pub async fn create<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Json(cmd): Json<CreateOrder>,
) -> Result<(StatusCode, Json<PlacedOrder>), ApiError> {
    let placed = state.coordinator.create_order(&actor, cmd).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// GET /orders: List orders visible to the caller.
#[tracing::instrument(skip(state, actor, params))]
pub async fn list<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<OrderListResponse>, ApiError> {
    let (page, limit) = (params.page(), params.limit());
    let result = state
        .coordinator
        .list_orders(&actor, params.into_query())
        .await?;

    Ok(Json(OrderListResponse {
        total: result.total,
        total_pages: result.total.div_ceil(limit as u64),
        orders: result.items,
        page,
        limit,
    }))
}

/// GET /orders/stats: Order statistics over the caller's scope.
#[tracing::instrument(skip(state, actor))]
pub async fn stats<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Query(params): Query<StatsParams>,
) -> Result<Json<OrderStats>, ApiError> {
    let stats = state
        .coordinator
        .stats(&actor, params.from, params.to)
        .await?;
    Ok(Json(stats))
}

/// GET /orders/{id}: Load a single order.
#[tracing::instrument(skip(state, actor))]
pub async fn get<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.coordinator.get_order(&actor, order_id).await?;
    Ok(Json(order))
}

/// PATCH /orders/{id}/status: Move an order through its lifecycle.
#[tracing::instrument(skip(state, actor, req))]
pub async fn update_status<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdatedOrder>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let change = ChangeStatus {
        target: req.status,
        reason: req.reason,
        delivery_person_id: req.delivery_person_id,
    };
    let updated = state
        .coordinator
        .update_order_status(&actor, order_id, change)
        .await?;
    Ok(Json(updated))
}

/// PATCH /orders/{id}/payment: Record a payment status change.
#[tracing::instrument(skip(state, actor, req))]
pub async fn update_payment<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<Json<UpdatedOrder>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let updated = state
        .coordinator
        .update_payment_status(&actor, order_id, req.payment_status)
        .await?;
    Ok(Json(updated))
}

/// POST /orders/{id}/cancel: Cancel an order.
#[tracing::instrument(skip(state, actor, req))]
pub async fn cancel<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<CancelOrderRequest>,
) -> Result<Json<UpdatedOrder>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let updated = state
        .coordinator
        .cancel_order(&actor, order_id, req.reason)
        .await?;
    Ok(Json(updated))
}

/// PATCH /orders/{id}/assign-delivery: Hand a delivery order to a courier.
#[tracing::instrument(skip(state, actor, req))]
pub async fn assign_delivery<S: OrderStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<String>,
    Json(req): Json<AssignDeliveryRequest>,
) -> Result<Json<UpdatedOrder>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let updated = state
        .coordinator
        .assign_delivery_person(&actor, order_id, req.delivery_person_id)
        .await?;
    Ok(Json(updated))
}

fn parse_order_id(id: &str) -> Result<OrderId, ApiError> {
    let uuid = uuid::Uuid::parse_str(id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid order ID format: {e}")))?;
    Ok(OrderId::from(uuid))
}
