//! Saga coordinator for order fulfillment.

use std::time::Instant;

use chrono::{DateTime, Utc};
use common::{OrderId, UserId};
use domain::{
    Actor, Capability, ChangeStatus, CreateOrder, Order, OrderCode, OrderEvent, OrderStats,
    OrderStatus, PaymentStatus, RESTAURANT_CANCELLATION_REASON, Role, Scope, Transition,
};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use order_store::{OrderQuery, OrderStore, OrderStoreExt, Page};
use serde::Serialize;

use crate::error::{GatewayError, Result, SagaError};
use crate::fanout::NotificationDispatcher;
use crate::gateway::Gateway;
use crate::order_fulfillment;
use crate::outcome::{SagaReport, StepOutcome, settle};
use crate::reservation::TableReservationCoordinator;
use crate::services::RestaurantSummary;

/// A best-effort step, spawned after the order is persisted.
type SideEffect = BoxFuture<'static, Vec<StepOutcome>>;

/// A newly placed order.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    /// Restaurant details for presentation only; never stored.
    pub restaurant: RestaurantSummary,
    pub report: SagaReport,
}

/// An order after a status, payment or delivery change.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedOrder {
    pub order: Order,
    /// False when the order already had the requested state.
    pub changed: bool,
    pub report: SagaReport,
}

/// Orchestrates the order fulfillment saga.
///
/// Required steps (user and restaurant lookups, validation, persistence) run
/// in sequence and abort the operation on failure. Once the order is stored,
/// side effects (table, cart, notifications, SMS) are spawned as independent
/// tasks whose failures are logged and reported but never returned as errors.
pub struct SagaCoordinator<S>
where
    S: OrderStore,
{
    store: S,
    gateway: Gateway,
    tables: TableReservationCoordinator,
    notifier: NotificationDispatcher,
}

impl<S> SagaCoordinator<S>
where
    S: OrderStore,
{
    /// Creates a new saga coordinator.
    pub fn new(store: S, gateway: Gateway) -> Self {
        Self {
            tables: TableReservationCoordinator::new(gateway.clone()),
            notifier: NotificationDispatcher::new(gateway.clone()),
            store,
            gateway,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Places an order for `actor`.
    ///
    /// Nothing is persisted unless the user and restaurant resolve and the
    /// request is valid.
    #[tracing::instrument(
        skip(self, actor, cmd),
        fields(saga_type = order_fulfillment::SAGA_TYPE, user_id = %actor.user_id, order_type = %cmd.order_type)
    )]
    pub async fn create_order(&self, actor: &Actor, cmd: CreateOrder) -> Result<PlacedOrder> {
        let start = Instant::now();
        let result = self.place(actor, &cmd).await;

        match &result {
            Ok(placed) => {
                metrics::counter!("orders_created_total").increment(1);
                tracing::info!(
                    order_id = %placed.order.id(),
                    order_code = %placed.order.code(),
                    failed_steps = placed.report.failures().count(),
                    "order saga completed"
                );
            }
            Err(error) => {
                metrics::counter!("order_create_rejected_total", "reason" => error.reason())
                    .increment(1);
                tracing::info!(%error, "order rejected");
            }
        }
        metrics::histogram!("order_create_duration_seconds")
            .record(start.elapsed().as_secs_f64());

        result
    }

    async fn place(&self, actor: &Actor, cmd: &CreateOrder) -> Result<PlacedOrder> {
        // Required steps
        let user = self
            .gateway
            .get_user(&actor.user_id)
            .await
            .map_err(|e| required(e, SagaError::UserNotFound(actor.user_id.clone())))?;

        let restaurant_id = cmd
            .resolve_restaurant()
            .ok_or(SagaError::MissingRestaurant)?;

        let restaurant = self
            .gateway
            .get_restaurant(&restaurant_id)
            .await
            .map_err(|e| required(e, SagaError::RestaurantNotFound(restaurant_id.clone())))?;

        let fulfillment = cmd.fulfillment(user.address.as_ref())?;

        // Persist
        let number = self.store.next_order_number().await?;
        let order = Order::place(
            OrderId::new(),
            OrderCode::from_sequence(number),
            actor.user_id.clone(),
            restaurant_id,
            cmd,
            fulfillment,
            Utc::now(),
        )?;
        self.store.insert(&order).await?;

        tracing::info!(
            order_id = %order.id(),
            order_code = %order.code(),
            total_cents = order.total_amount().cents(),
            "order persisted"
        );

        // Best-effort steps
        let mut side_effects = Vec::new();
        if let Some(step) = self.reserve_table(&order) {
            side_effects.push(step);
        }
        side_effects.push(self.clear_cart(&order));
        side_effects.push(self.notify(&order, OrderEvent::Placed));

        let report = run_side_effects(order.id(), side_effects).await;

        Ok(PlacedOrder {
            order,
            restaurant,
            report,
        })
    }

    /// Moves an order to a new status on behalf of an admin or the owner of
    /// its restaurant.
    ///
    /// Re-applying the current status succeeds without side effects. A move
    /// to `in-delivery` that names a delivery person is handled as
    /// [`Self::assign_delivery_person`], so it is admin only. A cancellation
    /// without a reason is recorded as cancelled by the restaurant.
    #[tracing::instrument(skip(self, actor, change), fields(target = %change.target, user_id = %actor.user_id))]
    pub async fn update_order_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        change: ChangeStatus,
    ) -> Result<UpdatedOrder> {
        if change.target == OrderStatus::InDelivery {
            if let Some(delivery_person_id) = change.delivery_person_id {
                return self
                    .assign_delivery_person(actor, order_id, delivery_person_id)
                    .await;
            }
        }

        let change = change.or_cancellation_reason(RESTAURANT_CANCELLATION_REASON);
        let (order, transition) = self
            .transition(actor, order_id, Capability::Transition, &change)
            .await?;

        let Transition::Applied { to, .. } = transition else {
            return Ok(unchanged(order));
        };

        let mut side_effects = Vec::new();
        if to == OrderStatus::Cancelled {
            if let Some(step) = self.release_table(&order) {
                side_effects.push(step);
            }
            side_effects.push(self.notify(
                &order,
                OrderEvent::Cancelled {
                    reason: order.cancellation_reason().map(str::to_string),
                    by: actor.role,
                },
            ));
        } else {
            side_effects.push(self.notify(&order, OrderEvent::StatusChanged(to)));
        }
        side_effects.push(self.send_sms(&order));

        let report = run_side_effects(order.id(), side_effects).await;
        Ok(changed(order, report))
    }

    /// Cancels an order.
    ///
    /// Allowed for admins, the restaurant owner and the customer who placed
    /// it. A dine-in order releases its table.
    #[tracing::instrument(skip(self, actor, reason), fields(user_id = %actor.user_id))]
    pub async fn cancel_order(
        &self,
        actor: &Actor,
        order_id: OrderId,
        reason: Option<String>,
    ) -> Result<UpdatedOrder> {
        let change = ChangeStatus::cancel(reason);
        let (order, transition) = self
            .transition(actor, order_id, Capability::Cancel, &change)
            .await?;

        if !transition.is_applied() {
            return Ok(unchanged(order));
        }

        let mut side_effects = Vec::new();
        if let Some(step) = self.release_table(&order) {
            side_effects.push(step);
        }
        side_effects.push(self.notify(
            &order,
            OrderEvent::Cancelled {
                reason: order.cancellation_reason().map(str::to_string),
                by: actor.role,
            },
        ));

        let report = run_side_effects(order.id(), side_effects).await;
        Ok(changed(order, report))
    }

    /// Updates the payment status of an order.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn update_payment_status(
        &self,
        actor: &Actor,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<UpdatedOrder> {
        let now = Utc::now();
        let (order, transition) = self
            .store
            .update(order_id, |order| {
                actor.authorize(Capability::UpdatePayment, order)?;
                order.change_payment_status(payment_status, now)
            })
            .await?;

        if !transition.is_applied() {
            return Ok(unchanged(order));
        }

        tracing::info!(%order_id, payment_status = %payment_status, "payment status updated");
        let side_effects = vec![self.notify(&order, OrderEvent::PaymentUpdated(payment_status))];
        let report = run_side_effects(order.id(), side_effects).await;
        Ok(changed(order, report))
    }

    /// Hands a delivery order to a delivery person, moving it to
    /// `in-delivery`. Admin only.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn assign_delivery_person(
        &self,
        actor: &Actor,
        order_id: OrderId,
        delivery_person_id: UserId,
    ) -> Result<UpdatedOrder> {
        let courier = self
            .gateway
            .get_user(&delivery_person_id)
            .await
            .map_err(|e| required(e, SagaError::UserNotFound(delivery_person_id.clone())))?;

        if courier.role.is_some_and(|role| role != Role::DeliveryPerson) {
            return Err(SagaError::Validation(format!(
                "User {delivery_person_id} is not a delivery person"
            )));
        }

        let change = ChangeStatus::dispatch(delivery_person_id);
        let (order, transition) = self
            .transition(actor, order_id, Capability::AssignDelivery, &change)
            .await?;

        if !transition.is_applied() {
            return Ok(unchanged(order));
        }

        let side_effects = vec![
            self.notify(&order, OrderEvent::DeliveryAssigned),
            self.send_sms(&order),
        ];
        let report = run_side_effects(order.id(), side_effects).await;
        Ok(changed(order, report))
    }

    /// Loads an order the actor may view.
    pub async fn get_order(&self, actor: &Actor, order_id: OrderId) -> Result<Order> {
        let order = self.store.require(order_id).await?;
        actor.authorize(Capability::View, &order)?;
        Ok(order)
    }

    /// Lists orders matching `query`, narrowed to what the actor may see.
    pub async fn list_orders(&self, actor: &Actor, query: OrderQuery) -> Result<Page<Order>> {
        let query = query.scope(&actor.listing_scope());
        Ok(self.store.query(&query).await?)
    }

    /// Computes order statistics over the actor's scope.
    ///
    /// Admins see every order, owners the orders of their restaurant.
    #[tracing::instrument(skip(self, actor), fields(user_id = %actor.user_id))]
    pub async fn stats(
        &self,
        actor: &Actor,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<OrderStats> {
        let scope = actor.stats_scope();
        if scope == Scope::Nothing {
            return Err(SagaError::Unauthorized(format!(
                "user {} may not view order statistics",
                actor.user_id
            )));
        }
        let query = OrderQuery::for_scope(&scope).created_between(from, to);
        Ok(self.store.stats(&query).await?)
    }

    /// Applies a status change inside one atomic store update.
    ///
    /// Authorization runs against the same snapshot the transition is
    /// checked on.
    async fn transition(
        &self,
        actor: &Actor,
        order_id: OrderId,
        capability: Capability,
        change: &ChangeStatus,
    ) -> Result<(Order, Transition<OrderStatus>)> {
        let now = Utc::now();
        let (order, transition) = self
            .store
            .update(order_id, |order| {
                actor.authorize(capability, order)?;
                order.change_status(change, now)
            })
            .await?;

        if let Transition::Applied { from, to } = transition {
            metrics::counter!("order_status_transitions_total", "to" => to.as_str())
                .increment(1);
            tracing::info!(%order_id, %from, %to, "order status changed");
        }

        Ok((order, transition))
    }

    fn reserve_table(&self, order: &Order) -> Option<SideEffect> {
        TableReservationCoordinator::reservation(order)?;
        let tables = self.tables.clone();
        let order = order.clone();
        Some(
            async move {
                match tables.reserve_for(&order).await {
                    Some(result) => {
                        vec![settle(order.id(), order_fulfillment::STEP_RESERVE_TABLE, result)]
                    }
                    None => Vec::new(),
                }
            }
            .boxed(),
        )
    }

    fn release_table(&self, order: &Order) -> Option<SideEffect> {
        TableReservationCoordinator::release(order)?;
        let tables = self.tables.clone();
        let order = order.clone();
        Some(
            async move {
                match tables.release_for(&order).await {
                    Some(result) => {
                        vec![settle(order.id(), order_fulfillment::STEP_RELEASE_TABLE, result)]
                    }
                    None => Vec::new(),
                }
            }
            .boxed(),
        )
    }

    fn clear_cart(&self, order: &Order) -> SideEffect {
        let gateway = self.gateway.clone();
        let order_id = order.id();
        let user_id = order.user_id().clone();
        async move {
            let result = gateway.clear_cart(&user_id).await;
            vec![settle(order_id, order_fulfillment::STEP_CLEAR_CART, result)]
        }
        .boxed()
    }

    fn notify(&self, order: &Order, event: OrderEvent) -> SideEffect {
        let notifier = self.notifier.clone();
        let order = order.clone();
        async move { notifier.dispatch(&order, &event).await }.boxed()
    }

    fn send_sms(&self, order: &Order) -> SideEffect {
        let notifier = self.notifier.clone();
        let order = order.clone();
        async move { vec![notifier.send_status_sms(&order).await] }.boxed()
    }
}

/// Classifies the failure of a required collaborator call.
fn required(error: GatewayError, not_found: SagaError) -> SagaError {
    match error {
        GatewayError::NotFound { .. } => not_found,
        GatewayError::Conflict { reason, .. } => SagaError::Conflict(reason),
        other => SagaError::CollaboratorUnavailable(other),
    }
}

/// Spawns every side effect and waits for all of them.
///
/// Each collaborator call is capped by the gateway timeout, so the wait is
/// bounded. Spawned tasks keep running if the caller goes away.
async fn run_side_effects(order_id: OrderId, side_effects: Vec<SideEffect>) -> SagaReport {
    let handles: Vec<_> = side_effects.into_iter().map(tokio::spawn).collect();

    let mut report = SagaReport::new();
    for joined in join_all(handles).await {
        match joined {
            Ok(outcomes) => report.extend(outcomes),
            Err(error) => tracing::error!(%order_id, %error, "side effect task aborted"),
        }
    }
    report
}

fn unchanged(order: Order) -> UpdatedOrder {
    UpdatedOrder {
        order,
        changed: false,
        report: SagaReport::new(),
    }
}

fn changed(order: Order, report: SagaReport) -> UpdatedOrder {
    UpdatedOrder {
        order,
        changed: true,
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryCollaborators;
    use crate::services::UserProfile;
    use domain::{DeliveryAddress, Money, OrderItem, OrderType};
    use order_store::InMemoryOrderStore;

    fn setup() -> (SagaCoordinator<InMemoryOrderStore>, InMemoryCollaborators) {
        let collaborators = InMemoryCollaborators::new();
        collaborators.users.add_user(UserProfile::new("alice", "Alice"));
        collaborators.users.add_user(UserProfile::new("owner", "Olga").owning("r-1"));
        collaborators
            .restaurants
            .add_restaurant(RestaurantSummary::new("r-1", "Spice Garden"));
        let coordinator = SagaCoordinator::new(InMemoryOrderStore::new(), collaborators.gateway());
        (coordinator, collaborators)
    }

    fn pickup_order() -> CreateOrder {
        CreateOrder::new(
            OrderType::Pickup,
            vec![
                OrderItem::new("m-1", 2, Money::from_cents(1250)),
                OrderItem::new("m-2", 1, Money::from_cents(500)),
            ],
        )
        .at_restaurant("r-1")
        .pickup_at("r-1")
    }

    #[tokio::test]
    async fn test_happy_path() {
        let (coordinator, collaborators) = setup();
        let actor = Actor::customer("alice");

        let placed = coordinator
            .create_order(&actor, pickup_order())
            .await
            .unwrap();

        assert_eq!(placed.order.status(), OrderStatus::Pending);
        assert_eq!(placed.order.total_amount().cents(), 3000);
        assert_eq!(placed.order.code().as_str(), "ORD001001");
        assert_eq!(placed.restaurant.name, "Spice Garden");
        assert!(placed.report.is_clean());
        assert!(placed.report.succeeded(order_fulfillment::STEP_CLEAR_CART));
        assert!(placed.report.succeeded(order_fulfillment::STEP_NOTIFY_OWNERS));
        assert_eq!(collaborators.carts.cleared(), vec![UserId::new("alice")]);
    }

    #[tokio::test]
    async fn test_unknown_user_persists_nothing() {
        let (coordinator, _) = setup();
        let result = coordinator
            .create_order(&Actor::customer("ghost"), pickup_order())
            .await;

        assert!(matches!(result, Err(SagaError::UserNotFound(_))));
        assert_eq!(coordinator.store().order_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_restaurant() {
        let (coordinator, _) = setup();
        let cmd = CreateOrder::new(
            OrderType::Pickup,
            vec![OrderItem::new("m-1", 1, Money::from_cents(500))],
        )
        .pickup_at("r-1");

        let result = coordinator.create_order(&Actor::customer("alice"), cmd).await;
        assert!(matches!(result, Err(SagaError::MissingRestaurant)));
    }

    #[tokio::test]
    async fn test_unreachable_restaurant_service_is_unavailable() {
        let (coordinator, collaborators) = setup();
        collaborators.restaurants.set_unavailable(true);

        let result = coordinator
            .create_order(&Actor::customer("alice"), pickup_order())
            .await;
        assert!(matches!(result, Err(SagaError::CollaboratorUnavailable(_))));
        assert_eq!(coordinator.store().order_count().await, 0);
    }

    #[tokio::test]
    async fn test_delivery_address_falls_back_to_profile() {
        let (coordinator, collaborators) = setup();
        let address = DeliveryAddress {
            street: "12 Galle Rd".to_string(),
            city: "Colombo".to_string(),
            ..Default::default()
        };
        collaborators
            .users
            .add_user(UserProfile::new("alice", "Alice").with_address(address.clone()));

        let cmd = CreateOrder::new(
            OrderType::Delivery,
            vec![OrderItem::new("m-1", 1, Money::from_cents(500))],
        )
        .at_restaurant("r-1");
        let placed = coordinator
            .create_order(&Actor::customer("alice"), cmd)
            .await
            .unwrap();

        assert_eq!(
            placed.order.fulfillment(),
            &domain::Fulfillment::Delivery {
                delivery_address: address
            }
        );
    }

    #[tokio::test]
    async fn test_delivery_without_any_address_is_invalid() {
        let (coordinator, _) = setup();
        let cmd = CreateOrder::new(
            OrderType::Delivery,
            vec![OrderItem::new("m-1", 1, Money::from_cents(500))],
        )
        .at_restaurant("r-1");

        let result = coordinator.create_order(&Actor::customer("alice"), cmd).await;
        assert!(matches!(result, Err(SagaError::Validation(_))));
    }

    #[tokio::test]
    async fn test_customer_cannot_move_status() {
        let (coordinator, _) = setup();
        let placed = coordinator
            .create_order(&Actor::customer("alice"), pickup_order())
            .await
            .unwrap();

        let result = coordinator
            .update_order_status(
                &Actor::customer("alice"),
                placed.order.id(),
                ChangeStatus::to(OrderStatus::Confirmed),
            )
            .await;
        assert!(matches!(result, Err(SagaError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_owner_of_other_restaurant_is_refused() {
        let (coordinator, _) = setup();
        let placed = coordinator
            .create_order(&Actor::customer("alice"), pickup_order())
            .await
            .unwrap();

        let result = coordinator
            .update_order_status(
                &Actor::owner_of("intruder", "r-2"),
                placed.order.id(),
                ChangeStatus::to(OrderStatus::Confirmed),
            )
            .await;
        assert!(matches!(result, Err(SagaError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_payment_update() {
        let (coordinator, collaborators) = setup();
        let placed = coordinator
            .create_order(&Actor::customer("alice"), pickup_order())
            .await
            .unwrap();
        let owner = Actor::owner_of("owner", "r-1");

        let updated = coordinator
            .update_payment_status(&owner, placed.order.id(), PaymentStatus::Paid)
            .await
            .unwrap();
        assert!(updated.changed);
        assert_eq!(updated.order.payment_status(), PaymentStatus::Paid);

        let payment_notes: Vec<_> = collaborators
            .notifications
            .sent_to(&UserId::new("alice"))
            .into_iter()
            .filter(|n| n.message.starts_with("Payment paid"))
            .collect();
        assert_eq!(payment_notes.len(), 1);

        let again = coordinator
            .update_payment_status(&owner, placed.order.id(), PaymentStatus::Paid)
            .await
            .unwrap();
        assert!(!again.changed);

        let result = coordinator
            .update_payment_status(&owner, placed.order.id(), PaymentStatus::Pending)
            .await;
        assert!(matches!(result, Err(SagaError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_stats_are_refused_to_customers() {
        let (coordinator, _) = setup();
        let result = coordinator.stats(&Actor::customer("alice"), None, None).await;
        assert!(matches!(result, Err(SagaError::Unauthorized(_))));
    }
}
