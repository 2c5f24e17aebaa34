//! Integration tests for the order fulfillment saga.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{RestaurantId, UserId};
use domain::{
    Actor, ChangeStatus, CreateOrder, Money, OrderItem, OrderStatus, OrderType,
    DEFAULT_CANCELLATION_REASON, RESTAURANT_CANCELLATION_REASON,
};
use order_store::{InMemoryOrderStore, OrderQuery, OrderStore, OrderStoreExt};
use saga::order_fulfillment::{
    STEP_CLEAR_CART, STEP_NOTIFY_CUSTOMER, STEP_RELEASE_TABLE, STEP_RESERVE_TABLE, STEP_SEND_SMS,
};
use saga::{
    CartService, Gateway, GatewayError, InMemoryCollaborators, RestaurantSummary, SagaCoordinator,
    SagaError, TableStatus, UserProfile,
};

type TestCoordinator = SagaCoordinator<InMemoryOrderStore>;

struct TestHarness {
    coordinator: TestCoordinator,
    store: InMemoryOrderStore,
    collaborators: InMemoryCollaborators,
}

impl TestHarness {
    fn new() -> Self {
        let collaborators = InMemoryCollaborators::new();
        Self::seed(&collaborators);
        let store = InMemoryOrderStore::new();
        let coordinator = SagaCoordinator::new(store.clone(), collaborators.gateway());

        Self {
            coordinator,
            store,
            collaborators,
        }
    }

    fn with_gateway(gateway: Gateway, collaborators: InMemoryCollaborators) -> Self {
        Self::seed(&collaborators);
        let store = InMemoryOrderStore::new();
        let coordinator = SagaCoordinator::new(store.clone(), gateway);

        Self {
            coordinator,
            store,
            collaborators,
        }
    }

    fn seed(collaborators: &InMemoryCollaborators) {
        collaborators
            .users
            .add_user(UserProfile::new("alice", "Alice").with_mobile("+94771234567"));
        collaborators.users.add_user(UserProfile::new("bob", "Bob"));
        collaborators
            .users
            .add_user(UserProfile::new("olga", "Olga").owning("r-1"));
        collaborators
            .restaurants
            .add_restaurant(RestaurantSummary::new("r-1", "Spice Garden"));
        collaborators.tables.add_table("r-1", "12");
        collaborators.carts.fill("alice");
    }

    fn owner() -> Actor {
        Actor::owner_of("olga", "r-1")
    }

    fn items() -> Vec<OrderItem> {
        vec![
            OrderItem::new("m-1", 2, Money::from_cents(1250)),
            OrderItem::new("m-2", 3, Money::from_cents(499)),
        ]
    }

    fn pickup() -> CreateOrder {
        CreateOrder::new(OrderType::Pickup, Self::items())
            .at_restaurant("r-1")
            .pickup_at("r-1")
    }

    fn dine_in(table: &str) -> CreateOrder {
        let mut cmd = CreateOrder::new(OrderType::DineIn, Self::items())
            .at_restaurant("r-1")
            .at_table(table);
        cmd.reservation_time = Some("19:30".to_string());
        cmd
    }

    fn table_status(&self) -> Option<TableStatus> {
        self.collaborators
            .tables
            .status(&RestaurantId::new("r-1"), "12")
    }
}

struct SlowCart;

#[async_trait]
impl CartService for SlowCart {
    async fn clear(&self, _user_id: &UserId) -> Result<(), GatewayError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(())
    }
}

mod placement {
    use super::*;

    #[tokio::test]
    async fn test_total_is_computed_from_items() {
        let h = TestHarness::new();

        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        // 2 x 12.50 + 3 x 4.99
        assert_eq!(placed.order.total_amount(), Money::from_cents(3997));
        assert_eq!(placed.order.status(), OrderStatus::Pending);
        assert_eq!(placed.restaurant.id, RestaurantId::new("r-1"));

        let stored = h.store.require(placed.order.id()).await.unwrap();
        assert_eq!(stored, placed.order);
    }

    #[tokio::test]
    async fn test_codes_are_unique_and_increasing() {
        let h = TestHarness::new();
        let actor = Actor::customer("alice");

        let mut codes = Vec::new();
        for _ in 0..5 {
            let placed = h
                .coordinator
                .create_order(&actor, TestHarness::pickup())
                .await
                .unwrap();
            codes.push(placed.order.code().to_string());
        }

        assert_eq!(
            codes,
            vec!["ORD001001", "ORD001002", "ORD001003", "ORD001004", "ORD001005"]
        );
    }

    #[tokio::test]
    async fn test_concurrent_placements_get_distinct_codes() {
        let h = Arc::new(TestHarness::new());

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let h = Arc::clone(&h);
                tokio::spawn(async move {
                    h.coordinator
                        .create_order(&Actor::customer("alice"), TestHarness::pickup())
                        .await
                        .unwrap()
                        .order
                        .code()
                        .to_string()
                })
            })
            .collect();

        let mut codes = Vec::new();
        for handle in handles {
            codes.push(handle.await.unwrap());
        }
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), 10);
    }

    #[tokio::test]
    async fn test_side_effects_run_after_persist() {
        let h = TestHarness::new();

        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        assert!(placed.report.is_clean());
        assert!(placed.report.succeeded(STEP_CLEAR_CART));
        assert!(placed.report.succeeded(STEP_NOTIFY_CUSTOMER));
        assert!(!h.collaborators.carts.has_items(&UserId::new("alice")));

        let owner_notes = h.collaborators.notifications.sent_to(&UserId::new("olga"));
        assert_eq!(owner_notes.len(), 1);
        assert_eq!(owner_notes[0].message, "New order received: ORD001001");
        assert_eq!(owner_notes[0].reference_id, placed.order.id());
    }

    #[tokio::test]
    async fn test_restaurant_not_found_persists_nothing() {
        let h = TestHarness::new();
        let cmd = CreateOrder::new(OrderType::Pickup, TestHarness::items())
            .at_restaurant("r-404")
            .pickup_at("r-404");

        let result = h
            .coordinator
            .create_order(&Actor::customer("alice"), cmd)
            .await;

        assert!(matches!(result, Err(SagaError::RestaurantNotFound(_))));
        assert_eq!(h.store.order_count().await, 0);
        assert!(h.collaborators.notifications.sent().is_empty());
        assert!(h.collaborators.carts.cleared().is_empty());
    }

    #[tokio::test]
    async fn test_restaurant_resolved_from_first_item() {
        let h = TestHarness::new();
        let mut cmd = CreateOrder::new(OrderType::Pickup, TestHarness::items()).pickup_at("r-1");
        cmd.items[0].restaurant_id = Some(RestaurantId::new("r-1"));

        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), cmd)
            .await
            .unwrap();
        assert_eq!(placed.order.restaurant_id(), &RestaurantId::new("r-1"));
    }

    #[tokio::test]
    async fn test_empty_order_is_rejected() {
        let h = TestHarness::new();
        let cmd = CreateOrder::new(OrderType::Pickup, vec![])
            .at_restaurant("r-1")
            .pickup_at("r-1");

        let result = h
            .coordinator
            .create_order(&Actor::customer("alice"), cmd)
            .await;
        assert!(matches!(result, Err(SagaError::Validation(_))));
        assert_eq!(h.store.order_count().await, 0);
    }

    #[tokio::test]
    async fn test_failed_side_effects_keep_the_order() {
        let h = TestHarness::new();
        h.collaborators.carts.set_unavailable(true);
        h.collaborators.notifications.set_unavailable(true);

        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        assert!(placed.report.failed(STEP_CLEAR_CART));
        assert!(placed.report.failed(STEP_NOTIFY_CUSTOMER));
        assert!(h.store.get(placed.order.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_slow_cart_times_out_without_failing_placement() {
        let collaborators = InMemoryCollaborators::new();
        let gateway = Gateway::new(
            Arc::new(collaborators.users.clone()),
            Arc::new(collaborators.restaurants.clone()),
            Arc::new(collaborators.tables.clone()),
            Arc::new(SlowCart),
            Arc::new(collaborators.notifications.clone()),
        )
        .with_timeout(Duration::from_millis(50));
        let h = TestHarness::with_gateway(gateway, collaborators);

        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        assert!(placed.report.failed(STEP_CLEAR_CART));
        assert!(placed.report.succeeded(STEP_NOTIFY_CUSTOMER));
        let failure = placed.report.failures().next().unwrap();
        assert_eq!(failure.step, STEP_CLEAR_CART);
    }
}

mod dine_in {
    use super::*;

    #[tokio::test]
    async fn test_reserves_the_table() {
        let h = TestHarness::new();

        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::dine_in("12"))
            .await
            .unwrap();

        assert_eq!(placed.order.status(), OrderStatus::Pending);
        assert!(placed.report.succeeded(STEP_RESERVE_TABLE));
        assert_eq!(h.table_status(), Some(TableStatus::Reserved));
    }

    #[tokio::test]
    async fn test_second_order_for_taken_table_still_persists() {
        let h = TestHarness::new();

        let first = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::dine_in("12"))
            .await
            .unwrap();
        let second = h
            .coordinator
            .create_order(&Actor::customer("bob"), TestHarness::dine_in("12"))
            .await
            .unwrap();

        assert!(second.report.failed(STEP_RESERVE_TABLE));
        let stored = h.store.require(second.order.id()).await.unwrap();
        assert_eq!(stored.status(), OrderStatus::Pending);

        assert_eq!(h.table_status(), Some(TableStatus::Reserved));
        assert_eq!(
            h.collaborators
                .tables
                .held_by(&RestaurantId::new("r-1"), "12"),
            Some(first.order.id())
        );
    }

    #[tokio::test]
    async fn test_unknown_table_still_persists() {
        let h = TestHarness::new();

        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::dine_in("99"))
            .await
            .unwrap();

        assert!(placed.report.failed(STEP_RESERVE_TABLE));
        assert!(h.store.get(placed.order.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_cancel_releases_the_table() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::dine_in("12"))
            .await
            .unwrap();

        let cancelled = h
            .coordinator
            .cancel_order(
                &Actor::customer("alice"),
                placed.order.id(),
                Some("changed mind".to_string()),
            )
            .await
            .unwrap();

        assert!(cancelled.changed);
        assert_eq!(cancelled.order.status(), OrderStatus::Cancelled);
        assert!(cancelled.order.cancelled_at().is_some());
        assert_eq!(cancelled.order.cancellation_reason(), Some("changed mind"));
        assert!(cancelled.report.succeeded(STEP_RELEASE_TABLE));
        assert_eq!(h.table_status(), Some(TableStatus::Available));
    }

    #[tokio::test]
    async fn test_cancel_of_loser_does_not_free_winner_table() {
        let h = TestHarness::new();
        let first = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::dine_in("12"))
            .await
            .unwrap();
        let second = h
            .coordinator
            .create_order(&Actor::customer("bob"), TestHarness::dine_in("12"))
            .await
            .unwrap();

        let cancelled = h
            .coordinator
            .cancel_order(&Actor::customer("bob"), second.order.id(), None)
            .await
            .unwrap();

        assert!(cancelled.report.failed(STEP_RELEASE_TABLE));
        assert_eq!(
            h.collaborators
                .tables
                .held_by(&RestaurantId::new("r-1"), "12"),
            Some(first.order.id())
        );
    }
}

mod lifecycle {
    use super::*;

    #[tokio::test]
    async fn test_pickup_happy_path() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();
        let id = placed.order.id();

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ] {
            let updated = h
                .coordinator
                .update_order_status(&TestHarness::owner(), id, ChangeStatus::to(status))
                .await
                .unwrap();
            assert!(updated.changed);
            assert_eq!(updated.order.status(), status);
        }

        let order = h.store.require(id).await.unwrap();
        assert!(order.delivered_at().is_some());
        assert!(order.is_terminal());

        // alice has a mobile number, one text per status change
        assert_eq!(h.collaborators.sms.sent().len(), 4);
    }

    #[tokio::test]
    async fn test_same_status_is_a_noop() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();
        let id = placed.order.id();

        let first = h
            .coordinator
            .update_order_status(&TestHarness::owner(), id, ChangeStatus::to(OrderStatus::Confirmed))
            .await
            .unwrap();
        let notified = h.collaborators.notifications.sent().len();

        let second = h
            .coordinator
            .update_order_status(&TestHarness::owner(), id, ChangeStatus::to(OrderStatus::Confirmed))
            .await
            .unwrap();

        assert!(!second.changed);
        assert!(second.report.is_empty());
        assert_eq!(second.order, first.order);
        assert_eq!(h.collaborators.notifications.sent().len(), notified);
    }

    #[tokio::test]
    async fn test_out_of_order_transition_leaves_order_unchanged() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();
        let id = placed.order.id();

        let result = h
            .coordinator
            .update_order_status(&TestHarness::owner(), id, ChangeStatus::to(OrderStatus::Delivered))
            .await;

        assert!(matches!(result, Err(SagaError::InvalidTransition(_))));
        assert_eq!(h.store.require(id).await.unwrap(), placed.order);
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let h = TestHarness::new();
        let result = h
            .coordinator
            .update_order_status(
                &TestHarness::owner(),
                common::OrderId::new(),
                ChangeStatus::to(OrderStatus::Confirmed),
            )
            .await;
        assert!(matches!(result, Err(SagaError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_without_reason_uses_default() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        let cancelled = h
            .coordinator
            .cancel_order(&TestHarness::owner(), placed.order.id(), None)
            .await
            .unwrap();

        assert_eq!(
            cancelled.order.cancellation_reason(),
            Some(DEFAULT_CANCELLATION_REASON)
        );
        // pickup orders hold no table
        assert!(!cancelled.report.succeeded(STEP_RELEASE_TABLE));
        assert_eq!(h.collaborators.tables.release_calls(), 0);
    }

    #[tokio::test]
    async fn test_customer_cancellation_tells_owners() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        h.coordinator
            .cancel_order(&Actor::customer("alice"), placed.order.id(), None)
            .await
            .unwrap();

        let owner_notes = h.collaborators.notifications.sent_to(&UserId::new("olga"));
        assert!(owner_notes.iter().any(|n| n.title == "Cancelled Order ORD001001"));
    }

    #[tokio::test]
    async fn test_admin_cancellation_tells_owners() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        h.coordinator
            .cancel_order(&Actor::admin("root"), placed.order.id(), None)
            .await
            .unwrap();

        let titles: Vec<_> = h
            .collaborators
            .notifications
            .sent_to(&UserId::new("olga"))
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, ["New Order ORD001001", "Cancelled Order ORD001001"]);
    }

    #[tokio::test]
    async fn test_owner_not_told_about_own_cancellation() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        h.coordinator
            .cancel_order(&TestHarness::owner(), placed.order.id(), None)
            .await
            .unwrap();

        let owner_notes = h.collaborators.notifications.sent_to(&UserId::new("olga"));
        assert_eq!(owner_notes.len(), 1);
    }

    #[tokio::test]
    async fn test_status_cancellation_defaults_to_restaurant_reason() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        let cancelled = h
            .coordinator
            .update_order_status(
                &TestHarness::owner(),
                placed.order.id(),
                ChangeStatus::to(OrderStatus::Cancelled),
            )
            .await
            .unwrap();

        assert_eq!(
            cancelled.order.cancellation_reason(),
            Some(RESTAURANT_CANCELLATION_REASON)
        );
        let customer_notes = h.collaborators.notifications.sent_to(&UserId::new("alice"));
        assert!(
            customer_notes
                .iter()
                .any(|n| n.message == "Order ORD001001 has been cancelled: Cancelled by restaurant")
        );
    }

    #[tokio::test]
    async fn test_other_customer_cannot_cancel() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        let result = h
            .coordinator
            .cancel_order(&Actor::customer("bob"), placed.order.id(), None)
            .await;
        assert!(matches!(result, Err(SagaError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_delivered_order_cannot_be_cancelled() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();
        let id = placed.order.id();
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ] {
            h.coordinator
                .update_order_status(&TestHarness::owner(), id, ChangeStatus::to(status))
                .await
                .unwrap();
        }

        let result = h
            .coordinator
            .cancel_order(&Actor::customer("alice"), id, None)
            .await;
        assert!(matches!(result, Err(SagaError::InvalidTransition(_))));
    }

    #[tokio::test]
    async fn test_sms_failure_is_reported_only() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();
        h.collaborators.users.set_unavailable(true);

        let updated = h
            .coordinator
            .update_order_status(
                &TestHarness::owner(),
                placed.order.id(),
                ChangeStatus::to(OrderStatus::Confirmed),
            )
            .await
            .unwrap();

        assert!(updated.changed);
        assert!(updated.report.failed(STEP_SEND_SMS));
    }
}

mod delivery {
    use super::*;
    use domain::DeliveryAddress;

    async fn ready_delivery_order(h: &TestHarness) -> common::OrderId {
        let address = DeliveryAddress {
            street: "12 Galle Rd".to_string(),
            city: "Colombo".to_string(),
            ..Default::default()
        };
        let cmd = CreateOrder::new(OrderType::Delivery, TestHarness::items())
            .at_restaurant("r-1")
            .deliver_to(address);
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), cmd)
            .await
            .unwrap();
        let id = placed.order.id();
        for status in [OrderStatus::Confirmed, OrderStatus::Preparing, OrderStatus::Ready] {
            h.coordinator
                .update_order_status(&TestHarness::owner(), id, ChangeStatus::to(status))
                .await
                .unwrap();
        }
        id
    }

    #[tokio::test]
    async fn test_admin_assigns_delivery_person() {
        let h = TestHarness::new();
        h.collaborators.users.add_user(UserProfile {
            role: Some(domain::Role::DeliveryPerson),
            ..UserProfile::new("dan", "Dan")
        });
        let id = ready_delivery_order(&h).await;

        let updated = h
            .coordinator
            .assign_delivery_person(&Actor::admin("root"), id, UserId::new("dan"))
            .await
            .unwrap();

        assert_eq!(updated.order.status(), OrderStatus::InDelivery);
        assert_eq!(updated.order.delivery_person_id(), Some(&UserId::new("dan")));

        let courier_notes = h.collaborators.notifications.sent_to(&UserId::new("dan"));
        assert_eq!(courier_notes.len(), 1);
        assert_eq!(
            courier_notes[0].message,
            "You have been assigned to deliver order ORD001001"
        );

        let page = h
            .coordinator
            .list_orders(&Actor::delivery_person("dan"), OrderQuery::new())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn test_owner_cannot_assign() {
        let h = TestHarness::new();
        h.collaborators.users.add_user(UserProfile {
            role: Some(domain::Role::DeliveryPerson),
            ..UserProfile::new("dan", "Dan")
        });
        let id = ready_delivery_order(&h).await;

        let result = h
            .coordinator
            .assign_delivery_person(&TestHarness::owner(), id, UserId::new("dan"))
            .await;
        assert!(matches!(result, Err(SagaError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_owner_cannot_attach_courier_through_status_change() {
        let h = TestHarness::new();
        h.collaborators.users.add_user(UserProfile {
            role: Some(domain::Role::DeliveryPerson),
            ..UserProfile::new("dan", "Dan")
        });
        let id = ready_delivery_order(&h).await;

        let result = h
            .coordinator
            .update_order_status(
                &TestHarness::owner(),
                id,
                ChangeStatus::dispatch(UserId::new("dan")),
            )
            .await;
        assert!(matches!(result, Err(SagaError::Unauthorized(_))));

        let result = h
            .coordinator
            .update_order_status(
                &TestHarness::owner(),
                id,
                ChangeStatus::dispatch(UserId::new("bob")),
            )
            .await;
        assert!(matches!(result, Err(SagaError::Validation(_))));

        let order = h.store.require(id).await.unwrap();
        assert_eq!(order.status(), OrderStatus::Ready);
        assert_eq!(order.delivery_person_id(), None);
    }

    #[tokio::test]
    async fn test_admin_status_change_with_courier_is_an_assignment() {
        let h = TestHarness::new();
        h.collaborators.users.add_user(UserProfile {
            role: Some(domain::Role::DeliveryPerson),
            ..UserProfile::new("dan", "Dan")
        });
        let id = ready_delivery_order(&h).await;

        let updated = h
            .coordinator
            .update_order_status(
                &Actor::admin("root"),
                id,
                ChangeStatus::dispatch(UserId::new("dan")),
            )
            .await
            .unwrap();

        assert_eq!(updated.order.delivery_person_id(), Some(&UserId::new("dan")));
        let courier_notes = h.collaborators.notifications.sent_to(&UserId::new("dan"));
        assert_eq!(courier_notes.len(), 1);
    }

    #[tokio::test]
    async fn test_customer_is_not_a_courier() {
        let h = TestHarness::new();
        let id = ready_delivery_order(&h).await;

        let result = h
            .coordinator
            .assign_delivery_person(&Actor::admin("root"), id, UserId::new("bob"))
            .await;
        assert!(matches!(result, Err(SagaError::Validation(_))));
    }

    #[tokio::test]
    async fn test_unknown_courier() {
        let h = TestHarness::new();
        let id = ready_delivery_order(&h).await;

        let result = h
            .coordinator
            .assign_delivery_person(&Actor::admin("root"), id, UserId::new("ghost"))
            .await;
        assert!(matches!(result, Err(SagaError::UserNotFound(_))));
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn test_listing_is_scoped() {
        let h = TestHarness::new();
        h.coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();
        h.coordinator
            .create_order(&Actor::customer("bob"), TestHarness::pickup())
            .await
            .unwrap();

        let alice = h
            .coordinator
            .list_orders(&Actor::customer("alice"), OrderQuery::new())
            .await
            .unwrap();
        assert_eq!(alice.total, 1);

        // a customer cannot widen the scope by filtering on someone else
        let snooping = h
            .coordinator
            .list_orders(
                &Actor::customer("alice"),
                OrderQuery::new().user(UserId::new("bob")),
            )
            .await
            .unwrap();
        assert_eq!(snooping.total, 1);
        assert_eq!(snooping.items[0].user_id(), &UserId::new("alice"));

        let owner = h
            .coordinator
            .list_orders(&TestHarness::owner(), OrderQuery::new())
            .await
            .unwrap();
        assert_eq!(owner.total, 2);

        let other_owner = h
            .coordinator
            .list_orders(&Actor::owner_of("zed", "r-2"), OrderQuery::new())
            .await
            .unwrap();
        assert_eq!(other_owner.total, 0);
    }

    #[tokio::test]
    async fn test_get_order_requires_view() {
        let h = TestHarness::new();
        let placed = h
            .coordinator
            .create_order(&Actor::customer("alice"), TestHarness::pickup())
            .await
            .unwrap();

        assert!(
            h.coordinator
                .get_order(&Actor::customer("alice"), placed.order.id())
                .await
                .is_ok()
        );
        assert!(matches!(
            h.coordinator
                .get_order(&Actor::customer("bob"), placed.order.id())
                .await,
            Err(SagaError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_stats_for_owner() {
        let h = TestHarness::new();
        for _ in 0..3 {
            h.coordinator
                .create_order(&Actor::customer("alice"), TestHarness::pickup())
                .await
                .unwrap();
        }
        h.coordinator
            .create_order(&Actor::customer("alice"), TestHarness::dine_in("12"))
            .await
            .unwrap();

        let stats = h
            .coordinator
            .stats(&TestHarness::owner(), None, None)
            .await
            .unwrap();
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.total_revenue, Money::from_cents(4 * 3997));
        assert_eq!(stats.average_order_value, Money::from_cents(3997));
        assert_eq!(stats.status_counts[&OrderStatus::Pending], 4);
        assert_eq!(stats.order_type_stats[&OrderType::Pickup].count, 3);
    }
}
