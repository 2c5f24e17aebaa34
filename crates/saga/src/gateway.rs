//! Collaborator gateway.
//!
//! Wraps every collaborator behind one cloneable handle and bounds each call
//! with a timeout. A call that does not answer in time fails with
//! [`GatewayError::Timeout`], distinct from `NotFound`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{RestaurantId, UserId};

use crate::error::GatewayError;
use crate::services::{
    CartService, InMemoryCartService, InMemoryNotificationService, InMemoryRestaurantService,
    InMemorySmsService, InMemoryTableService, InMemoryUserService, Notification,
    NotificationService, RestaurantService, RestaurantSummary, SmsRequest, SmsService,
    TableRelease, TableReservation, TableService, UserProfile, UserService, cart, notification,
    restaurant, sms, table, user,
};

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Handle to the collaborator services.
#[derive(Clone)]
pub struct Gateway {
    users: Arc<dyn UserService>,
    restaurants: Arc<dyn RestaurantService>,
    tables: Arc<dyn TableService>,
    carts: Arc<dyn CartService>,
    notifications: Arc<dyn NotificationService>,
    sms: Option<Arc<dyn SmsService>>,
    timeout: Duration,
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("sms", &self.sms.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Creates a gateway without an SMS service, using [`DEFAULT_TIMEOUT`].
    pub fn new(
        users: Arc<dyn UserService>,
        restaurants: Arc<dyn RestaurantService>,
        tables: Arc<dyn TableService>,
        carts: Arc<dyn CartService>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            users,
            restaurants,
            tables,
            carts,
            notifications,
            sms: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Enables text messages.
    pub fn with_sms(mut self, sms: Arc<dyn SmsService>) -> Self {
        self.sms = Some(sms);
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns true if an SMS service is configured.
    pub fn has_sms(&self) -> bool {
        self.sms.is_some()
    }

    async fn call<T, F>(&self, service: &'static str, fut: F) -> Result<T, GatewayError>
    where
        F: Future<Output = Result<T, GatewayError>>,
    {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout {
                service,
                after: self.timeout,
            }),
        };
        metrics::histogram!("collaborator_call_duration_seconds", "service" => service)
            .record(start.elapsed().as_secs_f64());
        if let Err(ref error) = result {
            tracing::debug!(service, %error, "collaborator call failed");
        }
        result
    }

    pub async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, GatewayError> {
        self.call(user::SERVICE, self.users.get_user(user_id)).await
    }

    pub async fn restaurant_owners(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<UserProfile>, GatewayError> {
        self.call(user::SERVICE, self.users.restaurant_owners(restaurant_id))
            .await
    }

    pub async fn get_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<RestaurantSummary, GatewayError> {
        self.call(
            restaurant::SERVICE,
            self.restaurants.get_restaurant(restaurant_id),
        )
        .await
    }

    pub async fn reserve_table(&self, reservation: &TableReservation) -> Result<(), GatewayError> {
        self.call(table::SERVICE, self.tables.reserve(reservation))
            .await
    }

    pub async fn release_table(&self, release: &TableRelease) -> Result<(), GatewayError> {
        self.call(table::SERVICE, self.tables.release(release)).await
    }

    pub async fn clear_cart(&self, user_id: &UserId) -> Result<(), GatewayError> {
        self.call(cart::SERVICE, self.carts.clear(user_id)).await
    }

    pub async fn notify(&self, notification: &Notification) -> Result<(), GatewayError> {
        self.call(notification::SERVICE, self.notifications.send(notification))
            .await
    }

    /// Sends a text message. Succeeds without sending when no SMS service is
    /// configured.
    pub async fn send_sms(&self, request: &SmsRequest) -> Result<(), GatewayError> {
        match &self.sms {
            Some(service) => self.call(sms::SERVICE, service.send_template(request)).await,
            None => Ok(()),
        }
    }
}

/// In-memory collaborators sharing state with the gateway built from them.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollaborators {
    pub users: InMemoryUserService,
    pub restaurants: InMemoryRestaurantService,
    pub tables: InMemoryTableService,
    pub carts: InMemoryCartService,
    pub notifications: InMemoryNotificationService,
    pub sms: InMemorySmsService,
}

impl InMemoryCollaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a gateway over these collaborators, SMS included.
    pub fn gateway(&self) -> Gateway {
        Gateway::new(
            Arc::new(self.users.clone()),
            Arc::new(self.restaurants.clone()),
            Arc::new(self.tables.clone()),
            Arc::new(self.carts.clone()),
            Arc::new(self.notifications.clone()),
        )
        .with_sms(Arc::new(self.sms.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct SlowCart;

    #[async_trait]
    impl CartService for SlowCart {
        async fn clear(&self, _user_id: &UserId) -> Result<(), GatewayError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_slow_call_times_out() {
        let collaborators = InMemoryCollaborators::new();
        let gateway = Gateway::new(
            Arc::new(collaborators.users.clone()),
            Arc::new(collaborators.restaurants.clone()),
            Arc::new(collaborators.tables.clone()),
            Arc::new(SlowCart),
            Arc::new(collaborators.notifications.clone()),
        )
        .with_timeout(Duration::from_millis(20));

        let result = gateway.clear_cart(&UserId::new("u-1")).await;
        assert!(matches!(
            result,
            Err(GatewayError::Timeout { service: "cart", .. })
        ));
    }

    #[tokio::test]
    async fn test_not_found_is_not_a_timeout() {
        let gateway = InMemoryCollaborators::new().gateway();
        let result = gateway.get_user(&UserId::new("ghost")).await;
        assert!(matches!(result, Err(GatewayError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_sms_is_optional() {
        let collaborators = InMemoryCollaborators::new();
        let gateway = Gateway::new(
            Arc::new(collaborators.users.clone()),
            Arc::new(collaborators.restaurants.clone()),
            Arc::new(collaborators.tables.clone()),
            Arc::new(collaborators.carts.clone()),
            Arc::new(collaborators.notifications.clone()),
        );
        assert!(!gateway.has_sms());

        let request = SmsRequest::order_status(
            UserId::new("u-1"),
            "ORD001001",
            domain::OrderStatus::Ready,
        );
        gateway.send_sms(&request).await.unwrap();
        assert!(collaborators.sms.sent().is_empty());
    }
}
