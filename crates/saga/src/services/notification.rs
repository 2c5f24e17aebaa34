//! Notification service trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{OrderId, UserId};
use domain::{Message, Order, OrderStatus, Severity};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub(crate) const SERVICE: &str = "notification";

/// Reference model attached to every order notification.
pub const REFERENCE_MODEL: &str = "Order";

/// Metadata attached to an order notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    /// Human-readable order code.
    pub order_id: String,
    pub status: OrderStatus,
}

/// A notification for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub user_id: UserId,
    pub reference_id: OrderId,
    pub reference_model: String,
    #[serde(rename = "type")]
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub data: NotificationData,
}

impl Notification {
    /// Builds the notification delivering `message` about `order` to `user_id`.
    pub fn about(order: &Order, user_id: UserId, message: Message) -> Self {
        Self {
            user_id,
            reference_id: order.id(),
            reference_model: REFERENCE_MODEL.to_string(),
            severity: message.severity,
            title: message.title,
            message: message.message,
            data: NotificationData {
                order_id: order.code().to_string(),
                status: order.status(),
            },
        }
    }
}

/// Trait for delivering notifications.
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryNotificationState {
    sent: Vec<Notification>,
    unavailable: bool,
}

/// In-memory notification service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotificationService {
    state: Arc<RwLock<InMemoryNotificationState>>,
}

impl InMemoryNotificationService {
    /// Creates a new in-memory notification service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every notification delivered so far.
    pub fn sent(&self) -> Vec<Notification> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sent
            .clone()
    }

    /// Returns the notifications delivered to `user_id`.
    pub fn sent_to(&self, user_id: &UserId) -> Vec<Notification> {
        self.sent()
            .into_iter()
            .filter(|n| &n.user_id == user_id)
            .collect()
    }

    /// Configures the service to fail every call as unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unavailable = unavailable;
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn send(&self, notification: &Notification) -> Result<(), GatewayError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(GatewayError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        state.sent.push(notification.clone());
        Ok(())
    }
}
