//! SMS service trait and in-memory implementation.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::UserId;
use domain::OrderStatus;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub(crate) const SERVICE: &str = "sms";

/// Template used for order status messages.
pub const ORDER_STATUS_TEMPLATE: &str = "order_status";

/// Data rendered into the order status template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsData {
    pub order_id: String,
    pub status: OrderStatus,
}

/// A templated SMS for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsRequest {
    pub user_id: UserId,
    pub template_type: String,
    pub data: SmsData,
}

impl SmsRequest {
    /// Builds an order status SMS.
    pub fn order_status(user_id: UserId, order_code: impl Into<String>, status: OrderStatus) -> Self {
        Self {
            user_id,
            template_type: ORDER_STATUS_TEMPLATE.to_string(),
            data: SmsData {
                order_id: order_code.into(),
                status,
            },
        }
    }
}

/// Trait for sending templated text messages.
#[async_trait]
pub trait SmsService: Send + Sync {
    async fn send_template(&self, request: &SmsRequest) -> Result<(), GatewayError>;
}

/// In-memory SMS service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemorySmsService {
    sent: Arc<RwLock<Vec<SmsRequest>>>,
}

impl InMemorySmsService {
    /// Creates a new in-memory SMS service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every message sent so far.
    pub fn sent(&self) -> Vec<SmsRequest> {
        self.sent
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SmsService for InMemorySmsService {
    async fn send_template(&self, request: &SmsRequest) -> Result<(), GatewayError> {
        self.sent
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        Ok(())
    }
}
