//! Saga error types.

use std::time::Duration;

use common::{OrderId, RestaurantId, UserId};
use domain::OrderError;
use order_store::StoreError;
use thiserror::Error;

/// Typed outcome of a failed collaborator call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The referenced entity does not exist.
    #[error("{service}: {resource} not found")]
    NotFound {
        service: &'static str,
        resource: String,
    },

    /// The collaborator refused because of its own state (e.g. table taken).
    #[error("{service}: conflict: {reason}")]
    Conflict {
        service: &'static str,
        reason: String,
    },

    /// The collaborator rejected the request as invalid.
    #[error("{service}: rejected with status {status}: {reason}")]
    Rejected {
        service: &'static str,
        status: u16,
        reason: String,
    },

    /// The collaborator could not be reached or failed internally.
    #[error("{service}: unavailable: {reason}")]
    Unavailable {
        service: &'static str,
        reason: String,
    },

    /// The collaborator did not answer within the call timeout.
    #[error("{service}: timed out after {after:?}")]
    Timeout {
        service: &'static str,
        after: Duration,
    },
}

impl GatewayError {
    /// Returns the collaborator the error came from.
    pub fn service(&self) -> &'static str {
        match self {
            GatewayError::NotFound { service, .. }
            | GatewayError::Conflict { service, .. }
            | GatewayError::Rejected { service, .. }
            | GatewayError::Unavailable { service, .. }
            | GatewayError::Timeout { service, .. } => service,
        }
    }

    /// Returns true for transport failures and timeouts.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            GatewayError::Unavailable { .. } | GatewayError::Timeout { .. }
        )
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::NotFound { .. } => "not_found",
            GatewayError::Conflict { .. } => "conflict",
            GatewayError::Rejected { .. } => "rejected",
            GatewayError::Unavailable { .. } => "unavailable",
            GatewayError::Timeout { .. } => "timeout",
        }
    }
}

/// Errors surfaced to callers of the saga orchestrator.
///
/// Only required steps and the store produce these; best-effort failures are
/// reported through [`crate::SagaReport`] instead.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Malformed or incomplete request.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Neither the request nor its items name a restaurant.
    #[error("Restaurant ID is required")]
    MissingRestaurant,

    /// The requesting user does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// The restaurant does not exist.
    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(RestaurantId),

    /// The order does not exist.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The actor lacks the role or ownership for the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The requested status change is not allowed.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A collaborator refused a required step because of its own state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collaborator needed for a required step could not be reached.
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(GatewayError),

    /// Persistence failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl From<OrderError> for SagaError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Unauthorized { .. } => SagaError::Unauthorized(err.to_string()),
            OrderError::InvalidTransition { .. } | OrderError::InvalidPaymentTransition { .. } => {
                SagaError::InvalidTransition(err.to_string())
            }
            _ => SagaError::Validation(err.to_string()),
        }
    }
}

impl From<StoreError> for SagaError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => SagaError::OrderNotFound(id),
            StoreError::Order(order_err) => order_err.into(),
            other => SagaError::Store(other),
        }
    }
}

impl SagaError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            SagaError::Validation(_) => "validation",
            SagaError::MissingRestaurant => "missing_restaurant",
            SagaError::UserNotFound(_) => "user_not_found",
            SagaError::RestaurantNotFound(_) => "restaurant_not_found",
            SagaError::OrderNotFound(_) => "order_not_found",
            SagaError::Unauthorized(_) => "unauthorized",
            SagaError::InvalidTransition(_) => "invalid_transition",
            SagaError::Conflict(_) => "conflict",
            SagaError::CollaboratorUnavailable(_) => "collaborator_unavailable",
            SagaError::Store(_) => "store",
        }
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
