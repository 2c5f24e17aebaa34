use common::OrderId;
use domain::OrderError;
use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The order was not found.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// An order with the same id or code already exists.
    #[error("Duplicate order: {0}")]
    Duplicate(String),

    /// The mutation applied inside an atomic update was rejected.
    #[error(transparent)]
    Order(#[from] OrderError),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored column holds a value the domain does not know.
    #[error("Invalid stored value: {0}")]
    InvalidRow(String),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
