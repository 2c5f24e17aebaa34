//! Order aggregate and related types.

mod aggregate;
mod commands;
mod payment;
mod state;
mod value_objects;

pub use aggregate::{
    DEFAULT_CANCELLATION_REASON, Order, RESTAURANT_CANCELLATION_REASON, Transition, compute_total,
};
pub use commands::{ChangeStatus, CreateOrder, OrderLine};
pub use payment::PaymentStatus;
pub use state::OrderStatus;
pub use value_objects::{
    AddonSelection, DeliveryAddress, Fulfillment, Money, OrderCode, OrderItem, OrderType,
    SelectedAddon, TableBooking,
};

use thiserror::Error;

/// Errors that can occur during order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order has no items.
    #[error("Order has no items")]
    NoItems,

    /// Invalid quantity.
    #[error("Invalid quantity for item {menu_item_id}: {quantity} (must be greater than 0)")]
    InvalidQuantity { menu_item_id: String, quantity: u32 },

    /// Invalid price.
    #[error("Invalid price for item {menu_item_id}: {price} (must not be negative)")]
    InvalidPrice { menu_item_id: String, price: i64 },

    /// The order total does not fit in an `i64` of cents.
    #[error("Order total is out of range")]
    TotalOutOfRange,

    /// A field required by the order type is missing.
    #[error("{field} is required for {order_type} orders")]
    MissingFulfillmentDetail {
        order_type: OrderType,
        field: &'static str,
    },

    /// Fulfillment details do not match the declared order type.
    #[error("Fulfillment for {fulfillment} does not match order type {order_type}")]
    FulfillmentMismatch {
        order_type: OrderType,
        fulfillment: OrderType,
    },

    /// Status change not allowed by the state machine.
    #[error("Invalid status transition from {from} to {to} for {order_type} order")]
    InvalidTransition {
        from: OrderStatus,
        to: OrderStatus,
        order_type: OrderType,
    },

    /// Payment status change not allowed.
    #[error("Invalid payment status transition from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// A delivery person was supplied for a status other than in-delivery.
    #[error("Delivery person can only be assigned when moving to in-delivery, not {target}")]
    DeliveryPersonNotAllowed { target: OrderStatus },

    /// The actor may not perform the operation on this order.
    #[error("User {user_id} is not allowed to {capability} this order")]
    Unauthorized {
        capability: crate::Capability,
        user_id: String,
    },
}

impl OrderError {
    /// Returns true if the error is caused by invalid input rather than by
    /// the current order state or the caller's permissions.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::NoItems
                | OrderError::InvalidQuantity { .. }
                | OrderError::InvalidPrice { .. }
                | OrderError::TotalOutOfRange
                | OrderError::MissingFulfillmentDetail { .. }
                | OrderError::FulfillmentMismatch { .. }
                | OrderError::DeliveryPersonNotAllowed { .. }
        )
    }
}
