//! Order status state machine.

use serde::{Deserialize, Serialize};

use super::OrderType;

/// The status of an order in its lifecycle.
///
/// State transitions:
/// ```text
/// Pending ──► Confirmed ──► Preparing ──► Ready ──┬──► InDelivery ──► Delivered   (delivery)
///                                                 └──────────────────► Delivered   (pickup, dine-in)
///
/// any non-terminal status ──► Cancelled
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    /// Order was placed and awaits the restaurant.
    #[default]
    Pending,

    /// Restaurant accepted the order.
    Confirmed,

    /// Kitchen is working on the order.
    Preparing,

    /// Order is ready for pickup, serving or hand-off to a courier.
    Ready,

    /// A courier is on the way (delivery orders only).
    InDelivery,

    /// Order reached the customer (terminal state).
    Delivered,

    /// Order was cancelled (terminal state).
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::InDelivery,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Returns the next status on the happy path for the given order type.
    ///
    /// `None` for terminal statuses.
    pub fn next(&self, order_type: OrderType) -> Option<OrderStatus> {
        match (self, order_type) {
            (OrderStatus::Pending, _) => Some(OrderStatus::Confirmed),
            (OrderStatus::Confirmed, _) => Some(OrderStatus::Preparing),
            (OrderStatus::Preparing, _) => Some(OrderStatus::Ready),
            (OrderStatus::Ready, OrderType::Delivery) => Some(OrderStatus::InDelivery),
            (OrderStatus::Ready, _) => Some(OrderStatus::Delivered),
            (OrderStatus::InDelivery, _) => Some(OrderStatus::Delivered),
            (OrderStatus::Delivered | OrderStatus::Cancelled, _) => None,
        }
    }

    /// Returns true if the order can move from this status to `target`.
    ///
    /// Only single forward steps and cancellation of a non-terminal order are
    /// legal. Staying on the same status is handled by the caller as a no-op.
    pub fn can_transition_to(&self, target: OrderStatus, order_type: OrderType) -> bool {
        if target == OrderStatus::Cancelled {
            return self.can_cancel();
        }
        self.next(order_type) == Some(target)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        !self.is_terminal()
    }

    /// Returns true if this is a terminal status (no further transitions possible).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Returns the wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::InDelivery => "in-delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown order status '{s}'"))
    }
}
