//! Domain layer for the order fulfillment services.
//!
//! This crate provides the pure parts of order fulfillment:
//! - Order aggregate with status and payment state machines
//! - Capability check for actors acting on an order
//! - Notification copy derived from order events
//! - Order statistics

pub mod actor;
pub mod notification;
pub mod order;
pub mod stats;

pub use actor::{Actor, Capability, Role, Scope};
pub use notification::{Audience, Message, OrderEvent, Severity, derive_message};
pub use order::{
    ChangeStatus, CreateOrder, DEFAULT_CANCELLATION_REASON, DeliveryAddress, Fulfillment, Money,
    Order, OrderCode, OrderError, OrderItem, OrderLine, OrderStatus, OrderType, PaymentStatus,
    RESTAURANT_CANCELLATION_REASON, TableBooking, Transition,
};
pub use stats::{OrderStats, StatsGroup, TypeStats};
