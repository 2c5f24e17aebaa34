//! Customer-, owner- and courier-facing copy derived from order events.
//!
//! Message derivation is pure; delivering the messages is the job of the
//! saga's notification dispatcher.

use serde::{Deserialize, Serialize};

use crate::actor::Role;
use crate::order::{Order, OrderStatus, PaymentStatus};

/// Notification type understood by the notification service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
    Order,
    Cancel,
}

/// Who a message is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Audience {
    Customer,
    Owner,
    DeliveryPerson,
}

/// Something that happened to an order and may be worth telling someone about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderEvent {
    Placed,
    StatusChanged(OrderStatus),
    Cancelled { reason: Option<String>, by: Role },
    PaymentUpdated(PaymentStatus),
    DeliveryAssigned,
}

impl OrderEvent {
    /// Audiences that may receive copy for this event.
    ///
    /// [`derive_message`] still decides per audience whether anything is sent.
    pub fn audiences(&self) -> &'static [Audience] {
        match self {
            OrderEvent::Placed | OrderEvent::Cancelled { .. } => {
                &[Audience::Customer, Audience::Owner]
            }
            OrderEvent::DeliveryAssigned => &[Audience::DeliveryPerson, Audience::Customer],
            OrderEvent::StatusChanged(_) | OrderEvent::PaymentUpdated(_) => &[Audience::Customer],
        }
    }
}

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub title: String,
    pub message: String,
    pub severity: Severity,
}

impl Message {
    fn new(title: impl Into<String>, message: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            severity,
        }
    }
}

/// Derives the copy `audience` receives for `event` on `order`.
///
/// Returns `None` when the audience is not told about the event, e.g. owners
/// are not told about cancellations they made themselves.
pub fn derive_message(order: &Order, event: &OrderEvent, audience: Audience) -> Option<Message> {
    let code = order.code();

    match (event, audience) {
        (OrderEvent::Placed, Audience::Customer) => Some(Message::new(
            "Order Placed",
            "Your order has been placed successfully",
            Severity::Success,
        )),
        (OrderEvent::Placed, Audience::Owner) => Some(Message::new(
            format!("New Order {code}"),
            format!("New order received: {code}"),
            Severity::Order,
        )),

        (OrderEvent::StatusChanged(status), Audience::Customer) => {
            let (message, severity) = match status {
                OrderStatus::Preparing => ("Your order is being prepared".to_string(), Severity::Info),
                OrderStatus::Ready => (
                    "Your order is ready for pickup/delivery".to_string(),
                    Severity::Success,
                ),
                OrderStatus::Delivered => {
                    ("Your order has been delivered".to_string(), Severity::Success)
                }
                OrderStatus::Cancelled => {
                    ("Your order has been cancelled".to_string(), Severity::Error)
                }
                other => (
                    format!("Your order status has been updated to {other}"),
                    Severity::Info,
                ),
            };
            Some(Message::new(format!("Order {code} Update"), message, severity))
        }

        (OrderEvent::Cancelled { reason, .. }, Audience::Customer) => {
            let message = match reason.as_deref().filter(|r| !r.trim().is_empty()) {
                Some(reason) => format!("Order {code} has been cancelled: {reason}"),
                None => format!("Order {code} has been cancelled"),
            };
            Some(Message::new("Order Cancelled", message, Severity::Error))
        }
        (OrderEvent::Cancelled { by, .. }, Audience::Owner) if *by != Role::RestaurantOwner => {
            Some(Message::new(
                format!("Cancelled Order {code}"),
                format!("Order {code} has been cancelled"),
                Severity::Cancel,
            ))
        }

        (OrderEvent::PaymentUpdated(payment), Audience::Customer) => {
            let severity = if *payment == PaymentStatus::Paid {
                Severity::Success
            } else {
                Severity::Info
            };
            Some(Message::new(
                "Payment Update",
                format!("Payment {payment} for order {code}"),
                severity,
            ))
        }

        (OrderEvent::DeliveryAssigned, Audience::DeliveryPerson) => Some(Message::new(
            "Delivery Assigned",
            format!("You have been assigned to deliver order {code}"),
            Severity::Info,
        )),
        (OrderEvent::DeliveryAssigned, Audience::Customer) => Some(Message::new(
            "Out for Delivery",
            format!("Your order {code} is out for delivery"),
            Severity::Info,
        )),

        _ => None,
    }
}
