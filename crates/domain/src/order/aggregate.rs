//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::{OrderId, RestaurantId, UserId};
use serde::{Deserialize, Serialize};

use super::{
    ChangeStatus, CreateOrder, Fulfillment, Money, OrderCode, OrderError, OrderItem, OrderStatus,
    OrderType, PaymentStatus,
};

/// Reason stored when a cancellation arrives without one.
pub const DEFAULT_CANCELLATION_REASON: &str = "No reason provided";

/// Reason stored when a restaurant cancels through a status change without one.
pub const RESTAURANT_CANCELLATION_REASON: &str = "Cancelled by restaurant";

/// Result of applying a status or payment change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition<S> {
    /// The order moved from one status to another.
    Applied { from: S, to: S },

    /// The order already had the requested status; nothing changed.
    Unchanged,
}

impl<S> Transition<S> {
    /// Returns true if the order was modified.
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

/// Order aggregate root.
///
/// Represents an order from placement to delivery or cancellation. Orders are
/// never deleted; cancellation is a terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,

    /// Sequential human-readable code, assigned once.
    code: OrderCode,

    user_id: UserId,
    restaurant_id: RestaurantId,
    items: Vec<OrderItem>,

    /// Always recomputed from `items`.
    #[serde(rename = "total_amount_cents")]
    total_amount: Money,

    #[serde(flatten)]
    fulfillment: Fulfillment,

    status: OrderStatus,
    payment_status: PaymentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivery_person_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    special_instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_delivery_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    estimated_pickup_time: Option<DateTime<Utc>>,

    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    delivered_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cancellation_reason: Option<String>,
}

/// Computes the order total from its line items.
///
/// Returns `None` if any line or the sum does not fit in an `i64` of cents.
pub fn compute_total(items: &[OrderItem]) -> Option<Money> {
    items.iter().try_fold(Money::zero(), |total, item| {
        total.checked_add(item.total_price()?)
    })
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn code(&self) -> &OrderCode {
        &self.code
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn restaurant_id(&self) -> &RestaurantId {
        &self.restaurant_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn fulfillment(&self) -> &Fulfillment {
        &self.fulfillment
    }

    pub fn order_type(&self) -> OrderType {
        self.fulfillment.order_type()
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn delivery_person_id(&self) -> Option<&UserId> {
        self.delivery_person_id.as_ref()
    }

    pub fn special_instructions(&self) -> Option<&str> {
        self.special_instructions.as_deref()
    }

    pub fn estimated_delivery_time(&self) -> Option<DateTime<Utc>> {
        self.estimated_delivery_time
    }

    pub fn estimated_pickup_time(&self) -> Option<DateTime<Utc>> {
        self.estimated_pickup_time
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn cancellation_reason(&self) -> Option<&str> {
        self.cancellation_reason.as_deref()
    }

    /// Returns true if the order is in a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

// Command methods
impl Order {
    /// Places a new order in `pending` status.
    ///
    /// Validates the line items and computes the total; client-supplied totals
    /// are never trusted.
    pub fn place(
        id: OrderId,
        code: OrderCode,
        user_id: UserId,
        restaurant_id: RestaurantId,
        cmd: &CreateOrder,
        fulfillment: Fulfillment,
        now: DateTime<Utc>,
    ) -> Result<Self, OrderError> {
        let items = cmd.order_items();
        validate_items(&items)?;
        let total_amount = compute_total(&items).ok_or(OrderError::TotalOutOfRange)?;

        if fulfillment.order_type() != cmd.order_type {
            return Err(OrderError::FulfillmentMismatch {
                order_type: cmd.order_type,
                fulfillment: fulfillment.order_type(),
            });
        }

        Ok(Self {
            id,
            code,
            user_id,
            restaurant_id,
            total_amount,
            items,
            fulfillment,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            delivery_person_id: None,
            special_instructions: cmd.special_instructions.clone(),
            estimated_delivery_time: cmd.estimated_delivery_time,
            estimated_pickup_time: cmd.estimated_pickup_time,
            created_at: now,
            updated_at: now,
            delivered_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        })
    }

    /// Moves the order to a new status.
    ///
    /// Re-applying the current status is a successful no-op so duplicate
    /// requests are harmless. A delivery person can only be attached on the
    /// move to `in-delivery`.
    pub fn change_status(
        &mut self,
        change: &ChangeStatus,
        now: DateTime<Utc>,
    ) -> Result<Transition<OrderStatus>, OrderError> {
        let target = change.target;

        if change.delivery_person_id.is_some() && target != OrderStatus::InDelivery {
            return Err(OrderError::DeliveryPersonNotAllowed { target });
        }

        if self.status == target {
            return Ok(Transition::Unchanged);
        }

        if !self.status.can_transition_to(target, self.order_type()) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: target,
                order_type: self.order_type(),
            });
        }

        match target {
            OrderStatus::Delivered => self.delivered_at = Some(now),
            OrderStatus::Cancelled => {
                self.cancelled_at = Some(now);
                self.cancellation_reason = Some(
                    change
                        .reason
                        .clone()
                        .filter(|r| !r.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string()),
                );
            }
            OrderStatus::InDelivery => {
                if let Some(person) = &change.delivery_person_id {
                    self.delivery_person_id = Some(person.clone());
                }
            }
            _ => {}
        }

        let from = self.status;
        self.status = target;
        self.updated_at = now;
        Ok(Transition::Applied { from, to: target })
    }

    /// Updates the payment status.
    pub fn change_payment_status(
        &mut self,
        target: PaymentStatus,
        now: DateTime<Utc>,
    ) -> Result<Transition<PaymentStatus>, OrderError> {
        if self.payment_status == target {
            return Ok(Transition::Unchanged);
        }

        if !self.payment_status.can_transition_to(target) {
            return Err(OrderError::InvalidPaymentTransition {
                from: self.payment_status,
                to: target,
            });
        }

        let from = self.payment_status;
        self.payment_status = target;
        self.updated_at = now;
        Ok(Transition::Applied { from, to: target })
    }
}

fn validate_items(items: &[OrderItem]) -> Result<(), OrderError> {
    if items.is_empty() {
        return Err(OrderError::NoItems);
    }

    for item in items {
        if item.quantity == 0 {
            return Err(OrderError::InvalidQuantity {
                menu_item_id: item.menu_item_id.to_string(),
                quantity: item.quantity,
            });
        }

        let negative_addon = item
            .selected_addons
            .iter()
            .flat_map(|group| group.selections.iter())
            .any(|selection| selection.price.is_negative());

        if item.unit_price.is_negative() || negative_addon {
            return Err(OrderError::InvalidPrice {
                menu_item_id: item.menu_item_id.to_string(),
                price: item.unit_price.cents(),
            });
        }
    }

    Ok(())
}
