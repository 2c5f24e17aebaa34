//! Order commands.

use chrono::{DateTime, NaiveDate, Utc};
use common::{RestaurantId, UserId};
use serde::Deserialize;

use super::{
    DeliveryAddress, Fulfillment, OrderError, OrderItem, OrderStatus, OrderType, TableBooking,
};

/// A requested line item, optionally naming the restaurant it comes from.
///
/// Cart-originated items carry their restaurant; the first one is used when
/// the request itself names none.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    #[serde(flatten)]
    pub item: OrderItem,

    #[serde(default)]
    pub restaurant_id: Option<RestaurantId>,
}

impl From<OrderItem> for OrderLine {
    fn from(item: OrderItem) -> Self {
        Self {
            item,
            restaurant_id: None,
        }
    }
}

/// Command to place a new order.
///
/// The requesting user is not part of the command; it comes from the actor.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrder {
    #[serde(default)]
    pub restaurant_id: Option<RestaurantId>,
    pub items: Vec<OrderLine>,
    pub order_type: OrderType,
    #[serde(default)]
    pub delivery_address: Option<DeliveryAddress>,
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub reservation_date: Option<NaiveDate>,
    #[serde(default)]
    pub reservation_time: Option<String>,
    #[serde(default)]
    pub pickup_location: Option<RestaurantId>,
    #[serde(default)]
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_pickup_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

impl CreateOrder {
    /// Creates a command with the given items and no type-specific details.
    pub fn new(order_type: OrderType, items: Vec<OrderItem>) -> Self {
        Self {
            restaurant_id: None,
            items: items.into_iter().map(OrderLine::from).collect(),
            order_type,
            delivery_address: None,
            table_number: None,
            reservation_date: None,
            reservation_time: None,
            pickup_location: None,
            estimated_delivery_time: None,
            estimated_pickup_time: None,
            special_instructions: None,
        }
    }

    /// Sets the restaurant explicitly.
    pub fn at_restaurant(mut self, restaurant_id: impl Into<RestaurantId>) -> Self {
        self.restaurant_id = Some(restaurant_id.into());
        self
    }

    /// Sets the delivery address.
    pub fn deliver_to(mut self, address: DeliveryAddress) -> Self {
        self.delivery_address = Some(address);
        self
    }

    /// Sets the table for a dine-in order.
    pub fn at_table(mut self, table_number: impl Into<String>) -> Self {
        self.table_number = Some(table_number.into());
        self
    }

    /// Sets the pickup location.
    pub fn pickup_at(mut self, location: impl Into<RestaurantId>) -> Self {
        self.pickup_location = Some(location.into());
        self
    }

    /// Resolves the restaurant from the request body, falling back to the
    /// first line item. Blank ids count as absent.
    pub fn resolve_restaurant(&self) -> Option<RestaurantId> {
        let present = |id: &&RestaurantId| !id.as_str().trim().is_empty();

        self.restaurant_id
            .as_ref()
            .filter(present)
            .or_else(|| self.items.first()?.restaurant_id.as_ref().filter(present))
            .cloned()
    }

    /// Returns the requested items without their routing information.
    pub fn order_items(&self) -> Vec<OrderItem> {
        self.items.iter().map(|line| line.item.clone()).collect()
    }

    /// Builds the type-conditional fulfillment details.
    ///
    /// A delivery order without an address falls back to `profile_address`.
    pub fn fulfillment(
        &self,
        profile_address: Option<&DeliveryAddress>,
    ) -> Result<Fulfillment, OrderError> {
        let missing = |field: &'static str| OrderError::MissingFulfillmentDetail {
            order_type: self.order_type,
            field,
        };

        match self.order_type {
            OrderType::Delivery => {
                let address = self
                    .delivery_address
                    .as_ref()
                    .filter(|a| !a.is_blank())
                    .or(profile_address.filter(|a| !a.is_blank()))
                    .cloned()
                    .ok_or_else(|| missing("delivery_address"))?;
                Ok(Fulfillment::Delivery {
                    delivery_address: address,
                })
            }
            OrderType::Pickup => {
                let location = self
                    .pickup_location
                    .clone()
                    .ok_or_else(|| missing("pickup_location"))?;
                Ok(Fulfillment::Pickup {
                    pickup_location: location,
                })
            }
            OrderType::DineIn => {
                let table_number = self
                    .table_number
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| missing("table_number"))?;
                Ok(Fulfillment::DineIn(TableBooking {
                    table_number: table_number.to_string(),
                    reservation_date: self.reservation_date,
                    reservation_time: self.reservation_time.clone(),
                }))
            }
        }
    }
}

/// Command to move an order to a new status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeStatus {
    pub target: OrderStatus,
    pub reason: Option<String>,
    pub delivery_person_id: Option<UserId>,
}

impl ChangeStatus {
    /// Creates a status change to `target`.
    pub fn to(target: OrderStatus) -> Self {
        Self {
            target,
            reason: None,
            delivery_person_id: None,
        }
    }

    /// Creates a cancellation with an optional reason.
    pub fn cancel(reason: Option<String>) -> Self {
        Self {
            target: OrderStatus::Cancelled,
            reason,
            delivery_person_id: None,
        }
    }

    /// Creates a hand-off to a delivery person.
    pub fn dispatch(delivery_person_id: UserId) -> Self {
        Self {
            target: OrderStatus::InDelivery,
            reason: None,
            delivery_person_id: Some(delivery_person_id),
        }
    }

    /// Attaches a reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Uses `reason` for a cancellation that carries no reason of its own.
    pub fn or_cancellation_reason(mut self, reason: &str) -> Self {
        let blank = self.reason.as_deref().is_none_or(|r| r.trim().is_empty());
        if self.target == OrderStatus::Cancelled && blank {
            self.reason = Some(reason.to_string());
        }
        self
    }
}
