//! Table reservation coordinator.
//!
//! Reserves and releases the table of a dine-in order. The order and the
//! table are separate aggregates written by separate calls, so nothing here
//! rolls back an order when the table step fails. Both calls are safe to
//! replay against the table service.

use domain::{Fulfillment, Order};

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::services::{TableRelease, TableReservation};

#[derive(Debug, Clone)]
pub struct TableReservationCoordinator {
    gateway: Gateway,
}

impl TableReservationCoordinator {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Builds the reservation request for `order`, if it is dine-in.
    pub fn reservation(order: &Order) -> Option<TableReservation> {
        match order.fulfillment() {
            Fulfillment::DineIn(booking) => Some(TableReservation {
                restaurant_id: order.restaurant_id().clone(),
                table_number: booking.table_number.clone(),
                reservation_date: booking.reservation_date,
                reservation_time: booking.reservation_time.clone(),
                order_id: order.id(),
            }),
            _ => None,
        }
    }

    /// Builds the release request for `order`, if it is dine-in.
    pub fn release(order: &Order) -> Option<TableRelease> {
        order.fulfillment().table_booking().map(|booking| TableRelease {
            restaurant_id: order.restaurant_id().clone(),
            table_number: booking.table_number.clone(),
            order_id: order.id(),
        })
    }

    /// Reserves the table of a dine-in order.
    ///
    /// Returns `None` for other order types. The table service only grants
    /// the reservation while the table is `available`; a taken table comes
    /// back as [`GatewayError::Conflict`].
    pub async fn reserve_for(&self, order: &Order) -> Option<Result<(), GatewayError>> {
        let reservation = Self::reservation(order)?;
        let result = self.gateway.reserve_table(&reservation).await;
        if result.is_ok() {
            tracing::info!(
                order_id = %order.id(),
                table_number = %reservation.table_number,
                "table reserved"
            );
        }
        Some(result)
    }

    /// Returns the table of a dine-in order to `available`.
    ///
    /// Returns `None` for other order types.
    pub async fn release_for(&self, order: &Order) -> Option<Result<(), GatewayError>> {
        let release = Self::release(order)?;
        let result = self.gateway.release_table(&release).await;
        if result.is_ok() {
            tracing::info!(
                order_id = %order.id(),
                table_number = %release.table_number,
                "table released"
            );
        }
        Some(result)
    }
}
