//! Table service trait and in-memory implementation.
//!
//! The table service owns table state. Reservation is a compare-and-set on
//! the table status: it only succeeds while the table is `available`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use chrono::NaiveDate;
use common::{OrderId, RestaurantId};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub(crate) const SERVICE: &str = "table";

/// Status of a physical table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    #[default]
    Available,
    Reserved,
    Occupied,
    Maintenance,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStatus::Available => "available",
            TableStatus::Reserved => "reserved",
            TableStatus::Occupied => "occupied",
            TableStatus::Maintenance => "maintenance",
        }
    }
}

/// Request to reserve a table for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableReservation {
    pub restaurant_id: RestaurantId,
    pub table_number: String,
    pub reservation_date: Option<NaiveDate>,
    pub reservation_time: Option<String>,
    pub order_id: OrderId,
}

/// Request to release the table held by an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRelease {
    pub restaurant_id: RestaurantId,
    pub table_number: String,
    pub order_id: OrderId,
}

/// Trait for table reservation operations.
///
/// Both operations must be safe to repeat: reserving a table already held by
/// the same order and releasing an available table succeed without change.
#[async_trait]
pub trait TableService: Send + Sync {
    /// Reserves a table if it is currently available.
    async fn reserve(&self, reservation: &TableReservation) -> Result<(), GatewayError>;

    /// Returns a reserved or occupied table to `available`.
    async fn release(&self, release: &TableRelease) -> Result<(), GatewayError>;
}

#[derive(Debug, Clone, Default)]
struct TableSlot {
    status: TableStatus,
    held_by: Option<OrderId>,
}

#[derive(Debug, Default)]
struct InMemoryTableState {
    tables: HashMap<(RestaurantId, String), TableSlot>,
    unavailable: bool,
    reserve_calls: usize,
    release_calls: usize,
}

/// In-memory table service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTableService {
    state: Arc<RwLock<InMemoryTableState>>,
}

impl InMemoryTableService {
    /// Creates a new in-memory table service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an available table.
    pub fn add_table(&self, restaurant_id: impl Into<RestaurantId>, table_number: impl Into<String>) {
        self.set_status(restaurant_id, table_number, TableStatus::Available);
    }

    /// Forces a table into `status`, clearing any holder.
    pub fn set_status(
        &self,
        restaurant_id: impl Into<RestaurantId>,
        table_number: impl Into<String>,
        status: TableStatus,
    ) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.tables.insert(
            (restaurant_id.into(), table_number.into()),
            TableSlot {
                status,
                held_by: None,
            },
        );
    }

    /// Returns the status of a table, if it exists.
    pub fn status(&self, restaurant_id: &RestaurantId, table_number: &str) -> Option<TableStatus> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .tables
            .get(&(restaurant_id.clone(), table_number.to_string()))
            .map(|slot| slot.status)
    }

    /// Returns the order holding a table, if any.
    pub fn held_by(&self, restaurant_id: &RestaurantId, table_number: &str) -> Option<OrderId> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .tables
            .get(&(restaurant_id.clone(), table_number.to_string()))
            .and_then(|slot| slot.held_by)
    }

    /// Configures the service to fail every call as unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unavailable = unavailable;
    }

    /// Returns the number of reserve calls received.
    pub fn reserve_calls(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .reserve_calls
    }

    /// Returns the number of release calls received.
    pub fn release_calls(&self) -> usize {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .release_calls
    }
}

fn not_found(restaurant_id: &RestaurantId, table_number: &str) -> GatewayError {
    GatewayError::NotFound {
        service: SERVICE,
        resource: format!("table {table_number} at restaurant {restaurant_id}"),
    }
}

#[async_trait]
impl TableService for InMemoryTableService {
    async fn reserve(&self, reservation: &TableReservation) -> Result<(), GatewayError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.reserve_calls += 1;

        if state.unavailable {
            return Err(GatewayError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }

        let key = (
            reservation.restaurant_id.clone(),
            reservation.table_number.clone(),
        );
        let slot = state
            .tables
            .get_mut(&key)
            .ok_or_else(|| not_found(&reservation.restaurant_id, &reservation.table_number))?;

        match (slot.status, slot.held_by) {
            (TableStatus::Available, _) => {
                slot.status = TableStatus::Reserved;
                slot.held_by = Some(reservation.order_id);
                Ok(())
            }
            // replayed reservation
            (TableStatus::Reserved, Some(holder)) if holder == reservation.order_id => Ok(()),
            (status, _) => Err(GatewayError::Conflict {
                service: SERVICE,
                reason: format!(
                    "Table {} is not available ({})",
                    reservation.table_number,
                    status.as_str()
                ),
            }),
        }
    }

    async fn release(&self, release: &TableRelease) -> Result<(), GatewayError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.release_calls += 1;

        if state.unavailable {
            return Err(GatewayError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }

        let key = (release.restaurant_id.clone(), release.table_number.clone());
        let slot = state
            .tables
            .get_mut(&key)
            .ok_or_else(|| not_found(&release.restaurant_id, &release.table_number))?;

        match (slot.status, slot.held_by) {
            (TableStatus::Available | TableStatus::Maintenance, _) => Ok(()),
            (_, Some(holder)) if holder != release.order_id => Err(GatewayError::Conflict {
                service: SERVICE,
                reason: format!(
                    "Table {} is held by another order",
                    release.table_number
                ),
            }),
            _ => {
                slot.status = TableStatus::Available;
                slot.held_by = None;
                Ok(())
            }
        }
    }
}
