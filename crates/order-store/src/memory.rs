use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderError, OrderStats};
use tokio::sync::RwLock;

use crate::{FIRST_ORDER_NUMBER, OrderQuery, OrderStore, Page, Result, StoreError};

/// In-memory order store implementation.
///
/// Used for tests and local runs. Provides the same guarantees as the
/// PostgreSQL implementation: updates hold the write lock for the whole
/// read-modify-write, and order numbers come from an atomic counter.
#[derive(Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    sequence: Arc<AtomicU64>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            sequence: Arc::new(AtomicU64::new(FIRST_ORDER_NUMBER)),
        }
    }

    /// Returns the total number of orders stored.
    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    /// Clears all orders. The order number sequence is not reset.
    pub async fn clear(&self) {
        self.orders.write().await.clear();
    }
}

impl Default for InMemoryOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn next_order_number(&self) -> Result<u64> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst))
    }

    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;

        if orders.contains_key(&order.id()) {
            return Err(StoreError::Duplicate(order.id().to_string()));
        }
        if orders.values().any(|o| o.code() == order.code()) {
            return Err(StoreError::Duplicate(order.code().to_string()));
        }

        orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn update<F, T>(&self, id: OrderId, mutate: F) -> Result<(Order, T)>
    where
        F: FnOnce(&mut Order) -> std::result::Result<T, OrderError> + Send,
        T: Send,
    {
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        // Mutate a copy so a failed mutation leaves the stored order untouched
        let mut order = stored.clone();
        let value = mutate(&mut order)?;
        if order != *stored {
            *stored = order.clone();
        }

        Ok((order, value))
    }

    async fn query(&self, query: &OrderQuery) -> Result<Page<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders
            .values()
            .filter(|o| query.matches(o))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.code().cmp(a.code()))
        });

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(query.offset.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Ok(Page { items, total })
    }

    async fn stats(&self, query: &OrderQuery) -> Result<OrderStats> {
        let orders = self.orders.read().await;
        Ok(OrderStats::from_orders(
            orders.values().filter(|o| query.matches(o)),
        ))
    }
}
