use async_trait::async_trait;
use common::OrderId;
use domain::{Order, OrderError, OrderStats};

use crate::{OrderQuery, Page, Result, StoreError};

/// First value handed out by [`OrderStore::next_order_number`].
pub const FIRST_ORDER_NUMBER: u64 = 1001;

/// Core trait for order store implementations.
///
/// Orders are stored as whole documents keyed by [`OrderId`]. All
/// implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Returns the next order number.
    ///
    /// Numbers start at [`FIRST_ORDER_NUMBER`] and are unique and increasing
    /// across concurrent callers. A number may be skipped if the order it was
    /// drawn for is never inserted.
    async fn next_order_number(&self) -> Result<u64>;

    /// Inserts a new order.
    ///
    /// Fails with `Duplicate` if the id or code is already taken.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Retrieves an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Atomically applies `mutate` to the stored order.
    ///
    /// `mutate` runs against the current document while no other update of
    /// the same order can interleave. If it returns an error nothing is
    /// written and the error is returned as `StoreError::Order`. The document
    /// is only written back if it changed.
    ///
    /// Returns the order as stored after the update together with the value
    /// produced by `mutate`.
    async fn update<F, T>(&self, id: OrderId, mutate: F) -> Result<(Order, T)>
    where
        F: FnOnce(&mut Order) -> std::result::Result<T, OrderError> + Send,
        T: Send;

    /// Retrieves orders matching a query, newest first.
    async fn query(&self, query: &OrderQuery) -> Result<Page<Order>>;

    /// Computes statistics over every order matching `query`.
    ///
    /// Pagination on the query is ignored.
    async fn stats(&self, query: &OrderQuery) -> Result<OrderStats>;
}

/// Extension trait providing convenience methods for order stores.
#[async_trait]
pub trait OrderStoreExt: OrderStore {
    /// Retrieves an order, failing with `NotFound` if it does not exist.
    async fn require(&self, id: OrderId) -> Result<Order> {
        self.get(id).await?.ok_or(StoreError::NotFound(id))
    }
}

// Blanket implementation for all OrderStore implementations
impl<T: OrderStore + ?Sized> OrderStoreExt for T {}
