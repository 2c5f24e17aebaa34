//! Order Store: durable keyed storage for order documents.
//!
//! Every store supports atomic read-modify-write of a single order and an
//! atomic sequence for human-readable order codes.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;
pub use query::{OrderQuery, Page};
pub use store::{FIRST_ORDER_NUMBER, OrderStore, OrderStoreExt};
