//! Identifier types shared by every crate of the order fulfillment workspace.

mod types;

pub use types::{MenuItemId, OrderId, RestaurantId, UserId};
