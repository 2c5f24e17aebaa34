//! Cart service trait and in-memory implementation.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::UserId;

use crate::error::GatewayError;

pub(crate) const SERVICE: &str = "cart";

/// Trait for cart operations.
#[async_trait]
pub trait CartService: Send + Sync {
    /// Empties the active cart of a user. Clearing an empty cart succeeds.
    async fn clear(&self, user_id: &UserId) -> Result<(), GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryCartState {
    non_empty: HashSet<UserId>,
    cleared: Vec<UserId>,
    unavailable: bool,
}

/// In-memory cart service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCartService {
    state: Arc<RwLock<InMemoryCartState>>,
}

impl InMemoryCartService {
    /// Creates a new in-memory cart service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the cart of `user_id` as holding items.
    pub fn fill(&self, user_id: impl Into<UserId>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.non_empty.insert(user_id.into());
    }

    /// Returns true if the cart of `user_id` holds items.
    pub fn has_items(&self, user_id: &UserId) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .non_empty
            .contains(user_id)
    }

    /// Returns the users whose carts were cleared, in call order.
    pub fn cleared(&self) -> Vec<UserId> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cleared
            .clone()
    }

    /// Configures the service to fail every call as unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .unavailable = unavailable;
    }
}

#[async_trait]
impl CartService for InMemoryCartService {
    async fn clear(&self, user_id: &UserId) -> Result<(), GatewayError> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(GatewayError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        state.non_empty.remove(user_id);
        state.cleared.push(user_id.clone());
        Ok(())
    }
}
