//! Restaurant service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::RestaurantId;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub(crate) const SERVICE: &str = "restaurant";

/// Denormalized restaurant details returned alongside a new order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantSummary {
    #[serde(alias = "_id")]
    pub id: RestaurantId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<serde_json::Value>,
}

impl RestaurantSummary {
    pub fn new(id: impl Into<RestaurantId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location: None,
        }
    }
}

/// Trait for restaurant lookups.
#[async_trait]
pub trait RestaurantService: Send + Sync {
    /// Fetches a restaurant by id.
    async fn get_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<RestaurantSummary, GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryRestaurantState {
    restaurants: HashMap<RestaurantId, RestaurantSummary>,
    unavailable: bool,
}

/// In-memory restaurant service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRestaurantService {
    state: Arc<RwLock<InMemoryRestaurantState>>,
}

impl InMemoryRestaurantService {
    /// Creates a new in-memory restaurant service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a restaurant.
    pub fn add_restaurant(&self, restaurant: RestaurantSummary) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.restaurants.insert(restaurant.id.clone(), restaurant);
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
impl RestaurantService for InMemoryRestaurantService {
    async fn get_restaurant(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<RestaurantSummary, GatewayError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(GatewayError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        state
            .restaurants
            .get(restaurant_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                service: SERVICE,
                resource: format!("restaurant {restaurant_id}"),
            })
    }
}
