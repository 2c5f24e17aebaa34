//! User service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use common::{RestaurantId, UserId};
use domain::{DeliveryAddress, Role};
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

pub(crate) const SERVICE: &str = "user";

/// Profile of a platform user as returned by the user service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub address: Option<DeliveryAddress>,
    #[serde(default)]
    pub assigned_restaurant: Option<RestaurantId>,
}

impl UserProfile {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            mobile_no: None,
            role: Some(Role::Customer),
            address: None,
            assigned_restaurant: None,
        }
    }

    pub fn with_mobile(mut self, mobile_no: impl Into<String>) -> Self {
        self.mobile_no = Some(mobile_no.into());
        self
    }

    pub fn with_address(mut self, address: DeliveryAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Makes the user the owner of `restaurant_id`.
    pub fn owning(mut self, restaurant_id: impl Into<RestaurantId>) -> Self {
        self.role = Some(Role::RestaurantOwner);
        self.assigned_restaurant = Some(restaurant_id.into());
        self
    }

    /// Returns true if the user registered a mobile number.
    pub fn has_mobile(&self) -> bool {
        self.mobile_no
            .as_deref()
            .is_some_and(|number| !number.trim().is_empty())
    }
}

/// Trait for user lookups.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Fetches a user by id.
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, GatewayError>;

    /// Lists the owners of a restaurant.
    async fn restaurant_owners(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<UserProfile>, GatewayError>;
}

#[derive(Debug, Default)]
struct InMemoryUserState {
    users: HashMap<UserId, UserProfile>,
    unavailable: bool,
}

/// In-memory user service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserService {
    state: Arc<RwLock<InMemoryUserState>>,
}

impl InMemoryUserService {
    /// Creates a new in-memory user service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a user.
    pub fn add_user(&self, user: UserProfile) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.users.insert(user.id.clone(), user);
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
impl UserService for InMemoryUserService {
    async fn get_user(&self, user_id: &UserId) -> Result<UserProfile, GatewayError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(GatewayError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        state
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                service: SERVICE,
                resource: format!("user {user_id}"),
            })
    }

    async fn restaurant_owners(
        &self,
        restaurant_id: &RestaurantId,
    ) -> Result<Vec<UserProfile>, GatewayError> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        if state.unavailable {
            return Err(GatewayError::Unavailable {
                service: SERVICE,
                reason: "connection refused".to_string(),
            });
        }
        let mut owners: Vec<_> = state
            .users
            .values()
            .filter(|u| u.assigned_restaurant.as_ref() == Some(restaurant_id))
            .cloned()
            .collect();
        owners.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(owners)
    }
}
